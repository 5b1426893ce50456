//! Upload session state machine.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use ironbox_cipher::StreamCipher;
use ironbox_protocol::Credential;
use ironbox_transfer::{BlockUploader, TransferLog};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, CheckoutLease};
use crate::error::TransferError;
use crate::keys::{KeyExchange, SessionKeyMaterial};
use crate::session::{TransferState, UploadReport, UploadSession};

/// Drives [`UploadSession`]s from `Start` to `Done`.
///
/// One remote call is outstanding at a time, except for the block PUTs of
/// the upload step. Any failure moves the session to
/// [`TransferState::Failed`] and drops whatever the state owned, including
/// the temporary ciphertext.
pub struct TransferOrchestrator<'a> {
    api: &'a ApiClient,
    log: &'a dyn TransferLog,
}

impl<'a> TransferOrchestrator<'a> {
    pub fn new(api: &'a ApiClient, log: &'a dyn TransferLog) -> Self {
        Self { api, log }
    }

    /// Encrypts and uploads `source` into `container_id` as `blob_name`.
    pub async fn upload(
        &self,
        credential: Credential,
        container_id: &str,
        source: &Path,
        blob_name: &str,
    ) -> Result<UploadReport, TransferError> {
        let mut session = UploadSession::new(credential, container_id, source, blob_name);
        self.run(&mut session).await
    }

    /// Advances `session` until it is done or failed.
    pub async fn run(&self, session: &mut UploadSession) -> Result<UploadReport, TransferError> {
        loop {
            if let TransferState::Done(report) = &session.state {
                return Ok(report.clone());
            }
            self.advance(session).await?;
        }
    }

    /// Performs one transition.
    ///
    /// On error the session is left in [`TransferState::Failed`] with the
    /// stage that failed. While the transition runs the session is parked as
    /// failed at that stage, so a session whose future was dropped cannot be
    /// resumed; start a fresh [`UploadSession`] instead.
    pub async fn advance(&self, session: &mut UploadSession) -> Result<(), TransferError> {
        let parked = TransferState::Failed(session.state.pending_stage());
        let state = std::mem::replace(&mut session.state, parked);
        let from = state.name();

        match self.transition(session, state).await {
            Ok(next) => {
                debug!(from, to = next.name(), blob = %session.blob_name, "transition");
                self.log.info(&format!("{}: {from} -> {}", session.blob_name, next.name()));
                session.state = next;
                Ok(())
            }
            Err(err) => {
                let stage = err.stage();
                error!(%stage, error = %err, blob = %session.blob_name, "upload failed");
                self.log.error(&format!("{}: {err}", session.blob_name));
                session.state = TransferState::Failed(stage);
                Err(err)
            }
        }
    }

    async fn transition(
        &self,
        session: &UploadSession,
        state: TransferState,
    ) -> Result<TransferState, TransferError> {
        let credential = &session.credential;
        let container = session.container_id.as_str();

        match state {
            TransferState::Start => {
                self.api.ping().await.map_err(TransferError::Ping)?;
                Ok(TransferState::Pinged)
            }

            TransferState::Pinged => {
                let key = KeyExchange::new(self.api).fetch(container, credential).await?;
                Ok(TransferState::KeyObtained { key })
            }

            TransferState::KeyObtained { key } => {
                let blob_id_name = self
                    .api
                    .create_blob(credential, container, &session.blob_name)
                    .await
                    .map_err(TransferError::CreateBlob)?;
                Ok(TransferState::BlobCreated { key, blob_id_name })
            }

            TransferState::BlobCreated { key, blob_id_name } => {
                let lease = self
                    .api
                    .check_out(credential, container, &blob_id_name)
                    .await
                    .map_err(TransferError::CheckOut)?;
                Ok(TransferState::CheckedOut {
                    key,
                    blob_id_name,
                    lease,
                })
            }

            TransferState::CheckedOut {
                key,
                blob_id_name,
                lease,
            } => {
                let (ciphertext, plaintext_size, ciphertext_size) = self.encrypt(&session.source, &key).await?;
                Ok(TransferState::Encrypted {
                    blob_id_name,
                    lease,
                    ciphertext,
                    plaintext_size,
                    ciphertext_size,
                })
            }

            TransferState::Encrypted {
                blob_id_name,
                lease,
                ciphertext,
                plaintext_size,
                ciphertext_size: _,
            } => {
                let CheckoutLease {
                    upload_uri,
                    check_in_token,
                    ..
                } = lease;
                let config = self.api.config();
                let receipt = BlockUploader::new(self.api.transport(), self.log)
                    .with_options(config.upload)
                    .with_request_config(config.request.clone())
                    .verbose(config.verbose)
                    .upload(ciphertext.path(), &upload_uri)
                    .await?;
                Ok(TransferState::Uploaded {
                    blob_id_name,
                    check_in_token,
                    ciphertext,
                    plaintext_size,
                    receipt,
                })
            }

            TransferState::Uploaded {
                blob_id_name,
                check_in_token,
                ciphertext,
                plaintext_size,
                receipt,
            } => {
                self.api
                    .check_in(credential, container, &blob_id_name, plaintext_size, &check_in_token)
                    .await
                    .map_err(TransferError::CheckIn)?;
                info!(
                    blob = %blob_id_name,
                    plaintext_size,
                    ciphertext_size = receipt.bytes,
                    blocks = receipt.block_count,
                    "upload checked in"
                );
                Ok(TransferState::CheckedIn {
                    ciphertext,
                    report: UploadReport {
                        blob_id_name,
                        plaintext_size,
                        ciphertext_size: receipt.bytes,
                        block_count: receipt.block_count,
                    },
                })
            }

            TransferState::CheckedIn { ciphertext, report } => {
                let path = ciphertext.path().to_path_buf();
                if let Err(e) = ciphertext.close() {
                    warn!(path = %path.display(), error = %e, "failed to remove temporary ciphertext");
                }
                Ok(TransferState::Done(report))
            }

            TransferState::Done(report) => Ok(TransferState::Done(report)),

            TransferState::Failed(stage) => Err(TransferError::AlreadyFailed(stage)),
        }
    }

    /// Encrypts `source` into a fresh temporary file under the configured
    /// temp directory. Returns the file with the plaintext and ciphertext
    /// sizes.
    async fn encrypt(
        &self,
        source: &Path,
        key: &SessionKeyMaterial,
    ) -> Result<(NamedTempFile, u64, u64), TransferError> {
        let source_error = |source_err| TransferError::Source {
            path: source.to_path_buf(),
            source: source_err,
        };
        let plaintext_size = tokio::fs::metadata(source).await.map_err(source_error)?.len();

        let config = self.api.config();
        let cipher = StreamCipher::new(key.key(), key.iv())?.with_read_size(config.cipher_read_size);
        let temp_dir = config.temp_dir.clone();
        let path = source.to_path_buf();

        let (ciphertext, written) = tokio::task::spawn_blocking(move || encrypt_to_temp(&cipher, &path, &temp_dir))
            .await
            .map_err(|e| TransferError::Task(e.to_string()))??;

        if !ciphertext.path().exists() {
            return Err(TransferError::CiphertextMissing(ciphertext.path().to_path_buf()));
        }
        debug!(
            source = %source.display(),
            ciphertext = %ciphertext.path().display(),
            plaintext_size,
            ciphertext_size = written,
            "file encrypted"
        );
        Ok((ciphertext, plaintext_size, written))
    }
}

fn encrypt_to_temp(
    cipher: &StreamCipher,
    source: &Path,
    temp_dir: &Path,
) -> Result<(NamedTempFile, u64), TransferError> {
    let mut out = tempfile::Builder::new()
        .prefix(".ironbox-")
        .suffix(".iron")
        .tempfile_in(temp_dir)
        .map_err(TransferError::TempFile)?;
    let reader = File::open(source).map_err(|e| TransferError::Source {
        path: source.to_path_buf(),
        source: e,
    })?;
    let written = cipher.encrypt(reader, BufWriter::new(out.as_file_mut()))?;
    Ok((out, written))
}
