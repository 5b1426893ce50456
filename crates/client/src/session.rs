use std::path::{Path, PathBuf};

use ironbox_protocol::Credential;
use ironbox_transfer::CommitReceipt;
use tempfile::NamedTempFile;

use crate::api::CheckoutLease;
use crate::error::TransferStage;
use crate::keys::SessionKeyMaterial;

/// Summary of a finished upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub blob_id_name: String,
    pub plaintext_size: u64,
    pub ciphertext_size: u64,
    pub block_count: u32,
}

/// Upload pipeline state.
///
/// Each state owns exactly what the next step needs. The key material is
/// dropped (and wiped) once the ciphertext exists; the lease is consumed by
/// the upload. Dropping a state that holds the temporary ciphertext deletes
/// the file.
#[derive(Debug)]
pub enum TransferState {
    Start,
    Pinged,
    KeyObtained {
        key: SessionKeyMaterial,
    },
    BlobCreated {
        key: SessionKeyMaterial,
        blob_id_name: String,
    },
    CheckedOut {
        key: SessionKeyMaterial,
        blob_id_name: String,
        lease: CheckoutLease,
    },
    Encrypted {
        blob_id_name: String,
        lease: CheckoutLease,
        ciphertext: NamedTempFile,
        plaintext_size: u64,
        ciphertext_size: u64,
    },
    Uploaded {
        blob_id_name: String,
        check_in_token: String,
        ciphertext: NamedTempFile,
        plaintext_size: u64,
        receipt: CommitReceipt,
    },
    CheckedIn {
        ciphertext: NamedTempFile,
        report: UploadReport,
    },
    Done(UploadReport),
    Failed(TransferStage),
}

impl TransferState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pinged => "pinged",
            Self::KeyObtained { .. } => "key obtained",
            Self::BlobCreated { .. } => "blob created",
            Self::CheckedOut { .. } => "checked out",
            Self::Encrypted { .. } => "encrypted",
            Self::Uploaded { .. } => "uploaded",
            Self::CheckedIn { .. } => "checked in",
            Self::Done(_) => "done",
            Self::Failed(_) => "failed",
        }
    }

    /// Stage performed by the transition out of this state. Terminal states
    /// report the stage they ended in.
    pub fn pending_stage(&self) -> TransferStage {
        match self {
            Self::Start => TransferStage::Ping,
            Self::Pinged => TransferStage::KeyExchange,
            Self::KeyObtained { .. } => TransferStage::CreateBlob,
            Self::BlobCreated { .. } => TransferStage::CheckOut,
            Self::CheckedOut { .. } => TransferStage::Encrypt,
            Self::Encrypted { .. } => TransferStage::Upload,
            Self::Uploaded { .. } | Self::CheckedIn { .. } | Self::Done(_) => TransferStage::CheckIn,
            Self::Failed(stage) => *stage,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed(_))
    }

    /// Path of the temporary ciphertext while the state holds one.
    pub fn ciphertext_path(&self) -> Option<&Path> {
        match self {
            Self::Encrypted { ciphertext, .. }
            | Self::Uploaded { ciphertext, .. }
            | Self::CheckedIn { ciphertext, .. } => Some(ciphertext.path()),
            _ => None,
        }
    }
}

/// One upload of one file into one container.
#[derive(Debug)]
pub struct UploadSession {
    pub(crate) credential: Credential,
    pub(crate) container_id: String,
    pub(crate) source: PathBuf,
    pub(crate) blob_name: String,
    pub(crate) state: TransferState,
}

impl UploadSession {
    pub fn new(
        credential: Credential,
        container_id: impl Into<String>,
        source: impl Into<PathBuf>,
        blob_name: impl Into<String>,
    ) -> Self {
        Self {
            credential,
            container_id: container_id.into(),
            source: source.into(),
            blob_name: blob_name.into(),
            state: TransferState::Start,
        }
    }

    pub fn state(&self) -> &TransferState {
        &self.state
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn blob_name(&self) -> &str {
        &self.blob_name
    }

    /// The report once the session reached [`TransferState::Done`].
    pub fn report(&self) -> Option<&UploadReport> {
        match &self.state {
            TransferState::Done(report) => Some(report),
            _ => None,
        }
    }
}
