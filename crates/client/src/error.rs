//! Error types of the upload client.

use std::fmt;
use std::path::PathBuf;

use ironbox_cipher::CipherError;
use ironbox_protocol::Endpoint;
use ironbox_transfer::BlockUploadError;
use ironbox_transport::{TransportError, body_excerpt};

/// Step of the upload pipeline, used to name where a session failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferStage {
    Ping,
    KeyExchange,
    CreateBlob,
    CheckOut,
    Encrypt,
    Upload,
    CheckIn,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ping => "ping",
            Self::KeyExchange => "key exchange",
            Self::CreateBlob => "blob creation",
            Self::CheckOut => "checkout",
            Self::Encrypt => "encryption",
            Self::Upload => "upload",
            Self::CheckIn => "check-in",
        })
    }
}

/// Failure of a single IronBox API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{endpoint} unreachable: {source}")]
    Unreachable {
        endpoint: Endpoint,
        #[source]
        source: TransportError,
    },

    #[error("{endpoint} rejected with status {status}{}", body_excerpt(.body))]
    ServerRejected {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },

    #[error("{endpoint} response has no {field}")]
    MissingField {
        endpoint: Endpoint,
        field: &'static str,
    },

    #[error("cannot encode {endpoint} request: {source}")]
    Encode {
        endpoint: Endpoint,
        #[source]
        source: serde_urlencoded::ser::Error,
    },

    #[error("malformed {endpoint} response: {source}")]
    MalformedResponse {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status of a rejected call.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure to obtain usable session key material.
#[derive(Debug, thiserror::Error)]
pub enum KeyExchangeError {
    #[error("key service unreachable: {0}")]
    Unreachable(#[source] TransportError),

    #[error("key request rejected with status {status}{}", body_excerpt(.body))]
    ServerRejected { status: u16, body: String },

    #[error("malformed key response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("key request failed: {0}")]
    Request(#[source] ApiError),

    #[error("session key or IV is empty")]
    EmptyKey,

    #[error("session key material is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("session key has unsupported length {0}")]
    InvalidKeyLength(usize),

    #[error("session IV has length {0}, expected 16")]
    InvalidIvLength(usize),
}

impl From<ApiError> for KeyExchangeError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unreachable { source, .. } => Self::Unreachable(source),
            ApiError::ServerRejected { status, body, .. } => Self::ServerRejected { status, body },
            ApiError::MalformedResponse { source, .. } => Self::MalformedResponse(source),
            other => Self::Request(other),
        }
    }
}

/// Failure of an upload session. [`TransferError::stage`] names the step.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("ping failed: {0}")]
    Ping(#[source] ApiError),

    #[error("key exchange failed: {0}")]
    KeyExchange(#[from] KeyExchangeError),

    #[error("blob creation failed: {0}")]
    CreateBlob(#[source] ApiError),

    #[error("checkout failed: {0}")]
    CheckOut(#[source] ApiError),

    #[error("cannot read {}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create temporary ciphertext: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("encryption failed: {0}")]
    Encrypt(#[from] CipherError),

    #[error("encryption task failed: {0}")]
    Task(String),

    #[error("ciphertext {} vanished before upload", .0.display())]
    CiphertextMissing(PathBuf),

    #[error("upload failed: {0}")]
    Upload(#[from] BlockUploadError),

    #[error("check-in failed: {0}")]
    CheckIn(#[source] ApiError),

    #[error("session already failed during {0}")]
    AlreadyFailed(TransferStage),
}

impl TransferError {
    pub fn stage(&self) -> TransferStage {
        match self {
            Self::Ping(_) => TransferStage::Ping,
            Self::KeyExchange(_) => TransferStage::KeyExchange,
            Self::CreateBlob(_) => TransferStage::CreateBlob,
            Self::CheckOut(_) => TransferStage::CheckOut,
            Self::Source { .. }
            | Self::TempFile(_)
            | Self::Encrypt(_)
            | Self::Task(_)
            | Self::CiphertextMissing(_) => TransferStage::Encrypt,
            Self::Upload(_) => TransferStage::Upload,
            Self::CheckIn(_) => TransferStage::CheckIn,
            Self::AlreadyFailed(stage) => *stage,
        }
    }

    /// Remote status and body carried by the failure, if any.
    pub fn remote_status(&self) -> Option<(u16, &str)> {
        match self {
            Self::Ping(e) | Self::CreateBlob(e) | Self::CheckOut(e) | Self::CheckIn(e) => match e {
                ApiError::ServerRejected { status, body, .. } => Some((*status, body.as_str())),
                _ => None,
            },
            Self::KeyExchange(KeyExchangeError::ServerRejected { status, body }) => Some((*status, body.as_str())),
            Self::Upload(BlockUploadError::BlockRejected { status, body, .. })
            | Self::Upload(BlockUploadError::CommitRejected { status, body }) => Some((*status, body.as_str())),
            _ => None,
        }
    }
}
