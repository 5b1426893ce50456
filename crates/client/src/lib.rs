//! IronBox secure upload client.
//!
//! Uploads a local file into an IronBox container. The file is encrypted
//! client-side under a per-container session key, pushed to the storage
//! layer in blocks and registered with the service.
//!
//! # Pipeline
//!
//! 1. **Ping**: check the API is reachable
//! 2. **Key exchange**: fetch the container's session key and IV
//! 3. **Create blob**: register the blob name, receive its id-name
//! 4. **Check out**: obtain a single-use signed upload URI
//! 5. **Encrypt**: AES-CBC into a temporary file
//! 6. **Upload**: blocks plus an ordered block-list commit
//! 7. **Check in**: report the plaintext size
//!
//! [`TransferOrchestrator`] drives an [`UploadSession`] through these
//! states. The temporary ciphertext is removed on every exit path.

pub mod api;
pub mod config;
pub mod error;
pub mod keys;
pub mod orchestrator;
pub mod session;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, CheckoutLease};
pub use config::ClientConfig;
pub use error::{ApiError, KeyExchangeError, TransferError, TransferStage};
pub use keys::{KeyExchange, SessionKeyMaterial};
pub use orchestrator::TransferOrchestrator;
pub use session::{TransferState, UploadReport, UploadSession};

pub use ironbox_protocol::Credential;
pub use ironbox_transfer::{NullLog, TracingLog, TransferLog, UploadOptions};
