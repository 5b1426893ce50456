//! Wire types for the IronBox secure storage API.
//!
//! Covers the form-encoded request bodies and JSON responses of the
//! IronBox REST endpoints, plus the header names and constants of the
//! block storage layer the ciphertext is pushed to.

pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::Endpoint;
pub use messages::{
    CheckInRequest, CheckOutRequest, CheckOutResponse, ContainerKeyDataRequest,
    ContainerKeyDataResponse, CreateBlobRequest, CreateBlobResponse,
};
pub use types::Credential;
