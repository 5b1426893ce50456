//! Block upload of encrypted blobs to the storage layer.
//!
//! A ciphertext file is split into fixed-size blocks, each block is PUT with
//! a fixed-width identifier, and the ordered identifier list is committed in
//! a final PUT. Nothing is committed unless every block was accepted.

mod blocks;
mod log;
mod progress;
mod uploader;

pub use blocks::{
    BlockDescriptor, DEFAULT_BLOCK_SIZE, DEFAULT_CONCURRENCY, MAX_BLOCKS, UploadOptions, block_id,
    block_url, commit_body, commit_url, encode_block_id, plan_blocks,
};
pub use log::{NullLog, TracingLog, TransferLog};
pub use progress::{ProgressTracker, SpeedCalculator, UploadProgress};
pub use uploader::{BlockUploader, CommitReceipt};

use ironbox_transport::{TransportError, body_excerpt};

/// Errors produced by the block uploader.
#[derive(Debug, thiserror::Error)]
pub enum BlockUploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ciphertext of {size} bytes needs {blocks} blocks, limit is {max_blocks}")]
    TooLarge { size: u64, blocks: u64, max_blocks: u32 },

    #[error("storage unreachable: {0}")]
    Unreachable(#[source] TransportError),

    #[error("block {index} rejected with status {status}{}", body_excerpt(.body))]
    BlockRejected { index: u32, status: u16, body: String },

    #[error("block list commit rejected with status {status}{}", body_excerpt(.body))]
    CommitRejected { status: u16, body: String },
}
