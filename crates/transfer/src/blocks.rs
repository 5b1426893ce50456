use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::BlockUploadError;

/// Default block size: 4 MiB.
pub const DEFAULT_BLOCK_SIZE: u64 = 4 * 1024 * 1024;

/// Storage-layer ceiling on the number of blocks in one blob.
pub const MAX_BLOCKS: u32 = 50_000;

/// Default number of block PUTs in flight.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Tunables of the block uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    pub block_size: u64,
    pub max_blocks: u32,
    /// Upper bound on concurrent block PUTs. Zero is treated as one.
    pub concurrency: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            max_blocks: MAX_BLOCKS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// One block of the ciphertext file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDescriptor {
    pub index: u32,
    /// Plain identifier, `block00000042`.
    pub id: String,
    /// Base64 of `id`, as sent to the storage layer.
    pub encoded_id: String,
    pub offset: u64,
    pub len: u64,
}

/// Fixed-width identifier of block `index`.
pub fn block_id(index: u32) -> String {
    format!("block{index:08}")
}

pub fn encode_block_id(id: &str) -> String {
    STANDARD.encode(id)
}

/// Splits `size` bytes into blocks of `options.block_size`.
///
/// Fails with [`BlockUploadError::TooLarge`] when more than
/// `options.max_blocks` blocks would be needed.
pub fn plan_blocks(size: u64, options: &UploadOptions) -> Result<Vec<BlockDescriptor>, BlockUploadError> {
    let block_size = options.block_size.max(1);
    let count = size.div_ceil(block_size);
    if count > u64::from(options.max_blocks) {
        return Err(BlockUploadError::TooLarge {
            size,
            blocks: count,
            max_blocks: options.max_blocks,
        });
    }

    // count <= max_blocks, which fits in u32.
    Ok((0..count as u32)
        .map(|index| {
            let offset = u64::from(index) * block_size;
            let id = block_id(index);
            BlockDescriptor {
                index,
                encoded_id: encode_block_id(&id),
                id,
                offset,
                len: block_size.min(size - offset),
            }
        })
        .collect())
}

/// URL of the PUT storing one block. `uri` already carries the signed query.
pub fn block_url(uri: &str, encoded_id: &str) -> String {
    format!(
        "{uri}&comp=block&blockid={}",
        utf8_percent_encode(encoded_id, NON_ALPHANUMERIC)
    )
}

/// URL of the PUT committing the block list.
pub fn commit_url(uri: &str) -> String {
    format!("{uri}&comp=blockList")
}

/// XML block list naming `blocks` in the given order.
pub fn commit_body(blocks: &[BlockDescriptor]) -> String {
    let mut body = String::from(r#"<?xml version="1.0" encoding="utf-8"?><BlockList>"#);
    for block in blocks {
        body.push_str("<Latest>");
        body.push_str(&block.encoded_id);
        body.push_str("</Latest>");
    }
    body.push_str("</BlockList>");
    body
}
