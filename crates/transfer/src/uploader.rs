use std::path::Path;

use futures_util::{StreamExt, stream};
use ironbox_protocol::constants::{
    BLOB_TYPE_BLOCK, CONTENT_TYPE_OCTET_STREAM, CONTENT_TYPE_XML, HEADER_BLOB_TYPE,
    HEADER_CONTENT_TYPE, HEADER_STORAGE_VERSION, STATUS_CREATED, STORAGE_API_VERSION,
};
use ironbox_transport::{Request, RequestBody, RequestConfig, Transport};
use tracing::{debug, info, warn};

use crate::blocks::{BlockDescriptor, UploadOptions, block_url, commit_body, commit_url, plan_blocks};
use crate::progress::ProgressTracker;
use crate::{BlockUploadError, TransferLog};

/// Outcome of a committed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub block_count: u32,
    pub bytes: u64,
    /// Plain identifiers in commit order.
    pub block_ids: Vec<String>,
}

/// Uploads a ciphertext file as blocks and commits the block list.
pub struct BlockUploader<'a> {
    transport: &'a dyn Transport,
    log: &'a dyn TransferLog,
    request: RequestConfig,
    options: UploadOptions,
    verbose: bool,
}

impl<'a> BlockUploader<'a> {
    pub fn new(transport: &'a dyn Transport, log: &'a dyn TransferLog) -> Self {
        Self {
            transport,
            log,
            request: RequestConfig::default(),
            options: UploadOptions::default(),
            verbose: false,
        }
    }

    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_request_config(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }

    /// Report every acknowledged block through the log sink.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Uploads `path` to the signed blob `uri`.
    ///
    /// Blocks go out concurrently, at most `options.concurrency` at a time.
    /// The first rejected block aborts the remaining PUTs and no commit is
    /// sent. On success the commit lists every block in index order.
    pub async fn upload(&self, path: &Path, uri: &str) -> Result<CommitReceipt, BlockUploadError> {
        let size = tokio::fs::metadata(path).await?.len();
        let blocks = plan_blocks(size, &self.options)?;
        let block_count = blocks.len() as u32;
        info!(
            path = %path.display(),
            size,
            blocks = block_count,
            concurrency = self.options.concurrency,
            "uploading blocks"
        );

        let mut progress = ProgressTracker::new(size, block_count);
        {
            let mut puts = stream::iter(&blocks)
                .map(|block| self.put_block(path, uri, block))
                .buffer_unordered(self.options.concurrency.max(1));

            while let Some(result) = puts.next().await {
                let block = result?;
                let snapshot = progress.record(block.len);
                debug!(index = block.index, sent = snapshot.sent_bytes, "block stored");
                if self.verbose {
                    let mut line = format!("block {} stored, {snapshot}", block.id);
                    if let Some(eta) = progress.eta().filter(|_| !snapshot.is_complete()) {
                        line.push_str(&format!(", about {}s left", eta.as_secs()));
                    }
                    self.log.info(&line);
                }
            }
        }

        self.commit(uri, &blocks).await?;
        info!(blocks = block_count, bytes = size, "block list committed");

        Ok(CommitReceipt {
            block_count,
            bytes: size,
            block_ids: blocks.into_iter().map(|b| b.id).collect(),
        })
    }

    async fn put_block<'b>(
        &self,
        path: &Path,
        uri: &str,
        block: &'b BlockDescriptor,
    ) -> Result<&'b BlockDescriptor, BlockUploadError> {
        let request = Request::put(block_url(uri, &block.encoded_id), self.request.clone())
            .header(HEADER_CONTENT_TYPE, CONTENT_TYPE_OCTET_STREAM)
            .header(HEADER_BLOB_TYPE, BLOB_TYPE_BLOCK)
            .header(HEADER_STORAGE_VERSION, STORAGE_API_VERSION)
            .body(RequestBody::File {
                path: path.to_path_buf(),
                offset: block.offset,
                len: block.len,
            });

        let response = self
            .transport
            .send(request)
            .await
            .map_err(BlockUploadError::Unreachable)?;
        if response.status != STATUS_CREATED {
            let body = response.text();
            warn!(index = block.index, status = response.status, "block rejected");
            if self.verbose {
                self.log.error(&format!("block {} rejected: {body}", block.id));
            }
            return Err(BlockUploadError::BlockRejected {
                index: block.index,
                status: response.status,
                body,
            });
        }
        Ok(block)
    }

    async fn commit(&self, uri: &str, blocks: &[BlockDescriptor]) -> Result<(), BlockUploadError> {
        let request = Request::put(commit_url(uri), self.request.clone())
            .header(HEADER_CONTENT_TYPE, CONTENT_TYPE_XML)
            .header(HEADER_STORAGE_VERSION, STORAGE_API_VERSION)
            .body(RequestBody::Bytes(commit_body(blocks).into_bytes()));

        let response = self
            .transport
            .send(request)
            .await
            .map_err(BlockUploadError::Unreachable)?;
        if response.status != STATUS_CREATED {
            let body = response.text();
            warn!(status = response.status, "block list rejected");
            if self.verbose {
                self.log.error(&format!("block list rejected: {body}"));
            }
            return Err(BlockUploadError::CommitRejected {
                status: response.status,
                body,
            });
        }
        Ok(())
    }
}
