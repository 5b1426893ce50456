use std::fmt;

/// Production API host. The version segment is appended per client.
pub const DEFAULT_API_URL: &str = "https://api.goironcloud.com";

/// API version path segment used when none is configured.
pub const DEFAULT_API_VERSION: &str = "latest";

/// Response format requested through the `Accept` header.
pub const DEFAULT_RESPONSE_FORMAT: &str = "application/json";

pub const HEADER_ACCEPT: &str = "Accept";

// ---------------------------------------------------------------------------
// Block storage layer
// ---------------------------------------------------------------------------

/// Storage service version the block and block-list calls are written against.
pub const STORAGE_API_VERSION: &str = "2012-02-12";

/// Header carrying [`STORAGE_API_VERSION`].
pub const HEADER_STORAGE_VERSION: &str = "x-ms-version";

/// Header declaring the blob type on block PUTs.
pub const HEADER_BLOB_TYPE: &str = "x-ms-blob-type";

/// Value of [`HEADER_BLOB_TYPE`] for block blobs.
pub const BLOB_TYPE_BLOCK: &str = "BlockBlob";

pub const HEADER_CONTENT_TYPE: &str = "Content-Type";

/// Content type of raw ciphertext blocks.
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// Content type of the block-list commit body.
pub const CONTENT_TYPE_XML: &str = "text/xml";

/// Status the storage layer answers with on a stored block or committed list.
pub const STATUS_CREATED: u16 = 201;

/// IronBox REST endpoint, relative to `{api_url}/{version}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Ping,
    ContainerKeyData,
    CreateEntityContainerBlob,
    CheckOutEntityContainerBlob,
    CheckInEntityContainerBlob,
}

impl Endpoint {
    /// Path segment of the endpoint.
    pub fn path(self) -> &'static str {
        match self {
            Self::Ping => "Ping",
            Self::ContainerKeyData => "ContainerKeyData",
            Self::CreateEntityContainerBlob => "CreateEntityContainerBlob",
            Self::CheckOutEntityContainerBlob => "CheckOutEntityContainerBlob",
            Self::CheckInEntityContainerBlob => "CheckInEntityContainerBlob",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
