//! `reqwest`-backed [`Transport`].

use std::io::SeekFrom;
use std::path::Path;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::redirect::Policy;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::{Method, Request, RequestBody, RequestConfig, Response, SendFuture, Transport, TransportError};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Maximum redirects followed before giving up.
const MAX_REDIRECTS: usize = 10;

/// HTTP transport on top of a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Builds the underlying client with the connect timeout and user agent
    /// of `config`.
    pub fn new(config: &RequestConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { http })
    }

    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };

        let mut builder = self
            .http
            .request(method, &request.url)
            .timeout(request.config.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(auth) = &request.config.auth {
            builder = builder.basic_auth(&auth.username, Some(&auth.password));
        }

        let body_bytes = request.body.content_length();
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Bytes(bytes) => builder.body(bytes),
            RequestBody::Form(form) => builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(form),
            RequestBody::File { path, offset, len } => {
                let slice = open_file_slice(&path, offset, len).await?;
                builder
                    .header(CONTENT_LENGTH, len)
                    .body(reqwest::Body::wrap_stream(ReaderStream::new(slice)))
            }
        };

        let resp = builder.send().await.map_err(TransportError::from_reqwest)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(TransportError::from_reqwest)?;

        debug!(
            method = %request.method,
            url = %request.url,
            body_bytes,
            status,
            "HTTP request finished"
        );

        Ok(Response {
            status,
            body: body.to_vec(),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: Request) -> SendFuture<'_> {
        Box::pin(self.execute(request))
    }
}

/// Opens `path`, seeks to `offset` and limits reads to `len` bytes.
async fn open_file_slice(
    path: &Path,
    offset: u64,
    len: u64,
) -> Result<Take<tokio::fs::File>, TransportError> {
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(offset)).await?;
    Ok(file.take(len))
}
