use std::fmt;
use std::path::PathBuf;

use crate::RequestConfig;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        })
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// In-memory bytes sent as-is.
    Bytes(Vec<u8>),
    /// Already url-encoded form fields, sent as
    /// `application/x-www-form-urlencoded`.
    Form(String),
    /// `len` bytes of a file starting at `offset`, streamed from disk with a
    /// matching `Content-Length`.
    File { path: PathBuf, offset: u64, len: u64 },
}

impl RequestBody {
    /// Number of body bytes that will go on the wire.
    pub fn content_length(&self) -> u64 {
        match self {
            Self::Empty => 0,
            Self::Bytes(bytes) => bytes.len() as u64,
            Self::Form(form) => form.len() as u64,
            Self::File { len, .. } => *len,
        }
    }
}

/// A single HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    /// Query parameters appended to `url`.
    pub query: Vec<(String, String)>,
    /// Request-specific headers.
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub config: RequestConfig,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>, config: RequestConfig) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            config,
        }
    }

    pub fn get(url: impl Into<String>, config: RequestConfig) -> Self {
        Self::new(Method::Get, url, config)
    }

    pub fn post(url: impl Into<String>, config: RequestConfig) -> Self {
        Self::new(Method::Post, url, config)
    }

    pub fn put(url: impl Into<String>, config: RequestConfig) -> Self {
        Self::new(Method::Put, url, config)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Returns the value of the first header named `name` (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of an HTTP answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for any status below 400; redirects count as success.
    pub fn is_successful(&self) -> bool {
        self.status < 400
    }

    /// True for 4xx and 5xx.
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Characters of a response body quoted in error messages.
const EXCERPT_CHARS: usize = 200;

/// `": <body>"` for a non-blank body, cut after [`EXCERPT_CHARS`] characters;
/// empty for a blank one. Meant to be appended to a status message.
pub fn body_excerpt(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return String::new();
    }
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!(": {head}...")
    } else {
        format!(": {head}")
    }
}
