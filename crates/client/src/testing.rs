//! In-memory stand-ins for the IronBox API and the storage layer.

use std::io::{Read, Seek, SeekFrom};
use std::sync::Mutex;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ironbox_protocol::Credential;
use ironbox_transport::{Method, Request, RequestBody, Response, SendFuture, Transport, TransportError};

pub(crate) const UPLOAD_URI: &str = "https://store.test/container/blob-1?sv=2012-02-12&sig=abc";

pub(crate) fn credential() -> Credential {
    Credential::new("you@example.com", "secret")
}

/// A request as the mock saw it, file bodies resolved to bytes.
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn form_value(&self, name: &str) -> Option<String> {
        let fields: Vec<(String, String)> = serde_urlencoded::from_bytes(&self.body).ok()?;
        fields.into_iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Last path segment of an API call, e.g. `ContainerKeyData`.
    pub fn api_endpoint(&self) -> Option<&str> {
        self.url
            .strip_prefix("https://api.test/latest/")
            .filter(|rest| !rest.contains('/'))
    }

    pub fn is_block_put(&self) -> bool {
        self.url.contains("&comp=block&blockid=")
    }

    pub fn is_commit(&self) -> bool {
        self.url.ends_with("&comp=blockList")
    }

    /// Index encoded in a block PUT URL.
    pub fn block_index(&self) -> Option<u32> {
        let encoded = self
            .url
            .split("&blockid=")
            .nth(1)?
            .replace("%2B", "+")
            .replace("%2F", "/")
            .replace("%3D", "=");
        let id = STANDARD.decode(encoded).ok()?;
        std::str::from_utf8(&id).ok()?.strip_prefix("block")?.parse().ok()
    }
}

type Handler = Box<dyn Fn(&Recorded) -> Result<Response, TransportError> + Send + Sync>;

/// Transport answering every request through a closure, recording each.
pub(crate) struct MockTransport {
    handler: Handler,
    requests: Mutex<Vec<Recorded>>,
}

impl MockTransport {
    pub fn new(handler: impl Fn(&Recorded) -> Result<Response, TransportError> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers everything with the same status and body.
    pub fn reply(status: u16, body: &'static str) -> Self {
        Self::new(move |_| Ok(Response::new(status, body)))
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Recorded) -> bool) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| pred(r)).count()
    }
}

fn read_body(body: &RequestBody) -> Vec<u8> {
    match body {
        RequestBody::Empty => Vec::new(),
        RequestBody::Bytes(b) => b.clone(),
        RequestBody::Form(f) => f.clone().into_bytes(),
        RequestBody::File { path, offset, len } => {
            let mut file = std::fs::File::open(path).unwrap();
            file.seek(SeekFrom::Start(*offset)).unwrap();
            let mut out = Vec::new();
            file.take(*len).read_to_end(&mut out).unwrap();
            out
        }
    }
}

impl Transport for MockTransport {
    fn send(&self, request: Request) -> SendFuture<'_> {
        let recorded = Recorded {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: read_body(&request.body),
        };
        self.requests.lock().unwrap().push(recorded.clone());
        let result = (self.handler)(&recorded);
        Box::pin(async move { result })
    }
}

/// Scripted IronBox service plus storage layer.
#[derive(Debug, Clone)]
pub(crate) struct FakeService {
    pub key_base64: String,
    pub iv_base64: String,
    /// `(endpoint or "block" / "blockList", status)` to fail with.
    pub fail: Option<(&'static str, u16)>,
}

impl FakeService {
    pub const KEY: [u8; 16] = *b"ironbox-test-key";
    pub const IV: [u8; 16] = *b"ironbox-test-iv!";

    pub fn new() -> Self {
        Self {
            key_base64: STANDARD.encode(Self::KEY),
            iv_base64: STANDARD.encode(Self::IV),
            fail: None,
        }
    }

    pub fn failing(mut self, target: &'static str, status: u16) -> Self {
        self.fail = Some((target, status));
        self
    }

    pub fn into_transport(self) -> MockTransport {
        MockTransport::new(move |req| Ok(self.respond(req)))
    }

    fn respond(&self, req: &Recorded) -> Response {
        let target = if req.is_block_put() {
            "block"
        } else if req.is_commit() {
            "blockList"
        } else {
            req.api_endpoint().unwrap_or("unknown")
        };
        if let Some((failing, status)) = self.fail {
            if failing == target {
                return Response::new(status, format!("{target} failed"));
            }
        }

        match target {
            "Ping" => Response::new(200, ""),
            "ContainerKeyData" => Response::new(
                200,
                format!(
                    r#"{{"SessionKeyBase64":"{}","SessionIVBase64":"{}","SymmetricKeyStrength":1}}"#,
                    self.key_base64, self.iv_base64
                ),
            ),
            "CreateEntityContainerBlob" => Response::new(200, r#""blob-1""#),
            "CheckOutEntityContainerBlob" => Response::new(
                200,
                format!(
                    r#"{{"SharedAccessSignature":"?sv=2012-02-12&sig=abc","SharedAccessSignatureUri":"{UPLOAD_URI}","CheckInToken":"check-in-1","StorageUri":"https://store.test","StorageType":1,"ContainerStorageName":"container"}}"#
                ),
            ),
            "CheckInEntityContainerBlob" => Response::new(200, "true"),
            "block" | "blockList" => Response::new(201, ""),
            _ => Response::new(404, "no such endpoint"),
        }
    }
}
