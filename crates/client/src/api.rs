//! Calls against the IronBox REST API.

use std::fmt;
use std::sync::Arc;

use ironbox_protocol::constants::HEADER_ACCEPT;
use ironbox_protocol::{
    CheckInRequest, CheckOutRequest, CheckOutResponse, ContainerKeyDataRequest,
    ContainerKeyDataResponse, CreateBlobRequest, CreateBlobResponse, Credential, Endpoint,
};
use ironbox_transport::{HttpTransport, Request, RequestBody, Response, Transport, TransportError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Single-use authorization to upload one blob.
///
/// Consumed by the upload step; the check-in token is the only part that
/// outlives it.
#[derive(Clone, PartialEq)]
pub struct CheckoutLease {
    pub shared_access_signature: String,
    /// Signed blob URI the blocks are PUT to.
    pub upload_uri: String,
    pub check_in_token: String,
    pub storage_uri: Option<String>,
    pub storage_type: Option<serde_json::Value>,
    pub container_storage_name: Option<String>,
}

impl fmt::Debug for CheckoutLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutLease")
            .field("storage_uri", &self.storage_uri)
            .field("storage_type", &self.storage_type)
            .field("container_storage_name", &self.container_storage_name)
            .finish_non_exhaustive()
    }
}

impl CheckoutLease {
    fn from_response(resp: CheckOutResponse) -> Result<Self, ApiError> {
        let endpoint = Endpoint::CheckOutEntityContainerBlob;
        let required = |value: Option<String>, field: &'static str| {
            value
                .filter(|v| !v.is_empty())
                .ok_or(ApiError::MissingField { endpoint, field })
        };
        Ok(Self {
            shared_access_signature: required(resp.shared_access_signature, "SharedAccessSignature")?,
            upload_uri: required(resp.shared_access_signature_uri, "SharedAccessSignatureUri")?,
            check_in_token: required(resp.check_in_token, "CheckInToken")?,
            storage_uri: resp.storage_uri,
            storage_type: resp.storage_type,
            container_storage_name: resp.container_storage_name,
        })
    }
}

/// IronBox API client.
///
/// Holds no credentials; each call takes the caller's [`Credential`].
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    /// Client over a `reqwest` transport built from `config.request`.
    pub fn with_http(config: ClientConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config.request)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Checks the API. Any status below 400 counts as reachable.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let endpoint = Endpoint::Ping;
        let request = Request::get(self.config.endpoint_url(endpoint), self.config.request.clone())
            .header(HEADER_ACCEPT, self.config.accept.as_str());
        self.send(endpoint, request).await.map(|_| ())
    }

    pub async fn container_key_data(
        &self,
        credential: &Credential,
        container_id: &str,
    ) -> Result<ContainerKeyDataResponse, ApiError> {
        let endpoint = Endpoint::ContainerKeyData;
        let form = ContainerKeyDataRequest::new(credential, container_id);
        let response = self.post_form(endpoint, &form).await?;
        parse_json(endpoint, &response)
    }

    /// Registers `blob_name` in the container and returns its id-name.
    pub async fn create_blob(
        &self,
        credential: &Credential,
        container_id: &str,
        blob_name: &str,
    ) -> Result<String, ApiError> {
        let endpoint = Endpoint::CreateEntityContainerBlob;
        let form = CreateBlobRequest::new(credential, container_id, blob_name);
        let response = self.post_form(endpoint, &form).await?;
        let id_name = parse_json::<CreateBlobResponse>(endpoint, &response)?.into_id_name();
        if id_name.is_empty() {
            return Err(ApiError::MissingField {
                endpoint,
                field: "BlobIDName",
            });
        }
        debug!(blob = %id_name, "blob created");
        Ok(id_name)
    }

    pub async fn check_out(
        &self,
        credential: &Credential,
        container_id: &str,
        blob_id_name: &str,
    ) -> Result<CheckoutLease, ApiError> {
        let endpoint = Endpoint::CheckOutEntityContainerBlob;
        let form = CheckOutRequest::new(credential, container_id, blob_id_name);
        let response = self.post_form(endpoint, &form).await?;
        let lease = CheckoutLease::from_response(parse_json(endpoint, &response)?)?;
        debug!(blob = %blob_id_name, storage = ?lease.storage_uri, "blob checked out");
        Ok(lease)
    }

    /// Marks the upload complete. `plaintext_size` is the size of the
    /// original file.
    pub async fn check_in(
        &self,
        credential: &Credential,
        container_id: &str,
        blob_id_name: &str,
        plaintext_size: u64,
        check_in_token: &str,
    ) -> Result<(), ApiError> {
        let endpoint = Endpoint::CheckInEntityContainerBlob;
        let form = CheckInRequest::new(credential, container_id, blob_id_name, plaintext_size, check_in_token);
        let response = self.post_form(endpoint, &form).await?;

        // The service may answer 200 with a literal `false`.
        if serde_json::from_slice::<bool>(&response.body).ok() == Some(false) {
            return Err(ApiError::ServerRejected {
                endpoint,
                status: response.status,
                body: response.text(),
            });
        }
        debug!(blob = %blob_id_name, size = plaintext_size, "blob checked in");
        Ok(())
    }

    async fn post_form<T: Serialize>(&self, endpoint: Endpoint, form: &T) -> Result<Response, ApiError> {
        let body = serde_urlencoded::to_string(form).map_err(|source| ApiError::Encode { endpoint, source })?;
        let request = Request::post(self.config.endpoint_url(endpoint), self.config.request.clone())
            .header(HEADER_ACCEPT, self.config.accept.as_str())
            .body(RequestBody::Form(body));
        self.send(endpoint, request).await
    }

    async fn send(&self, endpoint: Endpoint, request: Request) -> Result<Response, ApiError> {
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|source| ApiError::Unreachable { endpoint, source })?;

        if !response.is_successful() {
            if self.config.verbose {
                warn!(%endpoint, status = response.status, body = %response.text(), "request rejected");
            } else {
                warn!(%endpoint, status = response.status, "request rejected");
            }
            return Err(ApiError::ServerRejected {
                endpoint,
                status: response.status,
                body: response.text(),
            });
        }
        Ok(response)
    }
}

fn parse_json<T: DeserializeOwned>(endpoint: Endpoint, response: &Response) -> Result<T, ApiError> {
    serde_json::from_slice(&response.body).map_err(|source| ApiError::MalformedResponse { endpoint, source })
}
