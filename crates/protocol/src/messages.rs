use serde::{Deserialize, Serialize};

use crate::types::Credential;

// ---------------------------------------------------------------------------
// Request bodies (form-encoded)
// ---------------------------------------------------------------------------

/// Body of `ContainerKeyData`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerKeyDataRequest<'a> {
    pub entity: &'a str,
    pub entity_type: i32,
    pub entity_password: &'a str,
    #[serde(rename = "ContainerID")]
    pub container_id: &'a str,
}

impl<'a> ContainerKeyDataRequest<'a> {
    pub fn new(credential: &'a Credential, container_id: &'a str) -> Self {
        Self {
            entity: &credential.entity,
            entity_type: credential.entity_type,
            entity_password: &credential.entity_password,
            container_id,
        }
    }
}

/// Body of `CreateEntityContainerBlob`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateBlobRequest<'a> {
    pub entity: &'a str,
    pub entity_type: i32,
    pub entity_password: &'a str,
    #[serde(rename = "ContainerID")]
    pub container_id: &'a str,
    pub blob_name: &'a str,
}

impl<'a> CreateBlobRequest<'a> {
    pub fn new(credential: &'a Credential, container_id: &'a str, blob_name: &'a str) -> Self {
        Self {
            entity: &credential.entity,
            entity_type: credential.entity_type,
            entity_password: &credential.entity_password,
            container_id,
            blob_name,
        }
    }
}

/// Body of `CheckOutEntityContainerBlob`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckOutRequest<'a> {
    pub entity: &'a str,
    pub entity_type: i32,
    pub entity_password: &'a str,
    #[serde(rename = "ContainerID")]
    pub container_id: &'a str,
    #[serde(rename = "BlobIDName")]
    pub blob_id_name: &'a str,
}

impl<'a> CheckOutRequest<'a> {
    pub fn new(credential: &'a Credential, container_id: &'a str, blob_id_name: &'a str) -> Self {
        Self {
            entity: &credential.entity,
            entity_type: credential.entity_type,
            entity_password: &credential.entity_password,
            container_id,
            blob_id_name,
        }
    }
}

/// Body of `CheckInEntityContainerBlob`.
///
/// `blob_size_bytes` is the size of the plaintext, not of the uploaded
/// ciphertext.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckInRequest<'a> {
    pub entity: &'a str,
    pub entity_type: i32,
    pub entity_password: &'a str,
    #[serde(rename = "ContainerID")]
    pub container_id: &'a str,
    #[serde(rename = "BlobIDName")]
    pub blob_id_name: &'a str,
    pub blob_size_bytes: u64,
    pub blob_check_in_token: &'a str,
}

impl<'a> CheckInRequest<'a> {
    pub fn new(
        credential: &'a Credential,
        container_id: &'a str,
        blob_id_name: &'a str,
        blob_size_bytes: u64,
        blob_check_in_token: &'a str,
    ) -> Self {
        Self {
            entity: &credential.entity,
            entity_type: credential.entity_type,
            entity_password: &credential.entity_password,
            container_id,
            blob_id_name,
            blob_size_bytes,
            blob_check_in_token,
        }
    }
}

// ---------------------------------------------------------------------------
// Responses (JSON)
// ---------------------------------------------------------------------------

/// Session key material for a container.
///
/// Every field is optional on the wire; presence is validated by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerKeyDataResponse {
    #[serde(default)]
    pub session_key_base64: Option<String>,
    #[serde(rename = "SessionIVBase64", default)]
    pub session_iv_base64: Option<String>,
    #[serde(default)]
    pub symmetric_key_strength: Option<serde_json::Value>,
}

/// Checkout lease for a blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckOutResponse {
    #[serde(default)]
    pub shared_access_signature: Option<String>,
    #[serde(default)]
    pub shared_access_signature_uri: Option<String>,
    #[serde(default)]
    pub check_in_token: Option<String>,
    #[serde(default)]
    pub storage_uri: Option<String>,
    #[serde(default)]
    pub storage_type: Option<serde_json::Value>,
    #[serde(default)]
    pub container_storage_name: Option<String>,
}

/// Blob id-name returned by `CreateEntityContainerBlob`.
///
/// The service answers with a bare JSON string; an object carrying a
/// `BlobIDName` field is accepted as well.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CreateBlobResponse {
    IdName(String),
    Object {
        #[serde(rename = "BlobIDName")]
        blob_id_name: String,
    },
}

impl CreateBlobResponse {
    pub fn into_id_name(self) -> String {
        match self {
            Self::IdName(id) | Self::Object { blob_id_name: id } => id,
        }
    }
}
