//! Session key exchange for a container.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ironbox_cipher::{BLOCK_SIZE, KEY_SIZES};
use ironbox_protocol::{ContainerKeyDataResponse, Credential};
use tracing::debug;
use zeroize::Zeroizing;

use crate::api::ApiClient;
use crate::error::KeyExchangeError;

/// Symmetric key, IV and strength indicator of one upload.
///
/// The key bytes are wiped when the value is dropped.
#[derive(Clone)]
pub struct SessionKeyMaterial {
    key: Zeroizing<Vec<u8>>,
    iv: [u8; BLOCK_SIZE],
    strength: Option<i64>,
}

impl SessionKeyMaterial {
    pub fn new(key: Zeroizing<Vec<u8>>, iv: &[u8], strength: Option<i64>) -> Result<Self, KeyExchangeError> {
        if key.is_empty() || iv.is_empty() {
            return Err(KeyExchangeError::EmptyKey);
        }
        if !KEY_SIZES.contains(&key.len()) {
            return Err(KeyExchangeError::InvalidKeyLength(key.len()));
        }
        let iv: [u8; BLOCK_SIZE] = iv
            .try_into()
            .map_err(|_| KeyExchangeError::InvalidIvLength(iv.len()))?;
        Ok(Self { key, iv, strength })
    }

    /// Decodes and validates the key material of a `ContainerKeyData` answer.
    pub fn from_response(resp: &ContainerKeyDataResponse) -> Result<Self, KeyExchangeError> {
        let key = non_empty(resp.session_key_base64.as_deref())?;
        let iv = non_empty(resp.session_iv_base64.as_deref())?;

        let key = Zeroizing::new(STANDARD.decode(key)?);
        let iv = STANDARD.decode(iv)?;
        let strength = resp.symmetric_key_strength.as_ref().and_then(|value| match value {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        Self::new(key, &iv, strength)
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Strength code reported by the service, if any.
    pub fn strength(&self) -> Option<i64> {
        self.strength
    }

    pub fn key_bits(&self) -> usize {
        self.key.len() * 8
    }
}

impl fmt::Debug for SessionKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeyMaterial")
            .field("key_bits", &self.key_bits())
            .field("strength", &self.strength)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: Option<&str>) -> Result<&str, KeyExchangeError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(KeyExchangeError::EmptyKey)
}

/// Fetches session key material from the API.
pub struct KeyExchange<'a> {
    api: &'a ApiClient,
}

impl<'a> KeyExchange<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// One `ContainerKeyData` call; no retry.
    pub async fn fetch(
        &self,
        container_id: &str,
        credential: &Credential,
    ) -> Result<SessionKeyMaterial, KeyExchangeError> {
        let resp = self.api.container_key_data(credential, container_id).await?;
        let material = SessionKeyMaterial::from_response(&resp)?;
        debug!(
            container = container_id,
            key_bits = material.key_bits(),
            strength = ?material.strength(),
            "session key obtained"
        );
        Ok(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::ClientConfig;
    use crate::testing::{MockTransport, credential};

    fn response(key: Option<&str>, iv: Option<&str>) -> ContainerKeyDataResponse {
        ContainerKeyDataResponse {
            session_key_base64: key.map(str::to_owned),
            session_iv_base64: iv.map(str::to_owned),
            symmetric_key_strength: Some(serde_json::json!(2)),
        }
    }

    fn b64(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    #[test]
    fn decodes_all_key_sizes() {
        for len in [16, 24, 32] {
            let material =
                SessionKeyMaterial::from_response(&response(Some(&b64(&vec![7; len])), Some(&b64(&[1; 16]))))
                    .unwrap();
            assert_eq!(material.key(), vec![7u8; len].as_slice());
            assert_eq!(material.iv(), &[1u8; 16]);
            assert_eq!(material.strength(), Some(2));
            assert_eq!(material.key_bits(), len * 8);
        }
    }

    #[test]
    fn absent_or_empty_material_is_empty_key() {
        let iv = b64(&[1; 16]);
        for key in [None, Some(""), Some("   ")] {
            let err = SessionKeyMaterial::from_response(&response(key, Some(&iv))).unwrap_err();
            assert!(matches!(err, KeyExchangeError::EmptyKey), "key {key:?}");
        }
        let err = SessionKeyMaterial::from_response(&response(Some(&b64(&[7; 16])), None)).unwrap_err();
        assert!(matches!(err, KeyExchangeError::EmptyKey));
    }

    #[test]
    fn malformed_material_is_rejected() {
        let iv = b64(&[1; 16]);
        let err = SessionKeyMaterial::from_response(&response(Some("not base64!"), Some(&iv))).unwrap_err();
        assert!(matches!(err, KeyExchangeError::Decode(_)));

        let err = SessionKeyMaterial::from_response(&response(Some(&b64(&[7; 20])), Some(&iv))).unwrap_err();
        assert!(matches!(err, KeyExchangeError::InvalidKeyLength(20)));

        let err = SessionKeyMaterial::from_response(&response(Some(&b64(&[7; 16])), Some(&b64(&[1; 8]))))
            .unwrap_err();
        assert!(matches!(err, KeyExchangeError::InvalidIvLength(8)));
    }

    #[test]
    fn strength_may_be_a_string() {
        let mut resp = response(Some(&b64(&[7; 16])), Some(&b64(&[1; 16])));
        resp.symmetric_key_strength = Some(serde_json::json!("1"));
        assert_eq!(SessionKeyMaterial::from_response(&resp).unwrap().strength(), Some(1));

        resp.symmetric_key_strength = None;
        assert_eq!(SessionKeyMaterial::from_response(&resp).unwrap().strength(), None);
    }

    #[test]
    fn debug_hides_key_bytes() {
        let material = SessionKeyMaterial::new(Zeroizing::new(vec![0xAB; 16]), &[0; 16], None).unwrap();
        let rendered = format!("{material:?}");
        assert!(rendered.contains("key_bits: 128"));
        assert!(!rendered.contains("171"));
    }

    #[tokio::test]
    async fn fetch_maps_rejection() {
        let mock = Arc::new(MockTransport::reply(401, "bad password"));
        let api = ApiClient::new(mock.clone(), ClientConfig::default());
        let err = KeyExchange::new(&api).fetch("c", &credential()).await.unwrap_err();
        assert!(matches!(
            err,
            KeyExchangeError::ServerRejected { status: 401, ref body } if body == "bad password"
        ));
    }

    #[tokio::test]
    async fn fetch_maps_non_json() {
        let mock = Arc::new(MockTransport::reply(200, "<html>"));
        let api = ApiClient::new(mock.clone(), ClientConfig::default());
        let err = KeyExchange::new(&api).fetch("c", &credential()).await.unwrap_err();
        assert!(matches!(err, KeyExchangeError::MalformedResponse(_)));
    }
}
