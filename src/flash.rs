//! One-shot user notifications carried across a redirect in a signed cookie.

use axum::{
    http::{
        header::{COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const COOKIE_NAME: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Danger,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: Category,
    pub message: String,
}

impl Flash {
    pub fn new(category: Category, message: impl Into<String>) -> Self {
        Flash {
            category,
            message: message.into(),
        }
    }

    /// A 303 redirect to `location` that carries this message.
    pub fn redirect(self, signer: &FlashSigner, location: &str) -> Response {
        let mut response = StatusCode::SEE_OTHER.into_response();
        let headers = response.headers_mut();
        if let Ok(location) = HeaderValue::from_str(location) {
            headers.insert(LOCATION, location);
        }
        if let Ok(cookie) = HeaderValue::from_str(&signer.set_cookie(&[self])) {
            headers.insert(SET_COOKIE, cookie);
        }
        response
    }
}

/// Signs and verifies the flash cookie with the process secret.
#[derive(Clone)]
pub struct FlashSigner {
    secret: Vec<u8>,
}

impl FlashSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        FlashSigner {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self, payload: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .unwrap_or_else(|_| unreachable!("hmac accepts any key length"));
        mac.update(payload.as_bytes());
        mac
    }

    fn signature(&self, payload: &str) -> String {
        hex::encode(self.mac(payload).finalize().into_bytes())
    }

    fn verify(&self, payload: &str, signature: &str) -> bool {
        hex::decode(signature)
            .map(|tag| self.mac(payload).verify_slice(&tag).is_ok())
            .unwrap_or(false)
    }

    pub fn encode(&self, flashes: &[Flash]) -> String {
        // Serializing a plain struct list cannot fail.
        let json = serde_json::to_vec(flashes).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = self.signature(&payload);
        format!("{payload}.{signature}")
    }

    /// Returns the messages in `value`, or nothing when the value is malformed or was not signed by us.
    pub fn decode(&self, value: &str) -> Vec<Flash> {
        let Some((payload, signature)) = value.rsplit_once('.') else {
            return Vec::new();
        };
        if !self.verify(payload, signature) {
            tracing::debug!("discarding flash cookie with bad signature");
            return Vec::new();
        }
        URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|json| serde_json::from_slice(&json).ok())
            .unwrap_or_default()
    }

    pub fn set_cookie(&self, flashes: &[Flash]) -> String {
        format!(
            "{COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax",
            self.encode(flashes)
        )
    }

    /// Pulls pending messages out of a request's `Cookie` headers.
    pub fn take(&self, headers: &HeaderMap) -> Vec<Flash> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| *name == COOKIE_NAME)
            .flat_map(|(_, value)| self.decode(value))
            .collect()
    }
}

pub fn clear_cookie() -> String {
    format!("{COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_value_decodes() {
        let signer = FlashSigner::new("secret");
        let flashes = vec![Flash::new(Category::Danger, "No file uploaded")];
        let encoded = signer.encode(&flashes);
        assert_eq!(signer.decode(&encoded), flashes);
    }

    #[test]
    fn tampered_or_foreign_values_are_ignored() {
        let signer = FlashSigner::new("secret");
        let encoded = signer.encode(&[Flash::new(Category::Danger, "No file selected")]);

        let other = FlashSigner::new("another secret");
        assert!(other.decode(&encoded).is_empty());

        let (payload, _) = encoded.rsplit_once('.').unwrap();
        let forged = format!("{payload}.{}", "0".repeat(64));
        assert!(signer.decode(&forged).is_empty());
        assert!(signer.decode("garbage").is_empty());
        assert!(signer.decode(&format!("{payload}.not-hex")).is_empty());
    }

    #[test]
    fn take_finds_flash_among_other_cookies() {
        let signer = FlashSigner::new("secret");
        let encoded = signer.encode(&[Flash::new(Category::Danger, "hello")]);
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {COOKIE_NAME}={encoded}")).unwrap(),
        );
        let flashes = signer.take(&headers);
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].category.as_str(), "danger");
        assert_eq!(flashes[0].message, "hello");
    }

    #[test]
    fn redirect_sets_location_and_cookie() {
        let signer = FlashSigner::new("secret");
        let response = Flash::new(Category::Danger, "nope").redirect(&signer, "/upload");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/upload");
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("flash="));
    }
}
