//! OAuth 1.0a request signing (HMAC-SHA1) for the X API.
//!
//! Each call produces a one-time signature over a fresh nonce and
//! timestamp: signing the same request twice yields two different,
//! equally valid headers. Request bodies (JSON, multipart) are not part
//! of the signature base; only URL query pairs are folded in.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::{distr::Alphanumeric, Rng};
use sha1::Sha1;
use url::Url;

use crate::error::{Result, XError};

type HmacSha1 = Hmac<Sha1>;

const NONCE_LEN: usize = 32;

/// The four user-context secrets every signed call needs. Validated
/// eagerly at construction, before any network traffic.
pub struct OauthSigner {
    consumer_key: String,
    consumer_secret: String,
    access_token: String,
    access_token_secret: String,
}

impl OauthSigner {
    pub fn new(
        consumer_key: Option<String>,
        consumer_secret: Option<String>,
        access_token: Option<String>,
        access_token_secret: Option<String>,
    ) -> Result<Self> {
        match (consumer_key, consumer_secret, access_token, access_token_secret) {
            (Some(ck), Some(cs), Some(at), Some(ats)) => Ok(Self {
                consumer_key: ck,
                consumer_secret: cs,
                access_token: at,
                access_token_secret: ats,
            }),
            _ => Err(XError::CredentialsMissing),
        }
    }

    /// Produce an `Authorization` header value for `method` + `url`.
    pub fn sign(&self, method: &str, url: &str) -> Result<String> {
        let nonce: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.sign_at(method, url, &nonce, &timestamp)
    }

    fn sign_at(&self, method: &str, url: &str, nonce: &str, timestamp: &str) -> Result<String> {
        let parsed = Url::parse(url)
            .map_err(|e| XError::Validation(format!("unsignable URL {url}: {e}")))?;

        let mut base_endpoint = parsed.clone();
        base_endpoint.set_query(None);
        base_endpoint.set_fragment(None);

        let oauth_params = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.access_token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let mut encoded: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (percent_encode(&k), percent_encode(&v)))
            .chain(
                oauth_params
                    .iter()
                    .map(|(k, v)| (percent_encode(k), percent_encode(v))),
            )
            .collect();
        encoded.sort();

        let param_string = encoded
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let base_string = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            percent_encode(base_endpoint.as_str()),
            percent_encode(&param_string)
        );

        let signing_key = format!(
            "{}&{}",
            percent_encode(&self.consumer_secret),
            percent_encode(&self.access_token_secret)
        );

        let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
            .expect("HMAC-SHA1 accepts any key length");
        mac.update(base_string.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        let mut header_params: Vec<(&str, String)> = oauth_params
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect();
        header_params.push(("oauth_signature", signature));
        header_params.sort();

        let joined = header_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {joined}"))
    }
}

/// RFC 3986 percent-encoding: everything but unreserved characters.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}
