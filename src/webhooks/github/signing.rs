use hmac::{Hmac, Mac};
use rocket::{
    data::{ByteUnit, FromData, Outcome},
    http::Status,
    Data, Request,
};
use serde_json::Value;
use sha2::Sha256;
use tracing::{trace, warn};

use crate::webhooks::{
    github::{payload, GitHubSecret},
    PayloadError, WebhookError,
};

const X_GITHUB_SIGNATURE: &str = "X-Hub-Signature-256";

/// Secret that the sample configuration ships with. Treated the same as no secret at all.
pub const PLACEHOLDER_SECRET: &str = "your-webhook-secret-here";

type HmacSha256 = Hmac<Sha256>;

/// Returns the secret if it's a real one, `None` when signature checks should be bypassed.
pub fn effective_secret(secret: Option<&str>) -> Option<&str> {
    secret.filter(|s| !s.is_empty() && *s != PLACEHOLDER_SECRET)
}

/// Checks that `signature` is GitHub's `X-Hub-Signature-256` for `body` under `secret`.
///
/// **Bypass mode:** when no real secret is configured (absent, empty, or the placeholder),
/// every delivery is accepted. This is meant for local development only; the server warns
/// about it on startup.
pub fn verify(body: &[u8], signature: Option<&str>, secret: Option<&str>) -> bool {
    let secret = match effective_secret(secret) {
        Some(secret) => secret,
        None => {
            trace!("no webhook secret configured, accepting payload");
            return true;
        }
    };

    match signature {
        Some(signature) => validate_signature(secret, signature, body),
        None => {
            trace!("missing signature");
            false
        }
    }
}

/// Computes the `sha256=<hex>` header value GitHub would send for `body`.
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut mac = new_mac(secret);
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

fn new_mac(secret: &str) -> HmacSha256 {
    // HMAC accepts keys of any length, longer ones are hashed first
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC can take a key of any size"),
    }
}

fn validate_signature(secret: &str, signature: &str, data: &[u8]) -> bool {
    trace!("validating signature...");
    let mut mac = new_mac(secret);
    mac.update(data);

    // GitHub puts a prefix in front of its hex SHA256
    let signature = match signature.strip_prefix("sha256=") {
        Some(s) => s,
        None => {
            trace!("couldn't strip prefix from signature `{}`", signature);
            return false;
        }
    };

    // GitHub always sends lowercase digits, anything else isn't the header it would send
    if !signature.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        trace!("signature `{}` isn't lowercase hex", signature);
        return false;
    }

    match hex::decode(signature) {
        // constant-time comparison
        Ok(bytes) => mac.verify_slice(&bytes).is_ok(),
        Err(_) => {
            trace!("couldn't decode hex-encoded signature {}", signature);
            false
        }
    }
}

/// A delivery body that passed signature verification and parsed as a JSON object.
pub struct SignedGitHubPayload(pub Value);

// GitHub caps deliveries at 25 MB
const LIMIT: ByteUnit = ByteUnit::Mebibyte(25);

#[rocket::async_trait]
impl<'r> FromData<'r> for SignedGitHubPayload {
    type Error = WebhookError;

    async fn from_data(request: &'r Request<'_>, data: Data<'r>) -> Outcome<'r, Self> {
        trace!("received payload on GitHub webhook endpoint: {:?}", request);

        let size_limit = request.limits().get("json").unwrap_or(LIMIT);
        let content = match data.open(size_limit).into_bytes().await {
            Ok(bytes) if bytes.is_complete() => bytes.into_inner(),
            Ok(_) => {
                trace!("payload was too big");
                return Outcome::Error((Status::PayloadTooLarge, WebhookError::TooLarge));
            }
            Err(e) => return Outcome::Error((Status::BadRequest, WebhookError::Io(e))),
        };

        let secret = request
            .rocket()
            .state::<GitHubSecret>()
            .and_then(GitHubSecret::configured);
        if secret.is_some() {
            let signature = request.headers().get_one(X_GITHUB_SIGNATURE);
            if !verify(&content, signature, secret) {
                warn!("signature validation failed, stopping here...");
                return Outcome::Error((Status::Unauthorized, WebhookError::InvalidSignature));
            }
            trace!("validated GitHub payload");
        }

        match request.content_type() {
            Some(content_type) if content_type.is_json() => {}
            Some(content_type) => {
                trace!("content type `{}` wasn't json, stopping here...", content_type);
                let err = PayloadError::NotJson(content_type.to_string());
                return Outcome::Error((Status::BadRequest, err.into()));
            }
            None => {
                trace!("no content type, stopping here...");
                return Outcome::Error((Status::BadRequest, PayloadError::NoContentType.into()));
            }
        }

        match payload::parse(&content) {
            Ok(payload) => Outcome::Success(SignedGitHubPayload(payload)),
            Err(e) => {
                trace!("couldn't parse payload: {}", e);
                Outcome::Error((Status::BadRequest, e.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "It's a Secret to Everybody";
    const BODY: &[u8] = b"Hello, World!";

    #[test]
    fn test_github_documentation_vector() {
        // https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries
        let expected = "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";

        assert_eq!(sign(BODY, SECRET), expected);
        assert!(verify(BODY, Some(expected), Some(SECRET)));
    }

    #[test]
    fn test_valid_signatures() {
        for (body, secret) in [
            (&b""[..], "s"),
            (&b"{\"after\":\"sha1\"}"[..], "webhook secret"),
            (&[0u8, 159, 255, 10][..], "a much longer secret than the sha256 block size, which is sixty-four bytes long"),
        ] {
            let signature = sign(body, secret);
            assert!(verify(body, Some(&signature), Some(secret)));
        }
    }

    #[test]
    fn test_invalid_signatures() {
        let signature = sign(BODY, SECRET);

        // wrong secret or tampered body
        assert!(!verify(BODY, Some(&sign(BODY, "another secret")), Some(SECRET)));
        assert!(!verify(b"Hello, World?", Some(&signature), Some(SECRET)));

        // malformed headers
        let digest = signature.strip_prefix("sha256=").unwrap();
        assert!(!verify(BODY, Some(digest), Some(SECRET)));
        assert!(!verify(BODY, Some(&format!("sha1={}", digest)), Some(SECRET)));
        assert!(!verify(BODY, Some(&format!("sha256={}", digest.to_uppercase())), Some(SECRET)));
        assert!(!verify(BODY, Some(&signature[..signature.len() - 2]), Some(SECRET)));
        assert!(!verify(BODY, Some("sha256=not-hex"), Some(SECRET)));
        assert!(!verify(BODY, Some(""), Some(SECRET)));
    }

    #[test]
    fn test_missing_signature_with_real_secret() {
        assert!(!verify(BODY, None, Some(SECRET)));
    }

    #[test]
    fn test_bypass_mode() {
        for secret in [None, Some(""), Some(PLACEHOLDER_SECRET)] {
            assert!(verify(BODY, None, secret));
            assert!(verify(BODY, Some("sha256=garbage"), secret));
        }
    }
}
