use crate::http::{Error, Result};
use axum::http::HeaderValue;
use ring::hmac;

/// Ensure that the provided signature from EAS is valid. The header has the
/// form `<algorithm>=<digest>` where the digest is hex or base64 encoded.
pub fn eas(raw_body: &[u8], header: Option<&HeaderValue>, secret: &[u8]) -> Result<()> {
    // Get the header value
    let raw_signature = header
        .and_then(|h| h.to_str().ok())
        .ok_or(Error::Unauthorized)?;

    let (algorithm, digest) = raw_signature
        .trim()
        .split_once('=')
        .ok_or(Error::Unauthorized)?;
    let algorithm = match algorithm.to_ascii_lowercase().as_str() {
        "sha1" => hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
        "sha256" => hmac::HMAC_SHA256,
        _ => return Err(Error::Unauthorized),
    };
    let signature = match hex::decode(digest) {
        Ok(s) => s,
        Err(_) => base64::decode(digest)?,
    };

    let key = hmac::Key::new(algorithm, secret);

    // Display the expected signature in debug builds
    #[cfg(debug_assertions)]
    tracing::debug!(
        expected = %hex::encode(hmac::sign(&key, raw_body).as_ref()),
        got = %digest,
        "signature validation"
    );

    // Verify the signature
    hmac::verify(&key, raw_body, &signature)?;
    Ok(())
}
