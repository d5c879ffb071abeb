use sha3::{Digest, Keccak256};

/// Keccak-256 of raw image bytes, used to correlate log lines for one image.
pub fn image_digest(data: &[u8]) -> String {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    format!("0x{}", hex::encode(hasher.finalize()))
}

/// First 8 bytes of the digest, for compact log fields.
pub fn short_digest(data: &[u8]) -> String {
    let full = image_digest(data);
    full[..18].to_string()
}
