use sha2::{Digest, Sha256};

/// Content digest in `sha256:<hex>` form.
pub fn sha256_digest(data: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(data)))
}
