use sha2::{Digest, Sha256};

/// Number of hex characters kept from the digest
const HASH_LENGTH: usize = 32;

/// Content hash used for synthetic module names and default main-file names.
///
/// Lowercase hex of the first 16 bytes of SHA-256 over the UTF-8 input.
pub fn content_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let mut hash = format!("{:x}", hasher.finalize());
    hash.truncate(HASH_LENGTH);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_stable() {
        // sha256("code") = 5694d08a2e53ffcae0c3103e5ad6f6076abd960eb1f8a56577040bc1028f702b
        assert_eq!(content_hash("code"), "5694d08a2e53ffcae0c3103e5ad6f607");
        assert_eq!(content_hash("code").len(), 32);
        assert_ne!(content_hash("code"), content_hash("code2"));
    }
}
