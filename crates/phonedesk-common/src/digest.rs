//! SHA-256 digest helpers for record fingerprints

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest
pub const SHA256_HEX_LEN: usize = 64;

/// Compute the lowercase hex SHA-256 of a byte slice
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hash a sequence of text parts joined by `delimiter`.
///
/// The parts are fed to the hasher incrementally, so the joined string is
/// never materialised. `["a", "b"]` with `'|'` hashes exactly like `"a|b"`.
pub fn sha256_joined<I, S>(parts: I, delimiter: char) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 4];
    let delimiter = delimiter.encode_utf8(&mut buf).as_bytes();

    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            hasher.update(delimiter);
        }
        hasher.update(part.as_ref().as_bytes());
    }

    hex::encode(hasher.finalize())
}

/// Check that a string looks like a hex SHA-256 digest
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == SHA256_HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}
