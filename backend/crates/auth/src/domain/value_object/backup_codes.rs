//! Backup Code Value Object
//!
//! One-time recovery codes issued when TOTP enrollment is confirmed.
//! Plaintext codes are shown to the user exactly once; only SHA-256
//! hashes are stored, and each code is consumed on first successful use.

use platform::crypto::{random_bytes, sha256, to_base64_url};

/// Number of codes issued per enrollment
pub const BACKUP_CODE_COUNT: usize = 10;

/// Code format: XXXX-XXXX over an unambiguous alphabet
const CODE_GROUP_LEN: usize = 4;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// A freshly generated set of backup codes
#[derive(Debug)]
pub struct BackupCodeSet {
    /// Plaintext codes, for one-time display to the user
    pub plaintext: Vec<String>,
    /// Storage hashes, in the same order
    pub hashes: Vec<String>,
}

impl BackupCodeSet {
    /// Generate a full set of random codes
    pub fn generate() -> Self {
        let mut plaintext = Vec::with_capacity(BACKUP_CODE_COUNT);
        let mut hashes = Vec::with_capacity(BACKUP_CODE_COUNT);

        for _ in 0..BACKUP_CODE_COUNT {
            let code = generate_code();
            hashes.push(hash_backup_code(&code));
            plaintext.push(code);
        }

        Self { plaintext, hashes }
    }
}

fn generate_code() -> String {
    let bytes = random_bytes(CODE_GROUP_LEN * 2);
    let mut code = String::with_capacity(CODE_GROUP_LEN * 2 + 1);

    for (i, b) in bytes.iter().enumerate() {
        if i == CODE_GROUP_LEN {
            code.push('-');
        }
        code.push(CODE_ALPHABET[(*b as usize) % CODE_ALPHABET.len()] as char);
    }

    code
}

/// Hash a backup code for storage or lookup.
///
/// Input is uppercased and stripped of separators so user re-entry with
/// or without the dash matches.
pub fn hash_backup_code(code: &str) -> String {
    let normalized: String = code
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    to_base64_url(&sha256(normalized.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_full_set() {
        let set = BackupCodeSet::generate();
        assert_eq!(set.plaintext.len(), BACKUP_CODE_COUNT);
        assert_eq!(set.hashes.len(), BACKUP_CODE_COUNT);

        for (code, hash) in set.plaintext.iter().zip(&set.hashes) {
            assert_eq!(code.len(), CODE_GROUP_LEN * 2 + 1);
            assert_eq!(&hash_backup_code(code), hash);
        }
    }

    #[test]
    fn test_codes_are_unique() {
        let set = BackupCodeSet::generate();
        let mut sorted = set.plaintext.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), BACKUP_CODE_COUNT);
    }

    #[test]
    fn test_hash_is_entry_format_insensitive() {
        assert_eq!(hash_backup_code("ABCD-EF23"), hash_backup_code("abcdef23"));
        assert_eq!(hash_backup_code(" ABCD-EF23 "), hash_backup_code("ABCDEF23"));
        assert_ne!(hash_backup_code("ABCD-EF23"), hash_backup_code("ABCD-EF24"));
    }
}
