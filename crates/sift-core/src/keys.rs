//! Store-safe key encoding for domain and path strings
//!
//! Hierarchical store keys cannot contain the separator characters `.` and
//! `/`. Domains are made key-safe by substituting `+` for `.`; this is
//! lossless only because of two facts about hostnames that together form the
//! codec's invariant: a valid hostname never contains `+`, so the
//! substitution cannot collide with pre-existing content, and `+` in an
//! encoded key therefore always denotes a dot. [`encode_domain`] rejects
//! input that would violate the invariant instead of producing an ambiguous
//! key.
//!
//! Paths may contain any byte, including the separators themselves, so
//! substitution is not enough; the whole path string is wrapped in URL-safe
//! unpadded base64, which is injective for arbitrary content.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

/// Error type for key encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("empty string cannot be used as a key")]
    Empty,
    #[error("'{0}' is not a valid hostname")]
    BadDomain(String),
    #[error("'{0}' is not a valid path key")]
    BadPathKey(String),
}

/// Encode a domain or subdomain string as a store-safe key.
///
/// Deterministic and injective on valid hostnames: `decode_domain` of the
/// result reproduces the input exactly.
pub fn encode_domain(domain: &str) -> Result<String, KeyError> {
    if domain.is_empty() {
        return Err(KeyError::Empty);
    }
    if domain.contains('+') || domain.contains('/') {
        return Err(KeyError::BadDomain(domain.to_string()));
    }
    Ok(domain.replace('.', "+"))
}

/// Decode a domain key back to its display string.
pub fn decode_domain(key: &str) -> Result<String, KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    Ok(key.replace('+', "."))
}

/// Encode an arbitrary path string as a store-safe key.
pub fn encode_path(path: &str) -> Result<String, KeyError> {
    if path.is_empty() {
        return Err(KeyError::Empty);
    }
    Ok(URL_SAFE_NO_PAD.encode(path.as_bytes()))
}

/// Decode a path key back to the original path string.
pub fn decode_path(key: &str) -> Result<String, KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(key.as_bytes())
        .map_err(|_| KeyError::BadPathKey(key.to_string()))?;
    String::from_utf8(bytes).map_err(|_| KeyError::BadPathKey(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_round_trip() {
        for domain in ["example.com", "a.b.example.com", "xn--bcher-kva.ch", "localhost"] {
            let key = encode_domain(domain).unwrap();
            assert!(!key.contains('.'));
            assert_eq!(decode_domain(&key).unwrap(), domain);
        }
    }

    #[test]
    fn test_domain_encoding_is_deterministic() {
        assert_eq!(encode_domain("example.com").unwrap(), encode_domain("example.com").unwrap());
        assert_eq!(encode_domain("example.com").unwrap(), "example+com");
    }

    #[test]
    fn test_domain_rejects_invariant_violations() {
        assert_eq!(encode_domain(""), Err(KeyError::Empty));
        assert!(matches!(encode_domain("a+b.com"), Err(KeyError::BadDomain(_))));
        assert!(matches!(encode_domain("a/b.com"), Err(KeyError::BadDomain(_))));
        assert_eq!(decode_domain(""), Err(KeyError::Empty));
    }

    #[test]
    fn test_path_round_trip() {
        for path in ["/", "/index.html", "/a/b/c?q=1", "/with space", "/ünïcode/пример"] {
            let key = encode_path(path).unwrap();
            assert!(!key.contains('/'));
            assert!(!key.contains('.'));
            assert_eq!(decode_path(&key).unwrap(), path);
        }
    }

    #[test]
    fn test_path_rejects_garbage() {
        assert_eq!(encode_path(""), Err(KeyError::Empty));
        assert_eq!(decode_path(""), Err(KeyError::Empty));
        assert!(matches!(decode_path("!!not base64!!"), Err(KeyError::BadPathKey(_))));
    }
}
