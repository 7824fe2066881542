//! Version-tagged envelope around encrypted result files.
//!
//! Layout: ASCII `00N` (N in 1..=6) followed by base64 of
//! `nonce (12 bytes) || AES-256-GCM ciphertext`.

use crate::error::{DecryptError, Result};

pub const MARKER_LEN: usize = 3;
pub const MIN_VERSION: u8 = 1;
pub const MAX_VERSION: u8 = 6;

/// Envelope version written by [`crate::cipher::seal`].
pub const CURRENT_VERSION: u8 = MAX_VERSION;

/// Best-effort look at the first bytes: `Some(n)` when they read `00n`
/// with n in 1..=6. Says nothing about whether the rest decrypts.
pub fn sniff_version(bytes: &[u8]) -> Option<u8> {
    match bytes {
        [b'0', b'0', d, ..] if (b'1'..=b'6').contains(d) => Some(d - b'0'),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub version: u8,
    /// Base64 text following the marker
    pub payload: &'a [u8],
}

/// Splits `bytes` into version and payload.
pub fn parse(bytes: &[u8]) -> Result<Envelope<'_>> {
    if bytes.len() < MARKER_LEN {
        return Err(DecryptError::malformed("input shorter than version marker"));
    }
    let (marker, payload) = bytes.split_at(MARKER_LEN);
    let version = sniff_version(marker).ok_or_else(|| {
        DecryptError::UnsupportedVersion(String::from_utf8_lossy(marker).into_owned())
    })?;
    Ok(Envelope { version, payload })
}

pub fn marker(version: u8) -> String {
    format!("{version:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_version() {
        assert_eq!(sniff_version(b"001abc"), Some(1));
        assert_eq!(sniff_version(b"006"), Some(6));
        assert_eq!(sniff_version(b"007abc"), None);
        assert_eq!(sniff_version(b"000abc"), None);
        assert_eq!(sniff_version(b"MSH|^~"), None);
        assert_eq!(sniff_version(b"00"), None);
    }

    #[test]
    fn test_parse_rejects_unknown_marker() {
        assert!(matches!(
            parse(b"MSH|^~\\&|LAB"),
            Err(DecryptError::UnsupportedVersion(ref m)) if m == "MSH"
        ));
        assert!(matches!(parse(b"0"), Err(DecryptError::MalformedEnvelope(_))));
    }

    #[test]
    fn test_marker_format() {
        assert_eq!(marker(6), "006");
        let env = parse(b"006QUJD").unwrap();
        assert_eq!(env.version, 6);
        assert_eq!(env.payload, b"QUJD");
    }
}
