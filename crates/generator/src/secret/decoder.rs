//! Format-agnostic decoding of operator-supplied key and IV text.
//!
//! Each text is tried against a fixed, ordered list of encodings. The first
//! encoding that both parses and yields an accepted byte length wins:
//!
//! 1. hex (even length, `[0-9a-fA-F]+` only)
//! 2. Base64, standard or URL-safe alphabet, padding optional
//! 3. literal UTF-8 bytes of the text itself
//!
//! Encodings are tried independently: a hex-looking string whose decoded length
//! does not fit still falls through to Base64 and then to literal bytes.

use base64::{
    alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use thiserror::Error;

use super::material::SecretBytes;

/// Accepted AES key sizes in bytes (AES-128/192/256).
pub const KEY_LENGTHS: &[usize] = &[16, 24, 32];

/// Accepted IV sizes in bytes (12 = GCM nonce, 16 = CBC block).
pub const IV_LENGTHS: &[usize] = &[12, 16];

/// Base64 engine used after alphabet normalisation and re-padding.
///
/// Trailing bits are tolerated so that any text a lenient browser decoder
/// accepts is accepted here as well.
const BASE64_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Which secret a text is being decoded as; determines the accepted lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Key,
    Iv,
}

impl SecretKind {
    /// Byte lengths accepted for this kind of secret.
    pub fn accepted_lengths(self) -> &'static [usize] {
        match self {
            SecretKind::Key => KEY_LENGTHS,
            SecretKind::Iv => IV_LENGTHS,
        }
    }

    fn accepts(self, len: usize) -> bool {
        self.accepted_lengths().contains(&len)
    }
}

impl std::fmt::Display for SecretKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretKind::Key => f.write_str("AES key"),
            SecretKind::Iv => f.write_str("AES IV"),
        }
    }
}

/// Errors produced while decoding secret text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretError {
    /// The secret text is empty or absent.
    #[error("{0} is missing")]
    Missing(SecretKind),

    /// No encoding produced an accepted byte length.
    #[error("{kind} has invalid length: {len} bytes (allowed: {allowed:?})")]
    Format {
        kind: SecretKind,
        /// Length of the last attempted decoding (the literal bytes).
        len: usize,
        allowed: &'static [usize],
    },
}

/// A text encoding recognised by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Hex,
    Base64,
    Literal,
}

impl Encoding {
    /// Encodings in the order they are tried.
    pub const PRIORITY: [Encoding; 3] = [Encoding::Hex, Encoding::Base64, Encoding::Literal];

    /// Attempt to decode `raw` with this encoding.
    ///
    /// Returns `None` if the text is not valid in this encoding.
    pub fn decode(self, raw: &str) -> Option<Vec<u8>> {
        match self {
            Encoding::Hex => {
                if raw.len() % 2 != 0 || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return None;
                }
                hex::decode(raw).ok()
            }
            Encoding::Base64 => decode_base64(raw),
            Encoding::Literal => Some(raw.as_bytes().to_vec()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Hex => "hex",
            Encoding::Base64 => "base64",
            Encoding::Literal => "literal",
        }
    }
}

/// Result of a successful decode.
#[derive(Debug)]
pub struct Decoded {
    pub bytes: SecretBytes,
    /// The encoding that produced `bytes`.
    pub encoding: Encoding,
}

/// Decode `raw` as a secret of the given kind.
///
/// # Errors
///
/// Returns [`SecretError::Missing`] for empty input, or
/// [`SecretError::Format`] if no encoding yields an accepted length.
pub fn decode(raw: &str, kind: SecretKind) -> Result<Decoded, SecretError> {
    if raw.is_empty() {
        return Err(SecretError::Missing(kind));
    }

    for encoding in Encoding::PRIORITY {
        if let Some(bytes) = encoding.decode(raw) {
            if kind.accepts(bytes.len()) {
                return Ok(Decoded {
                    bytes: SecretBytes::new(bytes),
                    encoding,
                });
            }
        }
    }

    Err(SecretError::Format {
        kind,
        len: raw.len(),
        allowed: kind.accepted_lengths(),
    })
}

/// Decode standard or URL-safe Base64, with or without padding.
fn decode_base64(raw: &str) -> Option<Vec<u8>> {
    let mut normalised: String = raw
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while normalised.len() % 4 != 0 {
        normalised.push('=');
    }
    BASE64_LENIENT.decode(normalised).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY16_LITERAL: &str = "k3y!material#16b";
    const KEY16_HEX: &str = "6b3379216d6174657269616c23313662";
    const KEY16_B64: &str = "azN5IW1hdGVyaWFsIzE2Yg==";

    const KEY24_LITERAL: &str = "twenty-four byte secret!";
    const KEY24_HEX: &str = "7477656e74792d666f757220627974652073656372657421";
    const KEY24_B64: &str = "dHdlbnR5LWZvdXIgYnl0ZSBzZWNyZXQh";

    const KEY32_LITERAL: &str = "a 32 byte literal key, no base64";
    const KEY32_HEX: &str = "612033322062797465206c69746572616c206b65792c206e6f20626173653634";
    const KEY32_B64URL: &str = "YSAzMiBieXRlIGxpdGVyYWwga2V5LCBubyBiYXNlNjQ";

    fn key(raw: &str) -> Decoded {
        decode(raw, SecretKind::Key).unwrap()
    }

    #[test]
    fn same_key_in_three_encodings_decodes_identically() {
        for (literal, hex, b64) in [
            (KEY16_LITERAL, KEY16_HEX, KEY16_B64),
            (KEY24_LITERAL, KEY24_HEX, KEY24_B64),
            (KEY32_LITERAL, KEY32_HEX, KEY32_B64URL),
        ] {
            let from_literal = key(literal);
            let from_hex = key(hex);
            let from_b64 = key(b64);

            assert_eq!(from_literal.encoding, Encoding::Literal);
            assert_eq!(from_hex.encoding, Encoding::Hex);
            assert_eq!(from_b64.encoding, Encoding::Base64);

            assert_eq!(from_literal.bytes.as_slice(), literal.as_bytes());
            assert_eq!(from_hex.bytes, from_literal.bytes);
            assert_eq!(from_b64.bytes, from_literal.bytes);
        }
    }

    #[test]
    fn uppercase_hex_is_accepted() {
        let d = key(&KEY16_HEX.to_uppercase());
        assert_eq!(d.encoding, Encoding::Hex);
        assert_eq!(d.bytes.as_slice(), KEY16_LITERAL.as_bytes());
    }

    #[test]
    fn url_safe_and_standard_alphabets_agree() {
        // High-bit bytes encode with '+' in the standard alphabet.
        let bytes: Vec<u8> = (0..16).map(|i| 0xf8 | (i as u8 & 0x07)).collect();
        let standard = base64::engine::general_purpose::STANDARD.encode(&bytes);
        let url_safe = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&bytes);
        assert_ne!(standard.trim_end_matches('='), url_safe);

        assert_eq!(key(&standard).bytes.as_slice(), bytes.as_slice());
        assert_eq!(key(&url_safe).bytes.as_slice(), bytes.as_slice());
    }

    #[test]
    fn hex_looking_key_with_bad_length_falls_through_to_base64() {
        // 22 hex chars = 11 bytes as hex, but 16 bytes as Base64.
        let d = key("0123456789abcdef012345");
        assert_eq!(d.encoding, Encoding::Base64);
        assert_eq!(d.bytes.len(), 16);
    }

    #[test]
    fn hex_looking_iv_with_bad_length_falls_through_to_base64() {
        // 16 hex chars = 8 bytes as hex, but 12 bytes as Base64.
        let d = decode("0011223344556677", SecretKind::Iv).unwrap();
        assert_eq!(d.encoding, Encoding::Base64);
        assert_eq!(d.bytes.len(), 12);
    }

    #[test]
    fn base64_alphabet_passphrase_of_16_chars_is_literal() {
        // Decodes as 12 bytes of Base64, which is not a key size.
        let d = key("abcdefghijklmnop");
        assert_eq!(d.encoding, Encoding::Literal);
        assert_eq!(d.bytes.as_slice(), b"abcdefghijklmnop");
    }

    #[test]
    fn base64_alphabet_passphrase_of_32_chars_is_read_as_base64() {
        // 32 Base64 chars decode to 24 bytes, which is a valid key size,
        // so Base64 wins over the literal interpretation.
        let d = key("abcdefghijklmnopqrstuvwxyzABCDEF");
        assert_eq!(d.encoding, Encoding::Base64);
        assert_eq!(d.bytes.len(), 24);
    }

    #[test]
    fn literal_iv_of_12_chars() {
        let d = decode("nonce-12byte", SecretKind::Iv).unwrap();
        assert_eq!(d.encoding, Encoding::Literal);
        assert_eq!(d.bytes.as_slice(), b"nonce-12byte");
    }

    #[test]
    fn empty_input_is_missing() {
        assert_eq!(
            decode("", SecretKind::Key).unwrap_err(),
            SecretError::Missing(SecretKind::Key)
        );
        assert_eq!(
            decode("", SecretKind::Iv).unwrap_err(),
            SecretError::Missing(SecretKind::Iv)
        );
    }

    #[test]
    fn no_viable_encoding_reports_length_and_allowed_set() {
        let err = decode("too short!", SecretKind::Key).unwrap_err();
        assert_eq!(
            err,
            SecretError::Format {
                kind: SecretKind::Key,
                len: 10,
                allowed: KEY_LENGTHS,
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("10 bytes"), "{msg}");
        assert!(msg.contains("[16, 24, 32]"), "{msg}");
    }

    #[test]
    fn key_sized_text_is_not_an_iv() {
        // 32 hex chars = 16 bytes: valid IV. 64 hex chars = 32 bytes: not an IV.
        assert!(decode(&"ab".repeat(16), SecretKind::Iv).is_ok());
        assert!(decode(&"ab".repeat(32), SecretKind::Iv).is_err());
    }

    #[test]
    fn priority_order_is_hex_base64_literal() {
        assert_eq!(
            Encoding::PRIORITY,
            [Encoding::Hex, Encoding::Base64, Encoding::Literal]
        );
    }
}
