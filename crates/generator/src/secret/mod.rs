//! Key and IV material: decoding operator text and building the process cipher.
//!
//! # Lifecycle
//!
//! 1. At startup, [`load_cipher`] decodes the configured key and IV texts.
//! 2. The cipher mode is chosen from the decoded IV length.
//! 3. The resulting [`TokenCipher`] is shared read-only for the life of the
//!    process. There is no rotation.
//!
//! # Security invariants
//!
//! - Decoded bytes and the raw texts are never logged. Only the encoding that
//!   matched and the decoded length are reported.
//! - Any decode failure is fatal; the service does not start without a cipher.

pub mod decoder;
pub mod material;

pub use decoder::{decode, SecretKind};
pub use material::SecretBytes;

use anyhow::{Context, Result};
use tracing::info;

use crate::crypto::TokenCipher;

/// Decode `key_text` and `iv_text` and build the process-lifetime cipher.
///
/// # Errors
///
/// Returns an error if either text is empty, if no encoding yields an accepted
/// length, or if the IV length selects no mode.
pub fn load_cipher(key_text: &str, iv_text: &str) -> Result<TokenCipher> {
    let key = decode(key_text, SecretKind::Key).context("failed to decode AES_KEY")?;
    info!(
        encoding = key.encoding.as_str(),
        bytes = key.bytes.len(),
        "AES key decoded"
    );

    let iv = decode(iv_text, SecretKind::Iv).context("failed to decode AES_IV")?;
    info!(
        encoding = iv.encoding.as_str(),
        bytes = iv.bytes.len(),
        "AES IV decoded"
    );

    let cipher = TokenCipher::new(key.bytes, iv.bytes).context("failed to select cipher mode")?;
    info!(mode = %cipher.mode(), "token cipher ready");
    Ok(cipher)
}

#[cfg(test)]
mod tests {
    use super::decoder::SecretError;
    use super::*;
    use crate::crypto::mode::Mode;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

    const KEY_HEX: &str = "0123456789abcdef0123456789abcdef";
    const IV_HEX: &str = "a0a1a2a3a4a5a6a7a8a9aaab";

    #[test]
    fn hex_key_with_12_byte_iv_selects_gcm() {
        let cipher = load_cipher(KEY_HEX, IV_HEX).unwrap();
        assert_eq!(cipher.mode(), Mode::AuthenticatedStream);
    }

    #[test]
    fn serial_0042_token_is_stable_and_carries_the_iv() {
        let cipher = load_cipher(KEY_HEX, IV_HEX).unwrap();
        let first = cipher.encrypt("0042").unwrap();
        let second = cipher.encrypt("0042").unwrap();
        assert_eq!(first, second);

        let packed = URL_SAFE_NO_PAD.decode(&first).unwrap();
        assert_eq!(&packed[..12], hex::decode(IV_HEX).unwrap().as_slice());
    }

    #[test]
    fn literal_16_byte_iv_selects_cbc() {
        let cipher = load_cipher("k3y!material#16b", "sixteen byte iv!").unwrap();
        assert_eq!(cipher.mode(), Mode::BlockChaining);

        let packed = URL_SAFE_NO_PAD.decode(cipher.encrypt("0042").unwrap()).unwrap();
        assert_eq!(&packed[..16], b"sixteen byte iv!");
        assert_eq!(packed.len(), 16 + 16);
    }

    #[test]
    fn missing_key_is_fatal() {
        let err = load_cipher("", IV_HEX).unwrap_err();
        let root = err.downcast_ref::<SecretError>().unwrap();
        assert_eq!(*root, SecretError::Missing(SecretKind::Key));
    }

    #[test]
    fn missing_iv_is_fatal() {
        let err = load_cipher(KEY_HEX, "").unwrap_err();
        let root = err.downcast_ref::<SecretError>().unwrap();
        assert_eq!(*root, SecretError::Missing(SecretKind::Iv));
    }

    #[test]
    fn malformed_key_reports_format_error() {
        let err = load_cipher("short", IV_HEX).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SecretError>(),
            Some(SecretError::Format { len: 5, .. })
        ));
        assert!(format!("{err:#}").contains("AES_KEY"));
    }

    #[test]
    fn error_chain_never_contains_secret_text() {
        let key = "not-a-valid-key-text";
        let err = load_cipher(key, IV_HEX).unwrap_err();
        assert!(!format!("{err:#}").contains(key));
    }
}
