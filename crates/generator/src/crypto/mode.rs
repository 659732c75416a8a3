//! Cipher mode selection from IV length.

use thiserror::Error;

/// Errors from mode selection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModeError {
    /// The IV is neither 12 (GCM) nor 16 (CBC) bytes.
    #[error("unsupported IV length: {0} bytes (allowed: 12 for GCM, 16 for CBC)")]
    UnsupportedIvLength(usize),
}

/// Symmetric cipher mode used to produce tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// AES-GCM with a 12-byte nonce and a 128-bit tag appended to the ciphertext.
    AuthenticatedStream,
    /// AES-CBC with a 16-byte IV and PKCS#7 padding; no tag.
    BlockChaining,
}

impl Mode {
    /// Select the mode for an IV of `iv_len` bytes.
    ///
    /// The IV length is the only input: 12 bytes selects GCM, 16 selects CBC.
    pub fn select(iv_len: usize) -> Result<Self, ModeError> {
        match iv_len {
            12 => Ok(Mode::AuthenticatedStream),
            16 => Ok(Mode::BlockChaining),
            other => Err(ModeError::UnsupportedIvLength(other)),
        }
    }

    /// IV length this mode requires.
    pub fn iv_len(self) -> usize {
        match self {
            Mode::AuthenticatedStream => 12,
            Mode::BlockChaining => 16,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::AuthenticatedStream => "aes-gcm",
            Mode::BlockChaining => "aes-cbc",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_selects_gcm() {
        assert_eq!(Mode::select(12), Ok(Mode::AuthenticatedStream));
    }

    #[test]
    fn sixteen_selects_cbc() {
        assert_eq!(Mode::select(16), Ok(Mode::BlockChaining));
    }

    #[test]
    fn every_other_length_is_rejected() {
        for len in (0..=64).filter(|l| *l != 12 && *l != 16) {
            assert_eq!(Mode::select(len), Err(ModeError::UnsupportedIvLength(len)));
        }
    }

    #[test]
    fn iv_len_inverts_select() {
        for mode in [Mode::AuthenticatedStream, Mode::BlockChaining] {
            assert_eq!(Mode::select(mode.iv_len()), Ok(mode));
        }
    }
}
