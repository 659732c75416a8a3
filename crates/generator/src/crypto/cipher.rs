//! Token encryption: AES-GCM or AES-CBC over a serial, packed with its IV.
//!
//! # Token format
//!
//! ```text
//! base64url-no-pad( IV || ciphertext[ || tag] )
//! ```
//!
//! In GCM mode the 16-byte tag is part of the AEAD output and is not a
//! separate field. In CBC mode there is no tag.
//!
//! The IV is fixed for the lifetime of the process, so the same serial always
//! produces the same token. Verifiers rely on this stable mapping.

use aes::{Aes128, Aes192, Aes256};
use aes_gcm::{
    aead::{consts::U12, generic_array::GenericArray, Aead, AeadCore, KeyInit},
    Aes128Gcm, Aes256Gcm, AesGcm,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockCipher, BlockEncryptMut, KeyIvInit};
use thiserror::Error;

use super::mode::{Mode, ModeError};
use crate::secret::SecretBytes;
use crate::serial::Serial;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Errors produced by the cipher layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The key is not 16, 24 or 32 bytes.
    #[error("invalid key length: {0} bytes")]
    InvalidKeyLength(usize),

    /// The IV does not match the length the mode requires.
    #[error("invalid IV length for {mode}: {len} bytes")]
    InvalidIvLength { mode: Mode, len: usize },

    /// The AEAD primitive rejected the operation.
    #[error("aead operation failed")]
    AeadFailure,
}

/// Encrypt `plaintext` and return the packed, URL-safe token.
///
/// # Errors
///
/// Returns [`CipherError`] if the primitive rejects the key or IV. Decoded
/// secrets are length-checked at startup, so this only surfaces misuse.
pub fn encrypt(plaintext: &[u8], key: &[u8], iv: &[u8], mode: Mode) -> Result<String, CipherError> {
    let ciphertext = match mode {
        Mode::AuthenticatedStream => seal_gcm(plaintext, key, iv)?,
        Mode::BlockChaining => seal_cbc(plaintext, key, iv)?,
    };

    let mut packed = Vec::with_capacity(iv.len() + ciphertext.len());
    packed.extend_from_slice(iv);
    packed.extend_from_slice(&ciphertext);
    Ok(URL_SAFE_NO_PAD.encode(packed))
}

fn seal_gcm(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, CipherError> {
    match key.len() {
        16 => aead_seal::<Aes128Gcm>(plaintext, key, iv),
        24 => aead_seal::<Aes192Gcm>(plaintext, key, iv),
        32 => aead_seal::<Aes256Gcm>(plaintext, key, iv),
        other => Err(CipherError::InvalidKeyLength(other)),
    }
}

fn aead_seal<C>(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, CipherError>
where
    C: Aead + AeadCore + KeyInit,
{
    if iv.len() != Mode::AuthenticatedStream.iv_len() {
        return Err(CipherError::InvalidIvLength {
            mode: Mode::AuthenticatedStream,
            len: iv.len(),
        });
    }
    let cipher = C::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
    cipher
        .encrypt(GenericArray::from_slice(iv), plaintext)
        .map_err(|_| CipherError::AeadFailure)
}

fn seal_cbc(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, CipherError> {
    if iv.len() != Mode::BlockChaining.iv_len() {
        return Err(CipherError::InvalidIvLength {
            mode: Mode::BlockChaining,
            len: iv.len(),
        });
    }
    match key.len() {
        16 => chain_seal::<Aes128>(plaintext, key, iv),
        24 => chain_seal::<Aes192>(plaintext, key, iv),
        32 => chain_seal::<Aes256>(plaintext, key, iv),
        other => Err(CipherError::InvalidKeyLength(other)),
    }
}

fn chain_seal<C>(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, CipherError>
where
    C: BlockEncryptMut + BlockCipher,
    cbc::Encryptor<C>: KeyIvInit + BlockEncryptMut,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Produces the token for one serial.
///
/// This is the seam the batch scheduler fans out over; tests substitute it to
/// inject per-serial failures.
#[cfg_attr(test, mockall::automock)]
pub trait SerialEncryptor: Send + Sync {
    fn encrypt_serial(&self, serial: Serial) -> Result<String, CipherError>;
}

/// Process-lifetime cipher holding the decoded key, IV, and selected mode.
#[derive(Debug)]
pub struct TokenCipher {
    key: SecretBytes,
    iv: SecretBytes,
    mode: Mode,
}

impl TokenCipher {
    /// Build a cipher, selecting the mode from the IV length.
    ///
    /// # Errors
    ///
    /// Returns [`ModeError::UnsupportedIvLength`] if the IV is not 12 or 16 bytes.
    pub fn new(key: SecretBytes, iv: SecretBytes) -> Result<Self, ModeError> {
        let mode = Mode::select(iv.len())?;
        Ok(Self { key, iv, mode })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Encrypt arbitrary text into a token.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        encrypt(
            plaintext.as_bytes(),
            self.key.as_slice(),
            self.iv.as_slice(),
            self.mode,
        )
    }
}

impl SerialEncryptor for TokenCipher {
    fn encrypt_serial(&self, serial: Serial) -> Result<String, CipherError> {
        self.encrypt(&serial.to_string())
    }
}
