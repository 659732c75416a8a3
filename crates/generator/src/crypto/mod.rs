//! AES token encryption primitives.
//!
//! This module is free of HTTP and batch concerns. It provides mode selection
//! from the IV length and the encrypt-and-pack operation that turns a serial
//! into a URL-safe token.
//!
//! # Token format
//!
//! ```text
//! base64url-no-pad(IV || ciphertext[ || tag])
//! ```

pub mod cipher;
pub mod mode;

pub use cipher::{CipherError, SerialEncryptor, TokenCipher};
