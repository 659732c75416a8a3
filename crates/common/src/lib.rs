//! Common types, protocol definitions, and errors shared across QR token service crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
