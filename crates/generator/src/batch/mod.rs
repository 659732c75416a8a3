//! Batch generation over an inclusive serial range.
//!
//! [`scheduler`] runs one job over a bounded worker pool; [`slot`] keeps the
//! single current run and its lifecycle for the HTTP layer.

pub mod scheduler;
pub mod slot;

pub use scheduler::{BatchJob, BatchScheduler};
pub use slot::{BatchError, BatchSlot};
