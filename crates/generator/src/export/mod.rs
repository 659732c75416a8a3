//! Rendering of generated tokens for consumers outside the service.
//!
//! - [`url`]: path-style verification URL assembly.
//! - [`csv`]: CSV table and newline-joined URL list for completed batches.

pub mod csv;
pub mod url;

pub use self::csv::{csv_file_name, render_csv, render_url_list};
pub use self::url::build_check_url;
