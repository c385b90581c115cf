//! Low-level file and clock helpers shared by the Zuvia crates.
//!
//! The widget's file-backed storage and the completion proxy's request timing both
//! build on these.

pub mod atomic_io;
pub mod time_utils;

pub use atomic_io::{read_text_if_exists, remove_file_if_exists, write_text_atomic};
pub use time_utils::{current_unix_timestamp_ms, elapsed_ms_since};
