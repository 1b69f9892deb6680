pub mod csv;

pub use csv::{write_log, write_log_file, LogRecord};
