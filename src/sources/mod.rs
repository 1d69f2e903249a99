// src/sources/mod.rs
pub mod lines;
pub mod stdin;
pub mod tail;

pub use lines::{local_hostname, LineSettings, DEFAULT_MAX_LINE_LENGTH};
pub use stdin::StdinSource;
pub use tail::TailSource;
