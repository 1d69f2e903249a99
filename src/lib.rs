// src/lib.rs
pub mod colors;
pub mod error;
pub mod event;
pub mod filters;
pub mod pipeline;
pub mod sinks;
pub mod sources;

pub use error::*;
pub use event::{Event, FieldIdentifier, FieldType, Value};
pub use pipeline::*;
