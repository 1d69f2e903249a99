// src/sinks/mod.rs
pub mod debug;
pub mod syslog;

pub use debug::{DebugFormat, DebugSink};
pub use syslog::{SyslogEncoder, SyslogSink, SyslogTarget, Transport};
