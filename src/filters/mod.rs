// src/filters/mod.rs
pub mod debug;
pub mod enrich;
pub mod script;
pub mod syslog_format;

pub use debug::DebugFilter;
pub use enrich::EnrichFilter;
pub use script::ScriptFilter;
pub use syslog_format::SyslogFormatFilter;
