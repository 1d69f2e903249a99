// src/sinks/syslog.rs - RFC 5424 syslog forwarding
use crate::error::{BuildError, ProcessingError};
use crate::event::{Event, FieldIdentifier, FieldType};
use crate::pipeline::config::Section;
use crate::pipeline::stream::{Sink, Stage};
use chrono::SecondsFormat;
use indexmap::IndexMap;
use std::fmt;
use std::io::Write;
use std::net::{Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};

/// Private enterprise number used for the structured data elements
pub const PEN: u32 = 42785;

pub const DEFAULT_HOST: &str = "syslog.tcp://localhost:514";

pub const FACILITY: FieldIdentifier = FieldIdentifier::from_static("facility", FieldType::Literal);
pub const SEVERITY: FieldIdentifier = FieldIdentifier::from_static("severity", FieldType::Literal);
pub const APPNAME: FieldIdentifier = FieldIdentifier::from_static("appname", FieldType::Literal);
pub const PROCID: FieldIdentifier = FieldIdentifier::from_static("procid", FieldType::Literal);
pub const MSGID: FieldIdentifier = FieldIdentifier::from_static("msgid", FieldType::Literal);

// Fields that land in the header and so are left out of the structured data
const HEADER_FIELDS: [FieldIdentifier; 5] = [FACILITY, SEVERITY, APPNAME, PROCID, MSGID];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Udp,
}

/// Where a `syslog_sink` delivers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyslogTarget {
    pub transport: Transport,
    /// `address:port`
    pub address: String,
}

impl SyslogTarget {
    /// Parse `scheme://address:port` or a bare `address:port` (TCP)
    pub fn parse(raw: &str) -> Result<Self, BuildError> {
        let (transport, address) = match raw.split_once("://") {
            None => (Transport::Tcp, raw),
            Some(("syslog.tcp", rest)) => (Transport::Tcp, rest),
            Some(("syslog.udp", rest)) => (Transport::Udp, rest),
            Some(("syslog.tcptls", _)) => {
                return Err(BuildError::ConfigError(
                    "syslog.tcptls is not supported, use syslog.tcp or syslog.udp".to_string(),
                ))
            }
            Some((scheme, _)) => {
                return Err(BuildError::ConfigError(format!(
                    "unknown syslog scheme '{}'",
                    scheme
                )))
            }
        };

        let port_ok = address
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !port_ok {
            return Err(BuildError::ConfigError(format!(
                "syslog host '{}' must be of the form address:port",
                raw
            )));
        }

        Ok(SyslogTarget {
            transport,
            address: address.to_string(),
        })
    }
}

impl fmt::Display for SyslogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self.transport {
            Transport::Tcp => "syslog.tcp",
            Transport::Udp => "syslog.udp",
        };
        write!(f, "{}://{}", scheme, self.address)
    }
}

/// Builds RFC 5424 lines from events.
///
/// Every field carried in the structured data gets a small integer id. On a
/// persistent transport the `schema` element announcing `id -> TYPE:name` is
/// sent only with the first message that carries the field; otherwise it
/// accompanies every message.
#[derive(Debug, Clone)]
pub struct SyslogEncoder {
    persistent: bool,
    schema_ids: IndexMap<FieldIdentifier, usize>,
}

impl SyslogEncoder {
    pub fn new(persistent: bool) -> Self {
        SyslogEncoder {
            persistent,
            schema_ids: IndexMap::new(),
        }
    }

    /// Forget every announced schema entry, for a fresh connection
    pub fn reset(&mut self) {
        self.schema_ids.clear();
    }

    pub fn encode(&mut self, event: &Event) -> Result<String, ProcessingError> {
        let facility = facility_code(event.literal_or(FACILITY.name(), "daemon"))?;
        let severity = severity_code(event.literal_or(SEVERITY.name(), "info"))?;

        let timestamp = event
            .timestamp()
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|_| "-".to_string());

        let mut line = format!(
            "<{}>1 {} {} {} {} {} {}",
            facility * 8 + severity,
            timestamp,
            header_value(event.origin_or(""), 255),
            header_value(event.literal_or(APPNAME.name(), ""), 48),
            header_value(event.literal_or(PROCID.name(), ""), 128),
            header_value(event.literal_or(MSGID.name(), ""), 32),
            self.structured_data(event),
        );

        let message = event.message_or("");
        if !message.is_empty() {
            line.push(' ');
            line.push_str(message);
        }
        Ok(line)
    }

    fn structured_data(&mut self, event: &Event) -> String {
        let mut schema = String::new();
        let mut values = String::new();

        for (field, value) in event.fields() {
            if HEADER_FIELDS.contains(field) {
                continue;
            }
            let next_id = self.schema_ids.len() + 1;
            let (id, announced) = match self.schema_ids.get(field) {
                Some(id) => (*id, true),
                None => {
                    self.schema_ids.insert(field.clone(), next_id);
                    (next_id, false)
                }
            };
            if !announced || !self.persistent {
                schema.push_str(&format!(" {}=\"{}\"", id, escape_param(&field.to_string())));
            }
            values.push_str(&format!(" {}=\"{}\"", id, escape_param(&value.stringify())));
        }

        if values.is_empty() {
            return "-".to_string();
        }
        let mut sd = String::new();
        if !schema.is_empty() {
            sd.push_str(&format!("[schema@{}{}]", PEN, schema));
        }
        sd.push_str(&format!("[values@{}{}]", PEN, values));
        sd
    }
}

fn header_value(value: &str, max_len: usize) -> String {
    if value.is_empty() {
        return "-".to_string();
    }
    value
        .chars()
        .take(max_len)
        .map(|c| if ('!'..='~').contains(&c) { c } else { '_' })
        .collect()
}

fn escape_param(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn facility_code(name: &str) -> Result<u8, ProcessingError> {
    let code = match name.to_lowercase().as_str() {
        "kern" => 0,
        "user" => 1,
        "mail" => 2,
        "daemon" => 3,
        "auth" | "security" => 4,
        "syslog" => 5,
        "lpr" => 6,
        "news" => 7,
        "uucp" => 8,
        "cron" => 9,
        "authpriv" => 10,
        "ftp" => 11,
        "local0" => 16,
        "local1" => 17,
        "local2" => 18,
        "local3" => 19,
        "local4" => 20,
        "local5" => 21,
        "local6" => 22,
        "local7" => 23,
        other => return Err(ProcessingError::Encode(format!("unknown syslog facility '{}'", other))),
    };
    Ok(code)
}

pub fn severity_code(name: &str) -> Result<u8, ProcessingError> {
    let code = match name.to_lowercase().as_str() {
        "emerg" | "panic" => 0,
        "alert" => 1,
        "crit" => 2,
        "err" | "error" => 3,
        "warning" | "warn" => 4,
        "notice" => 5,
        "info" => 6,
        "debug" => 7,
        other => return Err(ProcessingError::Encode(format!("unknown syslog severity '{}'", other))),
    };
    Ok(code)
}

enum Connection {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

/// Forwards events to a syslog server
pub struct SyslogSink {
    target: SyslogTarget,
    encoder: SyslogEncoder,
    connection: Option<Connection>,
}

impl SyslogSink {
    pub fn new() -> Self {
        SyslogSink {
            target: SyslogTarget {
                transport: Transport::Tcp,
                address: "localhost:514".to_string(),
            },
            encoder: SyslogEncoder::new(true),
            connection: None,
        }
    }

    pub fn target(&self) -> &SyslogTarget {
        &self.target
    }

    fn connect(&self) -> Result<Connection, ProcessingError> {
        match self.target.transport {
            Transport::Tcp => Ok(Connection::Tcp(TcpStream::connect(self.target.address.as_str())?)),
            Transport::Udp => {
                let remote = self
                    .target
                    .address
                    .to_socket_addrs()?
                    .next()
                    .ok_or_else(|| {
                        ProcessingError::Encode(format!(
                            "could not resolve '{}'",
                            self.target.address
                        ))
                    })?;
                let local = match remote {
                    SocketAddr::V4(_) => SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0),
                    SocketAddr::V6(_) => SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), 0),
                };
                let socket = UdpSocket::bind(local)?;
                socket.connect(remote)?;
                Ok(Connection::Udp(socket))
            }
        }
    }
}

impl Default for SyslogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for SyslogSink {
    fn name(&self) -> &str {
        "syslog_sink"
    }

    fn describe(&self) -> String {
        format!("syslog_sink(host={})", self.target)
    }

    fn configure(&mut self, section: &Section) -> Result<(), BuildError> {
        self.target = SyslogTarget::parse(&section.get_string_or("host", DEFAULT_HOST))?;
        self.encoder = SyslogEncoder::new(self.target.transport == Transport::Tcp);
        Ok(())
    }

    fn init(&mut self) -> Result<(), ProcessingError> {
        self.connection = Some(self.connect()?);
        self.encoder.reset();
        tracing::debug!("connected to {}", self.target);
        Ok(())
    }

    fn fini(&mut self) -> Result<(), ProcessingError> {
        match self.connection.take() {
            Some(Connection::Tcp(mut stream)) => {
                stream.flush()?;
                if let Err(e) = stream.shutdown(Shutdown::Both) {
                    tracing::debug!("closing connection to {}: {}", self.target, e);
                }
            }
            Some(Connection::Udp(_)) | None => {}
        }
        Ok(())
    }
}

impl Sink for SyslogSink {
    fn consume(&mut self, event: Event) -> Result<(), ProcessingError> {
        let line = self.encoder.encode(&event)?;
        match self.connection.as_mut() {
            Some(Connection::Tcp(stream)) => {
                // Octet-counted framing
                write!(stream, "{} {}", line.len(), line)?;
            }
            Some(Connection::Udp(socket)) => {
                socket.send(line.as_bytes())?;
            }
            None => return Err(ProcessingError::NotInitialized("syslog_sink".to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parsing() {
        let udp = SyslogTarget::parse("syslog.udp://10.0.0.1:5514").unwrap();
        assert_eq!(udp.transport, Transport::Udp);
        assert_eq!(udp.address, "10.0.0.1:5514");

        let bare = SyslogTarget::parse("loghost:514").unwrap();
        assert_eq!(bare.transport, Transport::Tcp);
        assert_eq!(bare.to_string(), "syslog.tcp://loghost:514");

        assert!(SyslogTarget::parse("syslog.tcp://loghost").is_err());
        assert!(SyslogTarget::parse("syslog.tcptls://loghost:6514").is_err());
        assert!(SyslogTarget::parse("http://loghost:80").is_err());
    }

    #[test]
    fn test_priority_codes() {
        assert_eq!(facility_code("daemon").unwrap() * 8 + severity_code("info").unwrap(), 30);
        assert_eq!(facility_code("LOCAL7").unwrap(), 23);
        assert_eq!(severity_code("warn").unwrap(), 4);
        assert!(facility_code("nope").is_err());
        assert!(severity_code("loud").is_err());
    }

    #[test]
    fn test_escape_and_header_values() {
        assert_eq!(escape_param(r#"a"b\c]d"#), r#"a\"b\\c\]d"#);
        assert_eq!(header_value("", 10), "-");
        assert_eq!(header_value("my app", 10), "my_app");
        assert_eq!(header_value("abcdef", 3), "abc");
        // header parts are printable ASCII only
        assert_eq!(header_value("höst\u{7}", 255), "h_st_");
        assert_eq!(header_value("äpp\tx", 3), "_pp");
    }

    #[test]
    fn test_non_ascii_header_is_sanitized() {
        let mut event = Event::new(None);
        event.set(Event::ORIGIN, "höst\u{7}").unwrap();
        event.set(APPNAME, "äpp").unwrap();
        let line = SyslogEncoder::new(true).encode(&event).unwrap();
        assert_eq!(line, "<30>1 - h_st_ _pp - - -");
    }
}
