// tests/syslog_sink_tests.rs
use chrono::DateTime;
use indexmap::IndexMap;
use std::io::Read;
use std::net::{TcpListener, UdpSocket};
use std::time::Duration;

use terane::sinks::{SyslogEncoder, SyslogSink};
use terane::{Event, FieldIdentifier, FieldType, ProcessingError, Section, Sink, Stage};

fn sample_event() -> Event {
    let mut event = Event::new(Some("e1".to_string()));
    event
        .set(
            Event::TIMESTAMP,
            DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
        )
        .unwrap();
    event.set(Event::ORIGIN, "web01").unwrap();
    event.set(Event::MESSAGE, "hello world").unwrap();
    event
        .set(FieldIdentifier::new("appname", FieldType::Literal), "sshd")
        .unwrap();
    event
        .set(FieldIdentifier::new("user", FieldType::Text), "bob")
        .unwrap();
    event
}

fn configured_sink(host: &str) -> SyslogSink {
    let mut values = IndexMap::new();
    values.insert("host".to_string(), host.to_string());
    let mut sink = SyslogSink::new();
    sink.configure(&Section::new("node1:syslog_sink", values))
        .unwrap();
    sink
}

#[test]
fn test_encode_header_and_structured_data() {
    println!("=== Testing Syslog: encoding ===");

    let mut encoder = SyslogEncoder::new(true);
    let line = encoder.encode(&sample_event()).unwrap();

    assert_eq!(
        line,
        r#"<30>1 2023-11-14T22:13:20.123Z web01 sshd - - [schema@42785 1="TEXT:user"][values@42785 1="bob"] hello world"#
    );
    println!("✓ PRI, header and SD elements formatted");
}

#[test]
fn test_schema_sent_once_on_persistent_transport() {
    println!("=== Testing Syslog: schema once over TCP ===");

    let mut encoder = SyslogEncoder::new(true);
    encoder.encode(&sample_event()).unwrap();

    let mut second = sample_event();
    second
        .set(FieldIdentifier::new("bytes", FieldType::Integer), 512i64)
        .unwrap();
    let line = encoder.encode(&second).unwrap();
    assert!(line.contains(r#"[schema@42785 2="INTEGER:bytes"][values@42785 1="bob" 2="512"]"#));

    let third = encoder.encode(&sample_event()).unwrap();
    assert!(!third.contains("schema@"));
    assert!(third.contains(r#"[values@42785 1="bob"]"#));

    encoder.reset();
    assert!(encoder.encode(&sample_event()).unwrap().contains("schema@"));
    println!("✓ Schema entries only accompany new fields");
}

#[test]
fn test_schema_resent_over_udp() {
    let mut encoder = SyslogEncoder::new(false);
    let first = encoder.encode(&sample_event()).unwrap();
    let second = encoder.encode(&sample_event()).unwrap();
    assert_eq!(first, second);
    assert!(second.contains(r#"[schema@42785 1="TEXT:user"]"#));
}

#[test]
fn test_priority_escaping_and_empty_parts() {
    println!("=== Testing Syslog: priority and escaping ===");

    let mut event = Event::new(None);
    event
        .set(FieldIdentifier::new("facility", FieldType::Literal), "local3")
        .unwrap();
    event
        .set(FieldIdentifier::new("severity", FieldType::Literal), "err")
        .unwrap();
    event
        .set(FieldIdentifier::new("path", FieldType::Text), r#"C:\tmp "x" [y]"#)
        .unwrap();

    let line = SyslogEncoder::new(true).encode(&event).unwrap();
    assert_eq!(
        line,
        r#"<155>1 - - - - - [schema@42785 1="TEXT:path"][values@42785 1="C:\\tmp \"x\" [y\]"]"#
    );

    let bare = SyslogEncoder::new(true).encode(&Event::new(None)).unwrap();
    assert_eq!(bare, "<30>1 - - - - - -");

    let mut unknown = Event::new(None);
    unknown
        .set(FieldIdentifier::new("severity", FieldType::Literal), "shouting")
        .unwrap();
    assert!(matches!(
        SyslogEncoder::new(true).encode(&unknown),
        Err(ProcessingError::Encode(_))
    ));
    println!("✓ Header defaults, escapes and bad names handled");
}

#[test]
fn test_tcp_delivery_uses_octet_counting() {
    println!("=== Testing Syslog: TCP delivery ===");

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let mut sink = configured_sink(&format!("syslog.tcp://{}", addr));
    sink.init().unwrap();
    sink.consume(sample_event()).unwrap();
    sink.consume(sample_event()).unwrap();
    sink.fini().unwrap();

    let (mut stream, _) = listener.accept().unwrap();
    let mut received = String::new();
    stream.read_to_string(&mut received).unwrap();

    let mut rest = received.as_str();
    let mut frames = Vec::new();
    while !rest.is_empty() {
        let (len, tail) = rest.split_once(' ').unwrap();
        let len: usize = len.parse().unwrap();
        frames.push(&tail[..len]);
        rest = &tail[len..];
    }
    assert_eq!(frames.len(), 2);
    assert!(frames[0].contains("schema@42785"));
    assert!(!frames[1].contains("schema@42785"));
    assert!(frames[1].ends_with(" hello world"));
    println!("✓ Frames are length-prefixed and schema is sent once");
}

#[test]
fn test_udp_delivery_one_datagram_per_event() {
    println!("=== Testing Syslog: UDP delivery ===");

    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    receiver
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let addr = receiver.local_addr().unwrap();

    let mut sink = configured_sink(&format!("syslog.udp://{}", addr));
    sink.init().unwrap();
    sink.consume(sample_event()).unwrap();
    sink.fini().unwrap();

    let mut buf = [0u8; 2048];
    let (n, _) = receiver.recv_from(&mut buf).unwrap();
    let datagram = std::str::from_utf8(&buf[..n]).unwrap();
    assert!(datagram.starts_with("<30>1 "));
    assert!(datagram.contains(r#"[schema@42785 1="TEXT:user"]"#));
    println!("✓ Datagram carries one full message");
}

#[test]
fn test_consume_before_init_fails() {
    let mut sink = configured_sink("syslog.udp://127.0.0.1:5514");
    assert!(matches!(
        sink.consume(sample_event()),
        Err(ProcessingError::NotInitialized(_))
    ));
}
