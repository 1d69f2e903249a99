// tests/event_tests.rs
use chrono::{DateTime, Utc};
use terane::{Event, EventError, FieldIdentifier, FieldType, Value};

#[test]
fn test_reserved_accessors_and_defaults() {
    println!("=== Testing Event: reserved accessors ===");

    let mut event = Event::new(Some("evt-1".to_string()));
    assert_eq!(event.origin_or("unknown"), "unknown");
    assert!(matches!(event.message(), Err(EventError::NotFound(_))));

    event.set(Event::ORIGIN, "web01").unwrap();
    event.set(Event::MESSAGE, "hello").unwrap();
    event.set(Event::SOURCE, "stdin").unwrap();

    assert_eq!(event.id(), Some("evt-1"));
    assert_eq!(event.origin().unwrap(), "web01");
    assert_eq!(event.origin_or("unknown"), "web01");
    assert_eq!(event.message().unwrap(), "hello");
    assert_eq!(event.source().unwrap(), "stdin");
    assert!(event.timestamp().is_err());
    println!("✓ Reserved accessors fall back to defaults only when absent");
}

#[test]
fn test_parse_stringify_round_trip_per_type() {
    println!("=== Testing Event: parse/stringify round trip ===");

    let samples = [
        (FieldType::Text, "some text with spaces"),
        (FieldType::Literal, "sshd"),
        (FieldType::Integer, "-42"),
        (FieldType::Float, "2.5"),
        (FieldType::Datetime, "1700000000123"),
        (FieldType::Address, "10.0.0.1"),
        (FieldType::Hostname, "web01.example.com"),
    ];

    for (field_type, raw) in samples {
        let value = field_type.parse(raw).unwrap();
        assert!(field_type.accepts(&value), "{} rejected its own value", field_type);
        assert_eq!(value.stringify(), raw, "round trip failed for {}", field_type);
        assert_eq!(field_type.parse(&value.stringify()).unwrap(), value);
    }

    let dt = FieldType::Datetime.parse("1700000000123.9").unwrap();
    assert_eq!(dt.as_datetime().unwrap().timestamp_millis(), 1700000000123);
    println!("✓ Every type round-trips, datetimes to the millisecond");
}

#[test]
fn test_set_with_wrong_type_keeps_prior_value() {
    println!("=== Testing Event: type mismatch ===");

    let count = FieldIdentifier::new("count", FieldType::Integer);
    let mut event = Event::new(None);
    event.set(count.clone(), 7i64).unwrap();

    let err = event.set(count.clone(), "seven").unwrap_err();
    assert!(matches!(err, EventError::TypeMismatch { .. }));
    assert_eq!(event.get(&count), Some(&Value::Integer(7)));
    assert_eq!(event.integer("count").unwrap(), 7);
    println!("✓ Mismatched set is rejected and leaves the event unchanged");
}

#[test]
fn test_fields_excludes_reserved_and_is_repeatable() {
    println!("=== Testing Event: fields() ===");

    let mut event = Event::new(None);
    event.set(Event::MESSAGE, "msg").unwrap();
    event
        .set(FieldIdentifier::new("user", FieldType::Text), "bob")
        .unwrap();
    event
        .set(FieldIdentifier::new("pid", FieldType::Integer), 99i64)
        .unwrap();

    let first: Vec<_> = event.fields().collect();
    let second: Vec<_> = event.fields().collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(event.iter().count(), 3);
    assert!(first.iter().all(|(field, _)| field.name() != "message"));
    println!("✓ fields() skips reserved fields and yields the same sequence twice");
}

#[test]
fn test_parse_event_from_raw_pairs() {
    println!("=== Testing Event: parse from raw values ===");

    let event = Event::parse(
        None,
        vec![
            (Event::TIMESTAMP, "1700000000000"),
            (FieldIdentifier::new("bytes", FieldType::Integer), "512"),
        ],
    )
    .unwrap();

    let expected: DateTime<Utc> = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
    assert_eq!(event.timestamp().unwrap(), expected);
    assert_eq!(event.integer("bytes").unwrap(), 512);

    let bad = Event::parse(
        None,
        vec![(FieldIdentifier::new("bytes", FieldType::Integer), "lots")],
    );
    assert!(matches!(bad, Err(EventError::Parse { .. })));
    println!("✓ Raw values are parsed by their declared type");
}

#[test]
fn test_json_rendering() {
    println!("=== Testing Event: JSON rendering ===");

    let mut event = Event::new(Some("abc".to_string()));
    event
        .set(FieldIdentifier::new("status", FieldType::Integer), 200i64)
        .unwrap();

    assert_eq!(
        event.to_json_string(),
        r#"{"id":"abc","fields":[{"name":"status","type":"INTEGER","value":200}]}"#
    );
    println!("✓ JSON output lists fields in insertion order");
}

#[test]
fn test_identifier_from_strings_and_remove() {
    println!("=== Testing Event: identifiers from strings, remove ===");

    let env = FieldIdentifier::from_strings("env", "literal").unwrap();
    assert_eq!(env, FieldIdentifier::new("env", FieldType::Literal));
    assert!(matches!(
        FieldIdentifier::from_strings("env", "blob"),
        Err(EventError::UnknownFieldType(_))
    ));

    let mut event = Event::new(None);
    event.set(env.clone(), "prod").unwrap();
    event.set(Event::MESSAGE, "hi").unwrap();

    assert_eq!(event.remove(&env), Some(Value::String("prod".to_string())));
    assert_eq!(event.remove(&env), None);
    assert!(event.literal("env").is_err());
    assert_eq!(event.message().unwrap(), "hi");
    println!("✓ Type names parse case-insensitively and removed fields are gone");
}
