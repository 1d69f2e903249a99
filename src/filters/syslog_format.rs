// src/filters/syslog_format.rs
use crate::error::ProcessingError;
use crate::event::Event;
use crate::pipeline::context::FilterResult;
use crate::pipeline::stream::{Filter, Stage};
use crate::sinks::syslog::{APPNAME, PROCID};
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<ts>[A-Za-z]{3} [ \d]\d \d\d:\d\d:\d\d) (?P<hostname>\S*) (?P<msg>.*)$")
        .expect("valid syslog line regex")
});

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<name>\S+)\[(?P<pid>\d+)\]|(?P<bare>\S+)):$").expect("valid syslog tag regex")
});

/// Splits a traditional BSD syslog line held in `message` into its parts
#[derive(Debug, Default)]
pub struct SyslogFormatFilter;

impl SyslogFormatFilter {
    pub fn new() -> Self {
        SyslogFormatFilter
    }
}

impl Stage for SyslogFormatFilter {
    fn name(&self) -> &str {
        "syslog_format"
    }
}

impl Filter for SyslogFormatFilter {
    fn filter(&mut self, mut event: Event) -> Result<FilterResult, ProcessingError> {
        let Ok(line) = event.message().map(str::to_string) else {
            return Ok(FilterResult::drop("event has no message"));
        };
        let Some(caps) = LINE_REGEX.captures(&line) else {
            return Ok(FilterResult::drop("line is not in syslog format"));
        };

        let ts = &caps["ts"];
        let timestamp = match parse_timestamp(ts) {
            Ok(timestamp) => timestamp,
            Err(e) => return Ok(FilterResult::drop(format!("failed to parse ts '{}': {}", ts, e))),
        };

        // The tag is everything up to the first space; a line without one is all tag.
        let (tag, content) = caps["msg"].split_once(' ').unwrap_or((&caps["msg"], ""));
        let Some(tag_caps) = TAG_REGEX.captures(tag) else {
            return Ok(FilterResult::drop("line has an invalid tag"));
        };

        event.set(Event::TIMESTAMP, timestamp)?;
        event.set(Event::ORIGIN, &caps["hostname"])?;
        match (tag_caps.name("name"), tag_caps.name("pid"), tag_caps.name("bare")) {
            (Some(name), Some(pid), _) => {
                event.set(APPNAME, name.as_str())?;
                event.set(PROCID, pid.as_str())?;
            }
            (_, _, Some(bare)) => {
                event.set(APPNAME, bare.as_str())?;
            }
            _ => return Ok(FilterResult::drop("line has an invalid tag")),
        }
        event.set(Event::MESSAGE, content)?;
        Ok(FilterResult::Pass(event))
    }
}

/// Syslog timestamps carry no year; assume the current one, in UTC
fn parse_timestamp(ts: &str) -> Result<DateTime<Utc>, String> {
    let normalized = ts.split_whitespace().collect::<Vec<_>>().join(" ");
    let with_year = format!("{} {}", Utc::now().year(), normalized);
    match NaiveDateTime::parse_from_str(&with_year, "%Y %b %d %H:%M:%S") {
        Ok(naive) => Ok(naive.and_utc()),
        Err(strict) => dateparser::parse_with_timezone(&normalized, &Utc)
            .map_err(|_| strict.to_string()),
    }
}
