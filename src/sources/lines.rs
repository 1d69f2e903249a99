// src/sources/lines.rs - Line handling shared by the file-like sources
use crate::error::{BuildError, ProcessingError};
use crate::event::Event;
use crate::pipeline::config::Section;
use chrono::Utc;
use std::io::{self, BufRead, Read};

pub const DEFAULT_MAX_LINE_LENGTH: usize = 16384;

/// Settings every line-oriented source understands
#[derive(Debug, Clone)]
pub struct LineSettings {
    /// Value stamped into each event's `origin`
    pub origin: String,
    pub max_line_length: usize,
}

impl Default for LineSettings {
    fn default() -> Self {
        LineSettings {
            origin: local_hostname(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl LineSettings {
    pub fn configure(&mut self, section: &Section) -> Result<(), BuildError> {
        self.origin = section.get_string_or("origin", &self.origin);
        let max = section.get_int("max_line_length", self.max_line_length as i64)?;
        self.max_line_length = usize::try_from(max)
            .ok()
            .filter(|m| *m > 0)
            .ok_or_else(|| {
                BuildError::ConfigError(format!(
                    "max_line_length must be a positive integer, got {}",
                    max
                ))
            })?;
        Ok(())
    }

    /// Event for one input line: message, timestamp of now, and origin
    pub fn make_event(&self, line: &str) -> Result<Event, ProcessingError> {
        let mut event = Event::new(None);
        event.set(Event::MESSAGE, line)?;
        event.set(Event::TIMESTAMP, Utc::now())?;
        event.set(Event::ORIGIN, self.origin.as_str())?;
        Ok(event)
    }
}

/// One read from a `LineReader`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLine {
    /// A complete line including its terminator, or the unterminated tail at EOF
    Line(String),
    /// A line longer than the limit; holds the number of bytes thrown away
    TooLong(usize),
}

/// Reads newline-terminated lines without buffering more than the limit
pub struct LineReader<R> {
    reader: R,
    max_line_length: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R, max_line_length: usize) -> Self {
        LineReader {
            reader,
            max_line_length,
        }
    }

    /// Next line, or `None` at end of input
    pub fn read_line(&mut self) -> io::Result<Option<ReadLine>> {
        let limit = self.max_line_length as u64 + 1;
        let mut buf = Vec::new();
        let n = self.reader.by_ref().take(limit).read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(None);
        }

        if buf.last() == Some(&b'\n') || (n as u64) < limit {
            return Ok(Some(ReadLine::Line(
                String::from_utf8_lossy(&buf).into_owned(),
            )));
        }

        let discarded = n + self.discard_rest()?;
        Ok(Some(ReadLine::TooLong(discarded)))
    }

    // Throw away input up to and including the next newline
    fn discard_rest(&mut self) -> io::Result<usize> {
        let mut discarded = 0;
        loop {
            let (done, used) = {
                let available = self.reader.fill_buf()?;
                if available.is_empty() {
                    return Ok(discarded);
                }
                match available.iter().position(|b| *b == b'\n') {
                    Some(i) => (true, i + 1),
                    None => (false, available.len()),
                }
            };
            self.reader.consume(used);
            discarded += used;
            if done {
                return Ok(discarded);
            }
        }
    }
}

/// Best-effort name of this host
pub fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
        })
        .unwrap_or_else(|| "localhost".to_string())
}
