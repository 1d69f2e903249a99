// src/sources/stdin.rs
use crate::error::{BuildError, ProcessingError};
use crate::event::Event;
use crate::pipeline::config::Section;
use crate::pipeline::stream::{Source, Stage};
use crate::sources::lines::{LineReader, LineSettings, ReadLine};
use std::io::{self, BufRead};

/// Reads one event per line from standard input, or from any reader handed in
pub struct StdinSource {
    settings: LineSettings,
    input: Option<Box<dyn BufRead>>,
    reader: Option<LineReader<Box<dyn BufRead>>>,
    skipped: usize,
}

impl StdinSource {
    pub fn new() -> Self {
        StdinSource {
            settings: LineSettings::default(),
            input: None,
            reader: None,
            skipped: 0,
        }
    }

    /// Read from `reader` instead of stdin
    pub fn from_reader(reader: impl BufRead + 'static) -> Self {
        StdinSource {
            input: Some(Box::new(reader)),
            ..Self::new()
        }
    }

    pub fn settings(&self) -> &LineSettings {
        &self.settings
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for StdinSource {
    fn name(&self) -> &str {
        "stdin_source"
    }

    fn describe(&self) -> String {
        format!(
            "stdin_source(origin={}, max_line_length={})",
            self.settings.origin, self.settings.max_line_length
        )
    }

    fn configure(&mut self, section: &Section) -> Result<(), BuildError> {
        self.settings.configure(section)
    }

    fn init(&mut self) -> Result<(), ProcessingError> {
        let input: Box<dyn BufRead> = match self.input.take() {
            Some(input) => input,
            None => Box::new(io::stdin().lock()),
        };
        self.reader = Some(LineReader::new(input, self.settings.max_line_length));
        Ok(())
    }

    fn fini(&mut self) -> Result<(), ProcessingError> {
        self.reader = None;
        if self.skipped > 0 {
            tracing::debug!("skipped {} overlong lines", self.skipped);
        }
        Ok(())
    }
}

impl Source for StdinSource {
    fn emit(&mut self) -> Result<Option<Event>, ProcessingError> {
        let max_line_length = self.settings.max_line_length;
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| ProcessingError::NotInitialized("stdin_source".to_string()))?;

        loop {
            match reader.read_line() {
                Ok(None) => return Ok(None),
                Ok(Some(ReadLine::TooLong(length))) => {
                    tracing::warn!(
                        "skipping line of {} bytes, longer than max_line_length {}",
                        length,
                        max_line_length
                    );
                    self.skipped += 1;
                }
                Ok(Some(ReadLine::Line(line))) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    return self.settings.make_event(line).map(Some);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    tracing::debug!("input interrupted, stopping");
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
