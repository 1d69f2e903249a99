// src/sinks/debug.rs
use crate::colors::ColorScheme;
use crate::error::{BuildError, ProcessingError};
use crate::event::Event;
use crate::pipeline::config::Section;
use crate::pipeline::stream::{Sink, Stage};
use is_terminal::IsTerminal;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugFormat {
    /// An id line, then one `  name = 'value'` line per field
    Text,
    /// One JSON object per line
    Json,
}

/// Prints every event it receives
pub struct DebugSink {
    writer: Box<dyn Write>,
    format: DebugFormat,
    colors: ColorScheme,
    is_tty: bool,
}

impl DebugSink {
    pub fn stdout() -> Self {
        let is_tty = io::stdout().is_terminal();
        DebugSink {
            writer: Box::new(io::stdout()),
            format: DebugFormat::Text,
            colors: ColorScheme::new(is_tty),
            is_tty,
        }
    }

    /// Print to `writer`; colors stay off unless configured
    pub fn to_writer(writer: impl Write + 'static) -> Self {
        DebugSink {
            writer: Box::new(writer),
            format: DebugFormat::Text,
            colors: ColorScheme::new(false),
            is_tty: false,
        }
    }

    pub fn format(&self) -> DebugFormat {
        self.format
    }

    fn write_text(&mut self, event: &Event) -> io::Result<()> {
        let c = &self.colors;
        writeln!(self.writer, "{}{}{}", c.id, event.id().unwrap_or("-"), c.reset)?;
        for (field, value) in event.iter() {
            writeln!(
                self.writer,
                "  {}{}{} {}={} {}'{}'{}",
                c.name,
                field.name(),
                c.reset,
                c.equals,
                c.reset,
                c.for_value(value),
                value,
                c.reset
            )?;
        }
        Ok(())
    }
}

impl Stage for DebugSink {
    fn name(&self) -> &str {
        "debug_sink"
    }

    fn describe(&self) -> String {
        let format = match self.format {
            DebugFormat::Text => "text",
            DebugFormat::Json => "json",
        };
        format!("debug_sink(format={}, color={})", format, self.colors.enabled())
    }

    fn configure(&mut self, section: &Section) -> Result<(), BuildError> {
        self.format = match section.get_string_or("format", "text").to_lowercase().as_str() {
            "text" => DebugFormat::Text,
            "json" => DebugFormat::Json,
            other => {
                return Err(BuildError::ConfigError(format!(
                    "[{}] unknown format '{}', expected text or json",
                    section.name(),
                    other
                )))
            }
        };
        self.colors = ColorScheme::new(section.get_bool("color", self.is_tty)?);
        Ok(())
    }

    fn fini(&mut self) -> Result<(), ProcessingError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Sink for DebugSink {
    fn consume(&mut self, event: Event) -> Result<(), ProcessingError> {
        match self.format {
            DebugFormat::Text => self.write_text(&event)?,
            DebugFormat::Json => writeln!(self.writer, "{}", event.to_json_string())?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{FieldIdentifier, FieldType};
    use indexmap::IndexMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    fn sample() -> Event {
        let mut event = Event::new(Some("e7".to_string()));
        event.set(Event::MESSAGE, "hello").unwrap();
        event
            .set(FieldIdentifier::new("bytes", FieldType::Integer), 512i64)
            .unwrap();
        event
    }

    fn sink(buf: &SharedBuf, params: &[(&str, &str)]) -> DebugSink {
        let values: IndexMap<String, String> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut sink = DebugSink::to_writer(buf.clone());
        sink.configure(&Section::new("node1:debug_sink", values)).unwrap();
        sink
    }

    #[test]
    fn test_text_output() {
        let buf = SharedBuf::default();
        let mut sink = sink(&buf, &[]);
        assert_eq!(sink.format(), DebugFormat::Text);
        assert_eq!(sink.describe(), "debug_sink(format=text, color=false)");

        sink.consume(sample()).unwrap();
        sink.consume(Event::new(None)).unwrap();
        sink.fini().unwrap();

        assert_eq!(buf.contents(), "e7\n  message = 'hello'\n  bytes = '512'\n-\n");
    }

    #[test]
    fn test_json_output() {
        let buf = SharedBuf::default();
        let mut sink = sink(&buf, &[("format", "json")]);
        sink.consume(sample()).unwrap();

        assert_eq!(
            buf.contents(),
            "{\"id\":\"e7\",\"fields\":[{\"name\":\"message\",\"type\":\"TEXT\",\"value\":\"hello\"},{\"name\":\"bytes\",\"type\":\"INTEGER\",\"value\":512}]}\n"
        );
    }
}
