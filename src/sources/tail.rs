// src/sources/tail.rs
use crate::error::{BuildError, ProcessingError};
use crate::event::Event;
use crate::pipeline::config::Section;
use crate::pipeline::stream::{Source, Stage};
use crate::sources::lines::LineSettings;
use std::fs::{self, File, Metadata};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_SLEEP_TIME: Duration = Duration::from_secs(5);

/// Follows a file as it grows, one event per appended line.
///
/// Reading starts at the end of the file as it was at `init`. When the path
/// is replaced (log rotation) the new file is read from the start; when the
/// file shrinks, reading resumes at its new end. The source never reports
/// exhaustion on its own.
pub struct TailSource {
    settings: LineSettings,
    path: Option<PathBuf>,
    sleep_time: Duration,
    state: Option<TailState>,
}

impl TailSource {
    pub fn new() -> Self {
        TailSource {
            settings: LineSettings::default(),
            path: None,
            sleep_time: DEFAULT_SLEEP_TIME,
            state: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn sleep_time(&self) -> Duration {
        self.sleep_time
    }
}

impl Default for TailSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for TailSource {
    fn name(&self) -> &str {
        "tail_source"
    }

    fn describe(&self) -> String {
        let path = self
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        format!(
            "tail_source(path={}, origin={}, sleep_time={})",
            path,
            self.settings.origin,
            humantime::format_duration(self.sleep_time)
        )
    }

    fn configure(&mut self, section: &Section) -> Result<(), BuildError> {
        self.settings.configure(section)?;
        self.path = Some(section.get_path("path").ok_or_else(|| {
            BuildError::ConfigError(format!("[{}] requires a 'path' parameter", section.name()))
        })?);
        self.sleep_time = section.get_duration("sleep_time", DEFAULT_SLEEP_TIME)?;
        Ok(())
    }

    fn init(&mut self) -> Result<(), ProcessingError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| ProcessingError::NotInitialized("tail_source".to_string()))?;

        let mut state = TailState::default();
        match fs::metadata(path) {
            Ok(meta) => {
                state.file = Some(File::open(path)?);
                state.identity = Some(FileIdentity::of(&meta));
                state.position = meta.len();
                tracing::debug!("tailing {} from offset {}", path.display(), state.position);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("{} does not exist yet, waiting for it", path.display());
            }
            Err(e) => return Err(e.into()),
        }
        self.state = Some(state);
        Ok(())
    }

    fn fini(&mut self) -> Result<(), ProcessingError> {
        self.state = None;
        Ok(())
    }
}

impl Source for TailSource {
    fn emit(&mut self) -> Result<Option<Event>, ProcessingError> {
        let (Some(path), Some(state)) = (self.path.as_deref(), self.state.as_mut()) else {
            return Err(ProcessingError::NotInitialized("tail_source".to_string()));
        };
        let max_line_length = self.settings.max_line_length;

        loop {
            let chunk = state.read_chunk(path, max_line_length, self.sleep_time)?;
            let complete = chunk.last() == Some(&b'\n');

            if state.skipping {
                state.skipping = !complete;
                continue;
            }
            if !complete {
                tracing::warn!(
                    "skipping line in {} longer than max_line_length {}",
                    path.display(),
                    max_line_length
                );
                state.skipping = true;
                continue;
            }

            let line = String::from_utf8_lossy(&chunk);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            return self.settings.make_event(line).map(Some);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    #[cfg(unix)]
    fn of(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        FileIdentity {
            dev: meta.dev(),
            ino: meta.ino(),
        }
    }

    // Without inode numbers only shrinking is detected
    #[cfg(not(unix))]
    fn of(_meta: &Metadata) -> Self {
        FileIdentity { dev: 0, ino: 0 }
    }
}

#[derive(Debug, Default)]
struct TailState {
    file: Option<File>,
    identity: Option<FileIdentity>,
    position: u64,
    buffer: Vec<u8>,
    skipping: bool,
    last_error: Option<io::ErrorKind>,
}

impl TailState {
    /// Block until a full line, or `max_line_length + 1` bytes of one, is available
    fn read_chunk(
        &mut self,
        path: &Path,
        max_line_length: usize,
        sleep_time: Duration,
    ) -> io::Result<Vec<u8>> {
        loop {
            let meta = match fs::metadata(path) {
                Ok(meta) => meta,
                Err(e) => {
                    self.note_error(path, &e);
                    std::thread::sleep(sleep_time);
                    continue;
                }
            };

            let identity = FileIdentity::of(&meta);
            if self.identity.is_some_and(|prev| prev != identity) {
                tracing::info!("{} was replaced, reopening", path.display());
                self.file = None;
                self.position = 0;
                self.buffer.clear();
            }
            if self.file.is_none() {
                match File::open(path) {
                    Ok(file) => self.file = Some(file),
                    Err(e) => {
                        self.note_error(path, &e);
                        std::thread::sleep(sleep_time);
                        continue;
                    }
                }
            }
            self.identity = Some(identity);
            self.last_error = None;

            let size = meta.len();
            if size < self.position {
                tracing::info!(
                    "{} shrank by {} bytes, resuming at its end",
                    path.display(),
                    self.position - size
                );
                self.position = size;
                self.buffer.clear();
            }
            if size == self.position {
                std::thread::sleep(sleep_time);
                continue;
            }

            let wanted = (max_line_length + 1).saturating_sub(self.buffer.len()) as u64;
            let wanted = wanted.min(size - self.position);
            let Some(file) = self.file.as_mut() else {
                continue;
            };
            file.seek(SeekFrom::Start(self.position))?;
            let read = BufReader::new(file.by_ref().take(wanted)).read_until(b'\n', &mut self.buffer)?;
            self.position += read as u64;

            if self.buffer.last() == Some(&b'\n') || self.buffer.len() > max_line_length {
                return Ok(std::mem::take(&mut self.buffer));
            }
        }
    }

    // Log a failure once per distinct error kind rather than on every poll
    fn note_error(&mut self, path: &Path, error: &io::Error) {
        if self.last_error != Some(error.kind()) {
            if error.kind() == io::ErrorKind::NotFound {
                tracing::debug!("{} is missing: {}", path.display(), error);
            } else {
                tracing::warn!("failed to stat {}: {}", path.display(), error);
            }
            self.last_error = Some(error.kind());
        }
    }
}
