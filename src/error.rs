use crate::event::FieldType;

/// Errors raised by the event model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventError {
    #[error("field '{0}' not found")]
    NotFound(String),

    #[error("type mismatch for field {field}: expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("failed to parse {field_type} value '{raw}': {message}")]
    Parse {
        field_type: FieldType,
        raw: String,
        message: String,
    },

    #[error("unknown field type '{0}'")]
    UnknownFieldType(String),
}

/// Errors raised while turning a pipeline spec into configured stages.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("no plugin named '{name}' in group '{group}'")]
    PluginNotFound { group: String, name: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl From<starlark::Error> for BuildError {
    fn from(err: starlark::Error) -> Self {
        BuildError::ConfigError(format!("script syntax error: {}", err))
    }
}

impl From<EventError> for BuildError {
    fn from(err: EventError) -> Self {
        BuildError::ConfigError(err.to_string())
    }
}

/// Errors raised while a pipeline runs.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("stage '{stage}' failed to initialize: {source}")]
    StageInit {
        stage: String,
        #[source]
        source: Box<ProcessingError>,
    },

    #[error("stage '{stage}' failed to finalize: {source}")]
    StageFini {
        stage: String,
        #[source]
        source: Box<ProcessingError>,
    },

    #[error("Script error in stage '{stage}': {source}")]
    ScriptError {
        stage: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Event(#[from] EventError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encode(String),

    #[error("stage '{0}' was used before init")]
    NotInitialized(String),

    #[error("pipeline has already been run")]
    AlreadyRun,
}
