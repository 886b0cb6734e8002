use std::fmt;

/// The error taxonomy shared by every component that can reject a command
/// or fail an I/O operation.
#[derive(Debug)]
pub enum EngineError {
    /// Bad message framing or an unrecognized command type.
    InvalidCommand(String),
    /// A parameter was out of range or the wrong type.
    InvalidParam(String),
    /// An unknown effect name or preset id was referenced.
    NotFound(String),
    /// A preset id collided with an existing entry.
    Conflict(String),
    /// A mutation was attempted against a protected preset.
    Protected(String),
    /// Preset-store I/O or a sink transport error.
    Io(String),
    /// A panic was caught inside effect computation.
    Internal(String),
}

impl EngineError {
    pub fn message(&self) -> &str {
        match self {
            EngineError::InvalidCommand(m)
            | EngineError::InvalidParam(m)
            | EngineError::NotFound(m)
            | EngineError::Conflict(m)
            | EngineError::Protected(m)
            | EngineError::Io(m)
            | EngineError::Internal(m) => m,
        }
    }

    /// The wire-visible `kind` tag sent alongside `error` events.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidCommand(_) => "invalid_command",
            EngineError::InvalidParam(_) => "invalid_param",
            EngineError::NotFound(_) => "not_found",
            EngineError::Conflict(_) => "conflict",
            EngineError::Protected(_) => "protected",
            EngineError::Io(_) => "io",
            EngineError::Internal(_) => "internal",
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::InvalidCommand(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
