use thiserror::Error;

/// Failures produced while resolving or executing a command.
///
/// `NotFound` and `Ambiguous` only surface as waiting reasons inside the locate loop;
/// `MaxAttemptsExceeded` escapes once the attempt bound is reached.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("no widget matches {0}")]
    NotFound(String),

    #[error("{count} widgets match {descriptor}")]
    Ambiguous { descriptor: String, count: usize },

    #[error("widget is not visible: {0}")]
    NotVisible(String),

    #[error("widget is not clickable: {0}")]
    NotClickable(String),

    #[error("gave up after {attempts} locating attempts")]
    MaxAttemptsExceeded { attempts: u32 },

    #[error("unrecognizable command: {0}")]
    Unrecognizable(String),

    #[error("action rejected: {0}")]
    ActionRejected(String),

    #[error("{mode} is not supported by the {platform} driver")]
    Unsupported { mode: String, platform: String },

    #[error("driver error: {0}")]
    Driver(String),
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Driver(format!("{:#}", err))
    }
}
