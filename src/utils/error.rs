use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalcError {
    #[error("Evaluator request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Malformed evaluator response: {reason}")]
    MalformedResponse { reason: String },

    #[error("{message}")]
    Evaluation { message: String },

    #[error("Evaluator task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Calculator session is closed")]
    SessionClosed,
}

impl CalcError {
    /// The call never produced a usable answer (transport, timeout, bad body).
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            CalcError::Request(_)
                | CalcError::MalformedResponse { .. }
                | CalcError::Task(_)
                | CalcError::Serialization(_)
        )
    }

    /// The service answered with a structured `error` field.
    pub fn is_evaluation_error(&self) -> bool {
        matches!(self, CalcError::Evaluation { .. })
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CalcError::Evaluation { message } => format!("Error: {}", message),
            e if e.is_request_failure() => "Calculation error".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CalcError>;
