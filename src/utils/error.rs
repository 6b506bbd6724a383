use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackfillError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Failed creating client: {message}")]
    ClientError { message: String },

    #[error("Failed getting {target}: {message}")]
    FetchError { target: String, message: String },

    #[error("Failed adding user {member} to team {team}: {message}")]
    WriteError {
        team: String,
        member: String,
        message: String,
    },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API responded with {status}: {message}")]
    ApiStatus { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Client,
    Fetch,
    Write,
    Transport,
}

impl BackfillError {
    pub fn config(message: impl Into<String>) -> Self {
        BackfillError::ConfigError {
            message: message.into(),
        }
    }

    pub fn client(message: impl Into<String>) -> Self {
        BackfillError::ClientError {
            message: message.into(),
        }
    }

    /// 將底層錯誤包成 roster 讀取失敗
    pub fn fetch(target: impl Into<String>, source: &BackfillError) -> Self {
        BackfillError::FetchError {
            target: target.into(),
            message: source.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BackfillError::ConfigError { .. } => ErrorCategory::Configuration,
            BackfillError::ClientError { .. } => ErrorCategory::Client,
            BackfillError::FetchError { .. } => ErrorCategory::Fetch,
            BackfillError::WriteError { .. } => ErrorCategory::Write,
            BackfillError::ApiError(_)
            | BackfillError::ApiStatus { .. }
            | BackfillError::UrlError(_) => ErrorCategory::Transport,
        }
    }

    /// Every failure, fatal or recorded, ends the process with a non-zero status.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

pub type Result<T> = std::result::Result<T, BackfillError>;
