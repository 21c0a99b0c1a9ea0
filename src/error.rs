use thiserror::Error;

/// Why a batch of questions could not be loaded.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("request to the trivia source failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response format: {0}")]
    Format(String),

    #[error("trivia source answered with response code {code}")]
    Api { code: u32 },
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Format(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store file is not accessible: {0}")]
    Io(#[from] std::io::Error),

    #[error("store contents could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("store task did not finish: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a username.")]
    EmptyUsername,

    #[error("A username can be at most {max} characters long.")]
    UsernameTooLong { max: usize },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("there is no question number {0}")]
    UnknownQuestion(usize),

    #[error("question {question} has no choice number {choice}")]
    UnknownChoice { question: usize, choice: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    NotANumber { name: &'static str, value: String },

    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}
