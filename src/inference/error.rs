use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Provider error {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Missing API key: set the {0} environment variable")]
    MissingCredential(String),

    #[error("Malformed provider response: {0}")]
    Decode(#[from] serde_json::Error),
}
