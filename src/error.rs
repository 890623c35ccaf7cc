pub type BlendResult<T> = Result<T, BlendError>;

#[derive(thiserror::Error, Debug)]
pub enum BlendError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("collaborator error: {0}")]
    Collaborator(String),

    #[error("compositing error: {0}")]
    Compositing(String),

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl BlendError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }

    pub fn compositing(msg: impl Into<String>) -> Self {
        Self::Compositing(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }
}
