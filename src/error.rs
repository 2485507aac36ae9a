pub type StreaklabResult<T> = Result<T, StreaklabError>;

#[derive(thiserror::Error, Debug)]
pub enum StreaklabError {
    #[error("config error: {0}")]
    Config(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("pipeline error: {0}")]
    Pipeline(String),

    #[error("persist error: {0}")]
    Persist(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StreaklabError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }

    pub fn persist(msg: impl Into<String>) -> Self {
        Self::Persist(msg.into())
    }
}
