use nav_agent::AgentError;
use nav_core::NavError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("world configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Nav(#[from] NavError),

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),
}

pub type SimResult<T> = Result<T, SimError>;
