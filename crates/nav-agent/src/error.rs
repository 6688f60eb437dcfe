//! Agent error type.
//!
//! Every variant is a contract violation: the caller misused the API.
//! Runtime conditions (failed searches, zero time steps, empty paths) are
//! absorbed by the agent and never surface here.

use nav_core::PathId;
use nav_path::PathError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("path {0} has been started but not finished; pass a path that is either created or returned")]
    PathStillComputing(PathId),

    #[error("path {0} was started by this agent's own repath and will be picked up automatically")]
    AlreadyBeingComputed(PathId),

    #[error("path {0} is not a point-to-point path")]
    UnsupportedPathKind(PathId),

    #[error("path ownership error: {0}")]
    Path(#[from] PathError),

    #[error("invalid agent configuration: {0}")]
    Config(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
