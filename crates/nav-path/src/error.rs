//! Path-subsystem error type.

use thiserror::Error;

use nav_core::{AgentId, NodeId, PathId};

/// Errors produced by `nav-path`.
///
/// The claim variants are contract violations: they indicate a caller bug,
/// never a runtime condition to retry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathError {
    #[error("path {0} is still being computed and cannot be claimed")]
    ClaimWhileComputing(PathId),

    #[error("{owner} already holds a claim on path {path}")]
    DuplicateClaim { path: PathId, owner: AgentId },

    #[error("{owner} holds no claim on path {path}")]
    NotClaimed { path: PathId, owner: AgentId },

    #[error("no path from {from} to {to}")]
    NoPath { from: NodeId, to: NodeId },

    #[error("waypoint graph has no nodes")]
    EmptyGraph,
}

pub type PathResult<T> = Result<T, PathError>;
