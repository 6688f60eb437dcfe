//! Claim/release registry for shared paths.
//!
//! A returned [`Path`] may be followed by several owners at once (an agent,
//! a debug overlay, a replay recorder).  Each owner claims the path before
//! using it and releases it when done; the record is recycled when the last
//! claim goes away.  Misuse (claiming an unfinished path, claiming twice,
//! releasing without a claim) is rejected with a `PathError` rather than
//! silently tolerated.
//!
//! The pool also issues `PathId`s, so ids are unique for the lifetime of the
//! pool.

use nav_core::{AgentId, PathId};
use tracing::trace;

use crate::{Path, PathError, PathResult, PathState};

#[cfg(feature = "fx-hash")]
type ClaimMap = rustc_hash::FxHashMap<PathId, Vec<AgentId>>;
#[cfg(not(feature = "fx-hash"))]
type ClaimMap = std::collections::HashMap<PathId, Vec<AgentId>>;

/// Registry of live path claims.
#[derive(Debug, Default)]
pub struct PathPool {
    claims:   ClaimMap,
    next_id:  PathId,
    recycled: u64,
}

impl PathPool {
    pub fn new() -> Self {
        Self { claims: ClaimMap::default(), next_id: PathId(0), recycled: 0 }
    }

    /// Issue a fresh id for a path entering the pipeline.
    pub fn issue_id(&mut self) -> PathId {
        // `Default` leaves `next_id` at INVALID; start numbering at zero then.
        let id = if self.next_id.is_valid() { self.next_id } else { PathId(0) };
        self.next_id = id.next();
        id
    }

    /// Register `owner` as a holder of `path`.
    pub fn claim(&mut self, path: &Path, owner: AgentId) -> PathResult<()> {
        if path.state != PathState::Returned || !path.id.is_valid() {
            return Err(PathError::ClaimWhileComputing(path.id));
        }
        let owners = self.claims.entry(path.id).or_default();
        if owners.contains(&owner) {
            return Err(PathError::DuplicateClaim { path: path.id, owner });
        }
        owners.push(owner);
        trace!(path = %path.id, %owner, count = owners.len(), "path claimed");
        Ok(())
    }

    /// Drop `owner`'s claim on `path`.  Fails if `owner` holds none, so a
    /// path can never be released twice by the same owner.
    pub fn release(&mut self, path: PathId, owner: AgentId) -> PathResult<()> {
        let Some(owners) = self.claims.get_mut(&path) else {
            return Err(PathError::NotClaimed { path, owner });
        };
        let Some(slot) = owners.iter().position(|&o| o == owner) else {
            return Err(PathError::NotClaimed { path, owner });
        };
        owners.swap_remove(slot);
        if owners.is_empty() {
            self.claims.remove(&path);
            self.recycled += 1;
            trace!(%path, "path recycled");
        }
        Ok(())
    }

    /// Number of owners currently holding `path`.
    pub fn claim_count(&self, path: PathId) -> usize {
        self.claims.get(&path).map_or(0, Vec::len)
    }

    pub fn is_claimed_by(&self, path: PathId, owner: AgentId) -> bool {
        self.claims.get(&path).is_some_and(|o| o.contains(&owner))
    }

    /// Paths with at least one live claim.
    pub fn live_paths(&self) -> usize {
        self.claims.len()
    }

    /// Paths whose last claim has been released.
    pub fn recycled(&self) -> u64 {
        self.recycled
    }
}
