//! The asynchronous path service boundary.
//!
//! Agents submit requests and receive results some polls later.  The host
//! loop drives the service with [`PathService::poll`] and then drains
//! completed paths back to their requesters; that hand-off is the only point
//! where path state crosses into agent state.
//!
//! Cancelled requests are still delivered, flagged with
//! [`PathFailure::Cancelled`], so requesters can see the id retire.

use std::collections::VecDeque;
use std::sync::Arc;

use nav_core::{AgentId, PathId};
use tracing::{debug, trace};

use crate::{Path, PathFailure, PathPlanner, PathPool, PathRequest, PathState};

#[cfg(feature = "fx-hash")]
type LatestMap = rustc_hash::FxHashMap<AgentId, PathId>;
#[cfg(not(feature = "fx-hash"))]
type LatestMap = std::collections::HashMap<AgentId, PathId>;

// ── PathService trait ─────────────────────────────────────────────────────────

pub trait PathService {
    /// Start computing a path for `request`.  Returns the new path's id.
    fn start_path(&mut self, request: PathRequest) -> PathId {
        self.submit(Path::from_request(request))
    }

    /// Start computing a caller-built `Created` path.
    fn submit(&mut self, path: Path) -> PathId;

    /// Cancel an in-flight request.  Unknown or finished ids are ignored.
    fn cancel(&mut self, id: PathId);

    /// Advance pending computations by one poll.
    fn poll(&mut self);

    /// Move every completed path into `out`.
    fn drain_completed(&mut self, out: &mut Vec<Path>);

    /// The most recent path started on behalf of `requester`, whether or
    /// not it has been delivered yet.
    fn current_path(&self, requester: AgentId) -> Option<PathId>;

    /// Drop everything remembered about `requester`.  Called when an agent
    /// leaves the world for good.
    fn forget(&mut self, requester: AgentId);

    fn pool(&self) -> &PathPool;
    fn pool_mut(&mut self) -> &mut PathPool;
}

// ── QueuedPathService ─────────────────────────────────────────────────────────

struct Pending {
    path:       Path,
    polls_left: u32,
}

/// A path service that answers each request after a fixed number of polls.
///
/// With `latency_polls = 0` a request completes on the next poll.  Requests
/// are computed in submission order.
pub struct QueuedPathService<P> {
    planner:       P,
    latency_polls: u32,
    queue:         VecDeque<Pending>,
    completed:     Vec<Path>,
    latest:        LatestMap,
    pool:          PathPool,
}

impl<P: PathPlanner> QueuedPathService<P> {
    pub fn new(planner: P) -> Self {
        Self::with_latency(planner, 0)
    }

    pub fn with_latency(planner: P, latency_polls: u32) -> Self {
        Self {
            planner,
            latency_polls,
            queue: VecDeque::new(),
            completed: Vec::new(),
            latest: LatestMap::default(),
            pool: PathPool::new(),
        }
    }

    pub fn planner(&self) -> &P {
        &self.planner
    }

    /// Requests still being computed.
    pub fn in_flight(&self) -> usize {
        self.queue.len()
    }

    fn compute(&self, mut path: Path) -> Path {
        path.state = PathState::Returned;
        if path.failure.is_some() {
            return path;
        }
        match self.planner.plan(path.start, path.end) {
            Ok(planned) => {
                path.points = Arc::from(planned.points);
                path.plane = planned.plane;
            }
            Err(e) => {
                debug!(path = %path.id, error = %e, "path search failed");
                path.failure = Some(PathFailure::Error(e.to_string()));
            }
        }
        path
    }
}

impl<P: PathPlanner> PathService for QueuedPathService<P> {
    fn submit(&mut self, mut path: Path) -> PathId {
        if !path.id.is_valid() {
            path.id = self.pool.issue_id();
        }
        path.state = PathState::Computing;
        let id = path.id;
        trace!(path = %id, requester = %path.requester, "path submitted");
        self.latest.insert(path.requester, id);
        self.queue.push_back(Pending { path, polls_left: self.latency_polls });
        id
    }

    fn cancel(&mut self, id: PathId) {
        if let Some(p) = self.queue.iter_mut().find(|p| p.path.id == id) {
            p.path.failure = Some(PathFailure::Cancelled);
            trace!(path = %id, "path cancelled");
        } else if let Some(p) = self.completed.iter_mut().find(|p| p.id == id) {
            p.failure = Some(PathFailure::Cancelled);
        }
    }

    fn poll(&mut self) {
        let mut still_pending = VecDeque::with_capacity(self.queue.len());
        while let Some(mut pending) = self.queue.pop_front() {
            if pending.polls_left > 0 && pending.path.failure.is_none() {
                pending.polls_left -= 1;
                still_pending.push_back(pending);
                continue;
            }
            let done = self.compute(pending.path);
            self.completed.push(done);
        }
        self.queue = still_pending;
    }

    fn drain_completed(&mut self, out: &mut Vec<Path>) {
        out.append(&mut self.completed);
    }

    fn current_path(&self, requester: AgentId) -> Option<PathId> {
        self.latest.get(&requester).copied()
    }

    fn forget(&mut self, requester: AgentId) {
        if self.latest.remove(&requester).is_some() {
            trace!(%requester, "requester forgotten");
        }
    }

    fn pool(&self) -> &PathPool {
        &self.pool
    }

    fn pool_mut(&mut self) -> &mut PathPool {
        &mut self.pool
    }
}
