//! Deterministic simulation RNG.
//!
//! Agent movement itself is fully deterministic; randomness only enters
//! through world setup (spawn-point shuffling) and the `Wander` destination
//! controller's target picks.  Every consumer derives its stream
//! from the run's master seed, so a given `SimConfig::seed` always replays
//! the same session.
//!
//! Child streams are seeded by
//!
//!   seed = parent.next_u64() XOR (offset * MIXING_CONSTANT)
//!
//! where the mixing constant is the 64-bit fractional part of the golden
//! ratio.  Consecutive offsets (typically agent indices) land far apart in
//! seed space.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::AgentId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Seeded `SmallRng` wrapper.
///
/// Used from a single thread.  Parallel consumers each take a `child`.
#[derive(Clone, Debug)]
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Stream owned by one agent's controller.  Independent of spawn order
    /// for a fixed master seed.
    pub fn for_agent(master_seed: u64, agent: AgentId) -> Self {
        let seed = master_seed ^ (agent.0 as u64).wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive a child stream with a different seed offset.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(child_seed))
    }

    /// Uniform point inside the unit disc (rejection sampled).
    pub fn unit_disc(&mut self) -> glam::Vec2 {
        loop {
            let p = glam::Vec2::new(self.0.gen_range(-1.0..=1.0), self.0.gen_range(-1.0..=1.0));
            if p.length_squared() <= 1.0 {
                return p;
            }
        }
    }

    /// Shuffle a mutable slice in-place (Fisher-Yates).
    #[inline]
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.0);
    }
}
