use crate::{rng, AgentId, SplitMix64};

/// Per-frame input shared by the controller and the active task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
    pub seed: u64,
    /// Simulation clock at the start of this tick.
    pub time_seconds: f32,
}

impl TickContext {
    /// Context for tick `tick` of a fixed-step run starting at time zero.
    pub fn fixed(tick: u64, dt_seconds: f32, seed: u64) -> Self {
        Self {
            tick,
            dt_seconds,
            seed,
            time_seconds: tick as f32 * dt_seconds,
        }
    }

    pub fn rng_for_agent<A: AgentId>(&self, agent: A, stream: u64) -> SplitMix64 {
        let seed = rng::derive_seed(self.seed, agent.stable_id(), stream);
        SplitMix64::new(seed)
    }

    /// Stream that also varies per tick, for one-off rolls made by long-lived tasks.
    pub fn rng_for_tick<A: AgentId>(&self, agent: A, stream: u64) -> SplitMix64 {
        self.rng_for_agent(agent, stream ^ rng::mix64(self.tick.wrapping_add(1)))
    }
}
