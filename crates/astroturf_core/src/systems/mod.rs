//! Per-kind behaviour state machines.
//!
//! Every agent kind implements [`BehaviorLogic`]; [`step_agent`] dispatches
//! over the closed [`AgentState`] enum. A step reads the world and the other
//! agents, mutates only its own agent and that agent's position, and may ask
//! to be removed.

pub mod amplifier;
pub mod post;
pub mod promoter;
pub mod user;

use crate::config::BehaviorConfig;
use crate::error::Result;
use crate::registry::AgentRegistry;
use crate::world::SpatialWorld;
use astroturf_data::{Agent, AgentId, AgentKind, AgentState, Position};
use rand::Rng;

/// What the scheduler should do with an agent after its step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    RemoveSelf,
}

/// Everything a behaviour may observe or mutate during one step.
pub struct StepContext<'a, R: Rng> {
    pub world: &'a mut SpatialWorld,
    /// Every other live agent. The stepping agent is lent out and absent.
    pub registry: &'a AgentRegistry,
    pub behavior: &'a BehaviorConfig,
    pub detection_intensity: f64,
    pub heat_modifier: f64,
    pub rng: &'a mut R,
}

impl<'a, R: Rng> StepContext<'a, R> {
    /// Other live agents within `radius` of `me`.
    pub fn neighbors(&self, me: AgentId, radius: f64) -> Result<Vec<&'a Agent>> {
        let registry: &'a AgentRegistry = self.registry;
        Ok(self
            .world
            .neighbors_of(me, radius)?
            .into_iter()
            .filter_map(|id| registry.get(id))
            .collect())
    }

    /// Follows a weak link. `None` once the referent is gone.
    #[must_use]
    pub fn resolve(&self, id: AgentId) -> Option<&'a Agent> {
        let registry: &'a AgentRegistry = self.registry;
        registry.get(id)
    }

    /// Moves `me` towards `target`, confined to the world, and writes the
    /// stored position back.
    pub fn move_to(&mut self, me: AgentId, position: &mut Position, target: Position) -> Result<()> {
        *position = self.world.move_agent(me, target)?;
        Ok(())
    }

    /// Bounded random walk: an independent `U(-magnitude, magnitude)` offset
    /// per axis.
    pub fn wander(&mut self, me: AgentId, position: &mut Position, magnitude: f64) -> Result<()> {
        let dx = self.uniform(magnitude);
        let dy = self.uniform(magnitude);
        let target = position.offset(dx, dy);
        self.move_to(me, position, target)
    }

    /// Unit vector and distance from `from` to `to`, with the distance used
    /// for normalisation floored at `min_norm`.
    #[must_use]
    pub fn heading(&self, from: Position, to: Position, min_norm: f64) -> (f64, f64, f64) {
        let (dx, dy) = self.world.displacement(from, to);
        let distance = (dx * dx + dy * dy).sqrt();
        let norm = distance.max(min_norm);
        if norm <= 0.0 {
            return (0.0, 0.0, distance);
        }
        (dx / norm, dy / norm, distance)
    }

    pub fn uniform(&mut self, magnitude: f64) -> f64 {
        if magnitude > 0.0 {
            self.rng.gen_range(-magnitude..magnitude)
        } else {
            0.0
        }
    }

    /// Bernoulli draw. Probabilities above one always fire.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() < probability
    }
}

pub fn count_kind(agents: &[&Agent], kind: AgentKind) -> usize {
    agents.iter().filter(|a| a.kind() == kind).count()
}

pub fn count_bots(agents: &[&Agent]) -> usize {
    agents.iter().filter(|a| a.kind().is_bot()).count()
}

/// The single step capability shared by every agent kind.
pub trait BehaviorLogic {
    fn step<R: Rng>(
        &mut self,
        me: AgentId,
        position: &mut Position,
        ctx: &mut StepContext<'_, R>,
    ) -> Result<StepOutcome>;
}

/// Runs one agent's behaviour.
pub fn step_agent<R: Rng>(agent: &mut Agent, ctx: &mut StepContext<'_, R>) -> Result<StepOutcome> {
    let Agent {
        id,
        position,
        state,
    } = agent;
    match state {
        AgentState::Post(post) => post.step(*id, position, ctx),
        AgentState::PromoterBot(bot) => bot.step(*id, position, ctx),
        AgentState::AmplifierBot(bot) => bot.step(*id, position, ctx),
        AgentState::HumanUser(user) => user.step(*id, position, ctx),
    }
}
