//! Random activation by kind.
//!
//! Each tick visits the kind-groups in a fixed order. Within a group the
//! scheduler steps a shuffled snapshot of the ids, so behaviours may remove
//! agents mid-pass without disturbing the iteration.

use crate::config::BehaviorConfig;
use crate::detection::DetectionStats;
use crate::ensure_param;
use crate::error::Result;
use crate::registry::{despawn, AgentRegistry};
use crate::systems::{step_agent, StepContext, StepOutcome};
use crate::world::SpatialWorld;
use astroturf_data::{AgentId, AgentKind};
use rand::seq::SliceRandom;
use rand::Rng;

/// Tick-wide inputs shared by every step.
#[derive(Debug, Clone, Copy)]
pub struct StepParams<'a> {
    pub behavior: &'a BehaviorConfig,
    pub detection_intensity: f64,
    pub heat_modifier: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub stepped: usize,
    pub removed: Vec<AgentId>,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    order: Vec<AgentKind>,
    steps: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            order: AgentKind::ALL.to_vec(),
            steps: 0,
        }
    }
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps the kinds in the given order. Kinds left out are never stepped.
    pub fn with_order(order: Vec<AgentKind>) -> Result<Self> {
        let mut scheduler = Self::default();
        scheduler.set_order(order)?;
        Ok(scheduler)
    }

    /// Replaces the kind order without resetting the tick counter.
    pub fn set_order(&mut self, order: Vec<AgentKind>) -> Result<()> {
        for (i, kind) in order.iter().enumerate() {
            ensure_param!(
                !order[..i].contains(kind),
                "Kind {kind} appears twice in the schedule order"
            );
        }
        self.order = order;
        Ok(())
    }

    #[must_use]
    pub fn order(&self) -> &[AgentKind] {
        &self.order
    }

    /// Completed ticks.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Steps every live agent once.
    ///
    /// Self-removal requests are applied immediately to both the world and
    /// the registry. The first error aborts the tick; the tick counter only
    /// advances when every agent has stepped.
    pub fn step_all<R: Rng>(
        &mut self,
        registry: &mut AgentRegistry,
        world: &mut SpatialWorld,
        params: StepParams<'_>,
        rng: &mut R,
        stats: &mut DetectionStats,
    ) -> Result<TickReport> {
        let mut report = TickReport::default();
        for &kind in &self.order {
            let mut snapshot = registry.ids_of_kind(kind).to_vec();
            snapshot.shuffle(rng);

            for id in snapshot {
                let Some(mut agent) = registry.take(id) else {
                    continue;
                };
                let outcome = {
                    let mut ctx = StepContext {
                        world: &mut *world,
                        registry: &*registry,
                        behavior: params.behavior,
                        detection_intensity: params.detection_intensity,
                        heat_modifier: params.heat_modifier,
                        rng: &mut *rng,
                    };
                    step_agent(&mut agent, &mut ctx)
                };
                report.stepped += 1;

                match outcome {
                    Ok(StepOutcome::Continue) => registry.restore(agent),
                    Ok(StepOutcome::RemoveSelf) => {
                        registry.restore(agent);
                        despawn(registry, world, id)?;
                        stats.record_individual(kind);
                        tracing::debug!(agent = %id, kind = %kind, "Agent detected and removed");
                        report.removed.push(id);
                    }
                    Err(err) => {
                        registry.restore(agent);
                        tracing::warn!(agent = %id, error = %err, "Agent step failed, aborting tick");
                        return Err(err);
                    }
                }
            }
        }
        self.steps += 1;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astroturf_data::{Agent, AgentState, HumanUser, Position, Post, PromoterBot};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup(promoters: usize) -> (AgentRegistry, SpatialWorld) {
        let mut registry = AgentRegistry::new();
        let mut world = SpatialWorld::new(100.0, 100.0, false, 10.0).expect("world");
        let mut add = |state: AgentState, p: Position| {
            let id = registry.allocate_id();
            world.place(id, p).expect("place");
            registry.insert(Agent::new(id, p, state)).expect("insert");
        };
        add(AgentState::Post(Post::new(3)), Position::new(50.0, 50.0));
        add(
            AgentState::HumanUser(HumanUser::default()),
            Position::new(20.0, 20.0),
        );
        for i in 0..promoters {
            add(
                AgentState::PromoterBot(PromoterBot::new(2.0)),
                Position::new(10.0 + i as f64, 80.0),
            );
        }
        (registry, world)
    }

    #[test]
    fn test_rejects_duplicate_kinds_in_order() {
        assert!(Scheduler::with_order(vec![AgentKind::Post, AgentKind::Post]).is_err());
        assert!(Scheduler::with_order(vec![AgentKind::HumanUser, AgentKind::Post]).is_ok());
    }

    #[test]
    fn test_every_agent_steps_once_and_counter_advances() {
        let (mut registry, mut world) = setup(5);
        let behavior = BehaviorConfig::default();
        let params = StepParams {
            behavior: &behavior,
            detection_intensity: 0.0,
            heat_modifier: 1.0,
        };
        let mut scheduler = Scheduler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut stats = DetectionStats::default();

        let report = scheduler
            .step_all(&mut registry, &mut world, params, &mut rng, &mut stats)
            .expect("tick");
        assert_eq!(report.stepped, 7);
        assert!(report.removed.is_empty());
        assert_eq!(scheduler.steps(), 1);
    }

    #[test]
    fn test_self_removal_mid_pass_is_atomic() {
        let (mut registry, mut world) = setup(60);
        let behavior = BehaviorConfig::default();
        let params = StepParams {
            behavior: &behavior,
            detection_intensity: 1.0,
            heat_modifier: 1.0,
        };
        let mut scheduler = Scheduler::new();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut stats = DetectionStats::default();

        let report = scheduler
            .step_all(&mut registry, &mut world, params, &mut rng, &mut stats)
            .expect("tick");
        assert!(!report.removed.is_empty());
        for id in &report.removed {
            assert!(!registry.contains(*id));
            assert!(!world.contains(*id));
        }
        assert_eq!(registry.len(), world.len());
        assert_eq!(stats.promoters_detected as usize, report.removed.len());
    }

    #[test]
    fn test_kinds_outside_order_are_not_stepped() {
        let (mut registry, mut world) = setup(3);
        let behavior = BehaviorConfig::default();
        let params = StepParams {
            behavior: &behavior,
            detection_intensity: 0.0,
            heat_modifier: 1.0,
        };
        let mut scheduler = Scheduler::with_order(vec![AgentKind::Post]).expect("order");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut stats = DetectionStats::default();
        let report = scheduler
            .step_all(&mut registry, &mut world, params, &mut rng, &mut stats)
            .expect("tick");
        assert_eq!(report.stepped, 1);
    }
}
