//! The public simulation handle: world, registry, scheduler and detection
//! composed behind one seeded random source.

use crate::config::SimConfig;
use crate::detection::{self, ClusterPass, DetectionStats};
use crate::ensure_param;
use crate::error::Result;
use crate::metrics::TickMetrics;
use crate::registry::{despawn, AgentRegistry};
use crate::scheduler::{Scheduler, StepParams};
use crate::snapshot::MetricsSnapshot;
use crate::world::SpatialWorld;
use astroturf_data::{
    Agent, AgentId, AgentKind, AgentState, AmplifierBot, HumanUser, Position, Post, PromoterBot,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

pub struct Simulation {
    config: SimConfig,
    world: SpatialWorld,
    registry: AgentRegistry,
    scheduler: Scheduler,
    rng: ChaCha8Rng,
    heat_modifier: f64,
    stats: DetectionStats,
    metrics: TickMetrics,
    last_pass: Option<ClusterPass>,
}

impl Simulation {
    /// Builds a world and populates it with the configured head counts.
    pub fn new(config: SimConfig) -> Result<Self> {
        let mut sim = Self::empty(config)?;
        sim.populate()?;
        tracing::info!(
            fingerprint = %sim.config.fingerprint(),
            seed = ?sim.config.world.seed,
            agents = sim.agent_count(),
            "Simulation initialized"
        );
        Ok(sim)
    }

    /// Convenience constructor over the most common parameters; everything
    /// else keeps its default. Kinds missing from `counts` start empty.
    pub fn initialize(
        width: f64,
        height: f64,
        toroidal: bool,
        counts: &[(AgentKind, usize)],
        detection_intensity: f64,
        seed: Option<u64>,
    ) -> Result<Self> {
        let mut config = SimConfig::default();
        config.world.width = width;
        config.world.height = height;
        config.world.toroidal = toroidal;
        config.world.seed = seed;
        config.detection.intensity = detection_intensity;
        for kind in AgentKind::ALL {
            let count = counts
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|&(_, n)| n)
                .sum();
            config.population.set_count(kind, count);
        }
        Self::new(config)
    }

    /// Builds a world holding exactly the given agents, in order. The head
    /// counts in `config.population` are ignored.
    pub fn with_agents(config: SimConfig, agents: Vec<(Position, AgentState)>) -> Result<Self> {
        let mut sim = Self::empty(config)?;
        for (position, state) in agents {
            sim.spawn(position, state)?;
        }
        Ok(sim)
    }

    fn empty(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.world.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let world = SpatialWorld::new(
            config.world.width,
            config.world.height,
            config.world.toroidal,
            config.world.grid_cell_size,
        )?;
        Ok(Self {
            world,
            registry: AgentRegistry::new(),
            scheduler: Scheduler::new(),
            rng,
            heat_modifier: 1.0,
            stats: DetectionStats::default(),
            metrics: TickMetrics::default(),
            last_pass: None,
            config,
        })
    }

    fn populate(&mut self) -> Result<()> {
        let (width, height) = (self.config.world.width, self.config.world.height);
        let pop = self.config.population.clone();
        let behavior = self.config.behavior.clone();

        let margin_x = if width > 2.0 * pop.post_margin { pop.post_margin } else { 0.0 };
        let margin_y = if height > 2.0 * pop.post_margin { pop.post_margin } else { 0.0 };

        for _ in 0..pop.posts {
            let x = self.rng.gen_range(margin_x..width - margin_x);
            let y = self.rng.gen_range(margin_y..height - margin_y);
            let likes = self.rng.gen_range(pop.min_initial_likes..pop.max_initial_likes);
            self.spawn(Position::new(x, y), AgentState::Post(Post::new(likes)))?;
        }
        for _ in 0..pop.promoter_bots {
            let position = self.random_position();
            self.spawn(
                position,
                AgentState::PromoterBot(PromoterBot::new(behavior.promoter_speed)),
            )?;
        }
        for _ in 0..pop.amplifier_bots {
            let position = self.random_position();
            self.spawn(
                position,
                AgentState::AmplifierBot(AmplifierBot::new(behavior.amplifier_speed)),
            )?;
        }
        for _ in 0..pop.users {
            let position = self.random_position();
            self.spawn(
                position,
                AgentState::HumanUser(HumanUser::new(behavior.initial_trust)),
            )?;
        }
        Ok(())
    }

    fn random_position(&mut self) -> Position {
        Position::new(
            self.rng.gen_range(0.0..self.config.world.width),
            self.rng.gen_range(0.0..self.config.world.height),
        )
    }

    fn spawn(&mut self, position: Position, state: AgentState) -> Result<AgentId> {
        check_state(&state)?;
        let id = self.registry.allocate_id();
        let stored = self.world.place(id, position)?;
        if let Err(err) = self.registry.insert(Agent::new(id, stored, state)) {
            self.world.remove(id)?;
            return Err(err);
        }
        Ok(id)
    }

    /// Advances the simulation by one tick: every agent steps once, then the
    /// cluster pass runs if this tick is on its interval.
    pub fn tick(&mut self) -> Result<()> {
        let started = Instant::now();
        let tick = self.scheduler.steps() + 1;
        self.heat_modifier = self.config.heat.modifier_at(tick);

        let params = StepParams {
            behavior: &self.config.behavior,
            detection_intensity: self.config.detection.intensity,
            heat_modifier: self.heat_modifier,
        };
        let report = self.scheduler.step_all(
            &mut self.registry,
            &mut self.world,
            params,
            &mut self.rng,
            &mut self.stats,
        )?;
        let mut removed = report.removed.len();

        if self.scheduler.steps() % self.config.detection.interval == 0 {
            let pass = detection::cluster_pass(
                &mut self.registry,
                &mut self.world,
                &self.config.detection,
                &mut self.rng,
                &mut self.stats,
            )?;
            if let ClusterPass::Completed { removed: purged, .. } = &pass {
                removed += purged.len();
            }
            self.last_pass = Some(pass);
        }

        self.metrics
            .record_tick(started.elapsed(), self.counts(), removed);
        Ok(())
    }

    /// Runs `ticks` ticks, stopping at the first error.
    pub fn run(&mut self, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            self.tick()?;
        }
        Ok(())
    }

    /// Removes an agent from the world and the registry together.
    pub fn remove_agent(&mut self, id: AgentId) -> Result<Agent> {
        despawn(&mut self.registry, &mut self.world, id)
    }

    /// Replaces the kind stepping order. Kinds left out stop stepping.
    pub fn set_schedule_order(&mut self, order: Vec<AgentKind>) -> Result<()> {
        self.scheduler.set_order(order)
    }

    /// Live agents of one kind, in creation order.
    #[must_use]
    pub fn agents_of_kind(&self, kind: AgentKind) -> Vec<&Agent> {
        self.registry.agents_of_kind(kind).collect()
    }

    /// Every live agent, kind by kind.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.registry.iter()
    }

    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.registry.get(id)
    }

    /// Every live agent within `radius` of `position`.
    pub fn neighbors_within(&self, position: Position, radius: f64) -> Result<Vec<&Agent>> {
        Ok(self
            .world
            .neighbors_within(position, radius)?
            .into_iter()
            .filter_map(|id| self.registry.get(id))
            .collect())
    }

    /// Every other live agent within `radius` of agent `id`.
    pub fn neighbors_of(&self, id: AgentId, radius: f64) -> Result<Vec<&Agent>> {
        Ok(self
            .world
            .neighbors_of(id, radius)?
            .into_iter()
            .filter_map(|other| self.registry.get(other))
            .collect())
    }

    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn count_of(&self, kind: AgentKind) -> usize {
        self.registry.count(kind)
    }

    /// Live agents per kind, indexed by [`AgentKind::index`].
    #[must_use]
    pub fn counts(&self) -> [usize; 4] {
        AgentKind::ALL.map(|kind| self.registry.count(kind))
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.scheduler.steps()
    }

    #[must_use]
    pub fn heat_modifier(&self) -> f64 {
        self.heat_modifier
    }

    #[must_use]
    pub fn detection_stats(&self) -> &DetectionStats {
        &self.stats
    }

    #[must_use]
    pub fn last_cluster_pass(&self) -> Option<&ClusterPass> {
        self.last_pass.as_ref()
    }

    #[must_use]
    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub fn world(&self) -> &SpatialWorld {
        &self.world
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::capture(self)
    }
}

/// Rejects hand-built agent states that the step rules cannot handle.
fn check_state(state: &AgentState) -> Result<()> {
    match state {
        AgentState::Post(post) => {
            ensure_param!(
                post.heat.is_finite() && post.heat >= 1.0,
                "Post heat must be at least 1, got {}",
                post.heat
            );
        }
        AgentState::PromoterBot(PromoterBot { speed, .. })
        | AgentState::AmplifierBot(AmplifierBot { speed, .. }) => {
            ensure_param!(
                speed.is_finite() && *speed >= 0.0,
                "Bot speed must be non-negative, got {speed}"
            );
        }
        AgentState::HumanUser(user) => {
            ensure_param!(
                (0.0..=1.0).contains(&user.trust),
                "Trust must be within [0, 1], got {}",
                user.trust
            );
        }
    }
    Ok(())
}
