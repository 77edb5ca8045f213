pub mod macros;

use astroturf_lib::model::config::SimConfig;
use astroturf_lib::model::error::Result;
use astroturf_lib::model::state::{
    AgentKind, AgentState, AmplifierBot, HumanUser, Position, Post, PromoterBot,
};
use astroturf_lib::model::Simulation;

#[allow(dead_code)]
pub struct SimBuilder {
    config: SimConfig,
    agents: Vec<(Position, AgentState)>,
    populate: bool,
}

#[allow(dead_code)]
impl SimBuilder {
    /// Empty 100x100 world, fixed seed, nothing placed.
    pub fn new() -> Self {
        astroturf_core::init_logging();
        let mut config = SimConfig::default();
        config.world.width = 100.0;
        config.world.height = 100.0;
        config.world.seed = Some(42);
        Self {
            config,
            agents: Vec::new(),
            populate: false,
        }
    }

    /// The reference scenario: 200x200, default head counts, seed 42.
    pub fn scenario() -> Self {
        let mut builder = Self::new();
        builder.config = SimConfig::default();
        builder.config.world.seed = Some(42);
        builder.populate = true;
        builder
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.world.seed = Some(seed);
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut SimConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn toroidal(mut self) -> Self {
        self.config.world.toroidal = true;
        self
    }

    pub fn populated(mut self) -> Self {
        self.populate = true;
        self
    }

    pub fn with_counts(mut self, posts: usize, promoters: usize, amplifiers: usize, users: usize) -> Self {
        let pop = &mut self.config.population;
        pop.set_count(AgentKind::Post, posts);
        pop.set_count(AgentKind::PromoterBot, promoters);
        pop.set_count(AgentKind::AmplifierBot, amplifiers);
        pop.set_count(AgentKind::HumanUser, users);
        self.populate = true;
        self
    }

    pub fn with_post(mut self, x: f64, y: f64, likes: u64) -> Self {
        self.agents
            .push((Position::new(x, y), AgentState::Post(Post::new(likes))));
        self
    }

    pub fn with_promoter(mut self, x: f64, y: f64) -> Self {
        let speed = self.config.behavior.promoter_speed;
        self.agents.push((
            Position::new(x, y),
            AgentState::PromoterBot(PromoterBot::new(speed)),
        ));
        self
    }

    pub fn with_amplifier(mut self, x: f64, y: f64) -> Self {
        let speed = self.config.behavior.amplifier_speed;
        self.agents.push((
            Position::new(x, y),
            AgentState::AmplifierBot(AmplifierBot::new(speed)),
        ));
        self
    }

    pub fn with_user(mut self, x: f64, y: f64, trust: f64) -> Self {
        self.agents
            .push((Position::new(x, y), AgentState::HumanUser(HumanUser::new(trust))));
        self
    }

    pub fn try_build(self) -> Result<Simulation> {
        if self.populate {
            Simulation::new(self.config)
        } else {
            Simulation::with_agents(self.config, self.agents)
        }
    }

    pub fn build(self) -> Simulation {
        self.try_build()
            .expect("Failed to create simulation in test builder")
    }
}

/// Every live agent as `(id, x, y)`, kind by kind.
#[allow(dead_code)]
pub fn trajectory(sim: &Simulation) -> Vec<(u64, f64, f64)> {
    sim.agents()
        .map(|a| (a.id.0, a.position.x, a.position.y))
        .collect()
}
