//! Configuration management for simulation parameters.
//!
//! Strongly-typed configuration structures that map to the `config.toml`
//! file. Every probability and threshold here is an illustrative constant,
//! not a calibrated one.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (hardcoded in `Default` impls)
//! 2. `config.toml` file (overrides defaults)
//! 3. Command line overrides in the headless runner (seed, tick count)
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [world]
//! width = 200.0
//! height = 200.0
//! toroidal = false
//! seed = 42
//!
//! [population]
//! posts = 20
//! promoter_bots = 30
//!
//! [detection]
//! intensity = 0.5
//! interval = 1
//! ```

use crate::ensure_param;
use crate::error::Result;
use astroturf_data::AgentKind;
use serde::{Deserialize, Serialize};

/// Bounds and indexing of the 2D world.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    pub toroidal: bool,
    pub seed: Option<u64>,
    /// Edge length of one spatial index cell.
    pub grid_cell_size: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 200.0,
            toroidal: false,
            seed: None,
            grid_cell_size: 10.0,
        }
    }
}

/// Initial head count per agent kind. Agents are only created at startup.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PopulationConfig {
    pub posts: usize,
    pub promoter_bots: usize,
    pub amplifier_bots: usize,
    pub users: usize,
    /// Posts keep this distance from the edges.
    pub post_margin: f64,
    pub min_initial_likes: u64,
    /// Exclusive upper bound.
    pub max_initial_likes: u64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            posts: 20,
            promoter_bots: 30,
            amplifier_bots: 50,
            users: 100,
            post_margin: 10.0,
            min_initial_likes: 1,
            max_initial_likes: 10,
        }
    }
}

impl PopulationConfig {
    #[must_use]
    pub fn count(&self, kind: AgentKind) -> usize {
        match kind {
            AgentKind::Post => self.posts,
            AgentKind::PromoterBot => self.promoter_bots,
            AgentKind::AmplifierBot => self.amplifier_bots,
            AgentKind::HumanUser => self.users,
        }
    }

    pub fn set_count(&mut self, kind: AgentKind, count: usize) {
        match kind {
            AgentKind::Post => self.posts = count,
            AgentKind::PromoterBot => self.promoter_bots = count,
            AgentKind::AmplifierBot => self.amplifier_bots = count,
            AgentKind::HumanUser => self.users = count,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        AgentKind::ALL.iter().map(|&k| self.count(k)).sum()
    }
}

/// Radii, speeds and rates used by the four behaviours.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BehaviorConfig {
    pub post_radius: f64,
    pub post_heat_decay: f64,
    pub post_heat_per_bot: f64,
    pub amplifiers_per_like: u64,

    pub promoter_speed: f64,
    pub promoter_scan_radius: f64,
    pub promoter_cluster_radius: f64,
    pub promoter_wander: f64,
    pub promoter_jitter: f64,
    pub attach_distance: f64,
    pub promoter_base_detection: f64,
    pub promoter_cluster_detection: f64,

    pub amplifier_speed: f64,
    pub amplifier_scan_radius: f64,
    pub amplifier_swarm_distance: f64,
    pub amplifier_density_radius: f64,
    pub amplifier_wander: f64,
    pub amplifier_jitter: f64,
    pub amplifier_retarget_chance: f64,
    pub amplifier_base_detection: f64,
    pub amplifier_density_detection: f64,
    pub hot_post_threshold: f64,

    pub user_radius: f64,
    pub user_wander: f64,
    pub initial_trust: f64,
    pub trust_decay: f64,
    pub trust_growth: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            post_radius: 5.0,
            post_heat_decay: 0.95,
            post_heat_per_bot: 0.1,
            amplifiers_per_like: 3,

            promoter_speed: 2.0,
            promoter_scan_radius: 10.0,
            promoter_cluster_radius: 5.0,
            promoter_wander: 2.0,
            promoter_jitter: 1.0,
            attach_distance: 2.0,
            promoter_base_detection: 0.05,
            promoter_cluster_detection: 0.02,

            amplifier_speed: 1.5,
            amplifier_scan_radius: 15.0,
            amplifier_swarm_distance: 8.0,
            amplifier_density_radius: 3.0,
            amplifier_wander: 1.5,
            amplifier_jitter: 1.0,
            amplifier_retarget_chance: 0.05,
            amplifier_base_detection: 0.01,
            amplifier_density_detection: 0.03,
            hot_post_threshold: 2.0,

            user_radius: 8.0,
            user_wander: 2.0,
            initial_trust: 0.5,
            trust_decay: 0.95,
            trust_growth: 1.01,
        }
    }
}

/// Platform-side detection: per-agent removal and the periodic cluster pass.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Global scale applied to every removal probability.
    pub intensity: f64,
    /// The cluster pass runs once every `interval` ticks.
    pub interval: u64,
    pub eps: f64,
    pub min_pts: usize,
    /// Below this many live bots the cluster pass is skipped.
    pub min_bots: usize,
    /// Clusters strictly larger than this are candidates for a purge.
    pub suspicious_cluster_size: usize,
    pub purge_base: f64,
    pub purge_per_member: f64,
    pub purge_fraction: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            intensity: 0.5,
            interval: 1,
            eps: 8.0,
            min_pts: 5,
            min_bots: 11,
            suspicious_cluster_size: 10,
            purge_base: 0.2,
            purge_per_member: 0.01,
            purge_fraction: 0.3,
        }
    }
}

/// Periodic swing of the platform-wide heat modifier.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HeatConfig {
    pub wave_amplitude: f64,
    pub wave_period: f64,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            wave_amplitude: 0.3,
            wave_period: 10.0,
        }
    }
}

impl HeatConfig {
    /// Heat modifier in effect during the given 1-based tick.
    #[must_use]
    pub fn modifier_at(&self, tick: u64) -> f64 {
        1.0 + self.wave_amplitude * (tick as f64 / self.wave_period).sin()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub population: PopulationConfig,
    pub behavior: BehaviorConfig,
    pub detection: DetectionConfig,
    pub heat: HeatConfig,
}

impl SimConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or
    /// [`SimError::InvalidParameter`](crate::error::SimError::InvalidParameter)
    /// describing the first failure.
    pub fn validate(&self) -> Result<()> {
        let w = &self.world;
        ensure_param!(
            w.width.is_finite() && w.width > 0.0,
            "World width must be positive, got {}",
            w.width
        );
        ensure_param!(
            w.height.is_finite() && w.height > 0.0,
            "World height must be positive, got {}",
            w.height
        );
        ensure_param!(
            w.grid_cell_size > 0.0,
            "Grid cell size must be positive, got {}",
            w.grid_cell_size
        );

        let p = &self.population;
        ensure_param!(p.post_margin >= 0.0, "Post margin must be non-negative");
        ensure_param!(
            p.max_initial_likes > p.min_initial_likes,
            "Initial likes range {}..{} is empty",
            p.min_initial_likes,
            p.max_initial_likes
        );

        let b = &self.behavior;
        for (name, radius) in [
            ("post_radius", b.post_radius),
            ("promoter_scan_radius", b.promoter_scan_radius),
            ("promoter_cluster_radius", b.promoter_cluster_radius),
            ("amplifier_scan_radius", b.amplifier_scan_radius),
            ("amplifier_density_radius", b.amplifier_density_radius),
            ("user_radius", b.user_radius),
        ] {
            ensure_param!(radius >= 0.0, "{name} must be non-negative, got {radius}");
        }
        ensure_param!(
            b.promoter_speed >= 0.0,
            "Promoter speed must be non-negative"
        );
        ensure_param!(
            b.amplifier_speed >= 0.0,
            "Amplifier speed must be non-negative"
        );
        ensure_param!(
            b.amplifiers_per_like > 0,
            "Amplifiers per like must be positive"
        );
        ensure_param!(
            (0.0..=1.0).contains(&b.initial_trust),
            "Initial trust must be in [0.0, 1.0]"
        );
        ensure_param!(
            (0.0..=1.0).contains(&b.amplifier_retarget_chance),
            "Retarget chance must be in [0.0, 1.0]"
        );
        ensure_param!(
            (0.0..=1.0).contains(&b.trust_decay),
            "Trust decay must be in [0.0, 1.0]"
        );
        ensure_param!(b.trust_growth >= 1.0, "Trust growth must be at least 1.0");

        let d = &self.detection;
        ensure_param!(
            (0.0..=1.0).contains(&d.intensity),
            "Detection intensity must be in [0.0, 1.0], got {}",
            d.intensity
        );
        ensure_param!(d.interval > 0, "Detection interval must be positive");
        ensure_param!(d.eps > 0.0, "eps must be positive, got {}", d.eps);
        ensure_param!(d.min_pts > 0, "min_pts must be positive");
        ensure_param!(
            (0.0..=1.0).contains(&d.purge_fraction),
            "Purge fraction must be in [0.0, 1.0]"
        );

        ensure_param!(
            self.heat.wave_period > 0.0,
            "Heat wave period must be positive"
        );
        ensure_param!(
            (0.0..=1.0).contains(&self.heat.wave_amplitude),
            "Heat wave amplitude must be in [0.0, 1.0], got {}",
            self.heat.wave_amplitude
        );

        Ok(())
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Hash of every behaviour-relevant section. Two runs with the same
    /// fingerprint and seed produce the same trajectory.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.world).as_bytes());
        hasher.update(format!("{:?}", self.population).as_bytes());
        hasher.update(format!("{:?}", self.behavior).as_bytes());
        hasher.update(format!("{:?}", self.detection).as_bytes());
        hasher.update(format!("{:?}", self.heat).as_bytes());
        hex::encode(hasher.finalize())
    }
}
