//! # Astroturf Core
//!
//! The simulation engine for Astroturf, an agent-based model of coordinated
//! inauthentic behaviour on a social platform.
//!
//! This crate contains the deterministic simulation logic, including:
//! - A bounded or toroidal 2D world backed by a uniform-grid index
//! - Posts, promoter bots, amplifier bots and human users
//! - Random activation by kind over per-tick snapshots
//! - Per-agent detection and a periodic DBSCAN cluster purge
//!
//! ## Determinism
//!
//! Every random draw goes through one seeded `ChaCha8Rng`, and every
//! collection that drives an iteration order is ordered. Two runs with the
//! same configuration and seed produce identical trajectories.
//!
//! ## Example
//!
//! ```
//! use astroturf_core::config::SimConfig;
//! use astroturf_core::Simulation;
//! use astroturf_data::AgentKind;
//!
//! let mut config = SimConfig::default();
//! config.world.seed = Some(42);
//!
//! let mut sim = Simulation::new(config).unwrap();
//! sim.run(10).unwrap();
//!
//! assert_eq!(sim.tick_count(), 10);
//! assert_eq!(sim.count_of(AgentKind::Post), 20);
//! ```

/// Configuration management for simulation parameters
pub mod config;
/// Detection probabilities, DBSCAN and the cluster purge
pub mod detection;
/// Error types shared by every operation
pub mod error;
/// Tick metrics and structured logging
pub mod metrics;
/// Canonical store of live agents
pub mod registry;
/// Random activation by kind
pub mod scheduler;
/// The public simulation handle
pub mod simulation;
/// Aggregate read-only views for reporting
pub mod snapshot;
/// Spatial hashing for proximity queries
pub mod spatial_hash;
/// Per-kind behaviour state machines
pub mod systems;
/// Continuous 2D space with bounds policy
pub mod world;

pub use config::SimConfig;
pub use detection::{ClusterPass, Dbscan, DetectionStats};
pub use error::{Result, SimError};
pub use metrics::{init_logging, TickMetrics};
pub use simulation::Simulation;
pub use snapshot::MetricsSnapshot;
pub use systems::BehaviorLogic;
pub use world::SpatialWorld;
