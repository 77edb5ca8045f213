//! Core data structures for the Astroturf simulation.
//!
//! Plain, serializable agent state. Behaviour lives in `astroturf_core`.

pub mod data;

pub use data::agent::{Agent, AgentId, AgentKind, AgentState, Position};
pub use data::state::{AmplifierBot, HumanUser, Post, PromoterBot};
