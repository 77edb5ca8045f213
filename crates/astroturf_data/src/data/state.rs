use super::agent::AgentId;
use serde::{Deserialize, Serialize};

/// Original content that bots latch onto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub likes: u64,
    /// Popularity proxy, never below 1.0.
    pub heat: f64,
}

impl Post {
    #[must_use]
    pub fn new(likes: u64) -> Self {
        Self { likes, heat: 1.0 }
    }
}

/// Seeks popular posts and hovers near them once attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoterBot {
    pub speed: f64,
    /// Weak link to a post; resolved on use.
    pub target: Option<AgentId>,
    pub attached: bool,
    /// One plus the promoter bots nearby, refreshed every tick.
    pub cluster_size: usize,
}

impl PromoterBot {
    #[must_use]
    pub fn new(speed: f64) -> Self {
        Self {
            speed,
            target: None,
            attached: false,
            cluster_size: 1,
        }
    }
}

/// Follows attached promoters or hot posts to inflate engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmplifierBot {
    pub speed: f64,
    /// Weak link to a promoter bot or a hot post.
    pub target: Option<AgentId>,
}

impl AmplifierBot {
    #[must_use]
    pub fn new(speed: f64) -> Self {
        Self {
            speed,
            target: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanUser {
    pub engagement: u64,
    /// Always within `[0, 1]`.
    pub trust: f64,
    pub deceived: u64,
}

impl HumanUser {
    #[must_use]
    pub fn new(trust: f64) -> Self {
        Self {
            engagement: 0,
            trust: trust.clamp(0.0, 1.0),
            deceived: 0,
        }
    }
}

impl Default for HumanUser {
    fn default() -> Self {
        Self::new(0.5)
    }
}
