use super::state::{AmplifierBot, HumanUser, Post, PromoterBot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique, never reused identifier of an agent within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// World position of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    #[must_use]
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// The closed set of agent kinds.
///
/// The declaration order is the order in which the scheduler steps the
/// kind-groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Post,
    PromoterBot,
    AmplifierBot,
    HumanUser,
}

impl AgentKind {
    pub const ALL: [AgentKind; 4] = [
        AgentKind::Post,
        AgentKind::PromoterBot,
        AgentKind::AmplifierBot,
        AgentKind::HumanUser,
    ];

    /// Bots are the kinds subject to detection.
    #[must_use]
    pub fn is_bot(self) -> bool {
        matches!(self, AgentKind::PromoterBot | AgentKind::AmplifierBot)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AgentKind::Post => "post",
            AgentKind::PromoterBot => "promoter_bot",
            AgentKind::AmplifierBot => "amplifier_bot",
            AgentKind::HumanUser => "human_user",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind-specific state, one variant per agent kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentState {
    Post(Post),
    PromoterBot(PromoterBot),
    AmplifierBot(AmplifierBot),
    HumanUser(HumanUser),
}

impl AgentState {
    #[must_use]
    pub fn kind(&self) -> AgentKind {
        match self {
            AgentState::Post(_) => AgentKind::Post,
            AgentState::PromoterBot(_) => AgentKind::PromoterBot,
            AgentState::AmplifierBot(_) => AgentKind::AmplifierBot,
            AgentState::HumanUser(_) => AgentKind::HumanUser,
        }
    }
}

/// A live agent: immutable identity, current position, kind-specific state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub position: Position,
    pub state: AgentState,
}

impl Agent {
    #[must_use]
    pub fn new(id: AgentId, position: Position, state: AgentState) -> Self {
        Self {
            id,
            position,
            state,
        }
    }

    #[must_use]
    pub fn kind(&self) -> AgentKind {
        self.state.kind()
    }

    #[must_use]
    pub fn as_post(&self) -> Option<&Post> {
        match &self.state {
            AgentState::Post(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_promoter(&self) -> Option<&PromoterBot> {
        match &self.state {
            AgentState::PromoterBot(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_amplifier(&self) -> Option<&AmplifierBot> {
        match &self.state {
            AgentState::AmplifierBot(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_user(&self) -> Option<&HumanUser> {
        match &self.state {
            AgentState::HumanUser(u) => Some(u),
            _ => None,
        }
    }
}
