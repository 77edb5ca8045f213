//! Canonical store of live agents, grouped by kind.

use crate::error::{Result, SimError};
use crate::world::SpatialWorld;
use astroturf_data::{Agent, AgentId, AgentKind};
use std::collections::HashMap;

/// Owns every live agent. Per-kind id lists keep insertion order so that
/// iteration is reproducible; lookups go through the id map.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<AgentId, Agent>,
    by_kind: [Vec<AgentId>; 4],
    next_id: u64,
}

impl AgentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a fresh id. Ids are never reused within a run.
    pub fn allocate_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, agent: Agent) -> Result<()> {
        let kind = agent.kind().index();
        if self.agents.contains_key(&agent.id) || self.by_kind[kind].contains(&agent.id) {
            return Err(SimError::DuplicateId(agent.id));
        }
        self.next_id = self.next_id.max(agent.id.0 + 1);
        self.by_kind[kind].push(agent.id);
        self.agents.insert(agent.id, agent);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    #[must_use]
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    /// Ids of one kind, in insertion order.
    #[must_use]
    pub fn ids_of_kind(&self, kind: AgentKind) -> &[AgentId] {
        &self.by_kind[kind.index()]
    }

    pub fn agents_of_kind(&self, kind: AgentKind) -> impl Iterator<Item = &Agent> + '_ {
        self.by_kind[kind.index()]
            .iter()
            .filter_map(move |id| self.agents.get(id))
    }

    /// All agents, kind by kind.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> + '_ {
        AgentKind::ALL
            .iter()
            .flat_map(move |&kind| self.agents_of_kind(kind))
    }

    #[must_use]
    pub fn count(&self, kind: AgentKind) -> usize {
        self.by_kind[kind.index()].len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_kind.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lends an agent out for its step. The kind list keeps the id; the
    /// agent must come back through [`Self::restore`] or [`Self::discard`].
    pub(crate) fn take(&mut self, id: AgentId) -> Option<Agent> {
        self.agents.remove(&id)
    }

    pub(crate) fn restore(&mut self, agent: Agent) {
        self.agents.insert(agent.id, agent);
    }

    /// Forgets a lent-out agent for good.
    pub(crate) fn discard(&mut self, agent: &Agent) {
        let list = &mut self.by_kind[agent.kind().index()];
        if let Some(pos) = list.iter().position(|&e| e == agent.id) {
            list.remove(pos);
        }
    }

    fn remove(&mut self, id: AgentId) -> Result<Agent> {
        let agent = self.agents.remove(&id).ok_or(SimError::AgentNotFound(id))?;
        self.discard(&agent);
        Ok(agent)
    }
}

/// Removes an agent from the registry and the spatial index together.
///
/// Both sides are checked before either is touched, so a failure leaves no
/// half-removed agent behind.
pub fn despawn(registry: &mut AgentRegistry, world: &mut SpatialWorld, id: AgentId) -> Result<Agent> {
    if !registry.contains(id) || !world.contains(id) {
        return Err(SimError::AgentNotFound(id));
    }
    world.remove(id)?;
    registry.remove(id)
}
