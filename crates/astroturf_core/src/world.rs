//! Bounded 2D continuous space.
//!
//! The world owns the position index: where every live agent is and which
//! grid cell holds it. It never touches the scheduler's registry.

use crate::ensure_param;
use crate::error::{Result, SimError};
use crate::spatial_hash::SpatialHash;
use astroturf_data::{AgentId, Position};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct SpatialWorld {
    width: f64,
    height: f64,
    toroidal: bool,
    index: SpatialHash,
    positions: BTreeMap<AgentId, (Position, usize)>,
}

impl SpatialWorld {
    pub fn new(width: f64, height: f64, toroidal: bool, cell_size: f64) -> Result<Self> {
        ensure_param!(
            width.is_finite() && width > 0.0,
            "World width must be positive, got {width}"
        );
        ensure_param!(
            height.is_finite() && height > 0.0,
            "World height must be positive, got {height}"
        );
        ensure_param!(
            cell_size.is_finite() && cell_size > 0.0,
            "Grid cell size must be positive, got {cell_size}"
        );
        Ok(Self {
            width,
            height,
            toroidal,
            index: SpatialHash::new(cell_size, width, height),
            positions: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[must_use]
    pub fn is_toroidal(&self) -> bool {
        self.toroidal
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: AgentId) -> bool {
        self.positions.contains_key(&id)
    }

    #[must_use]
    pub fn position(&self, id: AgentId) -> Option<Position> {
        self.positions.get(&id).map(|&(p, _)| p)
    }

    #[must_use]
    pub fn in_bounds(&self, p: Position) -> bool {
        p.is_finite() && (0.0..=self.width).contains(&p.x) && (0.0..=self.height).contains(&p.y)
    }

    /// Brings a coordinate back inside the world: wrapped on a torus,
    /// clamped otherwise.
    #[must_use]
    pub fn confine(&self, p: Position) -> Position {
        if self.toroidal {
            Position::new(p.x.rem_euclid(self.width), p.y.rem_euclid(self.height))
        } else {
            Position::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
        }
    }

    /// Shortest displacement from `from` to `to`, across the seam on a torus.
    #[must_use]
    pub fn displacement(&self, from: Position, to: Position) -> (f64, f64) {
        let mut dx = to.x - from.x;
        let mut dy = to.y - from.y;
        if self.toroidal {
            if dx.abs() > self.width / 2.0 {
                dx -= self.width.copysign(dx);
            }
            if dy.abs() > self.height / 2.0 {
                dy -= self.height.copysign(dy);
            }
        }
        (dx, dy)
    }

    #[must_use]
    pub fn distance(&self, a: Position, b: Position) -> f64 {
        let (dx, dy) = self.displacement(a, b);
        (dx * dx + dy * dy).sqrt()
    }

    /// Registers an agent. Fails on a duplicate id, or on a position outside
    /// the bounds of a non-toroidal world. Returns the stored position.
    pub fn place(&mut self, id: AgentId, position: Position) -> Result<Position> {
        if self.positions.contains_key(&id) {
            return Err(SimError::DuplicateId(id));
        }
        if !position.is_finite() || (!self.toroidal && !self.in_bounds(position)) {
            return Err(SimError::out_of_bounds(position, self.width, self.height));
        }
        let stored = self.confine(position);
        let cell = self
            .index
            .insert(id, stored.x, stored.y)
            .ok_or_else(|| SimError::out_of_bounds(stored, self.width, self.height))?;
        self.positions.insert(id, (stored, cell));
        Ok(stored)
    }

    /// Moves a registered agent, clamping (or wrapping) the target first.
    /// Returns the stored position.
    pub fn move_agent(&mut self, id: AgentId, target: Position) -> Result<Position> {
        ensure_param!(
            target.is_finite(),
            "Cannot move {id} to non-finite position ({}, {})",
            target.x,
            target.y
        );
        let stored = self.confine(target);
        let entry = self
            .positions
            .get_mut(&id)
            .ok_or(SimError::AgentNotFound(id))?;
        let cell = self
            .index
            .relocate(id, entry.1, stored.x, stored.y)
            .ok_or(SimError::AgentNotFound(id))?;
        *entry = (stored, cell);
        Ok(stored)
    }

    /// Deletes an agent from the index and returns its last position.
    pub fn remove(&mut self, id: AgentId) -> Result<Position> {
        let (position, cell) = self
            .positions
            .remove(&id)
            .ok_or(SimError::AgentNotFound(id))?;
        self.index.remove(id, cell);
        Ok(position)
    }

    /// Every agent whose distance to `position` is at most `radius`.
    pub fn neighbors_within(&self, position: Position, radius: f64) -> Result<Vec<AgentId>> {
        self.collect_within(position, radius, None)
    }

    /// Every other agent within `radius` of the agent `id`.
    pub fn neighbors_of(&self, id: AgentId, radius: f64) -> Result<Vec<AgentId>> {
        let position = self.position(id).ok_or(SimError::AgentNotFound(id))?;
        self.collect_within(position, radius, Some(id))
    }

    fn collect_within(
        &self,
        position: Position,
        radius: f64,
        exclude: Option<AgentId>,
    ) -> Result<Vec<AgentId>> {
        ensure_param!(
            radius.is_finite() && radius >= 0.0,
            "Radius must be non-negative, got {radius}"
        );
        ensure_param!(position.is_finite(), "Query position must be finite");
        let mut found = Vec::new();
        self.index
            .query_callback(position.x, position.y, radius, self.toroidal, |id| {
                if Some(id) == exclude {
                    return;
                }
                if let Some(&(p, _)) = self.positions.get(&id) {
                    if self.distance(position, p) <= radius {
                        found.push(id);
                    }
                }
            });
        Ok(found)
    }

    /// Reference O(n) scan. Returns the same set as [`Self::neighbors_within`],
    /// ordered by id.
    pub fn neighbors_within_linear(&self, position: Position, radius: f64) -> Result<Vec<AgentId>> {
        ensure_param!(
            radius.is_finite() && radius >= 0.0,
            "Radius must be non-negative, got {radius}"
        );
        Ok(self
            .positions
            .iter()
            .filter(|(_, &(p, _))| self.distance(position, p) <= radius)
            .map(|(&id, _)| id)
            .collect())
    }
}
