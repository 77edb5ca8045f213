//! Read-only aggregate view of a running simulation.

use crate::detection::DetectionStats;
use crate::simulation::Simulation;
use astroturf_data::AgentKind;
use serde::{Deserialize, Serialize};

/// Population and engagement totals at one point in time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub tick: u64,
    pub heat_modifier: f64,
    pub posts: usize,
    pub promoter_bots: usize,
    pub amplifier_bots: usize,
    pub users: usize,
    /// Promoters currently fixed to a post.
    pub attached_promoters: usize,
    pub total_likes: u64,
    /// Mean post heat, 0.0 when no posts exist.
    pub average_post_heat: f64,
    pub total_engagement: u64,
    pub total_deceived: u64,
    /// Mean user trust, 0.0 when no users exist.
    pub average_trust: f64,
    pub detection: DetectionStats,
}

impl MetricsSnapshot {
    #[must_use]
    pub fn capture(sim: &Simulation) -> Self {
        let posts: Vec<_> = sim
            .agents_of_kind(AgentKind::Post)
            .into_iter()
            .filter_map(|a| a.as_post())
            .collect();
        let users: Vec<_> = sim
            .agents_of_kind(AgentKind::HumanUser)
            .into_iter()
            .filter_map(|a| a.as_user())
            .collect();
        let attached_promoters = sim
            .agents_of_kind(AgentKind::PromoterBot)
            .into_iter()
            .filter_map(|a| a.as_promoter())
            .filter(|p| p.attached)
            .count();

        Self {
            tick: sim.tick_count(),
            heat_modifier: sim.heat_modifier(),
            posts: posts.len(),
            promoter_bots: sim.count_of(AgentKind::PromoterBot),
            amplifier_bots: sim.count_of(AgentKind::AmplifierBot),
            users: users.len(),
            attached_promoters,
            total_likes: posts.iter().map(|p| p.likes).sum(),
            average_post_heat: mean(posts.iter().map(|p| p.heat)),
            total_engagement: users.iter().map(|u| u.engagement).sum(),
            total_deceived: users.iter().map(|u| u.deceived).sum(),
            average_trust: mean(users.iter().map(|u| u.trust)),
            detection: sim.detection_stats().clone(),
        }
    }

    #[must_use]
    pub fn bots(&self) -> usize {
        self.promoter_bots + self.amplifier_bots
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}
