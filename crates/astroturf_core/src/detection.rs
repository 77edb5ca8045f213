//! Platform-side bot detection.
//!
//! Two mechanisms:
//! - per-agent stochastic removal, evaluated inside the bot behaviours every
//!   tick from local density (the probability helpers below);
//! - a periodic global pass that clusters every live bot by density and
//!   partially purges the large clusters.

use crate::config::DetectionConfig;
use crate::ensure_param;
use crate::error::Result;
use crate::registry::{despawn, AgentRegistry};
use crate::spatial_hash::SpatialHash;
use crate::world::SpatialWorld;
use astroturf_data::{AgentId, AgentKind, Position};
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// `intensity * (base + per_member * cluster_size)`.
#[must_use]
pub fn promoter_detection_probability(
    intensity: f64,
    cluster_size: usize,
    base: f64,
    per_member: f64,
) -> f64 {
    intensity * (base + per_member * cluster_size as f64)
}

/// `intensity * (base + per_neighbor * density / 5)`.
#[must_use]
pub fn amplifier_detection_probability(
    intensity: f64,
    density: usize,
    base: f64,
    per_neighbor: f64,
) -> f64 {
    intensity * (base + per_neighbor * density as f64 / 5.0)
}

/// Chance that a suspicious cluster is purged in one pass.
#[must_use]
pub fn purge_probability(intensity: f64, cluster_size: usize, base: f64, per_member: f64) -> f64 {
    intensity * (base + per_member * cluster_size as f64)
}

/// Label value used for noise by the conventional integer encoding.
pub const NOISE: i64 = -1;

/// Per-point result of a clustering run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterLabels {
    labels: Vec<Option<usize>>,
    clusters: usize,
}

impl ClusterLabels {
    /// Cluster of point `i`, `None` for noise.
    #[must_use]
    pub fn label(&self, i: usize) -> Option<usize> {
        self.labels.get(i).copied().flatten()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Option<usize>] {
        &self.labels
    }

    /// Labels as integers, noise encoded as [`NOISE`].
    #[must_use]
    pub fn to_raw(&self) -> Vec<i64> {
        self.labels
            .iter()
            .map(|l| l.map_or(NOISE, |c| c as i64))
            .collect()
    }

    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters
    }

    #[must_use]
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_none()).count()
    }

    /// Point indices of every cluster, by cluster id, ascending within each.
    #[must_use]
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut out = vec![Vec::new(); self.clusters];
        for (i, label) in self.labels.iter().enumerate() {
            if let Some(c) = label {
                out[*c].push(i);
            }
        }
        out
    }
}

/// Density-based clustering.
///
/// A point is a core point when at least `min_pts` points, itself included,
/// lie within `eps` of it. Clusters grow by chaining core points. A non-core
/// point within `eps` of a core point joins the first cluster that reaches
/// it, and everything else is noise. Cluster ids are assigned in order of the
/// lowest-indexed core point, so labels are deterministic for a given input
/// order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dbscan {
    eps: f64,
    min_pts: usize,
}

impl Dbscan {
    pub fn new(eps: f64, min_pts: usize) -> Result<Self> {
        ensure_param!(eps.is_finite() && eps > 0.0, "eps must be positive, got {eps}");
        ensure_param!(min_pts > 0, "min_pts must be positive");
        Ok(Self { eps, min_pts })
    }

    pub fn fit(&self, points: &[Position]) -> ClusterLabels {
        let neighborhoods = self.region_queries(points);
        let core: Vec<bool> = neighborhoods
            .iter()
            .map(|n| n.len() + 1 >= self.min_pts)
            .collect();

        let mut labels: Vec<Option<usize>> = vec![None; points.len()];
        let mut clusters = 0;
        let mut stack = Vec::new();
        for seed in 0..points.len() {
            if labels[seed].is_some() || !core[seed] {
                continue;
            }
            labels[seed] = Some(clusters);
            stack.push(seed);
            while let Some(p) = stack.pop() {
                if !core[p] {
                    continue;
                }
                for &q in &neighborhoods[p] {
                    if labels[q].is_none() {
                        labels[q] = Some(clusters);
                        if core[q] {
                            stack.push(q);
                        }
                    }
                }
            }
            clusters += 1;
        }

        ClusterLabels { labels, clusters }
    }

    /// Indices of the other points within `eps` of each point, ascending.
    fn region_queries(&self, points: &[Position]) -> Vec<Vec<usize>> {
        let finite = || points.iter().filter(|p| p.is_finite());
        let min_x = finite().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = finite().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_x = finite().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = finite().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        if !min_x.is_finite() {
            return vec![Vec::new(); points.len()];
        }

        let mut grid = SpatialHash::new(
            self.eps,
            (max_x - min_x).max(self.eps),
            (max_y - min_y).max(self.eps),
        );
        for (i, p) in points.iter().enumerate() {
            grid.insert(AgentId(i as u64), p.x - min_x, p.y - min_y);
        }

        points
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                let mut found = Vec::new();
                grid.query_callback(p.x - min_x, p.y - min_y, self.eps, false, |id| {
                    let j = id.0 as usize;
                    if j != i && p.distance_to(&points[j]) <= self.eps {
                        found.push(j);
                    }
                });
                found.sort_unstable();
                found
            })
            .collect()
    }
}

/// Running totals of everything detection removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionStats {
    pub promoters_detected: u64,
    pub amplifiers_detected: u64,
    pub passes_run: u64,
    pub passes_skipped: u64,
    pub clusters_found: u64,
    pub clusters_flagged: u64,
    pub purges: u64,
    pub purged_bots: u64,
}

impl DetectionStats {
    pub fn record_individual(&mut self, kind: AgentKind) {
        match kind {
            AgentKind::PromoterBot => self.promoters_detected += 1,
            AgentKind::AmplifierBot => self.amplifiers_detected += 1,
            AgentKind::Post | AgentKind::HumanUser => {}
        }
    }

    #[must_use]
    pub fn total_removed(&self) -> u64 {
        self.promoters_detected + self.amplifiers_detected + self.purged_bots
    }
}

/// Outcome of one periodic clustering pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterPass {
    /// Too few live bots to cluster.
    Skipped { bots: usize },
    Completed {
        clusters: usize,
        flagged: usize,
        removed: Vec<AgentId>,
    },
}

/// Clusters every live bot and purges a random share of each large cluster
/// that draws a detection.
pub fn cluster_pass<R: Rng>(
    registry: &mut AgentRegistry,
    world: &mut SpatialWorld,
    config: &DetectionConfig,
    rng: &mut R,
    stats: &mut DetectionStats,
) -> Result<ClusterPass> {
    let bots: Vec<(AgentId, Position)> = [AgentKind::PromoterBot, AgentKind::AmplifierBot]
        .iter()
        .flat_map(|&kind| registry.agents_of_kind(kind))
        .map(|a| (a.id, a.position))
        .collect();

    if bots.len() < config.min_bots {
        stats.passes_skipped += 1;
        return Ok(ClusterPass::Skipped { bots: bots.len() });
    }

    let points: Vec<Position> = bots.iter().map(|&(_, p)| p).collect();
    let labels = Dbscan::new(config.eps, config.min_pts)?.fit(&points);
    stats.passes_run += 1;
    stats.clusters_found += labels.cluster_count() as u64;

    let mut flagged = 0;
    let mut removed = Vec::new();
    for members in labels.members() {
        let size = members.len();
        if size <= config.suspicious_cluster_size {
            continue;
        }
        flagged += 1;
        stats.clusters_flagged += 1;

        let p_purge = purge_probability(
            config.intensity,
            size,
            config.purge_base,
            config.purge_per_member,
        );
        if rng.gen::<f64>() >= p_purge {
            continue;
        }

        let amount = (size as f64 * config.purge_fraction).floor() as usize;
        let victims: Vec<AgentId> = members
            .choose_multiple(rng, amount)
            .map(|&i| bots[i].0)
            .collect();
        for id in &victims {
            despawn(registry, world, *id)?;
        }
        stats.purges += 1;
        stats.purged_bots += victims.len() as u64;
        tracing::info!(
            cluster_size = size,
            purged = victims.len(),
            "Purged coordinated bot cluster"
        );
        removed.extend(victims);
    }

    Ok(ClusterPass::Completed {
        clusters: labels.cluster_count(),
        flagged,
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use astroturf_data::{Agent, AgentState, AmplifierBot, PromoterBot};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn blob(cx: f64, cy: f64, n: usize, spread: f64) -> Vec<Position> {
        (0..n)
            .map(|i| {
                let angle = i as f64 * 2.399_963;
                let r = spread * ((i + 1) as f64 / n as f64).sqrt();
                Position::new(cx + r * angle.cos(), cy + r * angle.sin())
            })
            .collect()
    }

    #[test]
    fn test_detection_probability_formula() {
        let p = promoter_detection_probability(0.5, 5, 0.05, 0.02);
        assert!((p - 0.075).abs() < 1e-12);
        let p = amplifier_detection_probability(0.5, 5, 0.01, 0.03);
        assert!((p - 0.02).abs() < 1e-12);
        let p = purge_probability(1.0, 20, 0.2, 0.01);
        assert!((p - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_dbscan_rejects_bad_parameters() {
        assert!(Dbscan::new(0.0, 5).is_err());
        assert!(Dbscan::new(-1.0, 5).is_err());
        assert!(Dbscan::new(8.0, 0).is_err());
    }

    #[test]
    fn test_dbscan_two_blobs_and_noise() {
        let mut points = blob(20.0, 20.0, 12, 3.0);
        points.extend(blob(150.0, 150.0, 8, 3.0));
        points.push(Position::new(90.0, 10.0));
        let labels = Dbscan::new(8.0, 5).expect("params").fit(&points);

        assert_eq!(labels.cluster_count(), 2);
        assert!((0..12).all(|i| labels.label(i) == Some(0)));
        assert!((12..20).all(|i| labels.label(i) == Some(1)));
        assert_eq!(labels.label(20), None);
        assert_eq!(labels.noise_count(), 1);
        assert_eq!(labels.to_raw()[20], NOISE);
    }

    #[test]
    fn test_dbscan_core_count_includes_the_point_itself() {
        // five points one unit apart: each sees four others plus itself
        let points: Vec<Position> = (0..5)
            .map(|i| Position::new(10.0 + f64::from(i), 10.0))
            .collect();
        let labels = Dbscan::new(8.0, 5).expect("params").fit(&points);
        assert_eq!(labels.to_raw(), vec![0, 0, 0, 0, 0]);
        assert_eq!(labels.cluster_count(), 1);

        let labels = Dbscan::new(8.0, 5).expect("params").fit(&points[..4]);
        assert_eq!(labels.to_raw(), vec![NOISE; 4]);
        assert_eq!(labels.cluster_count(), 0);
    }

    #[test]
    fn test_dbscan_labels_match_reference_fixture() {
        // min_samples = 3, eps = 1.5: a core pair chain, a border point and
        // an outlier, labelled as a standard DBSCAN labels them
        let points = vec![
            Position::new(0.0, 0.0),
            Position::new(1.0, 0.0),
            Position::new(2.0, 0.0),
            Position::new(3.4, 0.0),
            Position::new(10.0, 10.0),
            Position::new(10.0, 11.0),
            Position::new(10.0, 12.0),
            Position::new(30.0, 30.0),
        ];
        let labels = Dbscan::new(1.5, 3).expect("params").fit(&points);
        assert_eq!(labels.to_raw(), vec![0, 0, 0, 0, 1, 1, 1, NOISE]);
    }

    #[test]
    fn test_dbscan_tiny_eps_over_wide_spread() {
        // eps far below the spread must not size the grid by eps alone
        let mut points: Vec<Position> = (0..200)
            .map(|i| Position::new(f64::from(i), f64::from(i % 7) * 30.0))
            .collect();
        points.extend((0..3).map(|_| Position::new(42.5, 42.5)));
        let labels = Dbscan::new(0.001, 3).expect("params").fit(&points);
        assert_eq!(labels.cluster_count(), 1);
        assert_eq!(labels.members(), vec![vec![200, 201, 202]]);
        assert!((0..200).all(|i| labels.label(i).is_none()));
    }

    #[test]
    fn test_dbscan_border_point_joins_cluster() {
        // core at (50, 50) with five close neighbours to its left, plus a
        // border point reachable only from that core
        let mut points = vec![Position::new(50.0, 50.0)];
        points.extend((0..5).map(|i| Position::new(45.5 + f64::from(i) * 0.5, 50.5)));
        points.push(Position::new(57.9, 50.0));
        let labels = Dbscan::new(8.0, 5).expect("params").fit(&points);
        assert_eq!(labels.label(6), Some(0));
        assert_eq!(labels.cluster_count(), 1);
    }

    #[test]
    fn test_dbscan_chains_core_points() {
        let points: Vec<Position> = (0..30)
            .map(|i| Position::new(f64::from(i) * 2.0, 0.0))
            .collect();
        let labels = Dbscan::new(8.0, 5).expect("params").fit(&points);
        assert_eq!(labels.cluster_count(), 1);
        assert_eq!(labels.noise_count(), 0);
    }

    #[test]
    fn test_dbscan_empty_input() {
        let labels = Dbscan::new(8.0, 5).expect("params").fit(&[]);
        assert_eq!(labels.cluster_count(), 0);
        assert!(labels.as_slice().is_empty());
    }

    fn populate(positions: &[Position]) -> (AgentRegistry, SpatialWorld) {
        let mut registry = AgentRegistry::new();
        let mut world = SpatialWorld::new(200.0, 200.0, false, 10.0).expect("world");
        for (i, &p) in positions.iter().enumerate() {
            let id = registry.allocate_id();
            let state = if i % 2 == 0 {
                AgentState::PromoterBot(PromoterBot::new(2.0))
            } else {
                AgentState::AmplifierBot(AmplifierBot::new(1.5))
            };
            world.place(id, p).expect("place");
            registry.insert(Agent::new(id, p, state)).expect("insert");
        }
        (registry, world)
    }

    #[test]
    fn test_cluster_pass_skips_small_populations() {
        let (mut registry, mut world) = populate(&blob(50.0, 50.0, 10, 2.0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut stats = DetectionStats::default();
        let config = DetectionConfig {
            intensity: 1.0,
            ..Default::default()
        };
        let pass = cluster_pass(&mut registry, &mut world, &config, &mut rng, &mut stats)
            .expect("pass");
        assert_eq!(pass, ClusterPass::Skipped { bots: 10 });
        assert_eq!(stats.passes_skipped, 1);
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn test_cluster_pass_purges_thirty_percent() {
        // intensity 1.0 and 80 members: p_purge = 0.2 + 0.8 = 1.0
        let (mut registry, mut world) = populate(&blob(100.0, 100.0, 80, 6.0));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut stats = DetectionStats::default();
        let config = DetectionConfig {
            intensity: 1.0,
            ..Default::default()
        };
        let pass = cluster_pass(&mut registry, &mut world, &config, &mut rng, &mut stats)
            .expect("pass");
        let ClusterPass::Completed {
            clusters,
            flagged,
            removed,
        } = pass
        else {
            panic!("pass should run");
        };
        assert_eq!(clusters, 1);
        assert_eq!(flagged, 1);
        assert_eq!(removed.len(), 24);
        assert_eq!(registry.len(), 56);
        assert_eq!(world.len(), 56);
        for id in removed {
            assert!(!registry.contains(id));
            assert!(!world.contains(id));
        }
        assert_eq!(stats.purged_bots, 24);
        assert_eq!(stats.total_removed(), 24);
    }

    #[test]
    fn test_cluster_pass_zero_intensity_never_purges() {
        let (mut registry, mut world) = populate(&blob(100.0, 100.0, 40, 4.0));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut stats = DetectionStats::default();
        let config = DetectionConfig {
            intensity: 0.0,
            ..Default::default()
        };
        for _ in 0..20 {
            cluster_pass(&mut registry, &mut world, &config, &mut rng, &mut stats)
                .expect("pass");
        }
        assert_eq!(registry.len(), 40);
        assert_eq!(stats.clusters_flagged, 20);
        assert_eq!(stats.purges, 0);
    }
}
