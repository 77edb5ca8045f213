use super::{count_kind, BehaviorLogic, StepContext, StepOutcome};
use crate::detection::promoter_detection_probability;
use crate::error::Result;
use astroturf_data::{AgentId, AgentKind, Position, PromoterBot};
use rand::Rng;

impl BehaviorLogic for PromoterBot {
    /// Seeking: pick up a post in scan range or wander; then close in at
    /// `speed` until within the attach distance.
    /// Attached: jitter around the post.
    /// Either way, risk detection scaled by the local promoter cluster.
    fn step<R: Rng>(
        &mut self,
        me: AgentId,
        position: &mut Position,
        ctx: &mut StepContext<'_, R>,
    ) -> Result<StepOutcome> {
        let cfg = ctx.behavior;

        let neighbors = ctx.neighbors(me, cfg.promoter_cluster_radius)?;
        self.cluster_size = 1 + count_kind(&neighbors, AgentKind::PromoterBot);

        let target = self
            .target
            .and_then(|id| ctx.resolve(id))
            .filter(|a| a.kind() == AgentKind::Post);
        if target.is_none() && self.target.is_some() {
            tracing::debug!(bot = %me, "Promoter target vanished, back to seeking");
            self.target = None;
            self.attached = false;
        }

        match target {
            Some(_) if self.attached => {
                ctx.wander(me, position, cfg.promoter_jitter)?;
            }
            Some(post) => {
                let (ux, uy, distance) = ctx.heading(*position, post.position, 0.0);
                if distance < cfg.attach_distance {
                    self.attached = true;
                } else {
                    let next = position.offset(ux * self.speed, uy * self.speed);
                    ctx.move_to(me, position, next)?;
                }
            }
            None => {
                if !self.acquire_target(me, ctx)? {
                    ctx.wander(me, position, cfg.promoter_wander)?;
                }
            }
        }

        let p_detect = promoter_detection_probability(
            ctx.detection_intensity,
            self.cluster_size,
            cfg.promoter_base_detection,
            cfg.promoter_cluster_detection,
        );
        if ctx.chance(p_detect) {
            return Ok(StepOutcome::RemoveSelf);
        }
        Ok(StepOutcome::Continue)
    }
}

/// Target selection for a seeking promoter.
trait PostTargeting {
    fn acquire_target<R: Rng>(&mut self, me: AgentId, ctx: &mut StepContext<'_, R>) -> Result<bool>;
}

impl PostTargeting for PromoterBot {
    /// Picks the nearby post maximising `likes * heat * U(0, 1)`, one fresh
    /// draw per candidate. Returns whether a target was found.
    fn acquire_target<R: Rng>(&mut self, me: AgentId, ctx: &mut StepContext<'_, R>) -> Result<bool> {
        let posts = ctx.neighbors(me, ctx.behavior.promoter_scan_radius)?;
        let mut best: Option<(AgentId, f64)> = None;
        for agent in posts {
            let Some(post) = agent.as_post() else {
                continue;
            };
            let weight = post.likes as f64 * post.heat * ctx.rng.gen::<f64>();
            if best.map_or(true, |(_, w)| weight > w) {
                best = Some((agent.id, weight));
            }
        }
        self.target = best.map(|(id, _)| id);
        Ok(self.target.is_some())
    }
}
