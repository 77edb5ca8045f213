use super::{count_bots, count_kind, BehaviorLogic, StepContext, StepOutcome};
use crate::error::Result;
use astroturf_data::{AgentId, AgentKind, Position, Post};
use rand::Rng;

impl BehaviorLogic for Post {
    /// Heat decays towards 1.0 and is pumped back up by nearby bots; every
    /// few nearby amplifiers add a like.
    fn step<R: Rng>(
        &mut self,
        me: AgentId,
        _position: &mut Position,
        ctx: &mut StepContext<'_, R>,
    ) -> Result<StepOutcome> {
        let cfg = ctx.behavior;
        self.heat = (self.heat * cfg.post_heat_decay).max(1.0);

        let neighbors = ctx.neighbors(me, cfg.post_radius)?;
        let bots = count_bots(&neighbors);
        let amplifiers = count_kind(&neighbors, AgentKind::AmplifierBot) as u64;

        self.heat += bots as f64 * cfg.post_heat_per_bot * ctx.heat_modifier.max(0.0);
        self.likes += amplifiers / cfg.amplifiers_per_like;
        Ok(StepOutcome::Continue)
    }
}
