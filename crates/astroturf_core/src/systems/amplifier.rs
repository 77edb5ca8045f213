use super::{count_kind, BehaviorLogic, StepContext, StepOutcome};
use crate::detection::amplifier_detection_probability;
use crate::error::Result;
use astroturf_data::{Agent, AgentId, AgentKind, AmplifierBot, Position};
use rand::seq::SliceRandom;
use rand::Rng;

impl BehaviorLogic for AmplifierBot {
    fn step<R: Rng>(
        &mut self,
        me: AgentId,
        position: &mut Position,
        ctx: &mut StepContext<'_, R>,
    ) -> Result<StepOutcome> {
        let cfg = ctx.behavior;

        if self.target.is_some_and(|id| ctx.resolve(id).is_none()) {
            self.target = None;
        }
        if self.target.is_none() || ctx.chance(cfg.amplifier_retarget_chance) {
            self.acquire_target(me, ctx)?;
        }

        match self.target.and_then(|id| ctx.resolve(id)) {
            Some(target) => {
                let (ux, uy, distance) = ctx.heading(*position, target.position, 0.1);
                let next = if distance < cfg.amplifier_swarm_distance {
                    let step = self.speed * 0.5;
                    let jx = ctx.uniform(cfg.amplifier_jitter);
                    let jy = ctx.uniform(cfg.amplifier_jitter);
                    position.offset(ux * step + jx, uy * step + jy)
                } else {
                    position.offset(ux * self.speed, uy * self.speed)
                };
                ctx.move_to(me, position, next)?;
            }
            None => ctx.wander(me, position, cfg.amplifier_wander)?,
        }

        let neighbors = ctx.neighbors(me, cfg.amplifier_density_radius)?;
        let density = count_kind(&neighbors, AgentKind::AmplifierBot);
        let p_detect = amplifier_detection_probability(
            ctx.detection_intensity,
            density,
            cfg.amplifier_base_detection,
            cfg.amplifier_density_detection,
        );
        if ctx.chance(p_detect) {
            return Ok(StepOutcome::RemoveSelf);
        }
        Ok(StepOutcome::Continue)
    }
}

/// Target selection for an amplifier looking for something to boost.
trait SwarmTargeting {
    fn acquire_target<R: Rng>(&mut self, me: AgentId, ctx: &mut StepContext<'_, R>) -> Result<()>;
}

impl SwarmTargeting for AmplifierBot {
    /// Prefers an attached promoter in range, then a hot post. Keeps the
    /// current target when neither is around.
    fn acquire_target<R: Rng>(&mut self, me: AgentId, ctx: &mut StepContext<'_, R>) -> Result<()> {
        let cfg = ctx.behavior;
        let nearby = ctx.neighbors(me, cfg.amplifier_scan_radius)?;

        let promoters: Vec<&Agent> = nearby
            .iter()
            .copied()
            .filter(|a| a.as_promoter().is_some_and(|b| b.attached))
            .collect();
        if let Some(choice) = promoters.choose(&mut *ctx.rng) {
            self.target = Some(choice.id);
            return Ok(());
        }

        let hot_posts: Vec<&Agent> = nearby
            .iter()
            .copied()
            .filter(|a| a.as_post().is_some_and(|p| p.heat > cfg.hot_post_threshold))
            .collect();
        if let Some(choice) = hot_posts.choose(&mut *ctx.rng) {
            self.target = Some(choice.id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::systems::testing::Fixture;
    use crate::systems::StepOutcome;
    use astroturf_data::{AgentState, AmplifierBot, Position, Post, PromoterBot};

    fn attached_promoter() -> PromoterBot {
        let mut bot = PromoterBot::new(2.0);
        bot.attached = true;
        bot
    }

    #[test]
    fn test_prefers_attached_promoter_over_hot_post() {
        let mut fx = Fixture::new();
        let mut hot = Post::new(5);
        hot.heat = 5.0;
        fx.add(40.0, 50.0, AgentState::Post(hot));
        fx.add(60.0, 50.0, AgentState::PromoterBot(PromoterBot::new(2.0)));
        let promoter = fx.add(50.0, 60.0, AgentState::PromoterBot(attached_promoter()));
        let bot = fx.add(50.0, 50.0, AgentState::AmplifierBot(AmplifierBot::new(1.5)));

        let (agent, _) = fx.step(bot, 0.0);
        assert_eq!(agent.as_amplifier().expect("amplifier").target, Some(promoter));
    }

    #[test]
    fn test_falls_back_to_hot_post_only() {
        let mut fx = Fixture::new();
        fx.add(45.0, 50.0, AgentState::Post(Post::new(5)));
        let mut hot = Post::new(5);
        hot.heat = 2.5;
        let hot_id = fx.add(55.0, 50.0, AgentState::Post(hot));
        let bot = fx.add(50.0, 50.0, AgentState::AmplifierBot(AmplifierBot::new(1.5)));

        let (agent, _) = fx.step(bot, 0.0);
        assert_eq!(agent.as_amplifier().expect("amplifier").target, Some(hot_id));
    }

    #[test]
    fn test_far_target_is_approached_at_full_speed() {
        let mut fx = Fixture::new();
        let promoter = fx.add(50.0, 64.0, AgentState::PromoterBot(attached_promoter()));
        let bot = fx.add(50.0, 50.0, AgentState::AmplifierBot(AmplifierBot::new(1.5)));

        let (agent, _) = fx.step(bot, 0.0);
        assert_eq!(agent.as_amplifier().expect("amplifier").target, Some(promoter));
        assert!((agent.position.y - 51.5).abs() < 1e-12);
        assert!((agent.position.x - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_near_target_is_swarmed_with_jitter() {
        let mut fx = Fixture::new();
        fx.add(50.0, 55.0, AgentState::PromoterBot(attached_promoter()));
        let bot = fx.add(50.0, 50.0, AgentState::AmplifierBot(AmplifierBot::new(1.5)));

        let (agent, _) = fx.step(bot, 0.0);
        // half speed towards the target plus U(-1, 1) per axis
        assert!((agent.position.y - 50.75).abs() <= 1.0);
        assert!((agent.position.x - 50.0).abs() <= 1.0);
    }

    #[test]
    fn test_wanders_when_nothing_to_follow() {
        let mut fx = Fixture::new();
        let bot = fx.add(50.0, 50.0, AgentState::AmplifierBot(AmplifierBot::new(1.5)));
        let (agent, _) = fx.step(bot, 0.0);
        assert_eq!(agent.as_amplifier().expect("amplifier").target, None);
        assert!(agent.position.distance_to(&Position::new(50.0, 50.0)) <= 1.5 * 2.0_f64.sqrt());
    }

    #[test]
    fn test_vanished_target_is_dropped() {
        let mut fx = Fixture::new();
        let mut bot = AmplifierBot::new(1.5);
        bot.target = Some(astroturf_data::AgentId(999));
        let id = fx.add(50.0, 50.0, AgentState::AmplifierBot(bot));
        let (agent, outcome) = fx.step(id, 0.0);
        assert_eq!(agent.as_amplifier().expect("amplifier").target, None);
        assert_eq!(outcome, StepOutcome::Continue);
    }
}
