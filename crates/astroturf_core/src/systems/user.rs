use super::{count_bots, count_kind, BehaviorLogic, StepContext, StepOutcome};
use crate::error::Result;
use astroturf_data::{AgentId, AgentKind, HumanUser, Position};
use rand::Rng;

impl BehaviorLogic for HumanUser {
    /// Wander, then browse: every tick near a post adds engagement, and the
    /// share of bots around decides whether this browse deceives the user.
    fn step<R: Rng>(
        &mut self,
        me: AgentId,
        position: &mut Position,
        ctx: &mut StepContext<'_, R>,
    ) -> Result<StepOutcome> {
        let cfg = ctx.behavior;
        ctx.wander(me, position, cfg.user_wander)?;

        let neighbors = ctx.neighbors(me, cfg.user_radius)?;
        if count_kind(&neighbors, AgentKind::Post) == 0 {
            return Ok(StepOutcome::Continue);
        }

        self.engagement += 1;
        let bot_ratio = count_bots(&neighbors) as f64 / neighbors.len().max(1) as f64;
        if ctx.chance(bot_ratio * self.trust) {
            self.deceived += 1;
            self.engagement += 2;
            self.trust *= cfg.trust_decay;
        } else {
            self.trust = (self.trust * cfg.trust_growth).min(1.0);
        }
        Ok(StepOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use crate::systems::testing::Fixture;
    use astroturf_data::{AgentState, AmplifierBot, HumanUser, Post};

    #[test]
    fn test_no_posts_means_no_engagement() {
        let mut fx = Fixture::new();
        fx.add(52.0, 50.0, AgentState::AmplifierBot(AmplifierBot::new(0.0)));
        let id = fx.add(50.0, 50.0, AgentState::HumanUser(HumanUser::default()));
        let (agent, _) = fx.step(id, 0.5);
        let user = agent.as_user().expect("user");
        assert_eq!(user.engagement, 0);
        assert_eq!(user.trust, 0.5);
    }

    #[test]
    fn test_post_without_bots_builds_trust() {
        let mut fx = Fixture::new();
        fx.add(50.0, 50.0, AgentState::Post(Post::new(1)));
        let id = fx.add(50.0, 50.0, AgentState::HumanUser(HumanUser::default()));
        let (agent, _) = fx.step(id, 0.5);
        let user = agent.as_user().expect("user");
        assert_eq!(user.engagement, 1);
        assert_eq!(user.deceived, 0);
        assert!((user.trust - 0.505).abs() < 1e-12);
    }

    #[test]
    fn test_bot_heavy_neighborhood_deceives() {
        let mut fx = Fixture::new();
        fx.add(50.0, 50.0, AgentState::Post(Post::new(1)));
        for i in 0..200 {
            fx.add(
                49.0 + f64::from(i % 10) * 0.2,
                49.0 + f64::from(i / 10) * 0.1,
                AgentState::AmplifierBot(AmplifierBot::new(0.0)),
            );
        }
        let id = fx.add(50.0, 50.0, AgentState::HumanUser(HumanUser::new(1.0)));
        let (agent, _) = fx.step(id, 0.5);
        let user = agent.as_user().expect("user");
        // p_deceive = 200/201: a deceived browse counts three engagements
        assert_eq!(user.engagement, 1 + 2 * user.deceived);
        if user.deceived == 1 {
            assert!((user.trust - 0.95).abs() < 1e-12);
        }
    }

    #[test]
    fn test_trust_stays_in_unit_interval() {
        let mut fx = Fixture::new();
        fx.add(50.0, 50.0, AgentState::Post(Post::new(1)));
        let id = fx.add(50.0, 50.0, AgentState::HumanUser(HumanUser::new(0.99)));
        for _ in 0..200 {
            let (agent, _) = fx.step(id, 0.5);
            let trust = agent.as_user().expect("user").trust;
            assert!((0.0..=1.0).contains(&trust));
        }
    }
}
