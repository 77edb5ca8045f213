/// Asserts that every live agent lies inside the world rectangle.
#[macro_export]
macro_rules! assert_in_bounds {
    ($sim:expr) => {
        let (w, h) = ($sim.world().width(), $sim.world().height());
        for agent in $sim.agents() {
            assert!(
                (0.0..=w).contains(&agent.position.x) && (0.0..=h).contains(&agent.position.y),
                "Agent {} at ({}, {}) is outside {}x{}",
                agent.id,
                agent.position.x,
                agent.position.y,
                w,
                h
            );
        }
    };
}

/// Asserts that an agent with the given id is gone from every query.
#[macro_export]
macro_rules! assert_agent_gone {
    ($sim:expr, $id:expr) => {
        assert!($sim.agent($id).is_none(), "Agent {} still registered", $id);
        for kind in astroturf_lib::model::state::AgentKind::ALL {
            assert!(
                $sim.agents_of_kind(kind).iter().all(|a| a.id != $id),
                "Agent {} still listed under {}",
                $id,
                kind
            );
        }
    };
}

/// Asserts the live head count of one kind.
#[macro_export]
macro_rules! assert_count {
    ($sim:expr, $kind:expr, $count:expr) => {
        assert_eq!(
            $sim.count_of($kind),
            $count,
            "{} count mismatch",
            $kind
        );
    };
}
