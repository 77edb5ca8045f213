//! Tick metrics and structured logging for the simulation.

use astroturf_data::AgentKind;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Running counters of simulation progress.
pub struct TickMetrics {
    tick_count: AtomicU64,
    agent_count: AtomicU64,
    bot_count: AtomicU64,
    removed_total: AtomicU64,
    log_every: u64,
    start_time: Instant,
}

impl Default for TickMetrics {
    fn default() -> Self {
        Self::new(100)
    }
}

impl TickMetrics {
    /// Creates a collector that logs a summary every `log_every` ticks.
    #[must_use]
    pub fn new(log_every: u64) -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            agent_count: AtomicU64::new(0),
            bot_count: AtomicU64::new(0),
            removed_total: AtomicU64::new(0),
            log_every: log_every.max(1),
            start_time: Instant::now(),
        }
    }

    /// Records a completed tick with its duration.
    pub fn record_tick(&self, duration: Duration, counts: [usize; 4], removed: usize) {
        let agents: usize = counts.iter().sum();
        let bots = counts[AgentKind::PromoterBot.index()] + counts[AgentKind::AmplifierBot.index()];
        let tick = self.tick_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.agent_count.store(agents as u64, Ordering::Relaxed);
        self.bot_count.store(bots as u64, Ordering::Relaxed);
        self.removed_total
            .fetch_add(removed as u64, Ordering::Relaxed);

        if tick % self.log_every == 0 {
            tracing::info!(
                tick = tick,
                agents = agents,
                promoters = counts[AgentKind::PromoterBot.index()],
                amplifiers = counts[AgentKind::AmplifierBot.index()],
                removed_total = self.removed_total(),
                duration_us = duration.as_micros() as u64,
                "Simulation tick"
            );
        }
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn agent_count(&self) -> u64 {
        self.agent_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn bot_count(&self) -> u64 {
        self.bot_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn removed_total(&self) -> u64 {
        self.removed_total.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Initialize tracing subscriber for logging.
pub fn init_logging() {
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(tracing::Level::INFO)
            .finish(),
    )
    .ok();
}
