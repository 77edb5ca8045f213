//! Headless runner: load a configuration, run a fixed number of ticks and
//! export what the collector gathered.

use crate::reporting::DataCollector;
use anyhow::{Context, Result};
use astroturf_core::{MetricsSnapshot, SimConfig, Simulation};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::Path;

pub struct App {
    pub sim: Simulation,
    pub collector: DataCollector,
}

impl App {
    pub fn new(config: SimConfig) -> Result<Self> {
        let sim = Simulation::new(config).context("failed to build simulation")?;
        Ok(Self {
            sim,
            collector: DataCollector::default(),
        })
    }

    /// Reads a configuration file. A missing file yields the defaults.
    pub fn load_config(path: &Path) -> Result<SimConfig> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(SimConfig::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        SimConfig::from_toml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Runs `ticks` ticks, collecting one report row after each.
    pub fn run(&mut self, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            self.sim.tick()?;
            self.collector.collect(&self.sim);
        }
        let snap = self.sim.snapshot();
        tracing::info!(
            ticks = snap.tick,
            promoters = snap.promoter_bots,
            amplifiers = snap.amplifier_bots,
            detected = snap.detection.total_removed(),
            "Run finished"
        );
        Ok(())
    }

    /// Writes the collected rows as CSV to `output`, or stdout.
    pub fn write_report(&self, output: Option<&Path>) -> Result<()> {
        match output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                self.collector.write_csv(BufWriter::new(file))?;
            }
            None => self.collector.write_csv(io::stdout().lock())?,
        }
        Ok(())
    }

    pub fn write_snapshot(&self, path: &Path) -> Result<MetricsSnapshot> {
        let snap = self.sim.snapshot();
        let json = serde_json::to_string_pretty(&snap)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(snap)
    }
}
