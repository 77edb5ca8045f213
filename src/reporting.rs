//! Pull-based metric reporters and a per-tick data collector.
//!
//! Reporters are plain functions of the simulation state. The core never
//! calls them; a [`DataCollector`] evaluates every reporter when its owner
//! asks it to, usually right after each tick.

use astroturf_core::Simulation;
use astroturf_data::AgentKind;
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Reporter '{0}' is already registered")]
    DuplicateReporter(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// A named scalar observation of the simulation.
pub trait Reporter {
    fn report(&self, sim: &Simulation) -> f64;
}

impl<F> Reporter for F
where
    F: Fn(&Simulation) -> f64,
{
    fn report(&self, sim: &Simulation) -> f64 {
        self(sim)
    }
}

pub const ACTIVE_PROMOTER_BOTS: &str = "Active Promoter Bots";
pub const ACTIVE_AMPLIFIER_BOTS: &str = "Active Amplifier Bots";
pub const USER_ENGAGEMENT: &str = "User Engagement";
pub const USER_DECEPTION: &str = "User Deception";
pub const AVERAGE_POST_HEAT: &str = "Average Post Heat";
pub const DETECTED_BOTS: &str = "Detected Bots";

/// Reporters in registration order.
#[derive(Default)]
pub struct ReporterSet {
    entries: Vec<(String, Box<dyn Reporter>)>,
}

impl ReporterSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bot head counts, user engagement and deception, post heat and total
    /// detections.
    #[must_use]
    pub fn standard() -> Self {
        let mut set = Self::new();
        let standard: [(&str, fn(&Simulation) -> f64); 6] = [
            (ACTIVE_PROMOTER_BOTS, |sim| {
                sim.count_of(AgentKind::PromoterBot) as f64
            }),
            (ACTIVE_AMPLIFIER_BOTS, |sim| {
                sim.count_of(AgentKind::AmplifierBot) as f64
            }),
            (USER_ENGAGEMENT, |sim| sim.snapshot().total_engagement as f64),
            (USER_DECEPTION, |sim| sim.snapshot().total_deceived as f64),
            (AVERAGE_POST_HEAT, |sim| sim.snapshot().average_post_heat),
            (DETECTED_BOTS, |sim| {
                sim.detection_stats().total_removed() as f64
            }),
        ];
        for (name, reporter) in standard {
            set.entries.push((name.to_string(), Box::new(reporter)));
        }
        set
    }

    pub fn add<R>(&mut self, name: impl Into<String>, reporter: R) -> Result<()>
    where
        R: Reporter + 'static,
    {
        let name = name.into();
        if self.entries.iter().any(|(n, _)| *n == name) {
            return Err(ReportError::DuplicateReporter(name));
        }
        self.entries.push((name, Box::new(reporter)));
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn evaluate(&self, sim: &Simulation) -> Vec<f64> {
        self.entries.iter().map(|(_, r)| r.report(sim)).collect()
    }
}

/// One collected row: the tick it was taken after and one value per
/// reporter, in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub tick: u64,
    pub values: Vec<f64>,
}

pub struct DataCollector {
    reporters: ReporterSet,
    rows: Vec<ReportRow>,
}

impl Default for DataCollector {
    fn default() -> Self {
        Self::new(ReporterSet::standard())
    }
}

impl DataCollector {
    #[must_use]
    pub fn new(reporters: ReporterSet) -> Self {
        Self {
            reporters,
            rows: Vec::new(),
        }
    }

    pub fn collect(&mut self, sim: &Simulation) {
        self.rows.push(ReportRow {
            tick: sim.tick_count(),
            values: self.reporters.evaluate(sim),
        });
    }

    #[must_use]
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    #[must_use]
    pub fn reporters(&self) -> &ReporterSet {
        &self.reporters
    }

    /// Every collected value of one reporter, oldest first.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.reporters.names().position(|n| n == name)?;
        Some(self.rows.iter().map(|row| row.values[idx]).collect())
    }

    /// Writes a header line and one line per row. Names containing commas
    /// or quotes are quoted.
    pub fn write_csv<W: Write>(&self, mut out: W) -> Result<()> {
        let header: Vec<String> = std::iter::once("tick")
            .chain(self.reporters.names())
            .map(csv_field)
            .collect();
        writeln!(out, "{}", header.join(","))?;
        for row in &self.rows {
            let mut line = row.tick.to_string();
            for value in &row.values {
                line.push(',');
                line.push_str(&value.to_string());
            }
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn write_json<W: Write>(&self, out: W) -> Result<()> {
        serde_json::to_writer_pretty(out, &self.rows)?;
        Ok(())
    }
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
