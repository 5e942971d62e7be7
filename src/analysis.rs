use crate::config::Config;
use crate::engine::Record;
use crate::stats::{Accumulator, AccumulatorReport, RunSummary};
use anyhow::{Context, Result};
use rmp_serde::decode;
use serde::{Deserialize, Serialize};
use std::{fs, fs::File, io::BufReader, path::Path};

pub trait Obs {
    fn update(&mut self, summary: &RunSummary, records: &[Record]);
    fn report(&self) -> (&'static str, AccumulatorReport);
}

/// Observable computed from a single number per run.
struct PerRun {
    name: &'static str,
    extract: fn(&RunSummary, &[Record]) -> f64,
    acc: Accumulator,
}

impl PerRun {
    fn new(name: &'static str, extract: fn(&RunSummary, &[Record]) -> f64) -> Self {
        Self {
            name,
            extract,
            acc: Accumulator::new(),
        }
    }
}

impl Obs for PerRun {
    fn update(&mut self, summary: &RunSummary, records: &[Record]) {
        self.acc.add((self.extract)(summary, records));
    }

    fn report(&self) -> (&'static str, AccumulatorReport) {
        (self.name, self.acc.report())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Results {
    pub n_runs: usize,
    pub observables: Vec<ObsReport>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ObsReport {
    pub name: String,
    pub mean: f64,
    pub std_dev: f64,
}

/// Aggregates run summaries and trajectories over all runs of a simulation.
pub struct Analyzer {
    cfg: Config,
    n_runs: usize,
    obs_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        let obs_vec: Vec<Box<dyn Obs>> = vec![
            Box::new(PerRun::new("deceased_ratio", |s, _| s.deceased_ratio)),
            Box::new(PerRun::new("total_infected", |s, _| s.total_infected as f64)),
            Box::new(PerRun::new("total_deceased", |s, _| s.total_deceased as f64)),
            Box::new(PerRun::new("active_groups", |s, _| s.active_groups as f64)),
            Box::new(PerRun::new("n_interactions", |s, _| s.n_interactions as f64)),
            Box::new(PerRun::new("density", |s, _| s.density)),
            Box::new(PerRun::new("peak_infected", |_, r| {
                r.iter().map(|rec| rec.infected).max().unwrap_or(0) as f64
            })),
        ];
        Self {
            cfg,
            n_runs: 0,
            obs_vec,
        }
    }

    /// Add one run from its summary and trajectory files.
    pub fn add_run<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        summary_file: P,
        trajectory_file: Q,
    ) -> Result<()> {
        let summary_file = summary_file.as_ref();
        let contents = fs::read_to_string(summary_file)
            .with_context(|| format!("failed to read {summary_file:?}"))?;
        let summary: RunSummary =
            toml::from_str(&contents).context("failed to deserialize summary")?;

        let trajectory_file = trajectory_file.as_ref();
        let file = File::open(trajectory_file)
            .with_context(|| format!("failed to open {trajectory_file:?}"))?;
        let mut reader = BufReader::new(file);
        let mut records = Vec::with_capacity(self.cfg.run.saves_per_run);
        for _ in 0..self.cfg.run.saves_per_run {
            let record: Record =
                decode::from_read(&mut reader).context("failed to deserialize record")?;
            records.push(record);
        }

        for obs in &mut self.obs_vec {
            obs.update(&summary, &records);
        }
        self.n_runs += 1;

        Ok(())
    }

    pub fn results(&self) -> Results {
        Results {
            n_runs: self.n_runs,
            observables: self
                .obs_vec
                .iter()
                .map(|obs| {
                    let (name, report) = obs.report();
                    ObsReport {
                        name: name.to_string(),
                        mean: report.mean,
                        std_dev: report.std_dev,
                    }
                })
                .collect(),
        }
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let contents =
            toml::to_string_pretty(&self.results()).context("failed to serialize results")?;
        fs::write(file, contents).with_context(|| format!("failed to write {file:?}"))?;
        Ok(())
    }
}
