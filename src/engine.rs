use crate::config::Config;
use crate::setup::populate;
use crate::stats::RunSummary;
use crate::world::World;
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rmp_serde::encode;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Aggregate state of the habitat at a saved step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub step: usize,
    pub susceptible: u64,
    pub infected: u64,
    pub recovered: u64,
    pub deceased: u64,
    pub active_groups: usize,
    pub vector_sources: usize,
    /// Food sources where the vector infected a group during the last step.
    pub vector_infections: usize,
}

impl Record {
    pub fn capture(world: &World) -> Self {
        let mut record = Record {
            step: world.step(),
            susceptible: 0,
            infected: 0,
            recovered: 0,
            deceased: 0,
            active_groups: world.n_active_groups(),
            vector_sources: world
                .foods()
                .iter()
                .filter(|f| f.is_visited_by_vector())
                .count(),
            vector_infections: world
                .foods()
                .iter()
                .filter(|f| f.infected_in_current_step())
                .count(),
        };
        for group in world.groups() {
            record.susceptible += group.susceptible() as u64;
            record.infected += group.infected() as u64;
            record.recovered += group.recovered() as u64;
            record.deceased += group.deceased() as u64;
        }
        record
    }
}

/// Simulation engine.
///
/// Holds the configuration and the world of one run, and drives the world
/// step by step while saving periodic records.
pub struct Engine {
    cfg: Config,
    world: World,
}

impl Engine {
    /// Create a new `Engine` for run `run_idx`.
    ///
    /// The run's generator is seeded with the configured seed offset by the
    /// run index, so every run is reproducible on its own.
    pub fn generate_initial_condition(cfg: Config, run_idx: usize) -> Result<Self> {
        let seed = cfg.run.seed.wrapping_add(run_idx as u64);
        let rng = ChaCha12Rng::seed_from_u64(seed);
        let world = populate(&cfg, rng).context("failed to populate habitat")?;
        log::info!("initialized run {run_idx} with seed {seed}");
        Ok(Self { cfg, world })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn summary(&self) -> RunSummary {
        self.world.summary()
    }

    /// Perform the simulation and save the resulting records to a binary file.
    pub fn perform_simulation<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        log::info!("simulating {} steps", self.cfg.n_steps());

        for i_save in 0..self.cfg.run.saves_per_run {
            for _ in 0..self.cfg.run.steps_per_save {
                self.world.tick().context("failed to perform step")?;
            }

            let record = Record::capture(&self.world);
            encode::write(&mut writer, &record).context("failed to serialize record")?;

            let progress = 100.0 * (i_save + 1) as f64 / self.cfg.run.saves_per_run as f64;
            log::info!(
                "completed {progress:06.2}% (infected: {}, active groups: {})",
                record.infected,
                record.active_groups
            );
        }

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }
}
