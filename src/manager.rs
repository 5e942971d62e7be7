use crate::analysis::Analyzer;
use crate::config::Config;
use crate::engine::Engine;
use anyhow::{Context, Result};
use glob::glob;
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn create_run(&self) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;

        let mut engine = Engine::generate_initial_condition(self.cfg.clone(), run_idx)
            .context("failed to generate initial condition")?;

        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        engine
            .perform_simulation(self.trajectory_file(run_idx))
            .context("failed to perform simulation")?;

        let summary = engine.summary();
        log::info!("{summary:#?}");
        let contents = toml::to_string_pretty(&summary).context("failed to serialize summary")?;
        let summary_file = self.summary_file(run_idx);
        fs::write(&summary_file, contents)
            .with_context(|| format!("failed to write {summary_file:?}"))?;

        let network = engine.world().network();
        let contents =
            toml::to_string_pretty(&network.report()).context("failed to serialize network")?;
        let network_file = run_dir.join("network.toml");
        fs::write(&network_file, contents)
            .with_context(|| format!("failed to write {network_file:?}"))?;

        let log_file = run_dir.join("interactions.txt");
        let file =
            fs::File::create(&log_file).with_context(|| format!("failed to create {log_file:?}"))?;
        let mut writer = BufWriter::new(file);
        for (a, b) in network.log() {
            writeln!(writer, "{a} {b}").context("failed to write interaction")?;
        }
        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    pub fn analyze_sim(&self) -> Result<()> {
        let mut analyzer = Analyzer::new(self.cfg.clone());

        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            analyzer
                .add_run(self.summary_file(run_idx), self.trajectory_file(run_idx))
                .with_context(|| format!("failed to add run {run_idx}"))?;
        }

        let results_file = self.results_file();
        analyzer
            .save_results(&results_file)
            .context("failed to save results")?;
        log::info!("analyzed {n_runs} runs into {results_file:?}");

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let run_dir = self.run_dir(run_idx);
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }

        let results_file = self.results_file();
        if results_file.exists() {
            fs::remove_file(&results_file)
                .with_context(|| format!("failed to remove {results_file:?}"))?;
            log::info!("removed {results_file:?}");
        }

        Ok(())
    }

    fn count_run_dirs(&self) -> Result<usize> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .count();
        Ok(count)
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn trajectory_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("trajectory.msgpack")
    }

    fn summary_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("summary.toml")
    }

    fn results_file(&self) -> PathBuf {
        self.sim_dir.join("results.toml")
    }
}
