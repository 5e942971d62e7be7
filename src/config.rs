use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub habitat: HabitatConfig,
    pub behavior: BehaviorConfig,
    pub vector: VectorConfig,
    pub disease: DiseaseConfig,
    pub run: RunConfig,
}

/// Layout of the habitat and its initial population.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct HabitatConfig {
    /// Number of gorilla groups.
    pub n_groups: usize,
    /// Number of food sources.
    pub n_food_sources: usize,
    /// Food sources are placed in a `(2n + 1)^2` square around the center.
    pub food_spread: usize,
    /// Minimum number of individuals per group.
    pub min_population: u32,
    /// Maximum number of individuals per group (exclusive).
    pub max_population: u32,
    /// Radius of the square home range around a group's starting point.
    pub home_range_radius: usize,
    /// Side of a grid cell in metres. Only used to compute the density.
    pub cell_side_length: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Steps a group stays at a food source before moving on.
    pub food_wait_time: u32,
    /// Number of recently visited food sources a group avoids.
    pub memory_len: usize,
}

/// Parameters of the secondary vector (chimpanzee visits).
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    /// Probability that the vector arrives at a quiet food source.
    pub prob_encounter: f64,
    /// Steps the vector lingers at a food source.
    pub linger_time: u32,
    /// Initial probability that a vector-visited food source infects a group.
    pub prob_infection_init: f64,
    /// Increase of a food source's infection probability after each exposure.
    pub infection_rate: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DiseaseConfig {
    /// Probability of transmission between two individuals.
    pub prob_transmission: f64,
    /// Probability that an infected individual recovers instead of dying.
    pub prob_recovery: f64,
    /// Number of moves until an infection resolves.
    pub infection_time: u32,
    /// Probability that another group accepts individuals of a dispersing group.
    pub prob_dispersal: f64,
    /// Number of groups seeded with one infected individual.
    pub n_index_cases: usize,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seed of the run's random number generator (offset by the run index).
    pub seed: u64,
    /// Number of steps between saved records.
    pub steps_per_save: usize,
    /// Number of saved records per run.
    pub saves_per_run: usize,
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid. Invalid values
    /// surface as a [`ConfigError`] in the error chain.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Total number of steps of a run.
    pub fn n_steps(&self) -> usize {
        self.run.steps_per_save * self.run.saves_per_run
    }

    /// Side length of the (square) habitat grid.
    pub fn grid_side(&self) -> usize {
        3 * self.habitat.food_spread
    }

    /// Number of cells food sources can be placed in.
    pub fn food_area(&self) -> usize {
        (2 * self.habitat.food_spread + 1).pow(2)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let hab = &self.habitat;
        check_num("n_groups", hab.n_groups, 1..100_000)?;
        check_num("n_food_sources", hab.n_food_sources, 1..1_000_000)?;
        check_num("food_spread", hab.food_spread, 1..10_000)?;
        check_num("min_population", hab.min_population, 1..100_000)?;
        check_num(
            "max_population",
            hab.max_population,
            hab.min_population + 1..100_001,
        )?;
        check_num("home_range_radius", hab.home_range_radius, 0..10_000)?;
        check_num("cell_side_length", hab.cell_side_length, 1e-3..1e6)?;

        check_num("food_wait_time", self.behavior.food_wait_time, 1..10_000)?;
        check_num("memory_len", self.behavior.memory_len, 0..10_000)?;

        let vec = &self.vector;
        check_num("prob_encounter", vec.prob_encounter, 0.0..=1.0)?;
        check_num("linger_time", vec.linger_time, 1..10_000)?;
        check_num("prob_infection_init", vec.prob_infection_init, 0.0..=1.0)?;
        check_num("infection_rate", vec.infection_rate, 0.0..=1.0)?;

        let dis = &self.disease;
        check_num("prob_transmission", dis.prob_transmission, 0.0..=1.0)?;
        check_num("prob_recovery", dis.prob_recovery, 0.0..=1.0)?;
        check_num("infection_time", dis.infection_time, 1..10_000)?;
        check_num("prob_dispersal", dis.prob_dispersal, 0.0..=1.0)?;
        check_num("n_index_cases", dis.n_index_cases, 0..100_000)?;

        check_num("steps_per_save", self.run.steps_per_save, 1..100_000)?;
        check_num("saves_per_run", self.run.saves_per_run, 1..100_000)?;

        self.check_feasibility()
    }

    /// Check that the habitat can actually be populated as configured.
    pub fn check_feasibility(&self) -> Result<(), ConfigError> {
        let hab = &self.habitat;
        let area = self.food_area();
        if hab.n_food_sources > area {
            return Err(ConfigError::FoodAreaExceeded {
                n_food_sources: hab.n_food_sources,
                area,
            });
        }
        if hab.n_groups > hab.n_food_sources {
            return Err(ConfigError::NotEnoughFoodSources {
                n_groups: hab.n_groups,
                n_food_sources: hab.n_food_sources,
            });
        }
        if self.disease.n_index_cases > hab.n_groups {
            return Err(ConfigError::TooManyIndexCases {
                n_index_cases: self.disease.n_index_cases,
                n_groups: hab.n_groups,
            });
        }
        Ok(())
    }
}

fn check_num<T, R>(name: &'static str, num: T, range: R) -> Result<(), ConfigError>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        return Err(ConfigError::OutOfRange {
            name,
            range: format!("{range:?}"),
            value: format!("{num:?}"),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        habitat: HabitatConfig {
            n_groups: 6,
            n_food_sources: 30,
            food_spread: 4,
            min_population: 8,
            max_population: 17,
            home_range_radius: 2,
            cell_side_length: 100.0,
        },
        behavior: BehaviorConfig {
            food_wait_time: 2,
            memory_len: 3,
        },
        vector: VectorConfig {
            prob_encounter: 0.05,
            linger_time: 3,
            prob_infection_init: 0.2,
            infection_rate: 0.05,
        },
        disease: DiseaseConfig {
            prob_transmission: 0.1,
            prob_recovery: 0.5,
            infection_time: 3,
            prob_dispersal: 0.5,
            n_index_cases: 1,
        },
        run: RunConfig {
            seed: 10_000,
            steps_per_save: 7,
            saves_per_run: 8,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_test_config_is_valid() {
        assert_eq!(test_config().validate(), Ok(()));
    }

    #[test]
    fn rejects_probability_above_one() {
        let mut cfg = test_config();
        cfg.disease.prob_recovery = 1.5;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange {
                name: "prob_recovery",
                ..
            })
        ));
    }

    #[test]
    fn rejects_empty_population_range() {
        let mut cfg = test_config();
        cfg.habitat.max_population = cfg.habitat.min_population;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_more_food_than_area() {
        let mut cfg = test_config();
        cfg.habitat.n_food_sources = 82;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::FoodAreaExceeded {
                n_food_sources: 82,
                area: 81
            })
        );
    }

    #[test]
    fn rejects_more_groups_than_food() {
        let mut cfg = test_config();
        cfg.habitat.n_groups = 31;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NotEnoughFoodSources {
                n_groups: 31,
                n_food_sources: 30
            })
        );
    }

    #[test]
    fn parses_toml() {
        let cfg = test_config();
        let text = toml::to_string(&cfg).expect("failed to serialize config");
        let parsed: Config = toml::from_str(&text).expect("failed to parse config");
        assert_eq!(parsed, cfg);
    }
}
