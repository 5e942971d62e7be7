use serde::{Deserialize, Serialize};

/// Running totals of disease events over a whole run.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub total_infected: u64,
    pub total_recovered: u64,
    pub total_deceased: u64,
}

/// Summary of a finished run, written as `summary.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub n_steps: usize,
    pub initial_population: u64,
    pub initial_groups: usize,
    pub n_food_sources: usize,
    pub n_visible_food_sources: usize,
    /// Highest visitation heat over all food sources.
    pub max_heat: f64,
    pub food_spread_area: usize,
    /// Individuals per km^2 at the start of the run.
    pub density: f64,
    pub total_infected: u64,
    pub total_recovered: u64,
    pub total_deceased: u64,
    pub deceased_ratio: f64,
    pub active_groups: usize,
    pub n_interactions: usize,
}

/// Initial population per km^2 of the food spread square.
pub fn density(initial_population: u64, food_spread: usize, cell_side_length: f64) -> f64 {
    let side_km = ((2 * food_spread + 1) as f64 * cell_side_length) / 1000.0;
    initial_population as f64 / side_km.powi(2)
}

/// Streaming mean and standard deviation (Welford).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_matches_sample_statistics() {
        let mut acc = Accumulator::new();
        for val in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            acc.add(val);
        }
        let report = acc.report();
        assert!((report.mean - 5.0).abs() < 1e-12);
        assert!((report.std_dev - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_value_has_no_spread() {
        let mut acc = Accumulator::new();
        acc.add(1.5);
        assert_eq!(acc.report().mean, 1.5);
        assert!(acc.report().std_dev.is_nan());
    }

    #[test]
    fn density_per_square_km() {
        // 21 cells of 100 m give a 2.1 km side.
        let dens = density(441, 10, 100.0);
        assert!((dens - 100.0).abs() < 1e-9);
    }
}
