use crate::config::{BehaviorConfig, VectorConfig};
use crate::habitat::Coord;
use rand::prelude::*;
use rand_distr::Bernoulli;

const HEAT_STEP: f64 = 0.2;
const HEAT_MAX: f64 = 255.0;

/// Stationary food source that the vector may visit.
///
/// While quiet, a visitation countdown runs and on expiry the vector may
/// arrive. While the vector is present, a linger countdown runs and on
/// expiry the source turns quiet again.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodSource {
    location: Coord,
    visible: bool,
    visited_by_vector: bool,
    infected_in_current_step: bool,
    visited_counter: u32,
    linger_counter: u32,
    infection_probability: f64,
    heat: f64,
}

impl FoodSource {
    pub fn new(location: Coord, behavior: &BehaviorConfig, vector: &VectorConfig) -> Self {
        Self {
            location,
            visible: false,
            visited_by_vector: false,
            infected_in_current_step: false,
            visited_counter: behavior.food_wait_time,
            linger_counter: vector.linger_time,
            infection_probability: vector.prob_infection_init,
            heat: 0.0,
        }
    }

    pub fn location(&self) -> Coord {
        self.location
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_visited_by_vector(&self) -> bool {
        self.visited_by_vector
    }

    pub fn infected_in_current_step(&self) -> bool {
        self.infected_in_current_step
    }

    pub fn infection_probability(&self) -> f64 {
        self.infection_probability
    }

    pub fn heat(&self) -> f64 {
        self.heat
    }

    pub fn set_visible(&mut self) {
        self.visible = true;
    }

    pub fn increment_heat(&mut self) {
        self.heat = (self.heat + HEAT_STEP).min(HEAT_MAX);
    }

    /// Raise the vector infection probability by `rate`, capped at 1.
    pub fn ratchet_infection_probability(&mut self, rate: f64) {
        self.infection_probability = (self.infection_probability + rate).min(1.0);
    }

    pub fn mark_infected(&mut self) {
        self.infected_in_current_step = true;
    }

    /// Advance the vector state machine by one step.
    ///
    /// Returns `true` if the vector arrived during this step.
    pub fn step<R: Rng>(
        &mut self,
        rng: &mut R,
        encounter: &Bernoulli,
        behavior: &BehaviorConfig,
        vector: &VectorConfig,
    ) -> bool {
        self.infected_in_current_step = false;

        if self.visited_by_vector {
            self.linger_counter = self.linger_counter.saturating_sub(1);
            if self.linger_counter == 0 {
                self.visited_by_vector = false;
                self.linger_counter = vector.linger_time;
            }
            return false;
        }

        self.visited_counter = self.visited_counter.saturating_sub(1);
        if self.visited_counter > 0 {
            return false;
        }
        self.visited_counter = behavior.food_wait_time;
        self.visited_by_vector = encounter.sample(rng);
        self.visited_by_vector
    }

    #[cfg(test)]
    pub(crate) fn set_visited_by_vector(&mut self, visited: bool) {
        self.visited_by_vector = visited;
    }

    #[cfg(test)]
    pub(crate) fn set_infection_probability(&mut self, prob: f64) {
        self.infection_probability = prob;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use rand_chacha::ChaCha12Rng;

    fn always() -> Bernoulli {
        Bernoulli::new(1.0).unwrap()
    }

    #[test]
    fn vector_arrives_when_visit_countdown_expires() {
        let cfg = test_config();
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let mut food = FoodSource::new(Coord::new(0, 0), &cfg.behavior, &cfg.vector);

        for _ in 0..cfg.behavior.food_wait_time - 1 {
            assert!(!food.step(&mut rng, &always(), &cfg.behavior, &cfg.vector));
        }
        assert!(food.step(&mut rng, &always(), &cfg.behavior, &cfg.vector));
        assert!(food.is_visited_by_vector());
    }

    #[test]
    fn vector_leaves_after_linger_time() {
        let cfg = test_config();
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let mut food = FoodSource::new(Coord::new(0, 0), &cfg.behavior, &cfg.vector);
        food.set_visited_by_vector(true);

        for _ in 0..cfg.vector.linger_time - 1 {
            food.step(&mut rng, &always(), &cfg.behavior, &cfg.vector);
            assert!(food.is_visited_by_vector());
        }
        food.step(&mut rng, &always(), &cfg.behavior, &cfg.vector);
        assert!(!food.is_visited_by_vector());
    }

    #[test]
    fn step_clears_infection_flag() {
        let cfg = test_config();
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let never = Bernoulli::new(0.0).unwrap();
        let mut food = FoodSource::new(Coord::new(0, 0), &cfg.behavior, &cfg.vector);
        food.mark_infected();
        food.step(&mut rng, &never, &cfg.behavior, &cfg.vector);
        assert!(!food.infected_in_current_step());
    }

    #[test]
    fn heat_and_probability_are_capped() {
        let cfg = test_config();
        let mut food = FoodSource::new(Coord::new(0, 0), &cfg.behavior, &cfg.vector);
        let mut last_heat = food.heat();
        for _ in 0..2000 {
            food.increment_heat();
            assert!(food.heat() >= last_heat);
            last_heat = food.heat();
        }
        assert_eq!(food.heat(), 255.0);

        let mut last_prob = food.infection_probability();
        for _ in 0..100 {
            food.ratchet_infection_probability(0.3);
            assert!(food.infection_probability() >= last_prob);
            last_prob = food.infection_probability();
        }
        assert_eq!(food.infection_probability(), 1.0);
    }
}
