//! Gorilla group agent.
//!
//! A group is tracked as aggregate compartment counts plus one countdown
//! per infected individual. Everything that touches other entities
//! (movement, dispersal, peer exchange) is driven by the world; this module
//! only mutates the group's own state.

use crate::habitat::FoodId;
use rand::prelude::*;
use rand_distr::Bernoulli;
use std::collections::VecDeque;

/// One individual leaving a group, carrying its disease state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Individual {
    Susceptible,
    /// Infected, with the remaining steps until its fate is resolved.
    Infected(u32),
    Recovered,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Compartment {
    Susceptible,
    Infected,
    Recovered,
}

/// Outcome of resolving expired infections.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub recovered: u32,
    pub deceased: u32,
    pub lead_died: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    home_range: Vec<FoodId>,
    memory: VecDeque<FoodId>,
    memory_len: usize,
    movement_counter: u32,

    susceptible: u32,
    infected: u32,
    recovered: u32,
    deceased: u32,
    infection_timer: Vec<u32>,

    lead_counter: u32,
    active: bool,
}

impl Group {
    /// Create a fully susceptible group.
    ///
    /// `home_range` is fixed for the group's lifetime. `lead_counter` is the
    /// number of deaths until the lead individual dies.
    pub fn new(
        population: u32,
        home_range: Vec<FoodId>,
        memory_len: usize,
        wait_time: u32,
        lead_counter: u32,
    ) -> Self {
        Self {
            home_range,
            memory: VecDeque::with_capacity(memory_len),
            memory_len,
            movement_counter: wait_time,
            susceptible: population,
            infected: 0,
            recovered: 0,
            deceased: 0,
            infection_timer: Vec::with_capacity(population as usize),
            lead_counter,
            active: population > 0,
        }
    }

    pub fn population(&self) -> u32 {
        self.susceptible + self.infected + self.recovered
    }

    pub fn susceptible(&self) -> u32 {
        self.susceptible
    }

    pub fn infected(&self) -> u32 {
        self.infected
    }

    pub fn recovered(&self) -> u32 {
        self.recovered
    }

    pub fn deceased(&self) -> u32 {
        self.deceased
    }

    #[cfg(test)]
    pub fn infection_timer(&self) -> &[u32] {
        &self.infection_timer
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn home_range(&self) -> &[FoodId] {
        &self.home_range
    }

    pub fn memory(&self) -> &VecDeque<FoodId> {
        &self.memory
    }

    #[cfg(test)]
    pub fn lead_counter(&self) -> u32 {
        self.lead_counter
    }

    /// Count down to the next move.
    ///
    /// Returns `true` (and restarts the countdown) when the group moves now.
    pub fn advance_movement(&mut self, wait_time: u32) -> bool {
        self.movement_counter = self.movement_counter.saturating_sub(1);
        if self.movement_counter > 0 {
            return false;
        }
        self.movement_counter = wait_time;
        true
    }

    /// Remember a visited food source, forgetting the oldest one when full.
    pub fn remember(&mut self, food: FoodId) {
        if self.memory_len == 0 {
            return;
        }
        if self.memory.len() >= self.memory_len {
            self.memory.pop_front();
        }
        self.memory.push_back(food);
    }

    pub fn forget_all(&mut self) {
        self.memory.clear();
    }

    /// Run a transmission pass of `n_sources` infectious contacts.
    ///
    /// Each contact tries every individual of the susceptible pool as it
    /// stands when the contact begins; successes shrink the pool at once.
    /// Returns the number of new infections.
    pub fn infect<R: Rng>(
        &mut self,
        rng: &mut R,
        n_sources: u32,
        transmission: &Bernoulli,
        infection_time: u32,
    ) -> u32 {
        let mut n_new = 0;
        for _ in 0..n_sources {
            if self.susceptible == 0 {
                break;
            }
            let pool = self.susceptible;
            for _ in 0..pool {
                if self.susceptible == 0 {
                    break;
                }
                if transmission.sample(rng) {
                    self.susceptible -= 1;
                    self.infected += 1;
                    self.infection_timer.push(infection_time);
                    n_new += 1;
                }
            }
        }
        n_new
    }

    /// Single vector contact at a food source: at most one individual
    /// catches the infection.
    pub fn expose_to_vector<R: Rng>(
        &mut self,
        rng: &mut R,
        exposure: &Bernoulli,
        infection_time: u32,
    ) -> bool {
        self.susceptible > 0 && exposure.sample(rng) && self.seed_infection(infection_time)
    }

    pub fn decrease_infection_timer(&mut self) {
        self.infection_timer
            .iter_mut()
            .for_each(|t| *t = t.saturating_sub(1));
    }

    /// Resolve every infection whose countdown reached zero.
    ///
    /// Each one either recovers or dies. Deaths count down to the lead
    /// individual; `lead_died` is set when that countdown hits zero.
    pub fn resolve_expired<R: Rng>(
        &mut self,
        rng: &mut R,
        recovery: &Bernoulli,
    ) -> Resolution {
        let n_expired = self.infection_timer.iter().filter(|&&t| t == 0).count();
        self.infection_timer.retain(|&t| t > 0);

        let mut res = Resolution::default();
        for _ in 0..n_expired {
            self.infected -= 1;
            if recovery.sample(rng) {
                self.recovered += 1;
                res.recovered += 1;
            } else {
                self.deceased += 1;
                res.deceased += 1;
                if self.lead_counter > 0 {
                    self.lead_counter -= 1;
                    if self.lead_counter == 0 {
                        res.lead_died = true;
                    }
                }
            }
        }
        res
    }

    /// Choose a new lead individual among the current population.
    pub fn roll_lead<R: Rng>(&mut self, rng: &mut R) {
        let population = self.population();
        if population > 0 {
            self.lead_counter = rng.random_range(1..=population);
        }
    }

    /// Remove one individual, picked uniformly among non-empty compartments.
    ///
    /// An infected individual takes the oldest countdown with it.
    pub fn take_individual<R: Rng>(&mut self, rng: &mut R) -> Option<Individual> {
        let choices: Vec<Compartment> = [
            (Compartment::Susceptible, self.susceptible),
            (Compartment::Infected, self.infected),
            (Compartment::Recovered, self.recovered),
        ]
        .into_iter()
        .filter(|&(_, count)| count > 0)
        .map(|(compartment, _)| compartment)
        .collect();

        let individual = match *choices.choose(rng)? {
            Compartment::Susceptible => {
                self.susceptible -= 1;
                Individual::Susceptible
            }
            Compartment::Infected => {
                self.infected -= 1;
                Individual::Infected(self.infection_timer.remove(0))
            }
            Compartment::Recovered => {
                self.recovered -= 1;
                Individual::Recovered
            }
        };
        Some(individual)
    }

    pub fn receive(&mut self, individual: Individual) {
        match individual {
            Individual::Susceptible => self.susceptible += 1,
            Individual::Infected(timer) => {
                self.infected += 1;
                self.infection_timer.push(timer);
            }
            Individual::Recovered => self.recovered += 1,
        }
    }

    /// Mark the group inactive if nobody is left. Inactivity is permanent.
    ///
    /// Returns `true` if the group became inactive now.
    pub fn deactivate_if_empty(&mut self) -> bool {
        if self.active && self.population() == 0 {
            self.active = false;
            return true;
        }
        false
    }

    /// Turn one susceptible individual into an index case.
    pub fn seed_infection(&mut self, infection_time: u32) -> bool {
        if self.susceptible == 0 {
            return false;
        }
        self.susceptible -= 1;
        self.infected += 1;
        self.infection_timer.push(infection_time);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha12Rng;

    fn bernoulli(p: f64) -> Bernoulli {
        Bernoulli::new(p).unwrap()
    }

    fn assert_consistent(group: &Group) {
        assert_eq!(
            group.susceptible() + group.infected() + group.recovered(),
            group.population()
        );
        assert_eq!(group.infected() as usize, group.infection_timer().len());
    }

    #[test]
    fn certain_transmission_infects_whole_pool_once() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let mut group = Group::new(10, vec![], 3, 7, 5);
        let n_new = group.infect(&mut rng, 4, &bernoulli(1.0), 3);
        assert_eq!(n_new, 10);
        assert_eq!(group.susceptible(), 0);
        assert_eq!(group.infection_timer(), &[3; 10]);
        assert_consistent(&group);
    }

    #[test]
    fn single_contact_with_certain_transmission_infects_everyone() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let mut group = Group::new(10, vec![], 3, 7, 5);
        assert_eq!(group.infect(&mut rng, 1, &bernoulli(1.0), 3), 10);
    }

    #[test]
    fn pool_is_counted_once_per_contact() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let mut expected = rng.clone();
        let never = bernoulli(0.0);
        let mut group = Group::new(5, vec![], 3, 7, 5);

        assert_eq!(group.infect(&mut rng, 2, &never, 3), 0);
        for _ in 0..10 {
            assert!(!never.sample(&mut expected));
        }
        assert_eq!(rng, expected);
    }

    #[test]
    fn shrinking_pool_limits_later_trials() {
        let mut rng = ChaCha12Rng::seed_from_u64(8);
        let mut expected = rng.clone();
        let coin = bernoulli(0.5);
        let mut group = Group::new(6, vec![], 3, 7, 5);

        let n_new = group.infect(&mut rng, 2, &coin, 3);

        let mut susceptible = 6;
        for _ in 0..2 {
            let pool = susceptible;
            for _ in 0..pool {
                if susceptible > 0 && coin.sample(&mut expected) {
                    susceptible -= 1;
                }
            }
        }
        assert_eq!(group.susceptible(), susceptible);
        assert_eq!(n_new, 6 - susceptible);
        assert_eq!(rng, expected);
        assert_consistent(&group);
    }

    #[test]
    fn zero_sources_or_pool_is_a_noop() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let mut group = Group::new(5, vec![], 3, 7, 5);
        assert_eq!(group.infect(&mut rng, 0, &bernoulli(1.0), 3), 0);
        group.infect(&mut rng, 1, &bernoulli(1.0), 3);
        assert_eq!(group.infect(&mut rng, 3, &bernoulli(1.0), 3), 0);
        assert_consistent(&group);
    }

    #[test]
    fn expired_infection_recovers() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let mut group = Group::new(10, vec![], 3, 7, 5);
        group.seed_infection(1);
        group.decrease_infection_timer();

        let res = group.resolve_expired(&mut rng, &bernoulli(1.0));
        assert_eq!(
            res,
            Resolution {
                recovered: 1,
                deceased: 0,
                lead_died: false
            }
        );
        assert_eq!(group.infected(), 0);
        assert_eq!(group.recovered(), 1);
        assert_eq!(group.population(), 10);
        assert_consistent(&group);
    }

    #[test]
    fn only_expired_timers_resolve() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let mut group = Group::new(10, vec![], 3, 7, 5);
        group.seed_infection(1);
        group.seed_infection(3);
        group.seed_infection(1);
        group.decrease_infection_timer();

        let res = group.resolve_expired(&mut rng, &bernoulli(0.0));
        assert_eq!(res.deceased, 2);
        assert_eq!(group.infection_timer(), &[2]);
        assert_eq!(group.population(), 8);
        assert_eq!(group.deceased(), 2);
        assert_consistent(&group);
    }

    #[test]
    fn lead_dies_when_counter_reaches_zero() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let mut group = Group::new(10, vec![], 3, 7, 2);
        for _ in 0..3 {
            group.seed_infection(1);
        }
        group.decrease_infection_timer();
        let res = group.resolve_expired(&mut rng, &bernoulli(0.0));
        assert!(res.lead_died);
        assert_eq!(group.lead_counter(), 0);
    }

    #[test]
    fn memory_evicts_oldest() {
        let mut group = Group::new(10, vec![], 2, 7, 5);
        group.remember(FoodId(1));
        group.remember(FoodId(2));
        group.remember(FoodId(3));
        let memory: Vec<_> = group.memory().iter().copied().collect();
        assert_eq!(memory, vec![FoodId(2), FoodId(3)]);
    }

    #[test]
    fn movement_counter_restarts_on_expiry() {
        let mut group = Group::new(10, vec![], 2, 3, 5);
        assert!(!group.advance_movement(3));
        assert!(!group.advance_movement(3));
        assert!(group.advance_movement(3));
        assert!(!group.advance_movement(3));
    }

    #[test]
    fn transfer_keeps_both_groups_consistent() {
        let mut rng = ChaCha12Rng::seed_from_u64(11);
        let mut src = Group::new(6, vec![], 3, 7, 5);
        src.infect(&mut rng, 1, &bernoulli(0.5), 4);
        let mut dst = Group::new(3, vec![], 3, 7, 5);

        while let Some(individual) = src.take_individual(&mut rng) {
            dst.receive(individual);
            assert_consistent(&src);
            assert_consistent(&dst);
        }
        assert_eq!(src.population(), 0);
        assert_eq!(dst.population(), 9);
        assert!(src.deactivate_if_empty());
        assert!(!src.deactivate_if_empty());
        assert!(!src.is_active());
    }
}
