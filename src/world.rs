//! Entity arena and per-step driver.
//!
//! The world owns every food source and group, the habitat holding their
//! positions, the interaction network and the run's random number
//! generator. Entities only refer to each other through ids.

use crate::config::Config;
use crate::food::FoodSource;
use crate::group::Group;
use crate::habitat::{Coord, FoodId, GroupId, Habitat, Occupant};
use crate::network::InteractionNetwork;
use crate::stats::{RunSummary, Tally, density};
use crate::utils::inverse_distance_weights;
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Bernoulli, weighted::WeightedIndex};

/// Fixed-probability trials of a run.
#[derive(Debug, Clone)]
struct Dists {
    transmission: Bernoulli,
    recovery: Bernoulli,
    dispersal: Bernoulli,
    encounter: Bernoulli,
}

impl Dists {
    fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            transmission: Bernoulli::new(cfg.disease.prob_transmission)
                .context("invalid transmission probability")?,
            recovery: Bernoulli::new(cfg.disease.prob_recovery)
                .context("invalid recovery probability")?,
            dispersal: Bernoulli::new(cfg.disease.prob_dispersal)
                .context("invalid dispersal probability")?,
            encounter: Bernoulli::new(cfg.vector.prob_encounter)
                .context("invalid vector encounter probability")?,
        })
    }
}

pub struct World {
    cfg: Config,
    habitat: Habitat,
    foods: Vec<FoodSource>,
    groups: Vec<Group>,
    network: InteractionNetwork,
    tally: Tally,
    initial_population: u64,
    rng: ChaCha12Rng,
    dists: Dists,
    step: usize,
}

impl World {
    /// Assemble a world from already placed entities.
    ///
    /// Every group and food source must have a position in `habitat`.
    pub fn from_parts(
        cfg: Config,
        habitat: Habitat,
        foods: Vec<FoodSource>,
        groups: Vec<Group>,
        rng: ChaCha12Rng,
    ) -> Result<Self> {
        let dists = Dists::new(&cfg)?;
        let initial_population = groups.iter().map(|g| g.population() as u64).sum();
        let network = InteractionNetwork::new(groups.len());
        Ok(Self {
            cfg,
            habitat,
            foods,
            groups,
            network,
            tally: Tally::default(),
            initial_population,
            rng,
            dists,
            step: 0,
        })
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn foods(&self) -> &[FoodSource] {
        &self.foods
    }

    pub fn network(&self) -> &InteractionNetwork {
        &self.network
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn location_of_group(&self, id: GroupId) -> Option<Coord> {
        self.habitat.location_of(Occupant::Group(id))
    }

    pub fn n_active_groups(&self) -> usize {
        self.groups.iter().filter(|g| g.is_active()).count()
    }

    /// Infect one susceptible individual in each of `n` distinct groups.
    pub fn seed_index_cases(&mut self, n: usize) {
        let infection_time = self.cfg.disease.infection_time;
        let ids: Vec<usize> = (0..self.groups.len())
            .collect::<Vec<_>>()
            .choose_multiple(&mut self.rng, n)
            .copied()
            .collect();
        for idx in ids {
            if self.groups[idx].seed_infection(infection_time) {
                self.tally.total_infected += 1;
                log::debug!("seeded index case in {}", GroupId(idx));
            }
        }
    }

    /// Advance every food source, then every group, by one step.
    pub fn tick(&mut self) -> Result<()> {
        for idx in 0..self.foods.len() {
            self.step_food(FoodId(idx));
        }
        for idx in 0..self.groups.len() {
            self.step_group(GroupId(idx))
                .with_context(|| format!("failed to step {}", GroupId(idx)))?;
        }
        self.step += 1;
        Ok(())
    }

    fn step_food(&mut self, id: FoodId) {
        let food = &mut self.foods[id.0];
        if food.step(
            &mut self.rng,
            &self.dists.encounter,
            &self.cfg.behavior,
            &self.cfg.vector,
        ) {
            log::debug!("vector arrived at {id} {:?}", food.location());
        }
    }

    pub fn step_group(&mut self, id: GroupId) -> Result<()> {
        let wait_time = self.cfg.behavior.food_wait_time;
        let group = &mut self.groups[id.0];
        if !group.is_active() || !group.advance_movement(wait_time) {
            return Ok(());
        }
        self.move_group(id)
    }

    fn move_group(&mut self, id: GroupId) -> Result<()> {
        let infection_time = self.cfg.disease.infection_time;

        let food_id = self
            .choose_food_source(id)
            .context("failed to choose food source")?;
        if let Some(food_id) = food_id {
            let dest = self.foods[food_id.0].location();
            self.habitat.relocate(Occupant::Group(id), dest);
        }

        let group = &mut self.groups[id.0];
        let n_own = group.infected();
        let mut n_new = group.infect(
            &mut self.rng,
            n_own,
            &self.dists.transmission,
            infection_time,
        );

        if let Some(food_id) = food_id {
            let food = &mut self.foods[food_id.0];
            if food.is_visited_by_vector() {
                let exposure = Bernoulli::new(food.infection_probability())
                    .context("invalid vector infection probability")?;
                if group.expose_to_vector(&mut self.rng, &exposure, infection_time) {
                    food.mark_infected();
                    n_new += 1;
                }
                food.ratchet_infection_probability(self.cfg.vector.infection_rate);
            }
        }

        group.decrease_infection_timer();
        let res = group.resolve_expired(&mut self.rng, &self.dists.recovery);

        self.tally.total_infected += n_new as u64;
        self.tally.total_recovered += res.recovered as u64;
        self.tally.total_deceased += res.deceased as u64;

        if res.lead_died {
            log::debug!("lead individual of {id} died at step {}", self.step);
            self.disperse(id).context("failed to disperse group")?;
            self.groups[id.0].roll_lead(&mut self.rng);
        }

        self.interact(id);

        if self.groups[id.0].deactivate_if_empty() {
            log::debug!("{id} became inactive at step {}", self.step);
        }
        Ok(())
    }

    fn food_candidates(&self, id: GroupId, here: Coord) -> Vec<FoodId> {
        let group = &self.groups[id.0];
        group
            .home_range()
            .iter()
            .copied()
            .filter(|&f| self.foods[f.0].location() != here && !group.memory().contains(&f))
            .collect()
    }

    /// Pick the next food source of a group by inverse distance, skipping
    /// its current location and the sources it remembers.
    ///
    /// With a single food source in the home range it is returned directly
    /// without drawing a random number.
    pub fn choose_food_source(&mut self, id: GroupId) -> Result<Option<FoodId>> {
        let home_range = self.groups[id.0].home_range();
        if home_range.len() <= 1 {
            return Ok(home_range.first().copied());
        }
        let fallback = home_range[0];

        let Some(here) = self.location_of_group(id) else {
            return Ok(None);
        };
        let mut candidates = self.food_candidates(id, here);
        if candidates.is_empty() {
            self.groups[id.0].forget_all();
            candidates = self.food_candidates(id, here);
        }
        if candidates.is_empty() {
            return Ok(Some(fallback));
        }

        let coords: Vec<Coord> = candidates
            .iter()
            .map(|f| self.foods[f.0].location())
            .collect();
        let weights = inverse_distance_weights(here, &coords);
        let food_dist = WeightedIndex::new(&weights)?;
        let chosen = candidates[food_dist.sample(&mut self.rng)];

        self.groups[id.0].remember(chosen);
        self.foods[chosen.0].increment_heat();
        Ok(Some(chosen))
    }

    /// Spread the remaining individuals of a group over other active groups.
    ///
    /// Each other active group accepts with the dispersal probability.
    /// Individuals pick among the accepting groups by inverse distance.
    /// Returns `false` if no group accepted.
    pub fn disperse(&mut self, id: GroupId) -> Result<bool> {
        let Some(origin) = self.location_of_group(id) else {
            return Ok(false);
        };

        let mut targets = Vec::new();
        let mut coords = Vec::new();
        for (idx, other) in self.groups.iter().enumerate() {
            if idx == id.0 || !other.is_active() {
                continue;
            }
            if !self.dists.dispersal.sample(&mut self.rng) {
                continue;
            }
            if let Some(coord) = self.habitat.location_of(Occupant::Group(GroupId(idx))) {
                targets.push(GroupId(idx));
                coords.push(coord);
            }
        }

        if targets.is_empty() {
            log::debug!("dispersal of {id} failed: no accepting group");
            return Ok(false);
        }

        let weights = inverse_distance_weights(origin, &coords);
        let target_dist = WeightedIndex::new(&weights)?;
        let population = self.groups[id.0].population();
        let destinations: Vec<GroupId> = (0..population)
            .map(|_| targets[target_dist.sample(&mut self.rng)])
            .collect();

        for &dest in &destinations {
            let Some(individual) = self.groups[id.0].take_individual(&mut self.rng) else {
                break;
            };
            self.groups[dest.0].receive(individual);
        }
        log::debug!(
            "dispersed {} individuals of {id} over {} groups",
            destinations.len(),
            targets.len()
        );
        Ok(true)
    }

    /// Exchange disease with every other active group at the same location
    /// and count the interaction.
    ///
    /// Both directions use the infected counts from before the exchange.
    fn interact(&mut self, id: GroupId) {
        let infection_time = self.cfg.disease.infection_time;
        let Some(here) = self.location_of_group(id) else {
            return;
        };
        let others: Vec<GroupId> = self
            .habitat
            .occupants_at(here)
            .iter()
            .filter_map(|occ| occ.group())
            .filter(|&other| other != id && self.groups[other.0].is_active())
            .collect();

        for other in others {
            let n_self = self.groups[id.0].infected();
            let n_other = self.groups[other.0].infected();
            let n_new_other = self.groups[other.0].infect(
                &mut self.rng,
                n_self,
                &self.dists.transmission,
                infection_time,
            );
            let n_new_self = self.groups[id.0].infect(
                &mut self.rng,
                n_other,
                &self.dists.transmission,
                infection_time,
            );
            self.tally.total_infected += (n_new_other + n_new_self) as u64;
            self.network.record(id, other);
        }
    }

    pub fn summary(&self) -> RunSummary {
        let hab = &self.cfg.habitat;
        let deceased_ratio = if self.initial_population > 0 {
            self.tally.total_deceased as f64 / self.initial_population as f64
        } else {
            0.0
        };
        RunSummary {
            n_steps: self.step,
            initial_population: self.initial_population,
            initial_groups: self.groups.len(),
            n_food_sources: self.foods.len(),
            n_visible_food_sources: self.foods.iter().filter(|f| f.is_visible()).count(),
            max_heat: self.foods.iter().map(|f| f.heat()).fold(0.0, f64::max),
            food_spread_area: self.cfg.food_area(),
            density: density(
                self.initial_population,
                hab.food_spread,
                hab.cell_side_length,
            ),
            total_infected: self.tally.total_infected,
            total_recovered: self.tally.total_recovered,
            total_deceased: self.tally.total_deceased,
            deceased_ratio,
            active_groups: self.n_active_groups(),
            n_interactions: self.network.log().len(),
        }
    }
}
