//! Habitat initialization: food placement, group allocation and index cases.

use crate::config::Config;
use crate::error::ConfigError;
use crate::food::FoodSource;
use crate::group::Group;
use crate::habitat::{Coord, FoodId, GroupId, Habitat, Occupant};
use crate::world::World;
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;

/// Build the initial world of a run from its configuration.
///
/// # Errors
/// Fails with a [`ConfigError`] if the habitat cannot be populated as
/// configured. No step is taken before this check.
pub fn populate(cfg: &Config, mut rng: ChaCha12Rng) -> Result<World> {
    cfg.check_feasibility()
        .context("infeasible habitat configuration")?;

    let side = cfg.grid_side();
    let mut habitat = Habitat::new(side, side);

    let mut foods = place_food_sources(cfg, &mut habitat, &mut rng)?;
    let groups = place_groups(cfg, &mut habitat, &mut foods, &mut rng)?;

    let mut world = World::from_parts(cfg.clone(), habitat, foods, groups, rng)?;
    world.seed_index_cases(cfg.disease.n_index_cases);

    log::info!(
        "populated {} food sources and {} groups ({} individuals)",
        world.foods().len(),
        world.groups().len(),
        world.summary().initial_population
    );
    Ok(world)
}

/// Scatter food sources over distinct cells around the grid center.
pub fn place_food_sources<R: Rng>(
    cfg: &Config,
    habitat: &mut Habitat,
    rng: &mut R,
) -> Result<Vec<FoodSource>, ConfigError> {
    let n_food_sources = cfg.habitat.n_food_sources;
    let area = cfg.food_area();
    if n_food_sources > area {
        return Err(ConfigError::FoodAreaExceeded {
            n_food_sources,
            area,
        });
    }

    let spread = cfg.habitat.food_spread as i32;
    let center = Coord::new(habitat.width() / 2, habitat.height() / 2);

    let mut foods = Vec::with_capacity(n_food_sources);
    for idx in 0..n_food_sources {
        let coord = loop {
            let coord = Coord::new(
                center.x + rng.random_range(-spread..=spread),
                center.y + rng.random_range(-spread..=spread),
            );
            if habitat.contains(coord) && habitat.is_vacant(coord) {
                break coord;
            }
        };
        habitat.relocate(Occupant::Food(FoodId(idx)), coord);
        foods.push(FoodSource::new(coord, &cfg.behavior, &cfg.vector));
    }
    Ok(foods)
}

/// Give every group a distinct starting food source, a random population
/// and the food sources of its home range.
pub fn place_groups<R: Rng>(
    cfg: &Config,
    habitat: &mut Habitat,
    foods: &mut [FoodSource],
    rng: &mut R,
) -> Result<Vec<Group>, ConfigError> {
    let hab = &cfg.habitat;
    if hab.n_groups > foods.len() {
        return Err(ConfigError::NotEnoughFoodSources {
            n_groups: hab.n_groups,
            n_food_sources: foods.len(),
        });
    }

    let mut starts: Vec<FoodId> = (0..foods.len()).map(FoodId).collect();
    starts.shuffle(rng);

    let mut groups = Vec::with_capacity(hab.n_groups);
    for (idx, &start) in starts.iter().take(hab.n_groups).enumerate() {
        let center = foods[start.0].location();
        let population = rng.random_range(hab.min_population..hab.max_population);

        let home_range: Vec<FoodId> = habitat
            .neighbors_within_radius(center, hab.home_range_radius)
            .into_iter()
            .filter_map(Occupant::food)
            .collect();
        for &food in &home_range {
            foods[food.0].set_visible();
        }

        let lead_counter = rng.random_range(1..=population);
        let mut group = Group::new(
            population,
            home_range,
            cfg.behavior.memory_len,
            cfg.behavior.food_wait_time,
            lead_counter,
        );
        group.remember(start);

        habitat.relocate(Occupant::Group(GroupId(idx)), center);
        groups.push(group);
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use std::collections::HashSet;

    #[test]
    fn food_sources_get_distinct_cells_within_spread() {
        let cfg = test_config();
        let mut rng = ChaCha12Rng::seed_from_u64(9);
        let side = cfg.grid_side();
        let mut habitat = Habitat::new(side, side);
        let foods = place_food_sources(&cfg, &mut habitat, &mut rng).expect("failed to place");

        let cells: HashSet<Coord> = foods.iter().map(|f| f.location()).collect();
        assert_eq!(cells.len(), cfg.habitat.n_food_sources);
        let center = (side / 2) as i32;
        let spread = cfg.habitat.food_spread as i32;
        for cell in cells {
            assert!((cell.x - center).abs() <= spread);
            assert!((cell.y - center).abs() <= spread);
        }
    }

    #[test]
    fn full_spread_area_can_be_filled() {
        let mut cfg = test_config();
        cfg.habitat.food_spread = 2;
        cfg.habitat.n_food_sources = 25;
        let mut rng = ChaCha12Rng::seed_from_u64(9);
        let mut habitat = Habitat::new(cfg.grid_side(), cfg.grid_side());
        let foods = place_food_sources(&cfg, &mut habitat, &mut rng).expect("failed to place");
        assert_eq!(foods.len(), 25);
    }

    #[test]
    fn too_many_food_sources_is_a_config_error() {
        let mut cfg = test_config();
        cfg.habitat.n_food_sources = 200;
        let mut rng = ChaCha12Rng::seed_from_u64(9);
        let mut habitat = Habitat::new(cfg.grid_side(), cfg.grid_side());
        assert_eq!(
            place_food_sources(&cfg, &mut habitat, &mut rng).err(),
            Some(ConfigError::FoodAreaExceeded {
                n_food_sources: 200,
                area: 81
            })
        );
    }

    #[test]
    fn too_many_groups_aborts_populate() {
        let mut cfg = test_config();
        cfg.habitat.n_groups = 40;
        let err = match populate(&cfg, ChaCha12Rng::seed_from_u64(1)) {
            Ok(_) => panic!("populate should fail"),
            Err(err) => err,
        };
        assert!(err.chain().any(|e| e.is::<ConfigError>()));
    }

    #[test]
    fn groups_start_on_distinct_food_sources() {
        let cfg = test_config();
        let world = populate(&cfg, ChaCha12Rng::seed_from_u64(2)).expect("failed to populate");

        let starts: HashSet<Coord> = (0..world.groups().len())
            .map(|idx| world.location_of_group(GroupId(idx)).expect("group not placed"))
            .collect();
        assert_eq!(starts.len(), cfg.habitat.n_groups);

        for (idx, group) in world.groups().iter().enumerate() {
            let pop = group.population();
            assert!((cfg.habitat.min_population..cfg.habitat.max_population).contains(&pop));
            assert!(group.lead_counter() >= 1 && group.lead_counter() <= pop);

            let here = world.location_of_group(GroupId(idx)).expect("group not placed");
            let home_coords: Vec<Coord> = group
                .home_range()
                .iter()
                .map(|f| world.foods()[f.0].location())
                .collect();
            assert!(home_coords.contains(&here));
            for food in group.home_range() {
                assert!(world.foods()[food.0].is_visible());
            }
        }
    }

    #[test]
    fn index_cases_land_in_distinct_groups() {
        let mut cfg = test_config();
        cfg.disease.n_index_cases = 3;
        let world = populate(&cfg, ChaCha12Rng::seed_from_u64(4)).expect("failed to populate");

        let infected: Vec<u32> = world.groups().iter().map(|g| g.infected()).collect();
        assert_eq!(infected.iter().sum::<u32>(), 3);
        assert!(infected.iter().all(|&n| n <= 1));
        assert_eq!(world.summary().total_infected, 3);
    }
}
