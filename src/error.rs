use thiserror::Error;

/// Setup-time configuration failure.
///
/// Raised before any stepping occurs, either while validating a
/// [`Config`](crate::config::Config) or while populating the habitat.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be in the range {range}, but is {value}")]
    OutOfRange {
        name: &'static str,
        range: String,
        value: String,
    },

    #[error("{n_food_sources} food sources do not fit in a spread area of {area} cells")]
    FoodAreaExceeded { n_food_sources: usize, area: usize },

    #[error("{n_groups} groups cannot get unique starting points among {n_food_sources} food sources")]
    NotEnoughFoodSources {
        n_groups: usize,
        n_food_sources: usize,
    },

    #[error("{n_index_cases} index cases cannot be seeded in {n_groups} groups")]
    TooManyIndexCases {
        n_index_cases: usize,
        n_groups: usize,
    },
}
