//! Sparse bounded grid holding the positions of groups and food sources.

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

/// Integer grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another cell.
    pub fn distance(&self, other: &Coord) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        dx.hypot(dy)
    }
}

/// Index of a group in the world arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub usize);

/// Index of a food source in the world arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FoodId(pub usize);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

impl fmt::Display for FoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Anything that can be placed in the habitat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occupant {
    Group(GroupId),
    Food(FoodId),
}

impl Occupant {
    pub fn group(self) -> Option<GroupId> {
        match self {
            Occupant::Group(id) => Some(id),
            Occupant::Food(_) => None,
        }
    }

    pub fn food(self) -> Option<FoodId> {
        match self {
            Occupant::Food(id) => Some(id),
            Occupant::Group(_) => None,
        }
    }
}

/// Bounded sparse grid.
///
/// Only stores positions: entity data lives in the world arena and is
/// referenced through [`Occupant`] ids. Occupants of a cell keep their
/// insertion order so queries are deterministic.
#[derive(Debug, Clone)]
pub struct Habitat {
    width: i32,
    height: i32,
    cells: HashMap<Coord, Vec<Occupant>>,
    locations: HashMap<Occupant, Coord>,
}

impl Habitat {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
            cells: HashMap::new(),
            locations: HashMap::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, coord: Coord) -> bool {
        (0..self.width).contains(&coord.x) && (0..self.height).contains(&coord.y)
    }

    pub fn is_vacant(&self, coord: Coord) -> bool {
        self.cells.get(&coord).is_none_or(|occ| occ.is_empty())
    }

    pub fn occupants_at(&self, coord: Coord) -> &[Occupant] {
        self.cells.get(&coord).map_or(&[], |occ| occ.as_slice())
    }

    pub fn location_of(&self, occupant: Occupant) -> Option<Coord> {
        self.locations.get(&occupant).copied()
    }

    /// Place an occupant at `coord`, removing it from its previous cell.
    pub fn relocate(&mut self, occupant: Occupant, coord: Coord) {
        if let Some(old) = self.locations.insert(occupant, coord) {
            if old == coord {
                return;
            }
            if let Some(occ) = self.cells.get_mut(&old) {
                occ.retain(|&o| o != occupant);
            }
        }
        self.cells.entry(coord).or_default().push(occupant);
    }

    /// Occupants of the square neighborhood of `center`, center included.
    ///
    /// Cells outside the grid are skipped. Results are ordered by column,
    /// then row, then insertion order within a cell.
    pub fn neighbors_within_radius(&self, center: Coord, radius: usize) -> Vec<Occupant> {
        let radius = radius as i32;
        let mut neighbors = Vec::new();
        for x in center.x - radius..=center.x + radius {
            for y in center.y - radius..=center.y + radius {
                let coord = Coord::new(x, y);
                if self.contains(coord) {
                    neighbors.extend_from_slice(self.occupants_at(coord));
                }
            }
        }
        neighbors
    }
}
