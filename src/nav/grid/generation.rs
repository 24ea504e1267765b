use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::nav::error::NavResult;
use crate::nav::fixed_math::{FixedNum, FixedVec2};
use super::NavGrid;

/// Reproducible random obstacle layout.
///
/// Each node becomes an obstacle with probability `obstacle_density`
/// (clamped to `0.0..=1.0`). The same seed always yields the same grid.
pub fn random_grid(
    width: usize,
    height: usize,
    node_radius: FixedNum,
    obstacle_density: f64,
    seed: u64,
) -> NavResult<NavGrid> {
    let mut grid = NavGrid::new(width, height, node_radius, FixedVec2::ZERO)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let density = obstacle_density.clamp(0.0, 1.0);

    let mut obstacles = 0usize;
    for y in 0..height {
        for x in 0..width {
            if rng.random_bool(density) {
                grid.set_obstacle(x, y);
                obstacles += 1;
            }
        }
    }

    debug!(
        "[GRID] Generated {}x{} grid with {} obstacles (seed {})",
        width, height, obstacles, seed
    );
    Ok(grid)
}
