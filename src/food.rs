use rand::Rng;

use crate::grid::{Cell, Grid};

/// Picks a random cell that is not in `occupied` by redrawing until one is free.
///
/// If `occupied` covers every cell of the grid this never returns. Config
/// validation keeps the starting snake smaller than the grid, and a snake long
/// enough to fill the board is far beyond practical play, so the loop is left
/// unbounded rather than inventing an end-of-board rule.
pub fn place_food<R: Rng + ?Sized>(grid: &Grid, occupied: &[Cell], rng: &mut R) -> Cell {
    loop {
        let candidate = grid.random_cell(rng);
        if !occupied.contains(&candidate) {
            return candidate;
        }
    }
}
