use serde::{Deserialize, Serialize};

use crate::grid::Cell;
use Direction::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    pub fn is_opposite(self, other: Direction) -> bool {
        matches!(
            (self, other),
            (Up, Down) | (Down, Up) | (Right, Left) | (Left, Right)
        )
    }
}

/// Ordered body segments, head first. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snake {
    body: Vec<Cell>,
}

impl Snake {
    /// A straight snake of `size` segments whose head is at `head`, laid out
    /// behind it so that it is travelling in `direction`.
    pub fn new(head: Cell, size: usize, direction: Direction) -> Self {
        let back = direction.opposite();
        let body = std::iter::successors(Some(head), |c| Some(c.step(back)))
            .take(size.max(1))
            .collect();
        Snake { body }
    }

    #[cfg(test)]
    pub fn from_cells(body: Vec<Cell>) -> Self {
        assert!(!body.is_empty());
        Snake { body }
    }

    pub fn body(&self) -> &[Cell] {
        &self.body
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Moves one cell in `direction`. The new head goes in front; the tail is
    /// dropped unless food was eaten, in which case the snake grows by one.
    pub fn advance(&mut self, direction: Direction, ate_food: bool) {
        let new_head = self.head().step(direction);
        self.body.insert(0, new_head);

        if !ate_food {
            self.body.pop();
        }
    }
}

/// Holds the direction of travel and the next requested turn.
///
/// Turns are validated against the direction the snake is actually moving in,
/// so two quick turns inside one tick cannot reverse it into its own neck.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Steering {
    current: Direction,
    pending: Direction,
}

impl Steering {
    pub fn new(direction: Direction) -> Self {
        Steering { current: direction, pending: direction }
    }

    pub fn current(&self) -> Direction {
        self.current
    }

    pub fn pending(&self) -> Direction {
        self.pending
    }

    /// Returns false if the request was a reversal and got dropped.
    pub fn request(&mut self, new_direction: Direction) -> bool {
        if new_direction.is_opposite(self.current) {
            return false;
        }
        self.pending = new_direction;
        true
    }

    /// Makes the pending direction current; called at the start of a tick.
    pub fn commit(&mut self) -> Direction {
        self.current = self.pending;
        self.current
    }

    #[cfg(test)]
    pub fn force(&mut self, direction: Direction) {
        self.pending = direction;
    }
}

pub fn head_char(direction: Direction) -> char {
    match direction {
        Up => '^',
        Down => 'v',
        Left => '<',
        Right => '>',
    }
}
