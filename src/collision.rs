use crate::grid::{Cell, Grid};
use crate::snake::Snake;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Collision {
    Wall,
    SelfIntersection,
}

pub fn is_wall_collision(head: Cell, grid: &Grid) -> bool {
    !grid.contains(head)
}

/// `body` is the whole snake with the head at index 0; the head is compared
/// against the remaining segments only.
pub fn is_self_collision(head: Cell, body: &[Cell]) -> bool {
    body.iter().skip(1).any(|segment| *segment == head)
}

/// Checked once per tick on the already advanced snake. Since the tail was
/// trimmed before this runs, moving into the cell the tail just left is fine.
pub fn detect(snake: &Snake, grid: &Grid) -> Option<Collision> {
    let head = snake.head();

    if is_wall_collision(head, grid) {
        Some(Collision::Wall)
    } else if is_self_collision(head, snake.body()) {
        Some(Collision::SelfIntersection)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::Direction::{self, *};

    fn cells(coords: &[(i32, i32)]) -> Vec<Cell> {
        coords.iter().map(|&(x, y)| Cell::new(x, y)).collect()
    }

    #[test]
    fn test_wall_on_every_side() {
        let grid = Grid::new(10, 10);
        let cases: [(Cell, Direction); 4] = [
            (Cell::new(0, 5), Left),
            (Cell::new(9, 5), Right),
            (Cell::new(5, 0), Up),
            (Cell::new(5, 9), Down),
        ];

        for (head, dir) in cases.iter().copied() {
            let mut snake = Snake::new(head, 1, dir);
            assert_eq!(detect(&snake, &grid), None);

            snake.advance(dir, false);
            assert!(is_wall_collision(snake.head(), &grid));
            assert_eq!(detect(&snake, &grid), Some(Collision::Wall));
        }
    }

    #[test]
    fn test_moving_into_vacated_tail_is_safe() {
        // A 2x2 loop: head (1,0) moving Down onto (1,1) where the tail sits.
        let grid = Grid::new(5, 5);
        let mut snake = Snake::from_cells(cells(&[(1, 0), (0, 0), (0, 1), (1, 1)]));

        snake.advance(Down, false);

        assert_eq!(snake.head(), Cell::new(1, 1));
        assert_eq!(detect(&snake, &grid), None);
    }

    #[test]
    fn test_moving_into_tail_while_growing_collides() {
        let grid = Grid::new(5, 5);
        let mut snake = Snake::from_cells(cells(&[(1, 0), (0, 0), (0, 1), (1, 1)]));

        snake.advance(Down, true);

        assert_eq!(detect(&snake, &grid), Some(Collision::SelfIntersection));
    }

    #[test]
    fn test_moving_into_body_collides() {
        let grid = Grid::new(10, 10);
        let mut snake =
            Snake::from_cells(cells(&[(2, 1), (1, 1), (1, 2), (2, 2), (3, 2), (3, 3)]));

        snake.advance(Down, false);

        assert_eq!(snake.head(), Cell::new(2, 2));
        assert_eq!(detect(&snake, &grid), Some(Collision::SelfIntersection));
    }

    #[test]
    fn test_self_collision_ignores_head_itself() {
        let body = cells(&[(3, 3), (2, 3), (1, 3)]);

        assert!(!is_self_collision(Cell::new(3, 3), &body));
        assert!(is_self_collision(Cell::new(2, 3), &body));
    }
}
