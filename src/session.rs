use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::collision::{self, Collision};
use crate::config::{ConfigError, GameConfig};
use crate::food::place_food;
use crate::grid::{Cell, Grid};
use crate::snake::{Direction, Snake, Steering};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Board drawn, clock stopped. Entered on creation and on reset.
    Idle,
    Running,
    Paused,
    /// Terminal until reset.
    Over,
}

/// Reported for every tick that actually ran.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickEvent {
    Moved { ate_food: bool },
    GameOver {
        collision: Collision,
        score: u32,
        /// Set when the final score beats the best known score and should be
        /// persisted.
        new_high_score: Option<u32>,
    },
}

/// Deadline of the one pending tick, if any.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Clock {
    next_tick: Option<Instant>,
}

impl Clock {
    pub fn schedule(&mut self, at: Instant) {
        self.next_tick = Some(at);
    }

    pub fn cancel(&mut self) {
        self.next_tick = None;
    }

    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.next_tick, Some(at) if now >= at)
    }

    /// Zero when the tick is overdue, `None` when nothing is scheduled.
    pub fn time_until(&self, now: Instant) -> Option<Duration> {
        self.next_tick.map(|at| at.saturating_duration_since(now))
    }
}

pub struct GameSession {
    config: GameConfig,
    grid: Grid,
    snake: Snake,
    food: Cell,
    steering: Steering,
    score: u32,
    tick_interval: Duration,
    state: Lifecycle,
    clock: Clock,
    best_score: u32,
    /// Set when the last game ended above the previous best
    new_best: bool,
    rng: StdRng,
}

impl GameSession {
    pub fn new(config: GameConfig, best_score: u32, mut rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;

        let grid = config.grid();
        let snake = config.initial_snake();
        let food = place_food(&grid, snake.body(), &mut rng);

        Ok(GameSession {
            grid,
            snake,
            food,
            steering: Steering::new(config.initial_direction),
            score: 0,
            tick_interval: config.initial_interval(),
            state: Lifecycle::Idle,
            clock: Clock::default(),
            best_score,
            new_best: false,
            rng,
            config,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn food(&self) -> Cell {
        self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn is_new_best(&self) -> bool {
        self.new_best
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    pub fn current_direction(&self) -> Direction {
        self.steering.current()
    }

    pub fn pending_direction(&self) -> Direction {
        self.steering.pending()
    }

    #[cfg(test)]
    pub(crate) fn put_food(&mut self, food: Cell) {
        self.food = food;
    }

    /// Queues a turn for the next tick. Reversals and requests after the game
    /// ended are dropped without complaint.
    pub fn request_direction(&mut self, direction: Direction) -> bool {
        if self.state == Lifecycle::Over {
            return false;
        }
        self.steering.request(direction)
    }

    /// Idle/Paused -> Running. The first tick comes one full interval later.
    pub fn start(&mut self, now: Instant) {
        match self.state {
            Lifecycle::Idle | Lifecycle::Paused => {
                self.state = Lifecycle::Running;
                self.clock.schedule(now + self.tick_interval);
                info!(score = self.score, interval_ms = self.tick_interval.as_millis() as u64, "game running");
            }
            Lifecycle::Running | Lifecycle::Over => {}
        }
    }

    pub fn pause(&mut self) {
        if self.state == Lifecycle::Running {
            self.clock.cancel();
            self.state = Lifecycle::Paused;
            info!(score = self.score, "game paused");
        }
    }

    /// Back to Idle with a fresh board. The best score survives.
    pub fn reset(&mut self) {
        self.clock.cancel();
        self.snake = self.config.initial_snake();
        self.food = place_food(&self.grid, self.snake.body(), &mut self.rng);
        self.steering = Steering::new(self.config.initial_direction);
        self.score = 0;
        self.new_best = false;
        self.tick_interval = self.config.initial_interval();
        self.state = Lifecycle::Idle;
        info!("game reset");
    }

    pub fn restart(&mut self, now: Instant) {
        self.reset();
        self.start(now);
    }

    /// How long the driver may wait for input before the next tick is due.
    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        if self.state == Lifecycle::Running {
            self.clock.time_until(now)
        } else {
            None
        }
    }

    /// Runs the pending tick if it is due.
    pub fn poll(&mut self, now: Instant) -> Option<TickEvent> {
        if self.state == Lifecycle::Running && self.clock.is_due(now) {
            Some(self.tick(now))
        } else {
            None
        }
    }

    fn tick(&mut self, now: Instant) -> TickEvent {
        self.clock.cancel();

        let direction = self.steering.commit();
        let ate_food = self.snake.head().step(direction) == self.food;
        self.snake.advance(direction, ate_food);

        if ate_food {
            self.score += self.config.food_reward;
            self.food = place_food(&self.grid, self.snake.body(), &mut self.rng);
            self.tick_interval = self
                .tick_interval
                .checked_sub(self.config.interval_step())
                .unwrap_or_default()
                .max(self.config.min_interval());
            debug!(score = self.score, interval_ms = self.tick_interval.as_millis() as u64, "food eaten");
        }

        if let Some(collision) = collision::detect(&self.snake, &self.grid) {
            self.state = Lifecycle::Over;

            let new_high_score = if self.score > self.best_score {
                self.best_score = self.score;
                self.new_best = true;
                Some(self.score)
            } else {
                None
            };

            info!(
                ?collision,
                score = self.score,
                length = self.snake.len(),
                new_high_score = new_high_score.is_some(),
                "game over"
            );
            return TickEvent::GameOver { collision, score: self.score, new_high_score };
        }

        self.clock.schedule(now + self.tick_interval);
        TickEvent::Moved { ate_food }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn session() -> GameSession {
        GameSession::new(GameConfig::default(), 0, StdRng::seed_from_u64(1)).unwrap()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Puts the food directly in front of the head.
    fn food_ahead(s: &mut GameSession) {
        s.food = s.snake.head().step(s.steering.pending());
    }

    #[test]
    fn test_fresh_session() {
        let s = session();

        assert_eq!(s.state(), Lifecycle::Idle);
        assert_eq!(s.score(), 0);
        assert_eq!(s.tick_interval(), ms(120));
        assert_eq!(s.current_direction(), Direction::Right);
        assert_eq!(s.snake().len(), 3);
        assert!(!s.snake().body().contains(&s.food()));
        assert!(s.grid().contains(s.food()));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = GameConfig { grid_height: 0, ..Default::default() };
        assert!(GameSession::new(config, 0, StdRng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn test_idle_does_not_tick() {
        let mut s = session();
        let t0 = Instant::now();

        assert_eq!(s.poll(t0 + ms(10_000)), None);
        assert_eq!(s.time_until_tick(t0), None);
        assert_eq!(s.snake().head(), Cell::new(5, 10));
    }

    #[test]
    fn test_start_waits_full_interval() {
        let mut s = session();
        s.food = Cell::new(0, 0);
        let t0 = Instant::now();

        s.start(t0);

        assert_eq!(s.state(), Lifecycle::Running);
        assert_eq!(s.time_until_tick(t0), Some(ms(120)));
        assert_eq!(s.poll(t0 + ms(119)), None);
        assert_eq!(s.poll(t0 + ms(120)), Some(TickEvent::Moved { ate_food: false }));
        assert_eq!(s.snake().head(), Cell::new(6, 10));
        assert_eq!(s.time_until_tick(t0 + ms(120)), Some(ms(120)));
    }

    #[test]
    fn test_start_twice_keeps_schedule() {
        let mut s = session();
        let t0 = Instant::now();

        s.start(t0);
        s.start(t0 + ms(100));

        assert_eq!(s.time_until_tick(t0), Some(ms(120)));
    }

    #[test]
    fn test_one_tick_per_deadline() {
        let mut s = session();
        s.food = Cell::new(0, 0);
        let t0 = Instant::now();
        s.start(t0);

        // Far overdue still yields a single tick, which schedules its successor.
        assert!(s.poll(t0 + ms(1_000)).is_some());
        assert_eq!(s.poll(t0 + ms(1_000)), None);
        assert_eq!(s.snake().head(), Cell::new(6, 10));
    }

    #[test]
    fn test_eating_food_scenario() {
        let mut s = session();
        s.food = Cell::new(6, 10);
        let t0 = Instant::now();
        s.start(t0);

        let event = s.poll(t0 + ms(120));

        assert_eq!(event, Some(TickEvent::Moved { ate_food: true }));
        assert_eq!(s.score(), 10);
        assert_eq!(
            s.snake().body(),
            &[Cell::new(6, 10), Cell::new(5, 10), Cell::new(4, 10), Cell::new(3, 10)]
        );
        assert!(!s.snake().body().contains(&s.food()));
        assert_eq!(s.tick_interval(), ms(118));
        assert_eq!(s.state(), Lifecycle::Running);
    }

    #[test]
    fn test_forced_reversal_ends_game() {
        let mut s = session();
        s.food = Cell::new(0, 0);
        s.steering.force(Direction::Left);
        let t0 = Instant::now();
        s.start(t0);

        let event = s.poll(t0 + ms(120));

        assert_eq!(
            event,
            Some(TickEvent::GameOver {
                collision: Collision::SelfIntersection,
                score: 0,
                new_high_score: None,
            })
        );
        assert_eq!(s.state(), Lifecycle::Over);
        assert_eq!(s.time_until_tick(t0), None);
        assert_eq!(s.poll(t0 + ms(10_000)), None);
    }

    #[test]
    fn test_reversal_request_ignored_while_running() {
        let mut s = session();
        s.start(Instant::now());

        assert!(!s.request_direction(Direction::Left));
        assert_eq!(s.pending_direction(), Direction::Right);
        assert!(s.request_direction(Direction::Up));
        assert_eq!(s.pending_direction(), Direction::Up);
        assert_eq!(s.current_direction(), Direction::Right);
    }

    #[test]
    fn test_turn_applies_on_next_tick() {
        let mut s = session();
        s.food = Cell::new(0, 0);
        let t0 = Instant::now();
        s.start(t0);

        s.request_direction(Direction::Up);
        s.poll(t0 + ms(120));

        assert_eq!(s.current_direction(), Direction::Up);
        assert_eq!(s.snake().head(), Cell::new(5, 9));
    }

    #[test]
    fn test_speed_curve() {
        let mut s = session();
        let mut now = Instant::now();
        s.start(now);

        for n in 1..=40u64 {
            // Same straight approach every time so the snake never reaches a wall.
            s.snake = Snake::new(Cell::new(5, 10), 3, Direction::Right);
            s.steering = Steering::new(Direction::Right);
            food_ahead(&mut s);

            now += s.tick_interval();
            assert_eq!(s.poll(now), Some(TickEvent::Moved { ate_food: true }));
            assert_eq!(s.score() as u64, 10 * n);
            assert_eq!(s.tick_interval(), ms(120u64.saturating_sub(2 * n).max(60)));
        }

        assert_eq!(s.tick_interval(), ms(60));
    }

    #[test]
    fn test_wall_ends_game_with_high_score() {
        let config = GameConfig {
            initial_head: Cell::new(19, 10),
            ..Default::default()
        };
        let mut s = GameSession::new(config, 5, StdRng::seed_from_u64(2)).unwrap();
        s.score = 30;
        s.food = Cell::new(0, 0);
        let t0 = Instant::now();
        s.start(t0);

        let event = s.poll(t0 + ms(120));

        assert_eq!(
            event,
            Some(TickEvent::GameOver {
                collision: Collision::Wall,
                score: 30,
                new_high_score: Some(30),
            })
        );
        assert_eq!(s.best_score(), 30);
    }

    #[test]
    fn test_over_is_frozen() {
        let mut s = session();
        s.food = Cell::new(0, 0);
        s.steering.force(Direction::Left);
        let t0 = Instant::now();
        s.start(t0);
        s.poll(t0 + ms(120));
        let frozen = s.snake().clone();

        s.start(t0 + ms(200));
        s.pause();
        assert!(!s.request_direction(Direction::Up));

        assert_eq!(s.state(), Lifecycle::Over);
        assert_eq!(s.snake(), &frozen);
        assert_eq!(s.poll(t0 + ms(10_000)), None);
    }

    #[test]
    fn test_pause_cancels_pending_tick() {
        let mut s = session();
        s.food = Cell::new(0, 0);
        let t0 = Instant::now();
        s.start(t0);
        assert!(s.poll(t0 + ms(120)).is_some());
        let head = s.snake().head();

        s.pause();

        assert_eq!(s.state(), Lifecycle::Paused);
        assert_eq!(s.time_until_tick(t0 + ms(150)), None);
        // The tick that was due at 240ms must not fire.
        assert_eq!(s.poll(t0 + ms(240)), None);
        assert_eq!(s.poll(t0 + ms(5_000)), None);
        assert_eq!(s.snake().head(), head);
    }

    #[test]
    fn test_resume_uses_full_interval() {
        let mut s = session();
        s.food = Cell::new(0, 0);
        let t0 = Instant::now();
        s.start(t0);
        s.pause();

        // Paused before the first tick fired; resuming later does not carry over.
        let resumed = t0 + ms(1_000);
        s.start(resumed);

        assert_eq!(s.time_until_tick(resumed), Some(ms(120)));
        assert_eq!(s.poll(resumed + ms(110)), None);
        assert_eq!(s.poll(resumed + ms(120)), Some(TickEvent::Moved { ate_food: false }));
    }

    #[test]
    fn test_pause_when_not_running_is_noop() {
        let mut s = session();

        s.pause();

        assert_eq!(s.state(), Lifecycle::Idle);
    }

    #[test]
    fn test_reset_restores_everything() {
        let mut s = session();
        let t0 = Instant::now();
        s.start(t0);
        food_ahead(&mut s);
        s.poll(t0 + ms(120));
        s.request_direction(Direction::Down);
        s.best_score = 50;

        s.reset();

        assert_eq!(s.state(), Lifecycle::Idle);
        assert_eq!(s.score(), 0);
        assert_eq!(s.tick_interval(), ms(120));
        assert_eq!(s.current_direction(), Direction::Right);
        assert_eq!(s.pending_direction(), Direction::Right);
        assert_eq!(s.snake().body(), GameConfig::default().initial_snake().body());
        assert!(!s.snake().body().contains(&s.food()));
        assert_eq!(s.best_score(), 50);
        assert_eq!(s.poll(t0 + ms(10_000)), None);
    }

    #[test]
    fn test_restart_from_over() {
        let mut s = session();
        s.food = Cell::new(0, 0);
        s.steering.force(Direction::Left);
        let t0 = Instant::now();
        s.start(t0);
        s.poll(t0 + ms(120));
        assert_eq!(s.state(), Lifecycle::Over);

        let t1 = t0 + ms(500);
        s.restart(t1);

        assert_eq!(s.state(), Lifecycle::Running);
        assert_eq!(s.snake().head(), Cell::new(5, 10));
        assert_eq!(s.time_until_tick(t1), Some(ms(120)));
    }

    #[test]
    fn test_clock() {
        let mut clock = Clock::default();
        let t0 = Instant::now();
        assert_eq!(clock.time_until(t0), None);
        assert!(!clock.is_due(t0));

        clock.schedule(t0 + ms(50));
        assert_eq!(clock.time_until(t0), Some(ms(50)));
        assert!(!clock.is_due(t0));
        assert!(clock.is_due(t0 + ms(50)));
        assert_eq!(clock.time_until(t0 + ms(80)), Some(Duration::ZERO));

        clock.cancel();
        assert!(!clock.is_due(t0 + ms(80)));
    }
}
