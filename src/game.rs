use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info};

use crate::highscore::HighScoreStore;
use crate::input::{self, Command};
use crate::session::{GameSession, Lifecycle, TickEvent};

/// While no tick is pending the loop still wakes up this often.
const IDLE_WAIT_MS: u64 = 250;

/// Draws the session. Called on startup, after every committed tick and after
/// every lifecycle change.
pub trait Renderer {
    fn render(&mut self, session: &GameSession) -> Result<()>;
}

pub struct SnakeGame<R: Renderer, S: HighScoreStore> {
    session: GameSession,
    renderer: R,
    store: S,
    should_quit: bool,
}

impl<R: Renderer, S: HighScoreStore> SnakeGame<R, S> {
    /// `make_session` receives the best score read from `store`.
    pub fn new<F>(renderer: R, mut store: S, make_session: F) -> Result<Self>
    where
        F: FnOnce(u32) -> Result<GameSession>,
    {
        let best = store.load_high_score();
        info!(best, "loaded high score");

        let session = make_session(best)?;
        let mut game = SnakeGame { session, renderer, store, should_quit: false };
        game.renderer.render(&game.session)?;
        Ok(game)
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn handle(&mut self, command: Command, now: Instant) -> Result<()> {
        let before = self.session.state();

        match command {
            Command::Turn(direction) => {
                // Takes effect on the next tick, nothing to redraw yet.
                let accepted = self.session.request_direction(direction);
                debug!(requested = ?direction, pending = ?self.session.pending_direction(), accepted, "turn");
                return Ok(());
            }
            Command::Start => self.session.start(now),
            Command::TogglePause => match self.session.state() {
                Lifecycle::Running => self.session.pause(),
                Lifecycle::Paused => self.session.start(now),
                Lifecycle::Idle | Lifecycle::Over => {}
            },
            Command::Reset => self.session.reset(),
            Command::Restart => self.session.restart(now),
            Command::Quit => {
                self.should_quit = true;
                return Ok(());
            }
        }

        let reset = matches!(command, Command::Reset | Command::Restart);
        if reset || self.session.state() != before {
            self.renderer.render(&self.session)?;
        }
        Ok(())
    }

    /// Fires the pending tick if it is due and passes the outcome on.
    pub fn update(&mut self, now: Instant) -> Result<Option<TickEvent>> {
        let event = match self.session.poll(now) {
            Some(event) => event,
            None => return Ok(None),
        };

        match event {
            TickEvent::GameOver { new_high_score: Some(score), .. } => self.store.save_high_score(score),
            TickEvent::Moved { ate_food: true } => {
                debug!(interval_ms = self.session.tick_interval().as_millis() as u64, "speed up");
            }
            _ => {}
        }

        self.renderer.render(&self.session)?;
        Ok(Some(event))
    }

    /// Interactive loop: sleep on the keyboard until the next tick is due,
    /// apply whatever was pressed, then run the tick.
    pub fn run(&mut self) -> Result<()> {
        while !self.should_quit() {
            let timeout = self
                .session
                .time_until_tick(Instant::now())
                .unwrap_or(Duration::from_millis(IDLE_WAIT_MS));

            for key in input::read_keys(timeout)? {
                if let Some(command) = input::command_for(key) {
                    self.handle(command, Instant::now())?;
                }
                if self.should_quit {
                    break;
                }
            }

            self.update(Instant::now())?;
        }

        info!(score = self.session().score(), "quitting");
        Ok(())
    }
}
