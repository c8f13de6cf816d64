use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};

use crate::snake::Direction;

/// What a key press asks the game to do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Turn(Direction),
    Start,
    TogglePause,
    Reset,
    Restart,
    Quit,
}

pub fn command_for(key: KeyEvent) -> Option<Command> {
    if is_ctrl_c(&key) {
        return Some(Command::Quit);
    }

    match key.code {
        KeyCode::Char('w') | KeyCode::Char('W') | KeyCode::Up => Some(Command::Turn(Direction::Up)),
        KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Left => Some(Command::Turn(Direction::Left)),
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Down => Some(Command::Turn(Direction::Down)),
        KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Right => Some(Command::Turn(Direction::Right)),
        KeyCode::Char(' ') | KeyCode::Enter => Some(Command::Start),
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Esc => Some(Command::TogglePause),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Restart),
        KeyCode::Backspace => Some(Command::Reset),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),
        _ => None,
    }
}

/// Waits up to `timeout` for the first key, then drains whatever else is
/// already queued without waiting again.
pub fn read_keys(timeout: Duration) -> Result<Vec<KeyEvent>> {
    let mut keys = vec![];
    let mut wait = timeout;

    while poll(wait).context("Failed to poll terminal events")? {
        if let Event::Key(ev) = read().context("Failed to read terminal event")? {
            keys.push(ev);
        }
        wait = Duration::from_millis(0);
    }

    Ok(keys)
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
}
