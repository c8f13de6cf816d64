use std::io::{stdout, Stdout, Write};

use anyhow::{bail, Context, Result};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue, style, terminal};
use tracing::warn;

use crate::game::Renderer;
use crate::grid::{Cell, Grid};
use crate::session::{GameSession, Lifecycle};
use crate::snake::head_char;

pub type TermInt = u16;
pub type Coords = (u16, u16);

const SNAKE_BODY_CHAR: char = '█';
const APPLE_CHAR: char = 'O';
const DEAD_SNAKE_CHAR: char = 'X';
const EMPTY_CHAR: char = ' ';

pub struct TermManager {
    width: TermInt,
    height: TermInt,
    stdout: Stdout,
    screen: Vec<char>,
    current_msg: Option<Message>,
}

struct Message {
    top_left: Coords,
    width: TermInt,
    height: TermInt,
}

impl TermManager {
    pub fn new() -> Result<Self> {
        let (width, height) = terminal::size().context("Error reading terminal size")?;
        let stdout = stdout();
        let screen = vec![EMPTY_CHAR; width as usize * height as usize];
        Ok(TermManager { width, height, stdout, screen, current_msg: None })
    }

    pub fn setup(&mut self) -> Result<()> {
        execute!(self.stdout, EnterAlternateScreen).context("Error entering alt screen")?;
        self.set_raw_mode(true)?;
        self.set_cursor_visibility(false)?;
        self.set_cursor_blink(false)?;
        self.clear()
    }

    pub fn restore(&mut self) -> Result<()> {
        self.set_raw_mode(false)?;
        self.set_cursor_visibility(true)?;
        self.set_cursor_blink(true)?;
        execute!(self.stdout, LeaveAlternateScreen).context("Error leaving alt screen")?;
        Ok(())
    }

    pub fn get_terminal_size(&self) -> Coords {
        (self.width, self.height)
    }

    pub fn draw_borders(&mut self, top_left: Coords, size: Coords) -> Result<()> {
        let (x0, y0) = top_left;
        let (width, height) = size;
        let end_x = x0 + width - 1;
        let end_y = y0 + height - 1;

        for x in x0..=end_x {
            let ch = if x == x0 || x == end_x {'+'} else {'-'};
            self.print_at((x, y0), ch)?;
            self.print_at((x, end_y), ch)?;
        }

        for y in y0 + 1..end_y {
            self.print_at((x0, y), '|')?;
            self.print_at((end_x, y), '|')?;
        }

        self.flush()
    }

    pub fn show_message(&mut self, lines: &[&str]) -> Result<()> {
        if self.has_message() {
            self.hide_message()?;
        }

        let msg_height = (lines.len() + 2) as TermInt;
        let msg_width = (lines.iter().map(|x| x.chars().count()).max().unwrap_or(0) + 2) as TermInt;
        let center = (self.width / 2, self.height / 2);
        let top_left = (
            center.0.saturating_sub(msg_width / 2),
            center.1.saturating_sub(msg_height / 2),
        );

        // Print the top and bottom empty lines
        for y in [top_left.1, top_left.1 + msg_height - 1].iter() {
            for x_diff in 0..msg_width {
                self.print_at_no_save((top_left.0 + x_diff, *y), ' ')?;
            }
        }

        // Print the message lines
        for (i, line) in lines.iter().enumerate() {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            let y = top_left.1 + i as TermInt + 1;
            for (x_diff, ch) in padded_line.chars().enumerate() {
                self.print_at_no_save((top_left.0 + x_diff as TermInt, y), ch)?;
            }
        }

        self.current_msg = Some(Message::new(msg_width, msg_height, top_left));
        self.flush()
    }

    pub fn hide_message(&mut self) -> Result<()> {
        let msg = match self.current_msg.take() {
            Some(msg) => msg,
            None => return Ok(()),
        };
        let top_left = msg.top_left();

        // Restore the content from the screen buffer
        for y_diff in 0..msg.height() {
            for x_diff in 0..msg.width() {
                let pos = (top_left.0 + x_diff, top_left.1 + y_diff);
                if let Some(idx) = self.index(pos) {
                    let ch = self.screen[idx];
                    self.print_at_no_save(pos, ch)?;
                }
            }
        }

        self.flush()
    }

    /// Only queues output when the cell actually changes.
    pub fn print_at(&mut self, pos: Coords, ch: char) -> Result<()> {
        let idx = match self.index(pos) {
            Some(idx) => idx,
            None => return Ok(()),
        };
        if self.screen[idx] == ch {
            return Ok(());
        }
        self.screen[idx] = ch;
        self.print_at_no_save(pos, ch)
    }

    pub fn print_str_at(&mut self, pos: Coords, text: &str) -> Result<()> {
        for (x_diff, ch) in text.chars().enumerate() {
            self.print_at((pos.0 + x_diff as TermInt, pos.1), ch)?;
        }
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        execute!(self.stdout, terminal::Clear(ClearType::All)).context("Error clearing")?;
        self.screen = vec![EMPTY_CHAR; self.width as usize * self.height as usize];
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.stdout.flush().context("Error flushing")
    }

    pub fn has_message(&self) -> bool {
        self.current_msg.is_some()
    }

    ///////////////////////////////////////////////////////////////////////////

    fn index(&self, pos: Coords) -> Option<usize> {
        if pos.0 < self.width && pos.1 < self.height {
            Some(self.width as usize * pos.1 as usize + pos.0 as usize)
        } else {
            None
        }
    }

    fn print_at_no_save(&mut self, pos: Coords, ch: char) -> Result<()> {
        // Used for messages, which must not overwrite the buffer they get
        // restored from
        if self.index(pos).is_none() {
            return Ok(());
        }
        queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(ch)).context("Error printing")?;
        Ok(())
    }

    fn set_raw_mode(&self, option: bool) -> Result<()> {
        let res = if option {
            terminal::enable_raw_mode()
        } else {
            terminal::disable_raw_mode()
        };

        res.context("Error setting raw mode")
    }

    fn set_cursor_blink(&mut self, option: bool) -> Result<()> {
        let res = if option {
            execute!(self.stdout, cursor::EnableBlinking)
        } else {
            execute!(self.stdout, cursor::DisableBlinking)
        };

        res.context("Error setting cursor blink")
    }

    fn set_cursor_visibility(&mut self, option: bool) -> Result<()> {
        let res = if option {
            execute!(self.stdout, cursor::Show)
        } else {
            execute!(self.stdout, cursor::Hide)
        };

        res.context("Error setting cursor visibility")
    }
}

impl Message {
    pub fn new(width: TermInt, height: TermInt, top_left: Coords) -> Self {
        Message { width, height, top_left }
    }

    pub fn width(&self) -> TermInt {
        self.width
    }

    pub fn height(&self) -> TermInt {
        self.height
    }

    pub fn top_left(&self) -> Coords {
        self.top_left
    }
}

/// Draws the board centered in the terminal, with the status line under it.
/// Restores the terminal when dropped.
pub struct TermRenderer {
    term: TermManager,
    /// Top-left corner of the border
    origin: Coords,
    board_size: Coords,
    active: bool,
}

impl TermRenderer {
    pub fn new(grid: Grid) -> Result<Self> {
        let term = TermManager::new()?;
        let (term_w, term_h) = term.get_terminal_size();

        let board_w = grid.width() as u64 + 2;
        let board_h = grid.height() as u64 + 2;
        // One extra row for the status line
        if board_w > term_w as u64 || board_h + 1 > term_h as u64 {
            bail!(
                "terminal is {}x{} but a {}x{} grid needs at least {}x{}",
                term_w, term_h, grid.width(), grid.height(), board_w, board_h + 1
            );
        }

        let board_size = (board_w as TermInt, board_h as TermInt);
        let origin = ((term_w - board_size.0) / 2, (term_h - board_size.1 - 1) / 2);

        Ok(TermRenderer { term, origin, board_size, active: false })
    }

    pub fn setup(&mut self) -> Result<()> {
        self.active = true;
        self.term.setup()?;
        self.term.draw_borders(self.origin, self.board_size)
    }

    pub fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.term.restore()
    }

    fn to_screen(&self, cell: Cell) -> Coords {
        (
            self.origin.0 + 1 + cell.x as TermInt,
            self.origin.1 + 1 + cell.y as TermInt,
        )
    }

    fn draw_board(&mut self, session: &GameSession) -> Result<()> {
        let grid = *session.grid();
        let width = grid.width() as usize;
        let mut cells = vec![EMPTY_CHAR; grid.cell_count()];
        let mut mark = |cell: Cell, ch: char| {
            if grid.contains(cell) {
                cells[cell.y as usize * width + cell.x as usize] = ch;
            }
        };

        mark(session.food(), APPLE_CHAR);

        let dead = session.state() == Lifecycle::Over;
        let snake = session.snake();
        for pos in snake.body().iter().rev() {
            mark(*pos, if dead {DEAD_SNAKE_CHAR} else {SNAKE_BODY_CHAR});
        }
        if !dead {
            mark(snake.head(), head_char(session.current_direction()));
        }

        for (i, ch) in cells.into_iter().enumerate() {
            let cell = Cell::new((i % width) as i32, (i / width) as i32);
            let pos = self.to_screen(cell);
            self.term.print_at(pos, ch)?;
        }

        Ok(())
    }

    fn draw_status(&mut self, session: &GameSession) -> Result<()> {
        let text = status_line(session);
        let line = format!("{:<width$}", text, width = self.board_size.0 as usize);
        let pos = (self.origin.0, self.origin.1 + self.board_size.1);
        self.term.print_str_at(pos, &line)
    }
}

impl Renderer for TermRenderer {
    fn render(&mut self, session: &GameSession) -> Result<()> {
        self.term.hide_message()?;
        self.draw_board(session)?;
        self.draw_status(session)?;
        self.term.flush()?;

        let lines = overlay_lines(session);
        if !lines.is_empty() {
            let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
            self.term.show_message(&refs)?;
        }

        Ok(())
    }
}

impl Drop for TermRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!(error = %format!("{:#}", e), "failed to restore terminal");
        }
    }
}

/// Puts the terminal back before the previous panic hook prints, so the
/// message ends up on the normal screen instead of the alternate one.
pub fn install_panic_hook() {
    chain_panic_hook(restore_after_panic);
}

fn chain_panic_hook<F>(restore: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        previous(info);
    }));
}

fn restore_after_panic() {
    let _ = terminal::disable_raw_mode();
    let _ = execute!(stdout(), cursor::Show, LeaveAlternateScreen);
}

/// Text shown over the board for the current state; empty while running.
pub fn overlay_lines(session: &GameSession) -> Vec<String> {
    match session.state() {
        Lifecycle::Running => vec![],
        Lifecycle::Idle => vec![
            "Snake".into(),
            "".into(),
            "Arrow keys or WASD to move".into(),
            "Space or Enter to start".into(),
            "P or Esc to pause".into(),
            "R to restart, Backspace to reset".into(),
            "Q or Ctrl+C to quit".into(),
        ],
        Lifecycle::Paused => vec!["Paused".into(), "Press P or Esc to resume".into()],
        Lifecycle::Over => {
            let mut lines = vec!["Game over!".to_string(), format!("Score: {}", session.score())];
            if session.is_new_best() {
                lines.push("New best!".into());
            }
            lines.push("".into());
            lines.push("R to play again, Q to quit".into());
            lines
        }
    }
}

/// Score, best score and a hint for the current state.
pub fn status_line(session: &GameSession) -> String {
    let hint = match session.state() {
        Lifecycle::Idle => "Ready",
        Lifecycle::Running => "",
        Lifecycle::Paused => "Paused",
        Lifecycle::Over => "Over",
    };
    format!("Score: {}  Best: {}  {}", session.score(), session.best_score(), hint)
        .trim_end()
        .to_string()
}
