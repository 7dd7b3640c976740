//! Terminal rendering and keyboard input.
use std::{
    io::{self, Stdout, Write},
    time::Duration,
};

use chip8::prelude::*;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode as TermKeyCode, KeyEventKind, KeyModifiers},
    queue,
    style::Print,
    terminal::{self, ClearType},
};

/// Keyboard input relevant to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermInput {
    Char(char),
    Quit,
}

/// Raw mode terminal on an alternate screen.
///
/// The terminal is restored when dropped.
pub struct Terminal {
    out: Stdout,
}

impl Terminal {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;

        let mut out = io::stdout();
        queue!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(ClearType::All)
        )?;
        out.flush()?;

        Ok(Self { out })
    }

    /// Wait up to `timeout` for a key press.
    pub fn poll_input(&mut self, timeout: Duration) -> io::Result<Option<TermInput>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }

        let input = match event::read()? {
            Event::Key(evt) if evt.kind != KeyEventKind::Release => match evt.code {
                TermKeyCode::Esc => Some(TermInput::Quit),
                TermKeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(TermInput::Quit)
                }
                TermKeyCode::Char(c) => Some(TermInput::Char(c)),
                _ => None,
            },
            _ => None,
        };

        Ok(input)
    }

    /// Ring the terminal bell.
    pub fn bell(&mut self) -> io::Result<()> {
        queue!(self.out, Print('\x07'))?;
        self.out.flush()
    }

    /// Draw a frame in the top left corner, two characters per pixel.
    pub fn draw(&mut self, frame: &DisplaySnapshot) -> io::Result<()> {
        queue!(self.out, cursor::MoveTo(0, 0))?;

        for (y, row) in frame.rows().enumerate() {
            let line: String = row
                .iter()
                .map(|px| if *px != 0 { "██" } else { "  " })
                .collect();
            queue!(self.out, cursor::MoveTo(0, y as u16), Print(line))?;
        }

        self.out.flush()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let restore = queue!(self.out, cursor::Show, terminal::LeaveAlternateScreen)
            .and_then(|_| self.out.flush())
            .and_then(|_| terminal::disable_raw_mode());

        if let Err(err) = restore {
            log::error!("failed to restore terminal: {err}");
        }
    }
}
