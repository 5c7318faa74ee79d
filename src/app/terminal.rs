use std::{
    io::{self, Stdout},
    sync::Once,
};

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use tracing::warn;

use super::view::{self, Screen};

static RESTORE_ON_PANIC: Once = Once::new();

/// Raw mode plus the alternate screen, held for as long as the editor runs.
/// Dropping the guard (or panicking) hands the terminal back untouched.
pub(crate) struct TerminalGuard {
    backend: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    pub(crate) fn new() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let backend = enter_screen().inspect_err(|_| leave_screen())?;
        RESTORE_ON_PANIC.call_once(|| {
            let previous = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                leave_screen();
                previous(info);
            }));
        });
        Ok(Self { backend })
    }

    pub(crate) fn render(&mut self, screen: &Screen<'_>) -> Result<()> {
        self.backend
            .draw(|frame| view::draw(frame, screen))
            .context("failed to draw frame")?;
        Ok(())
    }

    pub(crate) fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        self.backend
            .resize(Rect::new(0, 0, width, height))
            .context("failed to resize terminal")
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = self.backend.show_cursor() {
            warn!(error = %err, "cursor left hidden");
        }
        leave_screen();
    }
}

fn enter_screen() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide).context("failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("failed to initialize terminal")
}

fn leave_screen() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}
