//! Alternate-screen ownership.
//!
//! The guard enters the alternate screen on creation and leaves it on
//! drop. A panic hook does the same, since release builds abort on panic
//! and never run the drop.

use std::io::{self, Stdout, Write};
use std::sync::Once;

use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::style::ResetColor;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};

use baodweb_browser::Frame;
use baodweb_browser::paint::paint;

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Restore the normal screen before the default hook prints the panic.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = execute!(io::stdout(), ResetColor, Show, LeaveAlternateScreen);
            default_hook(info);
        }));
    });
}

/// Owns the screen while the browser runs.
pub struct TerminalGuard {
    out: Stdout,
}

impl TerminalGuard {
    /// Enter the alternate screen. Fails when stdout is not a terminal.
    pub fn enter() -> io::Result<Self> {
        // Size first: it fails cleanly on a non-terminal before any
        // escape sequence is written.
        terminal::size()?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, Clear(ClearType::All))?;
        install_panic_hook();
        log::debug!("entered alternate screen");
        Ok(Self { out })
    }

    /// Current size in cells (width, height).
    pub fn size(&self) -> io::Result<(usize, usize)> {
        let (w, h) = terminal::size()?;
        Ok((usize::from(w), usize::from(h)))
    }

    /// Paint one frame with a single write.
    pub fn draw(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        let mut buf = Vec::with_capacity(frame.width * frame.height * 4);
        paint(frame, &mut buf)?;
        self.out.write_all(&buf)?;
        self.out.flush()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(self.out, ResetColor, Show, LeaveAlternateScreen);
        log::debug!("left alternate screen");
    }
}
