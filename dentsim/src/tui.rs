//! Terminal setup and teardown.
//!
//! Frames go to stderr; stdout is never written while the alternate screen
//! is up. Logging goes to a file for the same reason.

use std::io::{stderr, BufWriter, Stderr};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crossterm::cursor::Show;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

/// Buffered so each frame's escape sequences go out in few writes.
pub type Tui = Terminal<CrosstermBackend<BufWriter<Stderr>>>;

/// Raw mode, alternate screen and mouse capture. Pair with [`restore_tui`].
pub fn init_tui() -> std::io::Result<Tui> {
    enable_raw_mode()?;
    let mut out = BufWriter::new(stderr());
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(out))?;
    terminal.clear()?;
    Ok(terminal)
}

/// Undoes [`init_tui`]. Safe to call more than once, and from the panic hook.
pub fn restore_tui() -> std::io::Result<()> {
    disable_raw_mode()?;
    execute!(stderr(), DisableMouseCapture, LeaveAlternateScreen, Show)
}

/// Chains a hook that restores the terminal, so the panic message lands on
/// the normal screen instead of being wiped with the alternate one.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_tui();
        previous(info);
    }));
}

/// Flag set by SIGTERM and polled by the main loop's heartbeat.
///
/// # Panics
///
/// If the handler cannot be installed. Startup cannot continue without it.
pub fn register_sigterm() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&flag))
        .expect("Failed to register SIGTERM handler");
    flag
}
