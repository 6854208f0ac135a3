//! Mouse-wheel support for the split pane.
//!
//! While the overlay is open the terminal is asked for button-event reporting in SGR form. Wheel
//! events arrive as `ESC [ < button ; column ; row M` (or `m` on release); buttons 64 and 65 are
//! wheel up and wheel down.

use std::fmt;
use std::io;
use std::io::Write;

use crossterm::Command;
use crossterm::execute;
use lazy_static::lazy_static;
use regex_lite::Regex;

/// Lines scrolled per wheel notch.
pub const WHEEL_SCROLL_LINES: usize = 3;

const WHEEL_UP_BUTTON: u16 = 64;
const WHEEL_DOWN_BUTTON: u16 = 65;

lazy_static! {
    static ref SGR_MOUSE_REGEX: Regex = Regex::new(r"^\x1b\[<(\d+);(\d+);(\d+)([Mm])$")
        .unwrap_or_else(|_| std::process::abort());
}

/// Button-event tracking plus SGR extended coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableMouseReporting;

impl Command for EnableMouseReporting {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "\x1b[?1000h\x1b[?1006h")
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> io::Result<()> {
        Err(io::Error::other(
            "tried to execute EnableMouseReporting using WinAPI; use ANSI instead",
        ))
    }

    #[cfg(windows)]
    fn is_ansi_code_supported(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisableMouseReporting;

impl Command for DisableMouseReporting {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "\x1b[?1000l\x1b[?1006l")
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> io::Result<()> {
        Err(io::Error::other(
            "tried to execute DisableMouseReporting using WinAPI; use ANSI instead",
        ))
    }

    #[cfg(windows)]
    fn is_ansi_code_supported(&self) -> bool {
        true
    }
}

/// Keeps mouse reporting switched on for as long as it is alive and enabled.
///
/// Dropping an enabled guard switches reporting back off, so an overlay that is torn down without
/// going through an exit path still leaves the terminal clean.
pub struct MouseReporting {
    out: Box<dyn Write + Send>,
    enabled: bool,
}

impl MouseReporting {
    pub fn enable(mut out: Box<dyn Write + Send>) -> io::Result<Self> {
        execute!(out, EnableMouseReporting)?;
        tracing::debug!("mouse reporting enabled");
        Ok(Self { out, enabled: true })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch reporting off. Calling this more than once writes nothing further.
    pub fn disable(&mut self) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.enabled = false;
        execute!(self.out, DisableMouseReporting)?;
        tracing::debug!("mouse reporting disabled");
        Ok(())
    }
}

impl Drop for MouseReporting {
    fn drop(&mut self) {
        if let Err(err) = self.disable() {
            tracing::warn!("failed to disable mouse reporting: {err}");
        }
    }
}

impl fmt::Debug for MouseReporting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MouseReporting")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    Up,
    Down,
}

/// One decoded SGR mouse report. Coordinates are 1-based, as sent by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SgrMouseEvent {
    pub button: u16,
    pub column: u16,
    pub row: u16,
    pub pressed: bool,
}

impl SgrMouseEvent {
    pub fn wheel(&self) -> Option<WheelDirection> {
        match self.button {
            WHEEL_UP_BUTTON => Some(WheelDirection::Up),
            WHEEL_DOWN_BUTTON => Some(WheelDirection::Down),
            _ => None,
        }
    }
}

/// Parse a complete SGR mouse report. Anything else, including truncated reports, is `None`.
pub fn parse_sgr_mouse(data: &str) -> Option<SgrMouseEvent> {
    let caps = SGR_MOUSE_REGEX.captures(data)?;
    Some(SgrMouseEvent {
        button: caps.get(1)?.as_str().parse().ok()?,
        column: caps.get(2)?.as_str().parse().ok()?,
        row: caps.get(3)?.as_str().parse().ok()?,
        pressed: caps.get(4)?.as_str() == "M",
    })
}
