//! Terminal setup and teardown, plus the raw input feed.

use std::io;
use std::io::IsTerminal;
use std::io::Read;
use std::io::Stdout;
use std::io::stdin;
use std::io::stdout;
use std::panic;

use crossterm::cursor;
use crossterm::execute;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use crate::mouse::DisableMouseReporting;

mod frame_rate_limiter;
mod frame_requester;

pub use frame_requester::FrameRequester;

pub type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Bytes requested per read from stdin; one read becomes one input chunk.
const READ_BUF_SIZE: usize = 4096;

/// Enter raw mode on the alternate screen.
pub fn init() -> io::Result<Terminal> {
    if !stdin().is_terminal() {
        return Err(io::Error::other("stdin is not a terminal"));
    }
    if !stdout().is_terminal() {
        return Err(io::Error::other("stdout is not a terminal"));
    }
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, cursor::Hide)?;
    set_panic_hook();
    ratatui::Terminal::new(CrosstermBackend::new(stdout()))
}

/// Undo [`init`]. Also switches mouse reporting off in case an overlay was torn down mid-session.
pub fn restore() -> io::Result<()> {
    let _ = execute!(stdout(), DisableMouseReporting);
    execute!(stdout(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    let _ = execute!(stdout(), cursor::Show);
    Ok(())
}

fn set_panic_hook() {
    let hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        hook(panic_info);
    }));
}

/// Read raw stdin on a dedicated thread and forward each read as one chunk. A character cut off
/// at the end of a read is held back and sent with the next one.
///
/// The thread ends when stdin reaches EOF, fails, or the receiver is dropped.
pub fn spawn_input_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let mut stdin = stdin().lock();
        let mut buf = [0u8; READ_BUF_SIZE];
        let mut decoder = Utf8Decoder::default();
        loop {
            let n = match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    tracing::warn!("stdin read failed: {err}");
                    break;
                }
            };
            let chunk = decoder.decode(&buf[..n]);
            if !chunk.is_empty() && tx.send(chunk).is_err() {
                return;
            }
        }
        if let Some(rest) = decoder.finish() {
            let _ = tx.send(rest);
        }
        tracing::debug!("input reader exiting");
    });
    rx
}

/// Decodes stdin reads as UTF-8, holding back a character cut off at the end of a read until
/// the rest of its bytes arrive.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let keep = incomplete_tail_len(&self.pending);
        let tail = self.pending.split_off(self.pending.len() - keep);
        let complete = std::mem::replace(&mut self.pending, tail);
        String::from_utf8_lossy(&complete).into_owned()
    }

    /// Whatever is still held back once input ends.
    fn finish(self) -> Option<String> {
        (!self.pending.is_empty()).then(|| String::from_utf8_lossy(&self.pending).into_owned())
    }
}

/// Number of trailing bytes that begin a multi-byte character without completing it.
fn incomplete_tail_len(bytes: &[u8]) -> usize {
    for (back, byte) in bytes.iter().rev().take(3).enumerate() {
        let seen = back + 1;
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let needed = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if needed > seen { seen } else { 0 };
    }
    0
}
