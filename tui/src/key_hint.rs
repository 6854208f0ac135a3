//! Key bindings and decoding of raw terminal input into key events.
//!
//! Input reaches the overlay as raw terminal chunks. [`decode_key`] turns one chunk into a
//! crossterm [`KeyEvent`] so bindings can be declared as constants and matched the same way
//! regardless of which encoding the terminal used (legacy VT, SS3, xterm modifiers, kitty CSI-u).

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Span;

const ALT_PREFIX: &str = "alt + ";
const CTRL_PREFIX: &str = "ctrl + ";
const SHIFT_PREFIX: &str = "shift + ";

/// A keyboard binding with key and modifiers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyBinding {
    key: KeyCode,
    modifiers: KeyModifiers,
}

impl KeyBinding {
    pub const fn new(key: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { key, modifiers }
    }

    /// Check if this binding matches the given key event (press or repeat).
    pub fn is_press(&self, event: KeyEvent) -> bool {
        self.key == event.code
            && self.modifiers == event.modifiers
            && (event.kind == KeyEventKind::Press || event.kind == KeyEventKind::Repeat)
    }

    /// Check if a raw input chunk encodes exactly this binding.
    pub fn matches(&self, data: &str) -> bool {
        decode_key(data).is_some_and(|event| self.is_press(event))
    }
}

/// Create a plain key binding (no modifiers).
pub const fn plain(key: KeyCode) -> KeyBinding {
    KeyBinding::new(key, KeyModifiers::NONE)
}

/// Create an Alt+key binding.
pub const fn alt(key: KeyCode) -> KeyBinding {
    KeyBinding::new(key, KeyModifiers::ALT)
}

/// Create a Shift+key binding.
pub const fn shift(key: KeyCode) -> KeyBinding {
    KeyBinding::new(key, KeyModifiers::SHIFT)
}

/// Create a Ctrl+key binding.
pub const fn ctrl(key: KeyCode) -> KeyBinding {
    KeyBinding::new(key, KeyModifiers::CONTROL)
}

fn modifiers_to_string(modifiers: KeyModifiers) -> String {
    let mut result = String::new();
    if modifiers.contains(KeyModifiers::CONTROL) {
        result.push_str(CTRL_PREFIX);
    }
    if modifiers.contains(KeyModifiers::SHIFT) {
        result.push_str(SHIFT_PREFIX);
    }
    if modifiers.contains(KeyModifiers::ALT) {
        result.push_str(ALT_PREFIX);
    }
    result
}

impl From<KeyBinding> for Span<'static> {
    fn from(binding: KeyBinding) -> Self {
        (&binding).into()
    }
}

impl From<&KeyBinding> for Span<'static> {
    fn from(binding: &KeyBinding) -> Self {
        let KeyBinding { key, modifiers } = binding;
        let modifiers = modifiers_to_string(*modifiers);
        let key = match key {
            KeyCode::Enter => "enter".to_string(),
            KeyCode::Esc => "esc".to_string(),
            KeyCode::Tab => "tab".to_string(),
            KeyCode::Backspace => "backspace".to_string(),
            KeyCode::Delete => "delete".to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            KeyCode::PageUp => "pgup".to_string(),
            KeyCode::PageDown => "pgdn".to_string(),
            KeyCode::Home => "home".to_string(),
            KeyCode::End => "end".to_string(),
            KeyCode::Char(c) => c.to_string(),
            other => format!("{other:?}").to_ascii_lowercase(),
        };
        Span::styled(format!("{modifiers}{key}"), key_hint_style())
    }
}

fn key_hint_style() -> Style {
    Style::default().dim()
}

/// Decode one raw input chunk into a key event.
///
/// Returns `None` for anything that is not exactly one key: mouse reports, pastes of several
/// characters, unknown escape sequences.
pub fn decode_key(data: &str) -> Option<KeyEvent> {
    let key = |code, modifiers| Some(KeyEvent::new(code, modifiers));
    match data {
        "\x1b" => return key(KeyCode::Esc, KeyModifiers::NONE),
        "\r" | "\n" => return key(KeyCode::Enter, KeyModifiers::NONE),
        "\t" => return key(KeyCode::Tab, KeyModifiers::NONE),
        "\x1b[Z" => return key(KeyCode::BackTab, KeyModifiers::SHIFT),
        "\x7f" | "\x08" => return key(KeyCode::Backspace, KeyModifiers::NONE),
        "\x1b\r" => return key(KeyCode::Enter, KeyModifiers::ALT),
        _ => {}
    }
    if let Some(rest) = data.strip_prefix("\x1b[") {
        return decode_csi(rest);
    }
    if let Some(rest) = data.strip_prefix("\x1bO") {
        let mut chars = rest.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => cursor_key(c).map(|code| KeyEvent::new(code, KeyModifiers::NONE)),
            _ => None,
        };
    }

    let mut chars = data.chars();
    let first = chars.next()?;
    let second = chars.next();
    if chars.next().is_some() {
        return None;
    }
    match (first, second) {
        ('\x1b', Some(c)) if !c.is_control() => key(KeyCode::Char(c), KeyModifiers::ALT),
        (c, None) if ('\u{1}'..='\u{1a}').contains(&c) => {
            let letter = char::from(b'a' + (c as u8) - 1);
            key(KeyCode::Char(letter), KeyModifiers::CONTROL)
        }
        (c, None) if !c.is_control() => key(KeyCode::Char(c), KeyModifiers::NONE),
        _ => None,
    }
}

/// Split one raw read into the inputs it carries, in order.
///
/// Terminals batch whatever arrived between reads: several wheel reports, a held key, an arrow
/// followed by a letter. Escape sequences and control bytes always stand alone. A printable run
/// is split into single keys only when it repeats one character (a held key); any other run is
/// pasted text and stays whole, as does a chunk without escapes that contains line breaks.
pub fn split_input(data: &str) -> Vec<&str> {
    if is_multiline_paste(data) {
        return vec![data];
    }
    let mut units = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        let Some((unit, tail)) = rest.split_at_checked(next_unit_len(rest)) else {
            units.push(rest);
            break;
        };
        if is_key_repeat(unit) {
            units.extend(
                unit.char_indices()
                    .filter_map(|(idx, c)| unit.get(idx..idx + c.len_utf8())),
            );
        } else {
            units.push(unit);
        }
        rest = tail;
    }
    units
}

fn is_multiline_paste(data: &str) -> bool {
    !data.contains('\x1b')
        && data.contains(['\r', '\n'])
        && data.chars().any(|c| !c.is_control())
}

fn is_key_repeat(unit: &str) -> bool {
    let mut chars = unit.chars();
    match chars.next() {
        Some(first) if !first.is_control() => chars.all(|c| c == first),
        _ => false,
    }
}

/// Byte length of the input at the start of `data`.
fn next_unit_len(data: &str) -> usize {
    match data.chars().next() {
        None => 0,
        Some('\x1b') => escape_len(data),
        Some(c) if c.is_control() => c.len_utf8(),
        Some(_) => data.find(|c: char| c.is_control()).unwrap_or(data.len()),
    }
}

/// Length of the escape sequence `data` starts with. ESC is a single byte.
fn escape_len(data: &str) -> usize {
    let body = data.get(1..).unwrap_or_default();
    let mut chars = body.char_indices();
    match chars.next() {
        None | Some((_, '\x1b')) => 1,
        Some((_, '[')) => {
            for (idx, c) in chars {
                match c {
                    // Parameter and intermediate bytes.
                    '\x20'..='\x3f' => {}
                    '\x40'..='\x7e' => return 1 + idx + 1,
                    _ => return 1 + idx,
                }
            }
            data.len()
        }
        Some((_, 'O')) => chars
            .next()
            .map_or(data.len(), |(idx, c)| 1 + idx + c.len_utf8()),
        Some((_, c)) => 1 + c.len_utf8(),
    }
}

fn cursor_key(final_byte: char) -> Option<KeyCode> {
    match final_byte {
        'A' => Some(KeyCode::Up),
        'B' => Some(KeyCode::Down),
        'C' => Some(KeyCode::Right),
        'D' => Some(KeyCode::Left),
        'H' => Some(KeyCode::Home),
        'F' => Some(KeyCode::End),
        _ => None,
    }
}

/// Decode the body of a CSI sequence (everything after `ESC [`).
fn decode_csi(body: &str) -> Option<KeyEvent> {
    let final_byte = body
        .chars()
        .last()
        .filter(|c| c.is_ascii_alphabetic() || *c == '~')?;
    let params = &body[..body.len() - 1];
    // Parameters only; anything else means several sequences arrived in one chunk.
    if !params.chars().all(|c| c.is_ascii_digit() || c == ';' || c == ':') {
        return None;
    }
    let mut fields = params.split(';');
    let first = fields
        .next()
        .and_then(|f| f.split(':').next())
        .unwrap_or_default();
    let modifiers = fields
        .next()
        .and_then(|f| f.split(':').next())
        .and_then(|m| m.parse::<u8>().ok())
        .map(modifiers_from_param)
        .unwrap_or(KeyModifiers::NONE);

    let code = match final_byte {
        '~' => match first {
            "1" | "7" => KeyCode::Home,
            "2" => KeyCode::Insert,
            "3" => KeyCode::Delete,
            "4" | "8" => KeyCode::End,
            "5" => KeyCode::PageUp,
            "6" => KeyCode::PageDown,
            _ => return None,
        },
        'u' => match first.parse::<u32>().ok()? {
            9 => KeyCode::Tab,
            13 => KeyCode::Enter,
            27 => KeyCode::Esc,
            127 => KeyCode::Backspace,
            cp => KeyCode::Char(char::from_u32(cp)?),
        },
        other => cursor_key(other)?,
    };
    Some(normalize_shifted_char(KeyEvent::new(code, modifiers)))
}

/// xterm/kitty modifier parameter: 1 + bitmask (shift = 1, alt = 2, ctrl = 4).
fn modifiers_from_param(param: u8) -> KeyModifiers {
    let mask = param.saturating_sub(1);
    let mut modifiers = KeyModifiers::NONE;
    if mask & 1 != 0 {
        modifiers |= KeyModifiers::SHIFT;
    }
    if mask & 2 != 0 {
        modifiers |= KeyModifiers::ALT;
    }
    if mask & 4 != 0 {
        modifiers |= KeyModifiers::CONTROL;
    }
    modifiers
}

/// Kitty reports `shift+k` as `k` with a shift modifier; legacy terminals send `K`.
fn normalize_shifted_char(event: KeyEvent) -> KeyEvent {
    match event.code {
        KeyCode::Char(c)
            if c.is_ascii_lowercase() && event.modifiers == KeyModifiers::SHIFT =>
        {
            KeyEvent::new(KeyCode::Char(c.to_ascii_uppercase()), KeyModifiers::NONE)
        }
        _ => event,
    }
}
