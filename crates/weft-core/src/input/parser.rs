//! Incremental byte-stream decoder for terminal input.
//!
//! Feeds of raw bytes become key, mouse, and resize events. Partial
//! escape sequences are held across feeds; a lone ESC is only reported
//! as the Escape key once the stream goes idle (see
//! [`Parser::idle_flush`]).

use super::event::{Event, Key, KeyEvent, Mods, MouseAction, MouseButton, MouseEvent};

/// Incremental input parser.
#[derive(Debug, Default)]
pub struct Parser {
    buf: Vec<u8>,
}

enum Step {
    /// Consume `n` bytes and emit an event.
    Emit(usize, Event),
    /// Consume `n` bytes with no event (unknown or invalid sequence).
    Skip(usize),
    /// The buffer holds an incomplete sequence; wait for more bytes.
    NeedMore,
}

impl Parser {
    /// Create an empty parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every event decoded so far.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Event> {
        self.buf.extend_from_slice(bytes);
        let mut events = Vec::new();
        loop {
            match parse_one(&self.buf) {
                Step::Emit(n, ev) => {
                    self.buf.drain(..n);
                    events.push(ev);
                }
                Step::Skip(n) => {
                    self.buf.drain(..n);
                }
                Step::NeedMore => break,
            }
            if self.buf.is_empty() {
                break;
            }
        }
        events
    }

    /// Flush a pending lone ESC as the Escape key. Call when the input
    /// stream has been idle long enough that no continuation is coming.
    pub fn idle_flush(&mut self) -> Option<Event> {
        if self.buf == [0x1b] {
            self.buf.clear();
            Some(Event::Key(KeyEvent::key(Key::Escape)))
        } else {
            None
        }
    }

    /// Returns true if a partial sequence is buffered.
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }
}

fn parse_one(buf: &[u8]) -> Step {
    let Some(&first) = buf.first() else {
        return Step::NeedMore;
    };

    match first {
        0x1b => parse_escape(buf),
        0x00..=0x1f | 0x7f => Step::Emit(1, Event::Key(control_key(first))),
        _ => parse_utf8(buf, 0, Mods::NONE),
    }
}

/// Decode a C0 control byte into a key event.
fn control_key(b: u8) -> KeyEvent {
    match b {
        0x0d => KeyEvent::key(Key::Enter),
        0x09 => KeyEvent::key(Key::Tab),
        0x08 | 0x7f => KeyEvent::key(Key::Backspace),
        0x00 => KeyEvent::rune(' ').with_mods(Mods::CTRL),
        0x01..=0x1a => KeyEvent::rune((b + 0x60) as char).with_mods(Mods::CTRL),
        // 0x1c-0x1f: Ctrl + punctuation
        _ => KeyEvent::rune((b | 0x40).to_ascii_lowercase() as char).with_mods(Mods::CTRL),
    }
}

fn parse_escape(buf: &[u8]) -> Step {
    if buf.len() < 2 {
        return Step::NeedMore;
    }
    match buf[1] {
        b'[' => parse_csi(buf),
        b'O' => parse_ss3(buf),
        0x1b => Step::Emit(1, Event::Key(KeyEvent::key(Key::Escape))),
        b if b >= 0x20 => parse_utf8(buf, 1, Mods::ALT),
        // ESC followed by a control byte: report Escape, re-parse the rest.
        _ => Step::Emit(1, Event::Key(KeyEvent::key(Key::Escape))),
    }
}

fn parse_csi(buf: &[u8]) -> Step {
    let mouse = buf.get(2) == Some(&b'<');
    let start = if mouse { 3 } else { 2 };

    let mut i = start;
    while i < buf.len() && (0x30..=0x3f).contains(&buf[i]) {
        i += 1;
    }
    while i < buf.len() && (0x20..=0x2f).contains(&buf[i]) {
        i += 1;
    }
    let Some(&final_byte) = buf.get(i) else {
        return Step::NeedMore;
    };
    let consumed = i + 1;
    if !(0x40..=0x7e).contains(&final_byte) {
        // Malformed sequence; drop it without aborting the stream.
        return Step::Skip(consumed);
    }

    let params: Vec<u32> = buf[start..i]
        .split(|&b| b == b';')
        .map(|p| {
            p.iter()
                .take_while(|b| b.is_ascii_digit())
                .fold(0u32, |acc, &d| {
                    acc.saturating_mul(10).saturating_add(u32::from(d - b'0'))
                })
        })
        .collect();

    if mouse {
        return match decode_sgr_mouse(&params, final_byte) {
            Some(ev) => Step::Emit(consumed, Event::Mouse(ev)),
            None => Step::Skip(consumed),
        };
    }

    let mods = params.get(1).map_or(Mods::NONE, |&m| decode_mods(m));
    let key = match final_byte {
        b'A' => Some(Key::Up),
        b'B' => Some(Key::Down),
        b'C' => Some(Key::Right),
        b'D' => Some(Key::Left),
        b'H' => Some(Key::Home),
        b'F' => Some(Key::End),
        b'Z' => {
            return Step::Emit(
                consumed,
                Event::Key(KeyEvent::key(Key::Tab).with_mods(mods | Mods::SHIFT)),
            );
        }
        b'~' => tilde_key(params.first().copied().unwrap_or(0)),
        _ => None,
    };

    match key {
        Some(key) => Step::Emit(consumed, Event::Key(KeyEvent::key(key).with_mods(mods))),
        // Unknown CSI: silently consumed.
        None => Step::Skip(consumed),
    }
}

/// Key for a `CSI <n> ~` sequence, per the xterm function-key map.
fn tilde_key(param: u32) -> Option<Key> {
    match param {
        1 | 7 => Some(Key::Home),
        2 => Some(Key::Insert),
        3 => Some(Key::Delete),
        4 | 8 => Some(Key::End),
        5 => Some(Key::PageUp),
        6 => Some(Key::PageDown),
        11..=15 => Some(Key::F((param - 10) as u8)),
        17..=21 => Some(Key::F((param - 11) as u8)),
        23 | 24 => Some(Key::F((param - 12) as u8)),
        _ => None,
    }
}

/// Modifier parameter: m = 1 + shift + 2*alt + 4*ctrl.
fn decode_mods(m: u32) -> Mods {
    let bits = m.saturating_sub(1);
    let mut mods = Mods::NONE;
    if bits & 1 != 0 {
        mods = mods | Mods::SHIFT;
    }
    if bits & 2 != 0 {
        mods = mods | Mods::ALT;
    }
    if bits & 4 != 0 {
        mods = mods | Mods::CTRL;
    }
    mods
}

fn decode_sgr_mouse(params: &[u32], final_byte: u8) -> Option<MouseEvent> {
    if params.len() < 3 {
        return None;
    }
    let b = params[0];
    let x = params[1] as i32 - 1;
    let y = params[2] as i32 - 1;

    let mut mods = Mods::NONE;
    if b & 4 != 0 {
        mods = mods | Mods::SHIFT;
    }
    if b & 8 != 0 {
        mods = mods | Mods::ALT;
    }
    if b & 16 != 0 {
        mods = mods | Mods::CTRL;
    }

    let wheel = b & 64 != 0;
    let button = if wheel {
        if b & 3 == 0 {
            MouseButton::WheelUp
        } else {
            MouseButton::WheelDown
        }
    } else {
        match b & 3 {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::None,
        }
    };

    let action = if final_byte == b'm' {
        MouseAction::Release
    } else if b & 32 != 0 {
        MouseAction::Drag
    } else {
        MouseAction::Press
    };

    Some(MouseEvent {
        button,
        action,
        x,
        y,
        mods,
    })
}

fn parse_ss3(buf: &[u8]) -> Step {
    let Some(&c) = buf.get(2) else {
        return Step::NeedMore;
    };
    let key = match c {
        b'P' => Some(Key::F(1)),
        b'Q' => Some(Key::F(2)),
        b'R' => Some(Key::F(3)),
        b'S' => Some(Key::F(4)),
        b'A' => Some(Key::Up),
        b'B' => Some(Key::Down),
        b'C' => Some(Key::Right),
        b'D' => Some(Key::Left),
        b'H' => Some(Key::Home),
        b'F' => Some(Key::End),
        _ => None,
    };
    match key {
        Some(key) => Step::Emit(3, Event::Key(KeyEvent::key(key))),
        None => Step::Skip(3),
    }
}

/// Decode a UTF-8 rune starting at `offset`. Invalid bytes drop one byte
/// and the stream resumes.
fn parse_utf8(buf: &[u8], offset: usize, mods: Mods) -> Step {
    let lead = buf[offset];
    let len = match lead {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => return Step::Skip(offset + 1),
    };
    if buf.len() < offset + len {
        return Step::NeedMore;
    }
    match std::str::from_utf8(&buf[offset..offset + len]) {
        Ok(s) => match s.chars().next() {
            Some(rune) => Step::Emit(
                offset + len,
                Event::Key(KeyEvent::rune(rune).with_mods(mods)),
            ),
            None => Step::Skip(offset + 1),
        },
        Err(_) => Step::Skip(offset + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(bytes: &[u8]) -> Vec<Event> {
        Parser::new().feed(bytes)
    }

    #[test]
    fn ascii_runes() {
        let evs = events(b"ab");
        assert_eq!(evs, vec![
            Event::Key(KeyEvent::rune('a')),
            Event::Key(KeyEvent::rune('b')),
        ]);
    }

    #[test]
    fn control_keys() {
        assert_eq!(events(b"\x0d"), vec![Event::Key(KeyEvent::key(Key::Enter))]);
        assert_eq!(events(b"\x09"), vec![Event::Key(KeyEvent::key(Key::Tab))]);
        assert_eq!(events(b"\x08"), vec![Event::Key(KeyEvent::key(
            Key::Backspace
        ))]);
        assert_eq!(events(b"\x7f"), vec![Event::Key(KeyEvent::key(
            Key::Backspace
        ))]);
    }

    #[test]
    fn ctrl_letters() {
        // Ctrl+A = 0x01
        assert_eq!(events(b"\x01"), vec![Event::Key(
            KeyEvent::rune('a').with_mods(Mods::CTRL)
        )]);
        // Ctrl+Z = 0x1A
        assert_eq!(events(b"\x1a"), vec![Event::Key(
            KeyEvent::rune('z').with_mods(Mods::CTRL)
        )]);
    }

    #[test]
    fn ctrl_space() {
        assert_eq!(events(b"\x00"), vec![Event::Key(
            KeyEvent::rune(' ').with_mods(Mods::CTRL)
        )]);
    }

    #[test]
    fn csi_arrows() {
        assert_eq!(events(b"\x1b[A"), vec![Event::Key(KeyEvent::key(Key::Up))]);
        assert_eq!(events(b"\x1b[B"), vec![Event::Key(KeyEvent::key(Key::Down))]);
        assert_eq!(events(b"\x1b[C"), vec![Event::Key(KeyEvent::key(
            Key::Right
        ))]);
        assert_eq!(events(b"\x1b[D"), vec![Event::Key(KeyEvent::key(Key::Left))]);
    }

    #[test]
    fn csi_home_end() {
        assert_eq!(events(b"\x1b[H"), vec![Event::Key(KeyEvent::key(Key::Home))]);
        assert_eq!(events(b"\x1b[F"), vec![Event::Key(KeyEvent::key(Key::End))]);
    }

    #[test]
    fn csi_modified_arrow() {
        // ESC[1;5A → Ctrl+Up
        assert_eq!(events(b"\x1b[1;5A"), vec![Event::Key(
            KeyEvent::key(Key::Up).with_mods(Mods::CTRL)
        )]);
        // ESC[1;2D → Shift+Left
        assert_eq!(events(b"\x1b[1;2D"), vec![Event::Key(
            KeyEvent::key(Key::Left).with_mods(Mods::SHIFT)
        )]);
        // ESC[1;4C → Shift+Alt+Right
        assert_eq!(events(b"\x1b[1;4C"), vec![Event::Key(
            KeyEvent::key(Key::Right).with_mods(Mods::SHIFT | Mods::ALT)
        )]);
    }

    #[test]
    fn csi_tilde_keys() {
        assert_eq!(events(b"\x1b[2~"), vec![Event::Key(KeyEvent::key(
            Key::Insert
        ))]);
        assert_eq!(events(b"\x1b[3~"), vec![Event::Key(KeyEvent::key(
            Key::Delete
        ))]);
        assert_eq!(events(b"\x1b[5~"), vec![Event::Key(KeyEvent::key(
            Key::PageUp
        ))]);
        assert_eq!(events(b"\x1b[6~"), vec![Event::Key(KeyEvent::key(
            Key::PageDown
        ))]);
    }

    #[test]
    fn csi_function_keys() {
        assert_eq!(events(b"\x1b[15~"), vec![Event::Key(KeyEvent::key(Key::F(
            5
        )))]);
        assert_eq!(events(b"\x1b[17~"), vec![Event::Key(KeyEvent::key(Key::F(
            6
        )))]);
        assert_eq!(events(b"\x1b[24~"), vec![Event::Key(KeyEvent::key(Key::F(
            12
        )))]);
    }

    #[test]
    fn csi_back_tab() {
        assert_eq!(events(b"\x1b[Z"), vec![Event::Key(
            KeyEvent::key(Key::Tab).with_mods(Mods::SHIFT)
        )]);
    }

    #[test]
    fn ss3_function_keys() {
        assert_eq!(events(b"\x1bOP"), vec![Event::Key(KeyEvent::key(Key::F(1)))]);
        assert_eq!(events(b"\x1bOS"), vec![Event::Key(KeyEvent::key(Key::F(4)))]);
        assert_eq!(events(b"\x1bOA"), vec![Event::Key(KeyEvent::key(Key::Up))]);
        assert_eq!(events(b"\x1bOF"), vec![Event::Key(KeyEvent::key(Key::End))]);
    }

    #[test]
    fn sgr_mouse_left_press() {
        let evs = events(b"\x1b[<0;10;5M");
        assert_eq!(evs, vec![Event::Mouse(MouseEvent {
            button: MouseButton::Left,
            action: MouseAction::Press,
            x: 9,
            y: 4,
            mods: Mods::NONE,
        })]);
    }

    #[test]
    fn sgr_mouse_wheel_up() {
        let evs = events(b"\x1b[<64;20;15M");
        assert_eq!(evs, vec![Event::Mouse(MouseEvent {
            button: MouseButton::WheelUp,
            action: MouseAction::Press,
            x: 19,
            y: 14,
            mods: Mods::NONE,
        })]);
    }

    #[test]
    fn sgr_mouse_wheel_down() {
        let evs = events(b"\x1b[<65;1;1M");
        assert_eq!(
            evs,
            vec![Event::Mouse(MouseEvent {
                button: MouseButton::WheelDown,
                action: MouseAction::Press,
                x: 0,
                y: 0,
                mods: Mods::NONE,
            })]
        );
    }

    #[test]
    fn sgr_mouse_release() {
        let evs = events(b"\x1b[<0;3;4m");
        assert_eq!(evs.len(), 1);
        match evs[0] {
            Event::Mouse(me) => assert_eq!(me.action, MouseAction::Release),
            _ => unreachable!(),
        }
    }

    #[test]
    fn sgr_mouse_drag() {
        let evs = events(b"\x1b[<32;3;4M");
        assert_eq!(evs.len(), 1);
        match evs[0] {
            Event::Mouse(me) => {
                assert_eq!(me.action, MouseAction::Drag);
                assert_eq!(me.button, MouseButton::Left);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn sgr_mouse_modifiers() {
        // b = 0 | ctrl(16) = 16
        let evs = events(b"\x1b[<16;1;1M");
        match evs[0] {
            Event::Mouse(me) => assert!(me.mods.contains(Mods::CTRL)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn alt_printable() {
        assert_eq!(events(b"\x1bx"), vec![Event::Key(
            KeyEvent::rune('x').with_mods(Mods::ALT)
        )]);
    }

    #[test]
    fn utf8_multibyte() {
        let evs = events("é世".as_bytes());
        assert_eq!(evs, vec![
            Event::Key(KeyEvent::rune('é')),
            Event::Key(KeyEvent::rune('世')),
        ]);
    }

    #[test]
    fn utf8_split_across_feeds() {
        let mut p = Parser::new();
        let bytes = "世".as_bytes();
        assert!(p.feed(&bytes[..1]).is_empty());
        assert!(p.feed(&bytes[1..2]).is_empty());
        assert_eq!(p.feed(&bytes[2..]), vec![Event::Key(KeyEvent::rune('世'))]);
    }

    #[test]
    fn invalid_utf8_drops_one_byte() {
        // 0xFF is never valid; the following 'a' must still decode.
        let evs = events(&[0xff, b'a']);
        assert_eq!(evs, vec![Event::Key(KeyEvent::rune('a'))]);
    }

    #[test]
    fn truncated_utf8_drops_lead_byte() {
        // A 2-byte lead followed by an ASCII byte is invalid.
        let evs = events(&[0xc3, b'a']);
        assert_eq!(evs, vec![Event::Key(KeyEvent::rune('a'))]);
    }

    #[test]
    fn lone_escape_needs_idle_flush() {
        let mut p = Parser::new();
        assert!(p.feed(b"\x1b").is_empty());
        assert!(p.has_pending());
        assert_eq!(p.idle_flush(), Some(Event::Key(KeyEvent::key(Key::Escape))));
        assert!(!p.has_pending());
    }

    #[test]
    fn escape_then_sequence_not_flushed() {
        let mut p = Parser::new();
        assert!(p.feed(b"\x1b[").is_empty());
        assert_eq!(p.idle_flush(), None);
        assert_eq!(p.feed(b"A"), vec![Event::Key(KeyEvent::key(Key::Up))]);
    }

    #[test]
    fn csi_split_across_feeds() {
        let mut p = Parser::new();
        assert!(p.feed(b"\x1b[1;").is_empty());
        assert_eq!(p.feed(b"5A"), vec![Event::Key(
            KeyEvent::key(Key::Up).with_mods(Mods::CTRL)
        )]);
    }

    #[test]
    fn unknown_csi_silently_consumed() {
        let evs = events(b"\x1b[99qa");
        // The unknown sequence is dropped; following text decodes.
        assert_eq!(evs, vec![Event::Key(KeyEvent::rune('a'))]);
    }

    #[test]
    fn mixed_stream() {
        let evs = events(b"a\x1b[Bq");
        assert_eq!(evs, vec![
            Event::Key(KeyEvent::rune('a')),
            Event::Key(KeyEvent::key(Key::Down)),
            Event::Key(KeyEvent::rune('q')),
        ]);
    }
}
