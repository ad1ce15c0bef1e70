//! Incremental VT100/ANSI byte-to-key decoder.
//!
//! Ported from the reference shell's embedded ANSI parser and extended with
//! the `ESC O <final>` SS3 function-key form and the `ESC[8;rows;colst`
//! terminal-size response, neither of which the original parser recognized.

use heapless::Vec;

const ESCAPE_BUFFER_CAP: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Home,
    End,
    Delete,

    Enter,
    Backspace,
    Tab,
    ShiftTab,

    CtrlA,
    CtrlE,
    CtrlU,
    CtrlK,
    CtrlW,
    CtrlL,
    CtrlD,
    CtrlC,
    CtrlBackslash,
    CtrlZ,

    /// Response to the `ESC[18t` terminal size probe.
    TermSize { rows: u16, cols: u16 },

    Char(char),
}

/// Incremental CSI/SS3 parser: feed one byte at a time, get `Some(Key)` when
/// a full key (or escape sequence) has been recognized.
pub struct AnsiKeyParser {
    escape_buffer: Vec<u8, ESCAPE_BUFFER_CAP>,
    in_escape: bool,
}

impl Default for AnsiKeyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AnsiKeyParser {
    pub const fn new() -> Self {
        Self {
            escape_buffer: Vec::new(),
            in_escape: false,
        }
    }

    pub fn parse_byte(&mut self, byte: u8) -> Option<Key> {
        if byte == 0x1B {
            self.in_escape = true;
            self.escape_buffer.clear();
            return None;
        }

        if self.in_escape {
            if self.escape_buffer.is_empty() && byte != b'[' && byte != b'O' {
                // Not a recognized introducer; drop the lone ESC silently.
                self.in_escape = false;
                return None;
            }
            if self.escape_buffer.push(byte).is_err() {
                self.in_escape = false;
                self.escape_buffer.clear();
                return None;
            }
            return self.try_complete_escape();
        }

        match byte {
            0x01 => Some(Key::CtrlA),
            0x05 => Some(Key::CtrlE),
            0x15 => Some(Key::CtrlU),
            0x0B => Some(Key::CtrlK),
            0x17 => Some(Key::CtrlW),
            0x0C => Some(Key::CtrlL),
            0x04 => Some(Key::CtrlD),
            0x03 => Some(Key::CtrlC),
            0x1C => Some(Key::CtrlBackslash),
            0x1A => Some(Key::CtrlZ),
            b'\r' | b'\n' => Some(Key::Enter),
            b'\t' => Some(Key::Tab),
            0x7F | 0x08 => Some(Key::Backspace),
            c if (0x20..0x7F).contains(&c) => Some(Key::Char(c as char)),
            _ => None,
        }
    }

    fn try_complete_escape(&mut self) -> Option<Key> {
        let buf = self.escape_buffer.clone();

        if buf.is_empty() {
            return None;
        }

        let result = match buf[0] {
            b'O' => {
                if buf.len() < 2 {
                    None
                } else {
                    Some(match buf[1] {
                        b'A' => Key::ArrowUp,
                        b'B' => Key::ArrowDown,
                        b'C' => Key::ArrowRight,
                        b'D' => Key::ArrowLeft,
                        b'H' => Key::Home,
                        b'F' => Key::End,
                        other => Key::Char(other as char),
                    })
                }
            }
            b'[' => self.try_complete_csi(&buf[1..]),
            _ => Some(Key::Char(buf[0] as char)),
        };

        if result.is_some() || buf.len() >= ESCAPE_BUFFER_CAP {
            self.in_escape = false;
            self.escape_buffer.clear();
        }
        result
    }

    fn try_complete_csi(&self, params: &[u8]) -> Option<Key> {
        let final_pos = params
            .iter()
            .position(|&b| !(b.is_ascii_digit() || b == b';'))?;
        let final_byte = params[final_pos];
        let digits = &params[..final_pos];

        Some(match final_byte {
            b'A' => Key::ArrowUp,
            b'B' => Key::ArrowDown,
            b'C' => Key::ArrowRight,
            b'D' => Key::ArrowLeft,
            b'H' => Key::Home,
            b'F' => Key::End,
            b'Z' => Key::ShiftTab,
            b'~' => match parse_u16(first_field(digits)) {
                Some(1) => Key::Home,
                Some(3) => Key::Delete,
                Some(4) => Key::End,
                _ => return None,
            },
            b't' => {
                let mut fields = digits.split(|&b| b == b';');
                let kind = fields.next().and_then(parse_u16);
                let rows = fields.next().and_then(parse_u16);
                let cols = fields.next().and_then(parse_u16);
                match (kind, rows, cols) {
                    (Some(8), Some(rows), Some(cols)) => Key::TermSize { rows, cols },
                    _ => return None,
                }
            }
            other => Key::Char(other as char),
        })
    }
}

fn first_field(digits: &[u8]) -> &[u8] {
    digits.split(|&b| b == b';').next().unwrap_or(digits)
}

fn parse_u16(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() {
        return None;
    }
    let mut value: u16 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add((b - b'0') as u16)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_chars() {
        let mut p = AnsiKeyParser::new();
        assert_eq!(p.parse_byte(b'a'), Some(Key::Char('a')));
        assert_eq!(p.parse_byte(b'5'), Some(Key::Char('5')));
    }

    #[test]
    fn control_keys() {
        let mut p = AnsiKeyParser::new();
        assert_eq!(p.parse_byte(0x01), Some(Key::CtrlA));
        assert_eq!(p.parse_byte(0x05), Some(Key::CtrlE));
        assert_eq!(p.parse_byte(0x17), Some(Key::CtrlW));
        assert_eq!(p.parse_byte(0x03), Some(Key::CtrlC));
        assert_eq!(p.parse_byte(0x1C), Some(Key::CtrlBackslash));
        assert_eq!(p.parse_byte(0x1A), Some(Key::CtrlZ));
        assert_eq!(p.parse_byte(b'\r'), Some(Key::Enter));
        assert_eq!(p.parse_byte(b'\t'), Some(Key::Tab));
    }

    #[test]
    fn arrow_keys() {
        let mut p = AnsiKeyParser::new();
        assert_eq!(p.parse_byte(0x1B), None);
        assert_eq!(p.parse_byte(b'['), None);
        assert_eq!(p.parse_byte(b'A'), Some(Key::ArrowUp));
    }

    #[test]
    fn ss3_arrow_keys() {
        let mut p = AnsiKeyParser::new();
        assert_eq!(p.parse_byte(0x1B), None);
        assert_eq!(p.parse_byte(b'O'), None);
        assert_eq!(p.parse_byte(b'C'), Some(Key::ArrowRight));
    }

    #[test]
    fn delete_key() {
        let mut p = AnsiKeyParser::new();
        for b in [0x1B, b'[', b'3', b'~'] {
            let r = p.parse_byte(b);
            if b == b'~' {
                assert_eq!(r, Some(Key::Delete));
            }
        }
    }

    #[test]
    fn term_size_response() {
        let mut p = AnsiKeyParser::new();
        let seq = b"\x1b[8;24;80t";
        let mut last = None;
        for &b in seq {
            last = p.parse_byte(b);
        }
        assert_eq!(last, Some(Key::TermSize { rows: 24, cols: 80 }));
    }

    #[test]
    fn unknown_sequence_discarded() {
        let mut p = AnsiKeyParser::new();
        assert_eq!(p.parse_byte(0x1B), None);
        assert_eq!(p.parse_byte(b'['), None);
        assert_eq!(p.parse_byte(b'9'), None);
        assert_eq!(p.parse_byte(b'9'), None);
        // no final byte ever arrives before buffer fills; next ESC resets cleanly
        assert_eq!(p.parse_byte(0x1B), None);
        assert_eq!(p.parse_byte(b'['), None);
        assert_eq!(p.parse_byte(b'A'), Some(Key::ArrowUp));
    }
}
