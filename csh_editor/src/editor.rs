//! C2: the line-editor state machine.
//!
//! New module — the reference shell's `InputParser` plays a similar role but
//! bakes in `#`-prefixed meta-commands and a `bool` return value that don't
//! match this spec's `line / again / fatal` contract. This module keeps the
//! reference's individual pieces (buffer, autocomplete, history, ANSI
//! parser, renderer) and wires them into the state machine the spec
//! describes directly.

use crate::autocomplete::Autocomplete;
use crate::buffer::InputBuffer;
use crate::history::History;
use crate::key_reader::{AnsiKeyParser, Key};
use crate::renderer::DisplayRenderer;
use csh_logger::UnifiedWriter;
use heapless::String;

/// One step's worth of editor output.
pub enum EditorEvent<const IML: usize> {
    /// No complete key yet (mid escape-sequence) or the key had no
    /// user-visible effect.
    Pending,
    /// Enter was pressed; ownership of the completed line.
    Line(String<IML>),
    /// Ctrl-C (SIGINT candidate).
    CtrlC,
    /// Ctrl-\ (SIGQUIT candidate).
    CtrlBackslash,
    /// Ctrl-Z (SIGTSTP candidate).
    CtrlZ,
    /// Ctrl-D on an empty line.
    Eof,
    /// Ctrl-L: caller should clear the screen and redraw.
    ClearScreen,
    /// Terminal answered the `ESC[18t` size probe.
    TermSize { rows: u16, cols: u16 },
}

pub struct LineEditor<'a, W, const NAC: usize, const FNL: usize, const IML: usize, const HTC: usize>
where
    W: UnifiedWriter,
{
    renderer: DisplayRenderer<W>,
    buffer: InputBuffer<IML>,
    autocomplete: Autocomplete<'a, NAC, FNL>,
    history: History<HTC>,
    key_parser: AnsiKeyParser,
    ignore: bool,
    masked: bool,
    auto_refresh: bool,
    term_rows: u16,
    term_cols: u16,
}

impl<'a, W, const NAC: usize, const FNL: usize, const IML: usize, const HTC: usize>
    LineEditor<'a, W, NAC, FNL, IML, HTC>
where
    W: UnifiedWriter,
{
    pub fn new(writer: W) -> Self {
        Self {
            renderer: DisplayRenderer::new(writer),
            buffer: InputBuffer::new(),
            autocomplete: Autocomplete::new(),
            history: History::new(),
            key_parser: AnsiKeyParser::new(),
            ignore: false,
            masked: false,
            auto_refresh: true,
            term_rows: 0,
            term_cols: 0,
        }
    }

    /// Invariant 5: while a command is executing the editor consumes bytes
    /// without rendering or mutating the line.
    pub fn set_ignore(&mut self, ignore: bool) {
        self.ignore = ignore;
        if !ignore {
            self.auto_refresh = true;
        }
    }

    pub fn ignore(&self) -> bool {
        self.ignore
    }

    /// While masked, typed characters still edit the line and Enter still
    /// submits it normally; only rendering is affected, each character
    /// echoed back as `*` (password entry, spec §4.9).
    pub fn set_masked(&mut self, masked: bool) {
        self.masked = masked;
    }

    pub fn masked(&self) -> bool {
        self.masked
    }

    pub fn set_auto_refresh(&mut self, auto_refresh: bool) {
        self.auto_refresh = auto_refresh;
    }

    pub fn term_size(&self) -> (u16, u16) {
        (self.term_rows, self.term_cols)
    }

    pub fn history_mut(&mut self) -> &mut History<HTC> {
        &mut self.history
    }

    pub fn renderer_mut(&mut self) -> &mut DisplayRenderer<W> {
        &mut self.renderer
    }

    /// Emits `ESC[18t`; the reply arrives as a later `feed_byte` call and
    /// surfaces as `EditorEvent::TermSize`.
    pub fn probe_term_size(&mut self) {
        self.renderer.writer_mut().write_bytes(b"\x1b[18t");
        self.renderer.writer_mut().flush();
    }

    pub fn render(&mut self, prompt: &str) {
        let content = self.buffer.to_string();
        if self.masked {
            let mut stars: String<IML> = String::new();
            for _ in 0..content.len() {
                let _ = stars.push('*');
            }
            self.renderer.render(prompt, stars.as_str(), self.buffer.cursor());
        } else {
            self.renderer.render(prompt, content.as_str(), self.buffer.cursor());
        }
    }

    pub fn clear_screen_and_render(&mut self, prompt: &str) {
        self.renderer.writer_mut().write_str("\x1B[2J\x1B[H");
        self.render(prompt);
    }

    /// Feed one transport byte. `get_candidates` supplies the autocomplete
    /// candidate set for a given first character (via a push callback); it
    /// is only invoked when that character's candidates have not already
    /// been loaded.
    pub fn feed_byte<F>(&mut self, byte: u8, prompt: &str, get_candidates: F) -> EditorEvent<IML>
    where
        F: FnMut(char, &mut dyn FnMut(&'a str)),
    {
        let key = match self.key_parser.parse_byte(byte) {
            Some(k) => k,
            None => return EditorEvent::Pending,
        };

        // Signals and the terminal-size reply must reach the caller even in
        // ignore mode (invariant 5 only suppresses line editing/rendering).
        match key {
            Key::CtrlC => return EditorEvent::CtrlC,
            Key::CtrlBackslash => return EditorEvent::CtrlBackslash,
            Key::CtrlZ => return EditorEvent::CtrlZ,
            Key::TermSize { rows, cols } => {
                self.term_rows = rows;
                self.term_cols = cols;
                return EditorEvent::TermSize { rows, cols };
            }
            _ => {}
        }

        if self.ignore {
            return EditorEvent::Pending;
        }

        match key {
            Key::CtrlD if self.buffer.is_empty() => return EditorEvent::Eof,
            Key::CtrlL => return EditorEvent::ClearScreen,
            Key::Enter => {
                let line = self.buffer.to_string();
                self.buffer.clear();
                self.autocomplete.reset();
                if !line.is_empty() {
                    self.history.push(line.as_str());
                }
                return EditorEvent::Line(line);
            }
            Key::Char(c) => {
                if !self.buffer.insert(c) {
                    self.renderer.bell();
                } else {
                    let content = self.buffer.to_string();
                    self.autocomplete.update_input(content.as_str(), get_candidates);
                }
            }
            Key::Backspace => {
                if !self.buffer.backspace() {
                    self.renderer.bell();
                }
            }
            Key::Delete => {
                if !self.buffer.delete() {
                    self.renderer.bell();
                }
            }
            Key::ArrowLeft => self.buffer.move_left(),
            Key::ArrowRight => self.buffer.move_right(),
            Key::Home | Key::CtrlA => self.buffer.move_home(),
            Key::End | Key::CtrlE => self.buffer.move_end(),
            Key::CtrlU => self.buffer.delete_to_start(),
            Key::CtrlK => self.buffer.delete_to_end(),
            Key::CtrlW => self.buffer.delete_word_before(),
            Key::ArrowUp => self.history_prev(),
            Key::ArrowDown => self.history_next(),
            Key::Tab => self.accept_completion(false),
            Key::ShiftTab => self.accept_completion(true),
            Key::CtrlD => {} // non-empty line: no-op
            _ => {}
        }

        if self.auto_refresh {
            self.render(prompt);
        }
        EditorEvent::Pending
    }

    fn accept_completion(&mut self, reverse: bool) {
        let candidates = self.autocomplete.filtered_candidates().len();
        if candidates == 0 {
            return;
        }
        // With exactly 1 candidate, `Autocomplete::update_input` already
        // extended `current_input` by the remaining bytes as the user typed;
        // cycling only makes sense with more than one candidate to cycle
        // between.
        if candidates > 1 {
            if reverse {
                self.autocomplete.cycle_backward();
            } else {
                self.autocomplete.cycle_forward();
            }
        }
        self.buffer.overwrite(self.autocomplete.current_input());
    }

    fn history_prev(&mut self) {
        let mut tmp: String<IML> = String::new();
        let got = self.history.get_prev_entry(|b| {
            let _ = tmp.push(b as char);
            tmp.len() < IML
        });
        if got {
            self.buffer.overwrite(tmp.as_str());
        }
    }

    fn history_next(&mut self) {
        let mut tmp: String<IML> = String::new();
        let got = self.history.get_next_entry(|b| {
            let _ = tmp.push(b as char);
            tmp.len() < IML
        });
        if got {
            self.buffer.overwrite(tmp.as_str());
        }
    }
}
