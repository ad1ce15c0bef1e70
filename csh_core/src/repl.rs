//! REPL driver (C6): turns transport bytes into executed commands.
//!
//! Implements the spec's read/edit/tokenize/resolve/execute/reprompt loop
//! as one `step` call per available byte, so both a bare-metal interrupt
//! handler and a hosted `loop { }` can drive it identically. The transport
//! and embedder `data` slot are supplied once at construction rather than
//! per byte: under the `threaded` execution model a dispatched command's
//! `ArgvContext` is moved onto a worker thread for the run's duration, so
//! these need a lifetime that outlives any single `step` call.

use crate::config::MAX_ARG;
use crate::exec::BareExec;
#[cfg(feature = "threaded")]
use crate::exec::{ThreadedExec, ThreadedPoll};
use crate::parser::{tokenize, ArgvContext};
use crate::prompt::Prompt;
use crate::session::{Session, SessionStep};
use crate::signal::{DefaultAction, Handler, Signal, SignalTable};
use crate::symtab::{CommandTable, VariableTable};
use core::sync::atomic::{AtomicBool, Ordering};
use csh_editor::editor::EditorEvent;
use csh_editor::{LineEditor, Transport};
use csh_logger::UnifiedWriter;

/// Outcome of one `Repl::step` call.
pub enum ReplStep {
    /// Byte consumed; nothing externally visible happened yet.
    Again,
    /// A command ran to completion; carries its exit status.
    Ran(i32),
    /// Ctrl-D on an empty, authenticated line: caller should end the
    /// session.
    Quit,
    /// A command's execution was cancelled by a signal.
    Cancelled,
    /// Login failed; username prompt should be shown again.
    LoginRejected,
    /// Input was malformed in a way the REPL can't recover from on its own
    /// (e.g. non-UTF-8 after tokenizing); the caller decides what to do.
    Error(crate::error::ShellError),
}

pub struct Repl<'a, W, const NAC: usize, const FNL: usize, const IML: usize, const HTC: usize>
where
    W: UnifiedWriter,
{
    editor: LineEditor<'a, W, NAC, FNL, IML, HTC>,
    commands: CommandTable,
    variables: VariableTable,
    session: Session,
    signals: SignalTable,
    #[cfg(feature = "threaded")]
    cancel: &'static AtomicBool,
    #[cfg(not(feature = "threaded"))]
    cancel: AtomicBool,
    prompt: Prompt,
    threaded: bool,
    out: Option<&'static mut (dyn Transport + Send)>,
    data: Option<&'static mut (dyn core::any::Any + Send)>,
    #[cfg(feature = "threaded")]
    inflight: Option<crate::exec::ThreadedHandle>,
}

impl<'a, W, const NAC: usize, const FNL: usize, const IML: usize, const HTC: usize>
    Repl<'a, W, NAC, FNL, IML, HTC>
where
    W: UnifiedWriter,
{
    pub fn new(
        writer: W,
        commands: CommandTable,
        variables: VariableTable,
        session: Session,
        prompt: Prompt,
        threaded: bool,
        out: &'static mut (dyn Transport + Send),
        data: &'static mut (dyn core::any::Any + Send),
    ) -> Self {
        #[cfg(feature = "threaded")]
        let cancel: &'static AtomicBool = Box::leak(Box::new(AtomicBool::new(false)));
        #[cfg(not(feature = "threaded"))]
        let cancel = AtomicBool::new(false);

        Self {
            editor: LineEditor::new(writer),
            commands,
            variables,
            session,
            signals: SignalTable::new(),
            cancel,
            prompt,
            threaded,
            out: Some(out),
            data: Some(data),
            #[cfg(feature = "threaded")]
            inflight: None,
        }
    }

    pub fn editor_mut(&mut self) -> &mut LineEditor<'a, W, NAC, FNL, IML, HTC> {
        &mut self.editor
    }

    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    fn prompt_text(&self) -> heapless::String<128> {
        self.prompt.render_to_string()
    }

    #[cfg(feature = "threaded")]
    fn cancel_ref(&self) -> &'static AtomicBool {
        self.cancel
    }

    /// Upgrades the borrow to `'static`: `cancel` lives exactly as long as
    /// this `Repl` does, and every `ArgvContext` built from it is always
    /// consumed (via `into_io`/`run_bare`) before `self` is touched again,
    /// so no two live references ever actually overlap.
    #[cfg(not(feature = "threaded"))]
    fn cancel_ref(&self) -> &'static AtomicBool {
        unsafe { &*(&self.cancel as *const AtomicBool) }
    }

    #[cfg(feature = "threaded")]
    fn has_inflight(&self) -> bool {
        self.inflight.is_some()
    }

    #[cfg(not(feature = "threaded"))]
    fn has_inflight(&self) -> bool {
        false
    }

    /// Delivers `signal`, running its installed handler. `Default` runs
    /// [`Signal::default_action`]: `Cancel`/`Terminate` flip the cooperative
    /// cancel flag a running command polls and print the `^SIGxxx\r\n`
    /// banner (spec §4.8, §8 scenario 4); `Ignore` is silent.
    pub fn raise(&mut self, signal: Signal) {
        match self.signals.handler(signal) {
            Handler::Ignore => {}
            Handler::Custom(f) => f(signal),
            Handler::Default => match signal.default_action() {
                DefaultAction::Ignore => {}
                DefaultAction::Cancel | DefaultAction::Terminate => {
                    self.cancel_ref().store(true, Ordering::Relaxed);
                    self.print_signal_banner(signal);
                }
            },
        }
    }

    /// Banners go out through the editor's own writer, not the command
    /// transport `out`: `out` may be off on a worker thread for the
    /// duration of an in-flight `threaded` command, exactly when a
    /// cancelling signal is most likely to arrive.
    fn print_signal_banner(&mut self, signal: Signal) {
        let name = match signal {
            Signal::Int => "SIGINT",
            Signal::Quit => "SIGQUIT",
            Signal::Kill => "SIGKILL",
            Signal::Term => "SIGTERM",
            Signal::Stop => "SIGSTOP",
            Signal::Tstp => "SIGTSTP",
            Signal::Cont => "SIGCONT",
        };
        let writer = self.editor.renderer_mut().writer_mut();
        writer.write_str("^");
        writer.write_str(name);
        writer.write_str("\r\n");
        writer.flush();
    }

    fn print_command_not_found(&mut self, name: &str) {
        let writer = self.editor.renderer_mut().writer_mut();
        writer.write_str(name);
        writer.write_str(": command not found\r\n");
        writer.flush();
    }

    /// Feeds one byte from the transport.
    pub fn step(&mut self, byte: u8) -> ReplStep {
        let prompt_text = self.prompt_text();
        let commands = self.commands;
        let event = self.editor.feed_byte(byte, prompt_text.as_str(), |c, push| {
            for d in commands.iter() {
                if d.name.starts_with(c) {
                    push(d.name);
                }
            }
        });

        let result = match event {
            EditorEvent::Pending => ReplStep::Again,
            EditorEvent::CtrlC => {
                self.raise(Signal::Int);
                ReplStep::Again
            }
            EditorEvent::CtrlBackslash => {
                self.raise(Signal::Quit);
                ReplStep::Again
            }
            EditorEvent::CtrlZ => {
                self.raise(Signal::Tstp);
                ReplStep::Again
            }
            EditorEvent::Eof => {
                if self.session.is_authenticated() && !self.has_inflight() {
                    ReplStep::Quit
                } else {
                    ReplStep::Again
                }
            }
            EditorEvent::ClearScreen => {
                self.editor.clear_screen_and_render(prompt_text.as_str());
                ReplStep::Again
            }
            EditorEvent::TermSize { .. } => ReplStep::Again,
            EditorEvent::Line(line) => self.handle_line(line.as_str()),
        };

        #[cfg(feature = "threaded")]
        {
            if matches!(result, ReplStep::Again) {
                if let Some(finished) = self.poll_inflight() {
                    return finished;
                }
            }
        }
        result
    }

    /// Non-blocking: `None` if the in-flight command (if any) hasn't
    /// finished yet. This is what lets `step` keep returning immediately,
    /// byte after byte, while a `threaded` command runs concurrently.
    #[cfg(feature = "threaded")]
    fn poll_inflight(&mut self) -> Option<ReplStep> {
        let handle = self.inflight.as_mut()?;
        match handle.poll() {
            ThreadedPoll::Pending => None,
            ThreadedPoll::Done(result, ctx) => {
                self.inflight = None;
                let (out, data) = ctx.into_io();
                self.out = Some(out);
                self.data = Some(data);
                self.editor.set_ignore(false);
                self.signals.reset_to_defaults();
                Some(match result {
                    Ok(status) => ReplStep::Ran(status),
                    Err(_) => ReplStep::Cancelled,
                })
            }
            ThreadedPoll::WorkerLost => {
                self.inflight = None;
                self.editor.set_ignore(false);
                Some(ReplStep::Cancelled)
            }
        }
    }

    fn handle_line(&mut self, line: &str) -> ReplStep {
        if !self.session.is_authenticated() {
            let step = match self.session.submit_line(line) {
                SessionStep::Rejected => ReplStep::LoginRejected,
                _ => ReplStep::Again,
            };
            // Password entry still edits and submits the line normally;
            // only the echoed characters change (spec §4.9).
            self.editor.set_masked(self.session.needs_masked_input());
            return step;
        }

        let mut buf = [0u8; crate::config::INPUT_MAX_LEN];
        let bytes = line.as_bytes();
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        let (argc, spans) = tokenize(&mut buf[..n]);
        if argc == 0 {
            return ReplStep::Again;
        }

        let mut argv: heapless::Vec<heapless::String<{ crate::config::MAX_TOKEN_LEN }>, MAX_ARG> =
            heapless::Vec::new();
        for span in spans.iter().take(argc) {
            let Ok(tok) = core::str::from_utf8(&buf[span.start..span.start + span.len]) else {
                return ReplStep::Error(crate::error::ShellError::Overflow);
            };
            let mut owned: heapless::String<{ crate::config::MAX_TOKEN_LEN }> = heapless::String::new();
            if owned.push_str(tok).is_err() {
                return ReplStep::Error(crate::error::ShellError::Overflow);
            }
            if argv.push(owned).is_err() {
                break;
            }
        }

        let name = argv[0].clone();
        let Some(descriptor) = self.commands.lookup(name.as_str()) else {
            self.print_command_not_found(name.as_str());
            return ReplStep::Again;
        };
        let func = descriptor.func;

        let (Some(out), Some(data)) = (self.out.take(), self.data.take()) else {
            return ReplStep::Error(crate::error::ShellError::TransportFatal);
        };

        self.signals.reset_to_defaults();
        self.editor.set_ignore(true);
        let ctx = ArgvContext::new(argv, out, data, func, self.cancel_ref());

        if self.threaded {
            #[cfg(feature = "threaded")]
            {
                self.inflight = Some(ThreadedExec::spawn(ctx, self.cancel_ref()));
                return ReplStep::Again;
            }
            #[cfg(not(feature = "threaded"))]
            {
                return self.run_bare(ctx);
            }
        }
        self.run_bare(ctx)
    }

    fn run_bare(&mut self, mut ctx: ArgvContext<'static>) -> ReplStep {
        let result = BareExec::run(&mut ctx, self.cancel_ref());
        let (out, data) = ctx.into_io();
        self.out = Some(out);
        self.data = Some(data);
        self.editor.set_ignore(false);
        self.signals.reset_to_defaults();
        match result {
            Ok(status) => ReplStep::Ran(status),
            Err(_) => ReplStep::Cancelled,
        }
    }
}
