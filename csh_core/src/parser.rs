//! Argv tokenizer and the per-invocation execution context (C4).
//!
//! The reference shell tokenizes the line buffer in place and smuggles the
//! shell handle and resolved function pointer through `argv[argc+1]` /
//! `argv[argc+2]` so a command body can recurse back into the dispatcher.
//! `ArgvContext` is the safe substitute: it carries the same information as
//! ordinary fields instead of extra, out-of-band argv slots.

use crate::config::{MAX_ARG, MAX_TOKEN_LEN};
use crate::symtab::{Cancelled, CommandFn};
use csh_editor::{Transport, TransportRead};
use heapless::String as TokenString;

/// One token's location within the (already compacted) line buffer.
#[derive(Clone, Copy, Default)]
pub struct TokenSpan {
    pub start: usize,
    pub len: usize,
}

/// Tokenizes `line` in place, following the spec's seven rules: runs of
/// spaces separate tokens; double quotes group a run containing spaces and
/// are themselves removed; a backslash escapes the following byte verbatim
/// (including a quote or another backslash) and is itself removed; output
/// bytes are shifted left over the removed quote/escape bytes so the
/// surviving token text is contiguous. Stops early, discarding the rest of
/// the line, once `MAX_ARG` tokens have been produced.
pub fn tokenize(line: &mut [u8]) -> (usize, [TokenSpan; MAX_ARG]) {
    let mut spans = [TokenSpan::default(); MAX_ARG];
    let mut argc = 0;
    let mut read = 0usize;
    let mut write = 0usize;
    let n = line.len();

    while read < n && argc < MAX_ARG {
        while read < n && line[read] == b' ' {
            read += 1;
        }
        if read >= n {
            break;
        }

        let start = write;
        let mut in_quotes = false;
        let mut saw_any = false;
        loop {
            if read >= n {
                break;
            }
            let b = line[read];
            if !in_quotes && b == b' ' {
                break;
            }
            saw_any = true;
            if b == b'"' {
                in_quotes = !in_quotes;
                read += 1;
                continue;
            }
            if b == b'\\' && read + 1 < n {
                read += 1;
                line[write] = line[read];
                write += 1;
                read += 1;
                continue;
            }
            line[write] = b;
            write += 1;
            read += 1;
        }
        let _ = saw_any;
        spans[argc] = TokenSpan {
            start,
            len: write - start,
        };
        argc += 1;
    }

    (argc, spans)
}

/// Per-invocation state handed to a command body. Substitutes for the raw
/// `argv[argc+1]`/`argv[argc+2]` ABI trick: `shell`-level access and the
/// resolved function pointer are ordinary fields instead of extra argv
/// slots.
///
/// Tokens are owned (`heapless::String`) rather than borrowed from the line
/// buffer they were parsed out of: the `threaded` execution model moves a
/// whole `ArgvContext<'static>` onto a worker thread, which requires it to
/// outlive the `handle_line` stack frame that tokenized the line.
pub struct ArgvContext<'a> {
    argv: heapless::Vec<TokenString<MAX_TOKEN_LEN>, MAX_ARG>,
    out: &'a mut (dyn Transport + Send),
    /// Opaque per-shell embedder slot (the spec's `data`/`user_data`).
    pub data: &'a mut (dyn core::any::Any + Send),
    pub func: CommandFn,
    cancel: &'a core::sync::atomic::AtomicBool,
}

impl<'a> ArgvContext<'a> {
    pub fn new(
        argv: heapless::Vec<TokenString<MAX_TOKEN_LEN>, MAX_ARG>,
        out: &'a mut (dyn Transport + Send),
        data: &'a mut (dyn core::any::Any + Send),
        func: CommandFn,
        cancel: &'a core::sync::atomic::AtomicBool,
    ) -> Self {
        Self {
            argv,
            out,
            data,
            func,
            cancel,
        }
    }

    pub fn argc(&self) -> usize {
        self.argv.len()
    }

    pub fn argv(&self) -> impl Iterator<Item = &str> {
        self.argv.iter().map(|s| s.as_str())
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.argv.get(index).map(|s| s.as_str())
    }

    /// Hands back the transport and embedder slot, consuming `self`. Used by
    /// [`crate::exec::ThreadedExec`] to return these to the REPL once the
    /// command body has finished running on its worker thread.
    pub fn into_io(self) -> (&'a mut (dyn Transport + Send), &'a mut (dyn core::any::Any + Send)) {
        (self.out, self.data)
    }

    /// Commands are expected to call this at their natural suspension
    /// points (loop iterations, blocking reads) to cooperate with
    /// [`crate::exec`]'s cancellation signal.
    pub fn poll_cancel(&self) -> Result<(), Cancelled> {
        if self.cancel.load(core::sync::atomic::Ordering::Relaxed) {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn print(&mut self, text: &str) -> Result<(), Cancelled> {
        self.poll_cancel()?;
        self.out.put(text.as_bytes());
        Ok(())
    }

    pub fn print_line(&mut self, text: &str) -> Result<(), Cancelled> {
        self.print(text)?;
        self.print("\r\n")
    }

    pub fn read_byte(&mut self) -> Result<Option<u8>, Cancelled> {
        self.poll_cancel()?;
        let mut byte = [0u8; 1];
        match self.out.get(&mut byte) {
            TransportRead::Read(1) => Ok(Some(byte[0])),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens<'a>(line: &'a mut [u8], argc: usize, spans: &[TokenSpan; MAX_ARG]) -> heapless::Vec<&'a str, MAX_ARG> {
        let mut out = heapless::Vec::new();
        for span in spans.iter().take(argc) {
            let s = core::str::from_utf8(&line[span.start..span.start + span.len]).unwrap();
            out.push(s).unwrap();
        }
        out
    }

    #[test]
    fn simple_space_separated() {
        let mut line = *b"ls -la /tmp";
        let (argc, spans) = tokenize(&mut line);
        let t = tokens(&mut line, argc, &spans);
        assert_eq!(t.as_slice(), ["ls", "-la", "/tmp"]);
    }

    #[test]
    fn quoted_run_keeps_embedded_spaces() {
        let mut buf = *br#"echo "hello world""#;
        let (argc, spans) = tokenize(&mut buf);
        let t = tokens(&mut buf, argc, &spans);
        assert_eq!(t.as_slice(), ["echo", "hello world"]);
    }

    #[test]
    fn backslash_escapes_quote_and_backslash() {
        let mut buf = *br#"echo \"x\\y"#;
        let (argc, spans) = tokenize(&mut buf);
        let t = tokens(&mut buf, argc, &spans);
        assert_eq!(t.as_slice(), ["echo", "\"x\\y"]);
    }

    #[test]
    fn empty_quoted_run_is_one_empty_token() {
        let mut buf = *br#"""#;
        let mut full = [0u8; 2];
        full[0] = b'"';
        full[1] = b'"';
        let (argc, spans) = tokenize(&mut full);
        assert_eq!(argc, 1);
        assert_eq!(spans[0].len, 0);
        let _ = buf;
    }

    #[test]
    fn truncates_at_max_arg() {
        let mut line = [b' '; 64];
        for (i, slot) in line.chunks_mut(4).enumerate().take(MAX_ARG + 4) {
            if i < MAX_ARG + 4 {
                slot[0] = b'a';
            }
        }
        let (argc, _spans) = tokenize(&mut line);
        assert!(argc <= MAX_ARG);
    }

    struct NullTransport;
    impl Transport for NullTransport {
        fn put(&mut self, data: &[u8]) -> usize {
            data.len()
        }
        fn get(&mut self, _buf: &mut [u8]) -> TransportRead {
            TransportRead::Again
        }
    }

    #[test]
    fn argv_owns_its_tokens() {
        let cancel = core::sync::atomic::AtomicBool::new(false);
        let mut transport = NullTransport;
        let mut data: u8 = 0;
        let mut argv: heapless::Vec<TokenString<MAX_TOKEN_LEN>, MAX_ARG> = heapless::Vec::new();
        for tok in ["echo", "hi"] {
            let mut s: TokenString<MAX_TOKEN_LEN> = TokenString::new();
            s.push_str(tok).unwrap();
            argv.push(s).unwrap();
        }
        fn noop(_ctx: &mut ArgvContext) -> Result<i32, Cancelled> {
            Ok(0)
        }
        let ctx = ArgvContext::new(argv, &mut transport, &mut data, noop, &cancel);
        assert_eq!(ctx.argc(), 2);
        assert_eq!(ctx.arg(0), Some("echo"));
        let collected: heapless::Vec<&str, MAX_ARG> = ctx.argv().collect();
        assert_eq!(collected.as_slice(), ["echo", "hi"]);
    }
}
