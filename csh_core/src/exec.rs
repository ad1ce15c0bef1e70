//! Execution context (C7): runs a resolved command's body to completion or
//! cancellation.
//!
//! The reference shell's single-threaded build runs commands on the
//! caller's own stack and cancels them with `setjmp`/`longjmp` out of the
//! command's own signal handler; its multi-threaded build runs each
//! command on a worker thread instead and cancels cooperatively. Rust has
//! no safe analogue of `longjmp`, so both execution models here are
//! cooperative: a command is only ever interrupted at a call to
//! [`crate::parser::ArgvContext::poll_cancel`] (or the I/O helpers that
//! call it internally). `BareExec` runs the command inline; `ThreadedExec`
//! (feature `threaded`) spawns a real `std::thread` per dispatch and hands
//! back a non-blocking handle, so the REPL's own `step` loop keeps
//! consuming bytes — and can still observe a cancelling signal — while the
//! command runs concurrently on its worker thread.

use crate::parser::ArgvContext;
use crate::symtab::Cancelled;
use core::sync::atomic::{AtomicBool, Ordering};

/// Single-threaded / bare-metal execution model (the `bare` feature,
/// enabled by default).
pub struct BareExec;

impl BareExec {
    pub fn run(ctx: &mut ArgvContext, cancel: &AtomicBool) -> Result<i32, Cancelled> {
        cancel.store(false, Ordering::Relaxed);
        let func = ctx.func;
        func(ctx)
    }
}

/// Multi-threaded execution model (feature `threaded`, implies `hosted`).
#[cfg(feature = "threaded")]
pub struct ThreadedExec;

#[cfg(feature = "threaded")]
impl ThreadedExec {
    /// Spawns `ctx`'s command body on a fresh worker thread and returns
    /// immediately. `cancel` must be the same flag the caller will set from
    /// `raise`; it is reset to `false` before the worker starts.
    pub fn spawn(
        mut ctx: ArgvContext<'static>,
        cancel: &'static AtomicBool,
    ) -> ThreadedHandle {
        cancel.store(false, Ordering::Relaxed);
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = std::thread::spawn(move || {
            let func = ctx.func;
            let result = func(&mut ctx);
            // The receiver may already be gone (handle abandoned); a failed
            // send just means nobody will ever reclaim `ctx`'s transport.
            let _ = tx.send((result, ctx));
        });
        ThreadedHandle {
            rx,
            handle: Some(handle),
        }
    }
}

/// Outcome of a non-blocking [`ThreadedHandle::poll`].
#[cfg(feature = "threaded")]
pub enum ThreadedPoll {
    /// The worker has not finished yet.
    Pending,
    /// The worker finished (normally or via cooperative cancellation) and
    /// has handed back its `ArgvContext`, including the transport and
    /// embedder slot it borrowed for the run.
    Done(Result<i32, Cancelled>, ArgvContext<'static>),
    /// The worker's sender was dropped without sending, i.e. it panicked.
    /// The `ArgvContext` it held (and the transport/data within it) is
    /// unrecoverable.
    WorkerLost,
}

#[cfg(feature = "threaded")]
pub struct ThreadedHandle {
    rx: std::sync::mpsc::Receiver<(Result<i32, Cancelled>, ArgvContext<'static>)>,
    handle: Option<std::thread::JoinHandle<()>>,
}

#[cfg(feature = "threaded")]
impl ThreadedHandle {
    /// Non-blocking: returns `Pending` immediately if the worker is still
    /// running. This is what lets `Repl::step` keep consuming bytes (and
    /// deliver a cancelling signal) while a command is in flight.
    pub fn poll(&mut self) -> ThreadedPoll {
        match self.rx.try_recv() {
            Ok((result, ctx)) => {
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                ThreadedPoll::Done(result, ctx)
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => ThreadedPoll::Pending,
            Err(std::sync::mpsc::TryRecvError::Disconnected) => ThreadedPoll::WorkerLost,
        }
    }

    /// Detaches the worker without waiting for it: spec §4.7's "the
    /// `JoinHandle` simply detached on the timeout path". Only meaningful
    /// for a command that never calls `poll_cancel` and so never notices
    /// cancellation; the transport and embedder slot it was holding are
    /// permanently lost, matching §4.8's "treat this as destroying
    /// resources the command had acquired".
    pub fn abandon(self) {
        drop(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symtab::CommandFn;

    fn incrementing(ctx: &mut ArgvContext) -> Result<i32, Cancelled> {
        ctx.poll_cancel()?;
        Ok(ctx.argc() as i32)
    }

    fn cancelling(ctx: &mut ArgvContext) -> Result<i32, Cancelled> {
        ctx.poll_cancel()?;
        Ok(0)
    }

    struct NullTransport;
    impl csh_editor::Transport for NullTransport {
        fn put(&mut self, data: &[u8]) -> usize {
            data.len()
        }
        fn get(&mut self, _buf: &mut [u8]) -> csh_editor::TransportRead {
            csh_editor::TransportRead::Again
        }
    }

    fn empty_argv() -> heapless::Vec<heapless::String<{ crate::config::MAX_TOKEN_LEN }>, { crate::config::MAX_ARG }> {
        heapless::Vec::new()
    }

    #[test]
    fn bare_exec_runs_to_completion() {
        let cancel = AtomicBool::new(false);
        let mut transport = NullTransport;
        let mut data: u8 = 0;
        let func: CommandFn = incrementing;
        let mut ctx = ArgvContext::new(empty_argv(), &mut transport, &mut data, func, &cancel);
        assert_eq!(BareExec::run(&mut ctx, &cancel), Ok(0));
    }

    #[test]
    fn bare_exec_reports_precancelled_context() {
        let cancel = AtomicBool::new(true);
        let mut transport = NullTransport;
        let mut data: u8 = 0;
        let func: CommandFn = cancelling;
        let mut ctx = ArgvContext::new(empty_argv(), &mut transport, &mut data, func, &cancel);
        // cancel flag is reset by `run` itself, mirroring "freshly dispatched
        // commands always start uncancelled".
        assert_eq!(BareExec::run(&mut ctx, &cancel), Ok(0));
    }

    #[cfg(feature = "threaded")]
    #[test]
    fn threaded_exec_runs_concurrently_and_reports_completion() {
        static CANCEL: AtomicBool = AtomicBool::new(false);
        let func: CommandFn = incrementing;
        let transport: &'static mut NullTransport = Box::leak(Box::new(NullTransport));
        let data: &'static mut u8 = Box::leak(Box::new(0u8));
        let ctx = ArgvContext::new(empty_argv(), transport, data, func, &CANCEL);
        let mut handle = ThreadedExec::spawn(ctx, &CANCEL);
        let result = loop {
            match handle.poll() {
                ThreadedPoll::Pending => std::thread::yield_now(),
                ThreadedPoll::Done(result, _ctx) => break result,
                ThreadedPoll::WorkerLost => panic!("worker should not panic"),
            }
        };
        assert_eq!(result, Ok(0));
    }
}
