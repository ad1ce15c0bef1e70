//! Hosted terminal demo binary.
//!
//! Grounded on the reference shell's `main_app`: logger init up front, a
//! code-generated command table, then a blocking read loop feeding the
//! REPL one byte at a time. Sample commands are adapted from
//! `ushell_usercode::commands` to this spec's `fn(&mut ArgvContext) ->
//! Result<i32, Cancelled>` signature.

use csh_core::{CommandTable, Prompt, ReplStep, ShellInit, ShellState, VariableTable};
use csh_editor::renderer::StdWriter;
use csh_editor::{RawMode, Transport, TransportRead};
use csh_logger::{init_logger, log_info, LogLevel, LoggerConfig};

mod commands {
    use csh_core::{ArgvContext, Cancelled};

    pub fn echo(ctx: &mut ArgvContext) -> Result<i32, Cancelled> {
        for i in 1..ctx.argc() {
            if i > 1 {
                ctx.print(" ")?;
            }
            let arg = ctx.arg(i).unwrap_or("").to_string();
            ctx.print(&arg)?;
        }
        ctx.print_line("")?;
        Ok(0)
    }

    pub fn help(ctx: &mut ArgvContext) -> Result<i32, Cancelled> {
        ctx.print_line("available commands: echo, help, sleep, exit")?;
        Ok(0)
    }

    /// Demonstrates cooperative cancellation: polls once per simulated
    /// "tick" instead of blocking the whole duration.
    pub fn sleep(ctx: &mut ArgvContext) -> Result<i32, Cancelled> {
        let ticks: u32 = ctx.arg(1).and_then(|s| s.parse().ok()).unwrap_or(5);
        for remaining in (0..ticks).rev() {
            ctx.poll_cancel()?;
            std::thread::sleep(std::time::Duration::from_millis(200));
            let _ = remaining;
        }
        ctx.print_line("done")?;
        Ok(0)
    }

    pub fn exit(ctx: &mut ArgvContext) -> Result<i32, Cancelled> {
        let code: i32 = ctx.arg(1).and_then(|s| s.parse().ok()).unwrap_or(0);
        std::process::exit(code);
    }
}

csh_macros::commands!(mod table; "
    crate::commands::echo | echo | /bin | echo [args...] | Print arguments back;
    crate::commands::help | help | /bin | help | List available commands;
    crate::commands::sleep | sleep | /bin | sleep [ticks] | Sleep cooperatively, cancellable with Ctrl-C;
    crate::commands::exit | exit | /bin | exit [code] | Exit the demo
");

struct StdinTransport;

impl Transport for StdinTransport {
    fn put(&mut self, bytes: &[u8]) -> usize {
        use std::io::Write;
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(bytes);
        let _ = stdout.flush();
        bytes.len()
    }

    fn get(&mut self, buf: &mut [u8]) -> TransportRead {
        use std::io::Read;
        match std::io::stdin().read(buf) {
            Ok(0) => TransportRead::Fatal,
            Ok(n) => TransportRead::Read(n),
            Err(_) => TransportRead::Fatal,
        }
    }
}

fn main() {
    init_logger(LoggerConfig {
        color_entire_line: false,
        min_level: LogLevel::Info,
    });
    log_info!("csh_demo starting");

    let threaded = std::env::args().any(|a| a == "--threaded");
    let no_login = std::env::args().any(|a| a == "--no-login");

    let mut prompt = Prompt::new();
    prompt.set_segment(0, Some("1;32"), "csh");
    prompt.set_segment(1, None, "> ");

    let hash_compare = if no_login {
        None
    } else {
        Some((|user: &str, pass: &str| user == "admin" && pass == "admin") as csh_core::HashCompareFn)
    };

    let init = ShellInit {
        commands: CommandTable(table::TABLE),
        variables: VariableTable(&[]),
        hash_compare,
        prompt,
        path: csh_core::config::DEFAULT_PATH,
        threaded,
    };

    // `ShellState` holds the command transport and embedder data slot for
    // its own lifetime, so the `threaded` model can move them onto a worker
    // thread for a command's duration: they need to genuinely outlive any
    // single `step` call, hence `'static` via `Box::leak` rather than a
    // stack-local borrow.
    let out: &'static mut StdinTransport = Box::leak(Box::new(StdinTransport));
    let user_data: &'static mut u8 = Box::leak(Box::new(0u8));

    let mut shell: ShellState<_, { csh_core::config::AUTOCOMPLETE_CANDIDATES }, { csh_core::config::AUTOCOMPLETE_NAME_LEN }, { csh_core::config::INPUT_MAX_LEN }, { csh_core::config::HISTORY_TOTAL_CAPACITY }> =
        ShellState::new(StdWriter, init, out, user_data).expect("invalid shell init");

    let _raw_mode = RawMode::new(0);
    let mut stdin_reader = StdinTransport;

    loop {
        let mut byte = [0u8; 1];
        match stdin_reader.get(&mut byte) {
            TransportRead::Read(1) => {}
            TransportRead::Fatal => break,
            _ => continue,
        }

        match shell.repl.step(byte[0]) {
            ReplStep::Quit => break,
            ReplStep::Error(err) => {
                println!("\r\nerror: {}\r", err);
            }
            ReplStep::Cancelled => {
                println!("\r\ncancelled\r");
            }
            ReplStep::LoginRejected => {
                println!("\r\nlogin incorrect\r");
            }
            ReplStep::Ran(_) | ReplStep::Again => {}
        }
    }
}
