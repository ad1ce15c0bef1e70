#![cfg_attr(not(feature = "hosted"), no_std)]

pub mod config;
pub mod error;
pub mod exec;
pub mod parser;
pub mod prompt;
pub mod repl;
pub mod session;
pub mod shell;
pub mod signal;
pub mod symtab;

pub use error::ShellError;
pub use parser::ArgvContext;
pub use prompt::Prompt;
pub use repl::{Repl, ReplStep};
pub use session::{HashCompareFn, Session, SessionStep};
pub use shell::{ShellInit, ShellState};
pub use signal::{DefaultAction, Handler, Signal, SignalTable};
pub use symtab::{Cancelled, CommandDescriptor, CommandFn, CommandTable, VarAttr, VarCell, VarStorage, VariableDescriptor, VariableTable};
