//! Shell-wide aggregate state and its external initialization surface.

use crate::error::ShellError;
use crate::prompt::Prompt;
use crate::repl::Repl;
use crate::session::{HashCompareFn, Session};
use crate::symtab::{self, CommandTable, VarStorage, VariableTable};
use csh_editor::Transport;
use csh_logger::UnifiedWriter;

/// Everything an embedder supplies to bring up a shell instance. Validated
/// once at construction (`ShellState::new`) rather than trusted, mirroring
/// the reference implementation's "refuse init on any bad pointer/size"
/// policy.
pub struct ShellInit {
    pub commands: CommandTable,
    pub variables: VariableTable,
    /// `None` disables the login gate.
    pub hash_compare: Option<HashCompareFn>,
    pub prompt: Prompt,
    pub path: &'static str,
    /// Selects the `threaded` execution model when the feature is enabled.
    pub threaded: bool,
}

impl ShellInit {
    fn validate(&self) -> Result<(), ShellError> {
        for command in self.commands.iter() {
            if command.name.is_empty() || command.path.is_empty() {
                return Err(ShellError::InitInvalid);
            }
        }
        for variable in self.variables.iter() {
            if variable.name.is_empty() {
                return Err(ShellError::InitInvalid);
            }
            let size = variable.cell.size_bytes();
            // Data model invariant: a variable's size never exceeds 2^30-1.
            if size == 0 || size >= (1 << 30) {
                return Err(ShellError::InitInvalid);
            }
        }
        if self.path.is_empty() {
            return Err(ShellError::InitInvalid);
        }
        Ok(())
    }
}

pub struct ShellState<'a, W, const NAC: usize, const FNL: usize, const IML: usize, const HTC: usize>
where
    W: UnifiedWriter,
{
    pub repl: Repl<'a, W, NAC, FNL, IML, HTC>,
}

impl<'a, W, const NAC: usize, const FNL: usize, const IML: usize, const HTC: usize>
    ShellState<'a, W, NAC, FNL, IML, HTC>
where
    W: UnifiedWriter,
{
    pub fn new(
        writer: W,
        init: ShellInit,
        out: &'static mut (dyn Transport + Send),
        data: &'static mut (dyn core::any::Any + Send),
    ) -> Result<Self, ShellError> {
        init.validate()?;
        if init.path.len() > crate::config::PATH_STORAGE_LEN {
            return Err(ShellError::Overflow);
        }
        let mut bytes = [0u8; crate::config::PATH_STORAGE_LEN];
        bytes[..init.path.len()].copy_from_slice(init.path.as_bytes());
        symtab::PATH.set(bytes);

        let session = Session::new(init.hash_compare);
        let repl = Repl::new(
            writer,
            init.commands,
            init.variables,
            session,
            init.prompt,
            init.threaded,
            out,
            data,
        );
        Ok(Self { repl })
    }

    /// Reads the `PATH` variable back out of its process-wide storage
    /// (spec §6: `PATH` is resolvable independent of any one shell
    /// instance's variable table).
    pub fn path(&self) -> heapless::String<{ crate::config::PATH_STORAGE_LEN }> {
        let bytes = symtab::PATH.get();
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let mut out = heapless::String::new();
        let _ = out.push_str(core::str::from_utf8(&bytes[..len]).unwrap_or(""));
        out
    }

    /// Looks up a shell variable's storage by name, the Rust substitute for
    /// the reference shell's `getenv`-style lookup.
    pub fn getenv(&self, name: &str) -> Option<&'static dyn VarStorage> {
        self.repl.variables().lookup(name).map(|descriptor| descriptor.cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symtab::{Cancelled, CommandDescriptor};

    fn noop(ctx: &mut crate::parser::ArgvContext) -> Result<i32, Cancelled> {
        let _ = ctx;
        Ok(0)
    }

    struct NullTransport;
    impl Transport for NullTransport {
        fn put(&mut self, data: &[u8]) -> usize {
            data.len()
        }
        fn get(&mut self, _buf: &mut [u8]) -> csh_editor::TransportRead {
            csh_editor::TransportRead::Again
        }
    }

    #[test]
    fn empty_path_is_rejected() {
        static COMMANDS: &[CommandDescriptor] = &[CommandDescriptor {
            path: "/bin",
            name: "noop",
            func: noop,
            usage: None,
            help: None,
        }];
        let init = ShellInit {
            commands: CommandTable(COMMANDS),
            variables: VariableTable(&[]),
            hash_compare: None,
            prompt: Prompt::new(),
            path: "",
            threaded: false,
        };
        static mut OUT_A: NullTransport = NullTransport;
        static mut DATA_A: u8 = 0;
        let mut sink = heapless::String::<256>::new();
        // SAFETY: this test owns `OUT_A`/`DATA_A` exclusively; nothing else
        // in the process observes them.
        let out: &'static mut NullTransport = unsafe { &mut *core::ptr::addr_of_mut!(OUT_A) };
        let data: &'static mut u8 = unsafe { &mut *core::ptr::addr_of_mut!(DATA_A) };
        let result = ShellState::<_, 4, 16, 128, 512>::new(&mut sink, init, out, data);
        assert!(matches!(result, Err(ShellError::InitInvalid)));
    }

    #[test]
    fn valid_init_succeeds() {
        static COMMANDS: &[CommandDescriptor] = &[CommandDescriptor {
            path: "/bin",
            name: "noop",
            func: noop,
            usage: None,
            help: None,
        }];
        let init = ShellInit {
            commands: CommandTable(COMMANDS),
            variables: VariableTable(&[]),
            hash_compare: None,
            prompt: Prompt::new(),
            path: crate::config::DEFAULT_PATH,
            threaded: false,
        };
        static mut OUT_B: NullTransport = NullTransport;
        static mut DATA_B: u8 = 0;
        let mut sink = heapless::String::<256>::new();
        // SAFETY: this test owns `OUT_B`/`DATA_B` exclusively; nothing else
        // in the process observes them.
        let out: &'static mut NullTransport = unsafe { &mut *core::ptr::addr_of_mut!(OUT_B) };
        let data: &'static mut u8 = unsafe { &mut *core::ptr::addr_of_mut!(DATA_B) };
        let shell = ShellState::<_, 4, 16, 128, 512>::new(&mut sink, init, out, data).unwrap();
        assert_eq!(shell.path().as_str(), crate::config::DEFAULT_PATH);
    }
}
