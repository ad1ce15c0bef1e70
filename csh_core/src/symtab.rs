//! Static command and variable symbol tables (C5).
//!
//! The reference shell populates these from a linker section filled by
//! `__attribute__((section(...)))` globals. `csh_macros::commands!` and
//! `csh_macros::variables!` are this repo's substitute: they expand to
//! plain `&'static [Descriptor]` slices, built at compile time, with no
//! runtime registration step and no heap.

use crate::parser::ArgvContext;

/// Every command body shares this signature (see `original_source`'s
/// `chry_syscall_func_t`). `Cancelled` lets a long-running command bail out
/// cooperatively once its execution context has been signalled; see
/// [`crate::exec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

pub type CommandFn = fn(&mut ArgvContext) -> Result<i32, Cancelled>;

pub struct CommandDescriptor {
    pub path: &'static str,
    pub name: &'static str,
    pub func: CommandFn,
    pub usage: Option<&'static str>,
    pub help: Option<&'static str>,
}

/// A borrowed view over a `commands!`-generated table.
#[derive(Clone, Copy)]
pub struct CommandTable(pub &'static [CommandDescriptor]);

impl CommandTable {
    pub fn lookup(&self, name: &str) -> Option<&'static CommandDescriptor> {
        self.0.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> core::slice::Iter<'static, CommandDescriptor> {
        self.0.iter()
    }
}

/// Read/write access bits for a variable. `size_bytes` is deliberately not
/// stored here: it is read off the referenced cell itself
/// ([`VarStorage::size_bytes`]) so it can never drift from the cell's
/// actual backing type.
#[derive(Clone, Copy)]
pub struct VarAttr {
    pub readable: bool,
    pub writable: bool,
}

/// Type-erased access to a variable's backing storage. Implemented by
/// [`VarCell`] for any `Copy + Send + Sync` scalar.
pub trait VarStorage: Sync {
    /// Copies the raw bytes of the current value into `out`, returning the
    /// number of bytes written (0 if `out` is too small).
    fn read_bytes(&self, out: &mut [u8]) -> usize;
    /// Overwrites the value from `data`'s leading bytes, returning the
    /// number of bytes consumed (0 if `data` is too small).
    fn write_bytes(&self, data: &[u8]) -> usize;
    /// Size in bytes of the backing value. Bounded well under the data
    /// model's 2^30-1 ceiling for any realistic scalar type.
    fn size_bytes(&self) -> usize;
}

/// Interior-mutable storage cell for a shell variable, safe to reference
/// from a `static`. Guarded by `critical_section` rather than an atomic so
/// it works for arbitrary `Copy` payloads, not just integer widths with a
/// native atomic.
pub struct VarCell<T: Copy + Send + Sync> {
    value: critical_section::Mutex<core::cell::Cell<T>>,
}

impl<T: Copy + Send + Sync> VarCell<T> {
    pub const fn new(initial: T) -> Self {
        Self {
            value: critical_section::Mutex::new(core::cell::Cell::new(initial)),
        }
    }

    pub fn get(&self) -> T {
        critical_section::with(|cs| self.value.borrow(cs).get())
    }

    pub fn set(&self, new_value: T) {
        critical_section::with(|cs| self.value.borrow(cs).set(new_value));
    }
}

impl<T: Copy + Send + Sync> VarStorage for VarCell<T> {
    fn read_bytes(&self, out: &mut [u8]) -> usize {
        let size = core::mem::size_of::<T>();
        if out.len() < size {
            return 0;
        }
        let value = self.get();
        // SAFETY: `value` is a valid, initialized `T` living on this stack
        // frame for the duration of the copy; we only ever read `size_of::<T>()`
        // bytes from it, mirroring the reference implementation's raw memcpy
        // of a variable's backing storage.
        let bytes = unsafe {
            core::slice::from_raw_parts(&value as *const T as *const u8, size)
        };
        out[..size].copy_from_slice(bytes);
        size
    }

    fn write_bytes(&self, data: &[u8]) -> usize {
        let size = core::mem::size_of::<T>();
        if data.len() < size {
            return 0;
        }
        let mut value = self.get();
        // SAFETY: `value` is a valid `T` and we overwrite exactly
        // `size_of::<T>()` bytes of it before it is read back through `set`.
        let bytes = unsafe {
            core::slice::from_raw_parts_mut(&mut value as *mut T as *mut u8, size)
        };
        bytes.copy_from_slice(&data[..size]);
        self.set(value);
        size
    }

    fn size_bytes(&self) -> usize {
        core::mem::size_of::<T>()
    }
}

pub struct VariableDescriptor {
    pub name: &'static str,
    pub cell: &'static dyn VarStorage,
    pub attr: VarAttr,
}

#[derive(Clone, Copy)]
pub struct VariableTable(pub &'static [VariableDescriptor]);

impl VariableTable {
    /// `PATH` is always resolvable, even in an embedder-supplied table that
    /// never mentions it: spec §6 registers it process-wide, independent of
    /// any particular shell instance's variable table.
    pub fn lookup(&self, name: &str) -> Option<&'static VariableDescriptor> {
        if name == "PATH" {
            return Some(&PATH_DESCRIPTOR);
        }
        self.0.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> core::slice::Iter<'static, VariableDescriptor> {
        self.0.iter()
    }
}

const fn default_path_bytes() -> [u8; crate::config::PATH_STORAGE_LEN] {
    let mut bytes = [0u8; crate::config::PATH_STORAGE_LEN];
    let src = crate::config::DEFAULT_PATH.as_bytes();
    let mut i = 0;
    while i < src.len() && i < bytes.len() {
        bytes[i] = src[i];
        i += 1;
    }
    bytes
}

/// Process-wide backing storage for the `PATH` variable (spec §6). A
/// `ShellState` writes its configured path into this cell at construction;
/// `VariableTable::lookup` resolves `"PATH"` against it unconditionally.
pub static PATH: VarCell<[u8; crate::config::PATH_STORAGE_LEN]> = VarCell::new(default_path_bytes());

pub static PATH_DESCRIPTOR: VariableDescriptor = VariableDescriptor {
    name: "PATH",
    cell: &PATH,
    attr: VarAttr {
        readable: true,
        writable: true,
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    static COUNTER: VarCell<u32> = VarCell::new(42);

    #[test]
    fn get_set_roundtrip() {
        assert_eq!(COUNTER.get(), 42);
        COUNTER.set(7);
        assert_eq!(COUNTER.get(), 7);
        COUNTER.set(42);
    }

    #[test]
    fn read_write_bytes_roundtrip() {
        let storage: &dyn VarStorage = &COUNTER;
        assert_eq!(storage.size_bytes(), 4);
        let mut buf = [0u8; 4];
        assert_eq!(storage.read_bytes(&mut buf), 4);
        assert_eq!(u32::from_ne_bytes(buf), COUNTER.get());

        let new_value = 99u32.to_ne_bytes();
        assert_eq!(storage.write_bytes(&new_value), 4);
        assert_eq!(COUNTER.get(), 99);
        COUNTER.set(42);
    }

    #[test]
    fn undersized_buffers_are_rejected() {
        let storage: &dyn VarStorage = &COUNTER;
        let mut short = [0u8; 2];
        assert_eq!(storage.read_bytes(&mut short), 0);
        assert_eq!(storage.write_bytes(&short), 0);
    }

    #[test]
    fn path_resolves_even_in_an_empty_table() {
        let variables = VariableTable(&[]);
        let descriptor = variables.lookup("PATH").expect("PATH is always registered");
        let mut buf = [0u8; crate::config::PATH_STORAGE_LEN];
        descriptor.cell.read_bytes(&mut buf);
        assert!(buf.starts_with(b"/sbin:/bin"));
    }

    #[test]
    fn command_table_lookup() {
        fn noop(_ctx: &mut ArgvContext) -> Result<i32, Cancelled> {
            Ok(0)
        }
        static TABLE: &[CommandDescriptor] = &[CommandDescriptor {
            path: "/bin",
            name: "noop",
            func: noop,
            usage: None,
            help: None,
        }];
        let table = CommandTable(TABLE);
        assert!(table.lookup("noop").is_some());
        assert!(table.lookup("missing").is_none());
    }
}
