//! Flat `pub const` application constants, in the style of the reference
//! shell's `ushell_config` crate.

pub const PROMPT: &str = "csh> ";
pub const INPUT_MAX_LEN: usize = 128;
pub const MAX_ARG: usize = 16;
/// Capacity of each owned argv token (`ArgvContext` stores tokens by value so
/// a dispatched command's context can outlive the line buffer it was parsed
/// from, e.g. across the `threaded` model's worker-thread boundary).
pub const MAX_TOKEN_LEN: usize = 32;
/// Byte capacity of the `PATH` variable's backing storage.
pub const PATH_STORAGE_LEN: usize = 64;
pub const MAX_USER: usize = 4;
pub const MAX_USER_LEN: usize = 32;
pub const MAX_HASH_LEN: usize = 64;
pub const HISTORY_TOTAL_CAPACITY: usize = 512;
pub const ERROR_BUFFER_SIZE: usize = 64;
pub const NUM_PROMPT_SEGMENTS: usize = 8;
pub const SEGMENT_LEN: usize = 32;
pub const DEFAULT_PATH: &str = "/sbin:/bin";

/// `NAC` (autocomplete candidates sharing one first letter) and `FNL`
/// (max command-name length) size the editor's `Autocomplete`.
pub const AUTOCOMPLETE_CANDIDATES: usize = 16;
pub const AUTOCOMPLETE_NAME_LEN: usize = 32;
