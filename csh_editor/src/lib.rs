#![cfg_attr(not(feature = "hosted"), no_std)]
#![allow(unused)]

pub extern crate heapless;

#[cfg(any(feature = "history-persistence", feature = "heap-history", feature = "heap-input-buffer"))]
extern crate std;

pub mod autocomplete;
pub mod buffer;
pub mod editor;
pub mod history;
pub mod key_reader;
pub mod renderer;
pub mod terminal;
pub mod transport;

pub use editor::{EditorEvent, LineEditor};
pub use key_reader::{AnsiKeyParser, Key};
pub use terminal::RawMode;
pub use transport::{FnTransport, Transport, TransportRead};
