//! C1: byte-level transport abstraction (`sput`/`sget` in the spec's own
//! naming). Generalizes the reference shell's function-pointer pair
//! (`write_bytes`/`flush_noop` plus a queue reader) into a trait so both a
//! hosted stdio transport and an embedded function-pointer transport can
//! implement it.

/// Result of a single `get` poll.
pub enum TransportRead {
    /// `n` bytes were written into the caller's buffer.
    Read(usize),
    /// Nothing available right now; not EOF. Caller should retry later.
    Again,
    /// Unrecoverable transport failure.
    Fatal,
}

pub trait Transport {
    /// `sput`: write as many of `bytes` as possible, returning how many were
    /// accepted. Partial writes are permitted; callers loop.
    fn put(&mut self, bytes: &[u8]) -> usize;

    /// `sget`: poll for input.
    fn get(&mut self, buf: &mut [u8]) -> TransportRead;
}

/// Adapter for embedders that only have bare function pointers (the
/// reference shell's `uart_hal::write_bytes`-style API), not a `Transport`
/// impl.
pub struct FnTransport<P, G>
where
    P: FnMut(&[u8]) -> usize,
    G: FnMut(&mut [u8]) -> TransportRead,
{
    put_fn: P,
    get_fn: G,
}

impl<P, G> FnTransport<P, G>
where
    P: FnMut(&[u8]) -> usize,
    G: FnMut(&mut [u8]) -> TransportRead,
{
    pub fn new(put_fn: P, get_fn: G) -> Self {
        Self { put_fn, get_fn }
    }
}

impl<P, G> Transport for FnTransport<P, G>
where
    P: FnMut(&[u8]) -> usize,
    G: FnMut(&mut [u8]) -> TransportRead,
{
    fn put(&mut self, bytes: &[u8]) -> usize {
        (self.put_fn)(bytes)
    }

    fn get(&mut self, buf: &mut [u8]) -> TransportRead {
        (self.get_fn)(buf)
    }
}
