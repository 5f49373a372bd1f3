//! The abstraction components I (serial) and J (simulator) both implement:
//! one half-duplex request/response transaction per call.

use crate::error::AlpacaResult;

/// A half-duplex NexStar wire transport. Implementations hold whatever
/// lock or state a single in-flight transaction needs; callers must not
/// interleave two transactions against the same transport.
pub trait Transport: Send {
    /// Write `request` in full, then read until `expected_response_len`
    /// bytes have been received or a read returns zero bytes. Returns
    /// whatever was actually read — short reads are not an error at this
    /// layer, they surface as framing errors once the codec looks for the
    /// `'#'` terminator (spec.md §4.I, §8 "Framing").
    fn transact(&mut self, request: &[u8], expected_response_len: usize) -> AlpacaResult<Vec<u8>>;
}
