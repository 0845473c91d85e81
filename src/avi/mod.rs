/*!
 * AVI Muxer Module
 *
 * Single-stream RIFF/AVI writer: header skeleton up front, frame chunks
 * appended to `movi`, timing fields and the `idx1` index written at finalize.
 */

pub mod error;
pub mod riff;
pub mod writer;

pub use error::{AviError, AviResult};
pub use writer::{AviWriter, FinalizeTiming, IndexEntry, StreamParams};

/// Largest file a segment may grow to; RIFF sizes are 32-bit.
pub const MAX_USABLE_FILE_SIZE: u64 = 4_000_000_000;
