//! Segment size projection.

use std::io::{Seek, Write};

use crate::avi::AviWriter;

/// True when appending a frame of `next_len` bytes (plus its index entry)
/// would bring the finalized file to or past `ceiling`. A ceiling of 0
/// disables rotation.
pub fn should_rotate<W: Write + Seek>(
    writer: &AviWriter<W>,
    next_len: usize,
    ceiling: u64,
) -> bool {
    ceiling > 0 && writer.projected_size(next_len) >= ceiling
}
