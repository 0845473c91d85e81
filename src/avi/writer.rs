//! Streaming AVI writer.
//!
//! Usage:
//! ```ignore
//! let params = StreamParams::new(1920, 1080, 24, VideoCodec::Rgb24);
//! let mut writer = AviWriter::create("capture.avi", params)?;
//!
//! // Frames are appended to the movi list as they arrive
//! writer.write_frame(&frame, frame.len())?;
//!
//! // Finalize patches the header, writes idx1 and flushes
//! writer.finalize(FinalizeTiming::Measured(elapsed))?;
//! ```
//!
//! The header skeleton is written up front with placeholders; nothing is
//! seeked during normal frame writes, only at finalize.

use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::Duration;

use crate::avi::error::{AviError, AviResult};
use crate::avi::riff::{self, FourCc};
use crate::video::VideoCodec;

/// Size of one idx1 entry.
pub const INDEX_ENTRY_LEN: u64 = 16;

/// idx1 flag: entry is a key frame.
pub const AVIIF_KEYFRAME: u32 = 0x10;

/// avih flag: file has an idx1 index.
pub const AVIF_HASINDEX: u32 = 0x10;

/// Time scale of strh; rate / scale is the frame rate.
pub const RATE_SCALE: u32 = 1000;

/// Bounds applied to a frame rate recomputed from wall time.
pub const MIN_EFFECTIVE_FPS: f64 = 1.0;
pub const MAX_EFFECTIVE_FPS: f64 = 120.0;

/// Elapsed times shorter than this are treated as "not measured".
const MIN_MEASURED_ELAPSED: Duration = Duration::from_millis(1);

/// Geometry and timing of the single video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    pub width: u32,
    pub height: u32,
    /// Nominal frames per second
    pub fps: u32,
    pub codec: VideoCodec,
}

impl StreamParams {
    pub fn new(width: u32, height: u32, fps: u32, codec: VideoCodec) -> Self {
        Self {
            width,
            height,
            fps,
            codec,
        }
    }

    /// Size of one uncompressed 24-bit frame.
    pub fn raw_frame_len(&self) -> u64 {
        self.width as u64 * self.height as u64 * 3
    }

    fn validate(&self) -> AviResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AviError::InvalidConfig(format!(
                "frame size {}x{} must be positive",
                self.width, self.height
            )));
        }
        if self.width > i16::MAX as u32 || self.height > i16::MAX as u32 {
            return Err(AviError::InvalidConfig(format!(
                "frame size {}x{} exceeds the stream rectangle range",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(AviError::InvalidConfig("frame rate must be positive".into()));
        }
        riff::to_u32("frame size", self.raw_frame_len())?;
        Ok(())
    }
}

/// How finalize derives the timing header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeTiming {
    /// Keep the nominal frame rate given at open.
    NominalRate,
    /// Recompute the rate from the wall time the segment actually covered.
    Measured(Duration),
}

/// One idx1 record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub chunk_id: FourCc,
    pub flags: u32,
    /// Offset of the chunk header relative to the start of movi payload data.
    pub offset: u32,
    /// Payload length without the pad byte.
    pub size: u32,
}

/// Positions of the header fields patched by finalize.
#[derive(Debug, Clone, Copy, Default)]
struct DeferredFields {
    riff_size: u64,
    micro_sec_per_frame: u64,
    max_bytes_per_sec: u64,
    total_frames: u64,
    main_buffer_size: u64,
    stream_scale: u64,
    stream_rate: u64,
    stream_length: u64,
    stream_buffer_size: u64,
    size_image: u64,
    movi_size: u64,
}

/// Streaming AVI writer with a single video stream.
pub struct AviWriter<W: Write + Seek = BufWriter<File>> {
    /// Output sink; `None` once finalized.
    sink: Option<W>,
    params: StreamParams,
    fields: DeferredFields,
    /// First byte after the "movi" list type.
    movi_data_start: u64,
    /// Current stream position, tracked without querying the sink.
    position: u64,
    index: Vec<IndexEntry>,
    /// Payload bytes written including pad bytes.
    committed_bytes: u64,
    largest_frame: u32,
}

impl AviWriter<BufWriter<File>> {
    /// Create the file at `path` and write the header skeleton.
    pub fn create(path: impl AsRef<Path>, params: StreamParams) -> AviResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            AviError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create output file {:?}: {}", path, e),
            ))
        })?;

        let writer = Self::new(BufWriter::new(file), params)?;
        tracing::debug!(
            "AVI segment opened: {} ({}x{} @ {} fps, {})",
            path.display(),
            params.width,
            params.height,
            params.fps,
            params.codec
        );
        Ok(writer)
    }
}

impl<W: Write + Seek> AviWriter<W> {
    /// Write the header skeleton to `sink`, starting at its beginning.
    pub fn new(mut sink: W, params: StreamParams) -> AviResult<Self> {
        params.validate()?;

        let (header, fields) = build_header(&params)?;
        sink.seek(SeekFrom::Start(0))?;
        sink.write_all(&header)?;

        let position = header.len() as u64;
        Ok(Self {
            sink: Some(sink),
            params,
            fields,
            movi_data_start: position,
            position,
            index: Vec::new(),
            committed_bytes: 0,
            largest_frame: 0,
        })
    }

    /// Append one frame chunk using the first `length` bytes of `buffer`.
    pub fn write_frame(&mut self, buffer: &[u8], length: usize) -> AviResult<()> {
        let Some(sink) = self.sink.as_mut() else {
            return Err(AviError::InvalidState);
        };

        if length == 0 {
            return Err(AviError::InvalidFrame("frame is empty".into()));
        }
        if length > buffer.len() {
            return Err(AviError::InvalidFrame(format!(
                "frame length {} exceeds buffer of {} bytes",
                length,
                buffer.len()
            )));
        }
        let fixed_len = self.params.codec.fixed_frame_len(self.params.width, self.params.height);
        if let Some(expected) = fixed_len {
            if length as u64 != expected {
                return Err(AviError::InvalidFrame(format!(
                    "{} frame must be exactly {} bytes for {}x{}, got {}",
                    self.params.codec, expected, self.params.width, self.params.height, length
                )));
            }
        }
        let size = u32::try_from(length).map_err(|_| {
            AviError::InvalidFrame(format!("frame length {} exceeds 32 bits", length))
        })?;
        let offset = riff::to_u32("movi offset", self.position - self.movi_data_start)?;

        let chunk_id = self.params.codec.chunk_id();
        sink.write_all(&chunk_id)?;
        sink.write_u32::<LittleEndian>(size)?;
        sink.write_all(&buffer[..length])?;
        let pad = length as u64 % 2;
        if pad != 0 {
            sink.write_u8(0)?;
        }

        self.position += riff::padded_chunk_len(length as u64);
        self.index.push(IndexEntry {
            chunk_id,
            flags: AVIIF_KEYFRAME,
            offset,
            size,
        });
        self.committed_bytes += length as u64 + pad;
        self.largest_frame = self.largest_frame.max(size);
        Ok(())
    }

    /// File size if a frame of `next_len` bytes and its index entry were
    /// appended and the file finalized.
    pub fn projected_size(&self, next_len: usize) -> u64 {
        let next_len = next_len as u64;
        self.position
            + riff::CHUNK_HEADER_LEN
            + next_len
            + next_len % 2
            + riff::CHUNK_HEADER_LEN
            + (self.index.len() as u64 + 1) * INDEX_ENTRY_LEN
    }

    /// Patch the header, append idx1 and flush.
    ///
    /// Returns the sink on the first call; later calls are no-ops returning
    /// `None`. Dropping the returned sink closes the file.
    pub fn finalize(&mut self, timing: FinalizeTiming) -> AviResult<Option<W>> {
        let Some(mut sink) = self.sink.take() else {
            return Ok(None);
        };

        let frames = self.index.len() as u64;
        let fields = self.fields;

        if frames > 0 {
            let fps = effective_fps(frames, self.params.fps, timing);
            let largest = self.largest_frame;
            let max_bytes_per_sec = match timing {
                FinalizeTiming::Measured(elapsed) if elapsed >= MIN_MEASURED_ELAPSED => {
                    self.committed_bytes as f64 / elapsed.as_secs_f64()
                }
                _ => largest as f64 * fps,
            };
            let end = self.position;

            let us_per_frame = micro_sec_per_frame(fps);
            riff::patch_u32(&mut sink, fields.micro_sec_per_frame, us_per_frame, end)?;
            let max_bytes_per_sec = clamp_u32(max_bytes_per_sec);
            riff::patch_u32(&mut sink, fields.max_bytes_per_sec, max_bytes_per_sec, end)?;
            riff::patch_u32(&mut sink, fields.stream_scale, RATE_SCALE, end)?;
            riff::patch_u32(&mut sink, fields.stream_rate, scaled_rate(fps), end)?;
            riff::patch_u32(&mut sink, fields.main_buffer_size, largest, end)?;
            riff::patch_u32(&mut sink, fields.stream_buffer_size, largest, end)?;
            riff::patch_u32(&mut sink, fields.size_image, largest, end)?;
        }

        let movi_end = self.position;
        let movi_size = riff::to_u32("movi size", movi_end - fields.movi_size - 4)?;
        riff::patch_u32(&mut sink, fields.movi_size, movi_size, movi_end)?;

        let index_len = riff::to_u32("idx1 size", frames * INDEX_ENTRY_LEN)?;
        let mut index = Vec::with_capacity(riff::CHUNK_HEADER_LEN as usize + index_len as usize);
        index.write_all(b"idx1")?;
        index.write_u32::<LittleEndian>(index_len)?;
        for entry in &self.index {
            index.write_all(&entry.chunk_id)?;
            index.write_u32::<LittleEndian>(entry.flags)?;
            index.write_u32::<LittleEndian>(entry.offset)?;
            index.write_u32::<LittleEndian>(entry.size)?;
        }
        sink.write_all(&index)?;
        self.position += index.len() as u64;

        let file_end = self.position;
        let frame_count = riff::to_u32("frame count", frames)?;
        riff::patch_u32(&mut sink, fields.total_frames, frame_count, file_end)?;
        riff::patch_u32(&mut sink, fields.stream_length, frame_count, file_end)?;
        let riff_size = riff::to_u32("riff size", file_end - 8)?;
        riff::patch_u32(&mut sink, fields.riff_size, riff_size, file_end)?;

        sink.flush()?;

        tracing::debug!(
            "AVI segment finalized: {} frames, {} bytes, largest frame {} bytes",
            frames,
            file_end,
            self.largest_frame
        );
        Ok(Some(sink))
    }

    pub fn params(&self) -> &StreamParams {
        &self.params
    }

    pub fn frame_count(&self) -> u64 {
        self.index.len() as u64
    }

    /// Current end of the file in bytes.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn committed_bytes(&self) -> u64 {
        self.committed_bytes
    }

    pub fn largest_frame(&self) -> u32 {
        self.largest_frame
    }

    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    pub fn is_finalized(&self) -> bool {
        self.sink.is_none()
    }
}

impl<W: Write + Seek> Drop for AviWriter<W> {
    fn drop(&mut self) {
        if self.sink.is_some() {
            tracing::warn!(
                "AVI writer dropped while open with {} frames, finalizing with nominal rate",
                self.index.len()
            );
            if let Err(e) = self.finalize(FinalizeTiming::NominalRate) {
                tracing::error!("Failed to finalize AVI writer on drop: {}", e);
            }
        }
    }
}

/// Frame rate used for the timing fields at finalize.
pub fn effective_fps(frames: u64, nominal_fps: u32, timing: FinalizeTiming) -> f64 {
    match timing {
        FinalizeTiming::Measured(elapsed) if frames > 0 && elapsed >= MIN_MEASURED_ELAPSED => {
            (frames as f64 / elapsed.as_secs_f64()).clamp(MIN_EFFECTIVE_FPS, MAX_EFFECTIVE_FPS)
        }
        _ => nominal_fps as f64,
    }
}

fn micro_sec_per_frame(fps: f64) -> u32 {
    clamp_u32(1_000_000.0 / fps)
}

fn scaled_rate(fps: f64) -> u32 {
    clamp_u32(fps * RATE_SCALE as f64)
}

fn clamp_u32(value: f64) -> u32 {
    value.round().clamp(0.0, u32::MAX as f64) as u32
}

/// Build the RIFF/hdrl/movi skeleton in memory and record the positions of
/// the fields finalize will patch.
fn build_header(params: &StreamParams) -> AviResult<(Vec<u8>, DeferredFields)> {
    let mut fields = DeferredFields::default();
    let mut w = Cursor::new(Vec::with_capacity(256));

    let frame_len = riff::to_u32("frame size", params.raw_frame_len())?;
    let max_bytes_per_sec = clamp_u32(frame_len as f64 * params.fps as f64);
    let fps = params.fps as f64;

    w.write_all(&riff::RIFF)?;
    fields.riff_size = riff::size_placeholder(&mut w)?;
    w.write_all(b"AVI ")?;

    riff::write_list(&mut w, *b"hdrl", |w| {
        riff::write_chunk(w, *b"avih", |w| {
            fields.micro_sec_per_frame = riff::deferred_u32(w, micro_sec_per_frame(fps))?;
            fields.max_bytes_per_sec = riff::deferred_u32(w, max_bytes_per_sec)?;
            w.write_u32::<LittleEndian>(0)?; // padding granularity
            w.write_u32::<LittleEndian>(AVIF_HASINDEX)?;
            fields.total_frames = riff::deferred_u32(w, 0)?;
            w.write_u32::<LittleEndian>(0)?; // initial frames
            w.write_u32::<LittleEndian>(1)?; // streams
            fields.main_buffer_size = riff::deferred_u32(w, frame_len)?;
            w.write_u32::<LittleEndian>(params.width)?;
            w.write_u32::<LittleEndian>(params.height)?;
            w.write_all(&[0u8; 16])?;
            Ok(())
        })?;

        riff::write_list(w, *b"strl", |w| {
            riff::write_chunk(w, *b"strh", |w| {
                w.write_all(b"vids")?;
                w.write_all(&params.codec.handler())?;
                w.write_u32::<LittleEndian>(0)?; // flags
                w.write_u16::<LittleEndian>(0)?; // priority
                w.write_u16::<LittleEndian>(0)?; // language
                w.write_u32::<LittleEndian>(0)?; // initial frames
                fields.stream_scale = riff::deferred_u32(w, RATE_SCALE)?;
                fields.stream_rate = riff::deferred_u32(w, scaled_rate(fps))?;
                w.write_u32::<LittleEndian>(0)?; // start
                fields.stream_length = riff::deferred_u32(w, 0)?;
                fields.stream_buffer_size = riff::deferred_u32(w, frame_len)?;
                w.write_u32::<LittleEndian>(u32::MAX)?; // quality
                w.write_u32::<LittleEndian>(0)?; // sample size
                w.write_i16::<LittleEndian>(0)?;
                w.write_i16::<LittleEndian>(0)?;
                w.write_i16::<LittleEndian>(params.width as i16)?;
                w.write_i16::<LittleEndian>(params.height as i16)?;
                Ok(())
            })?;

            riff::write_chunk(w, *b"strf", |w| {
                w.write_u32::<LittleEndian>(40)?; // BITMAPINFOHEADER size
                w.write_i32::<LittleEndian>(params.width as i32)?;
                w.write_i32::<LittleEndian>(params.height as i32)?;
                w.write_u16::<LittleEndian>(1)?; // planes
                w.write_u16::<LittleEndian>(24)?; // bit count
                w.write_u32::<LittleEndian>(params.codec.compression())?;
                fields.size_image = riff::deferred_u32(w, frame_len)?;
                w.write_all(&[0u8; 16])?; // pels per meter x/y, colors used/important
                Ok(())
            })
        })
    })?;

    w.write_all(&riff::LIST)?;
    fields.movi_size = riff::size_placeholder(&mut w)?;
    w.write_all(b"movi")?;

    Ok((w.into_inner(), fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ByteOrder;

    const MOVI_DATA_START: usize = 224;

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        LittleEndian::read_u32(&bytes[offset..offset + 4])
    }

    fn raw_params() -> StreamParams {
        StreamParams::new(4, 2, 10, VideoCodec::Rgb24)
    }

    fn memory_writer(params: StreamParams) -> AviWriter<Cursor<Vec<u8>>> {
        AviWriter::new(Cursor::new(Vec::new()), params).unwrap()
    }

    fn finish(mut writer: AviWriter<Cursor<Vec<u8>>>, timing: FinalizeTiming) -> Vec<u8> {
        writer.finalize(timing).unwrap().unwrap().into_inner()
    }

    /// Offset of the idx1 chunk, found by walking the top-level RIFF records.
    fn find_top_level(bytes: &[u8], fourcc: &[u8; 4]) -> Option<usize> {
        let mut offset = 12;
        while offset + 8 <= bytes.len() {
            if &bytes[offset..offset + 4] == fourcc {
                return Some(offset);
            }
            let size = read_u32(bytes, offset + 4) as usize;
            offset += 8 + size + size % 2;
        }
        None
    }

    #[test]
    fn test_header_layout() {
        let bytes = finish(memory_writer(raw_params()), FinalizeTiming::NominalRate);

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"AVI ");
        assert_eq!(&bytes[12..16], b"LIST");
        assert_eq!(read_u32(&bytes, 16), 192);
        assert_eq!(&bytes[20..24], b"hdrl");
        assert_eq!(&bytes[24..28], b"avih");
        assert_eq!(read_u32(&bytes, 28), 56);
        assert_eq!(read_u32(&bytes, 44), AVIF_HASINDEX);
        assert_eq!(read_u32(&bytes, 56), 1);
        assert_eq!(read_u32(&bytes, 64), 4);
        assert_eq!(read_u32(&bytes, 68), 2);
        assert_eq!(&bytes[88..92], b"LIST");
        assert_eq!(read_u32(&bytes, 92), 116);
        assert_eq!(&bytes[96..100], b"strl");
        assert_eq!(&bytes[100..104], b"strh");
        assert_eq!(read_u32(&bytes, 104), 56);
        assert_eq!(&bytes[108..112], b"vids");
        assert_eq!(&bytes[112..116], b"DIB ");
        assert_eq!(read_u32(&bytes, 148), u32::MAX);
        assert_eq!(&bytes[164..168], b"strf");
        assert_eq!(read_u32(&bytes, 168), 40);
        assert_eq!(read_u32(&bytes, 172), 40);
        assert_eq!(LittleEndian::read_u16(&bytes[184..186]), 1);
        assert_eq!(LittleEndian::read_u16(&bytes[186..188]), 24);
        assert_eq!(read_u32(&bytes, 188), 0);
        assert_eq!(read_u32(&bytes, 192), 24);
        assert_eq!(&bytes[212..216], b"LIST");
        assert_eq!(&bytes[220..224], b"movi");
    }

    #[test]
    fn test_mjpeg_header_tags() {
        let params = StreamParams::new(4, 2, 10, VideoCodec::Mjpeg);
        let mut writer = memory_writer(params);
        writer.write_frame(&[0xFF; 11], 11).unwrap();
        writer.write_frame(&[0xEE; 30], 30).unwrap();
        let bytes = finish(writer, FinalizeTiming::NominalRate);

        assert_eq!(&bytes[112..116], b"MJPG");
        assert_eq!(&bytes[188..192], b"MJPG");
        // size image / buffer sizes follow the largest frame
        assert_eq!(read_u32(&bytes, 192), 30);
        assert_eq!(read_u32(&bytes, 60), 30);
        assert_eq!(read_u32(&bytes, 144), 30);
        assert_eq!(&bytes[MOVI_DATA_START..MOVI_DATA_START + 4], b"00dc");
    }

    #[test]
    fn test_end_to_end_raw_scenario() {
        let mut writer = memory_writer(raw_params());
        let frame = [7u8; 24];
        for _ in 0..5 {
            writer.write_frame(&frame, frame.len()).unwrap();
        }
        let bytes = finish(writer, FinalizeTiming::Measured(Duration::from_millis(500)));

        // 5 frames / 0.5 s = 10 fps
        assert_eq!(read_u32(&bytes, 32), 100_000);
        assert_eq!(read_u32(&bytes, 128), 1000);
        assert_eq!(read_u32(&bytes, 132), 10_000);
        // total frames, stream length
        assert_eq!(read_u32(&bytes, 48), 5);
        assert_eq!(read_u32(&bytes, 140), 5);
        // 5 * 24 bytes over 0.5 s
        assert_eq!(read_u32(&bytes, 36), 240);

        let movi_size = read_u32(&bytes, 216) as usize;
        assert_eq!(movi_size, 4 + 5 * 32);

        let idx1 = find_top_level(&bytes, b"idx1").unwrap();
        assert_eq!(idx1, MOVI_DATA_START + 5 * 32);
        assert_eq!(read_u32(&bytes, idx1 + 4), 5 * 16);
        for i in 0..5 {
            let entry = idx1 + 8 + i * 16;
            assert_eq!(&bytes[entry..entry + 4], b"00db");
            assert_eq!(read_u32(&bytes, entry + 4), AVIIF_KEYFRAME);
            assert_eq!(read_u32(&bytes, entry + 8), (i * 32) as u32);
            assert_eq!(read_u32(&bytes, entry + 12), 24);
        }

        assert_eq!(read_u32(&bytes, 4) as usize, bytes.len() - 8);
        assert_eq!(bytes.len(), idx1 + 8 + 5 * 16);
    }

    #[test]
    fn test_zero_frames_still_valid() {
        let bytes = finish(memory_writer(raw_params()), FinalizeTiming::NominalRate);

        assert_eq!(read_u32(&bytes, 48), 0);
        assert_eq!(read_u32(&bytes, 140), 0);
        // movi list holds only its type
        assert_eq!(read_u32(&bytes, 216), 4);
        assert_eq!(&bytes[224..228], b"idx1");
        assert_eq!(read_u32(&bytes, 228), 0);
        assert_eq!(bytes.len(), 232);
        assert_eq!(read_u32(&bytes, 4), 224);
        // open-time timing kept
        assert_eq!(read_u32(&bytes, 32), 100_000);
        assert_eq!(read_u32(&bytes, 132), 10_000);
    }

    #[test]
    fn test_odd_frame_padding() {
        let params = StreamParams::new(4, 2, 10, VideoCodec::Mjpeg);
        let mut writer = memory_writer(params);
        writer.write_frame(&[1, 2, 3, 4, 5], 5).unwrap();
        writer.write_frame(&[6, 7], 2).unwrap();
        assert_eq!(writer.committed_bytes(), 8);
        assert_eq!(writer.position(), MOVI_DATA_START as u64 + 14 + 10);

        let bytes = finish(writer, FinalizeTiming::NominalRate);
        let first = MOVI_DATA_START;
        assert_eq!(read_u32(&bytes, first + 4), 5);
        assert_eq!(&bytes[first + 8..first + 13], &[1, 2, 3, 4, 5]);
        assert_eq!(bytes[first + 13], 0);
        let second = first + 14;
        assert_eq!(&bytes[second..second + 4], b"00dc");
        assert_eq!(read_u32(&bytes, second + 4), 2);

        let idx1 = find_top_level(&bytes, b"idx1").unwrap();
        assert_eq!(read_u32(&bytes, idx1 + 8 + 8), 0);
        assert_eq!(read_u32(&bytes, idx1 + 8 + 12), 5);
        assert_eq!(read_u32(&bytes, idx1 + 24 + 8), 14);
        assert_eq!(read_u32(&bytes, idx1 + 24 + 12), 2);
    }

    #[test]
    fn test_partial_buffer_length() {
        let params = StreamParams::new(4, 2, 10, VideoCodec::Mjpeg);
        let mut writer = memory_writer(params);
        let buffer = [9u8; 64];
        writer.write_frame(&buffer, 10).unwrap();
        assert_eq!(writer.index()[0].size, 10);
        assert_eq!(writer.largest_frame(), 10);
    }

    #[test]
    fn test_invalid_frames_rejected() {
        let mut writer = memory_writer(raw_params());
        assert!(matches!(writer.write_frame(&[0; 23], 23), Err(AviError::InvalidFrame(_))));
        assert!(matches!(writer.write_frame(&[0; 24], 0), Err(AviError::InvalidFrame(_))));
        assert!(matches!(writer.write_frame(&[0; 10], 24), Err(AviError::InvalidFrame(_))));
        assert_eq!(writer.frame_count(), 0);
    }

    #[test]
    fn test_write_after_finalize_fails() {
        let mut writer = memory_writer(raw_params());
        writer.write_frame(&[0; 24], 24).unwrap();
        writer.finalize(FinalizeTiming::NominalRate).unwrap();
        assert!(writer.is_finalized());
        assert!(matches!(writer.write_frame(&[0; 24], 24), Err(AviError::InvalidState)));
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut writer = memory_writer(raw_params());
        writer.write_frame(&[0; 24], 24).unwrap();
        let first = writer.finalize(FinalizeTiming::NominalRate).unwrap();
        assert!(first.is_some());
        let position = writer.position();

        let second = writer.finalize(FinalizeTiming::Measured(Duration::from_secs(3))).unwrap();
        assert!(second.is_none());
        assert_eq!(writer.position(), position);
        assert_eq!(writer.frame_count(), 1);
    }

    #[test]
    fn test_effective_rate_recomputed() {
        let mut writer = memory_writer(StreamParams::new(4, 2, 30, VideoCodec::Rgb24));
        for _ in 0..10 {
            writer.write_frame(&[0; 24], 24).unwrap();
        }
        let bytes = finish(writer, FinalizeTiming::Measured(Duration::from_secs(1)));
        assert_eq!(read_u32(&bytes, 32), 100_000);
        assert_eq!(read_u32(&bytes, 128), 1000);
        assert_eq!(read_u32(&bytes, 132), 10_000);
    }

    #[test]
    fn test_effective_rate_clamped() {
        let elapsed = Duration::from_millis(100);
        // 50 frames in 0.1 s = 500 fps
        assert_eq!(effective_fps(50, 30, FinalizeTiming::Measured(elapsed)), 120.0);
        // 1 frame in 10 s = 0.1 fps
        assert_eq!(effective_fps(1, 30, FinalizeTiming::Measured(Duration::from_secs(10))), 1.0);
        assert_eq!(effective_fps(50, 30, FinalizeTiming::NominalRate), 30.0);
        assert_eq!(effective_fps(50, 30, FinalizeTiming::Measured(Duration::ZERO)), 30.0);
        assert_eq!(effective_fps(0, 30, FinalizeTiming::Measured(elapsed)), 30.0);

        let mut writer = memory_writer(StreamParams::new(4, 2, 30, VideoCodec::Rgb24));
        for _ in 0..50 {
            writer.write_frame(&[0; 24], 24).unwrap();
        }
        let bytes = finish(writer, FinalizeTiming::Measured(elapsed));
        assert_eq!(read_u32(&bytes, 32), 8333);
        assert_eq!(read_u32(&bytes, 132), 120_000);
    }

    #[test]
    fn test_fractional_rate_preserved() {
        let mut writer = memory_writer(StreamParams::new(4, 2, 30, VideoCodec::Rgb24));
        for _ in 0..25 {
            writer.write_frame(&[0; 24], 24).unwrap();
        }
        // 25 frames / 2 s = 12.5 fps
        let bytes = finish(writer, FinalizeTiming::Measured(Duration::from_secs(2)));
        assert_eq!(read_u32(&bytes, 132), 12_500);
        assert_eq!(read_u32(&bytes, 32), 80_000);
    }

    #[test]
    fn test_nominal_max_bytes_per_sec() {
        let mut writer = memory_writer(StreamParams::new(4, 2, 30, VideoCodec::Rgb24));
        writer.write_frame(&[0; 24], 24).unwrap();
        let bytes = finish(writer, FinalizeTiming::NominalRate);
        assert_eq!(read_u32(&bytes, 36), 24 * 30);
    }

    #[test]
    fn test_projected_size() {
        let mut writer = memory_writer(raw_params());
        // header + frame chunk + idx1 header + one entry
        assert_eq!(writer.projected_size(24), 224 + 32 + 8 + 16);
        assert_eq!(writer.projected_size(25), 224 + 34 + 8 + 16);

        writer.write_frame(&[0; 24], 24).unwrap();
        let projected = writer.projected_size(24);
        assert_eq!(projected, 224 + 64 + 8 + 32);

        let bytes = {
            writer.write_frame(&[0; 24], 24).unwrap();
            finish(writer, FinalizeTiming::NominalRate)
        };
        assert_eq!(bytes.len() as u64, projected);
    }

    #[test]
    fn test_projected_size_monotonic() {
        let mut writer = memory_writer(StreamParams::new(4, 2, 10, VideoCodec::Mjpeg));
        let mut last = writer.projected_size(1);
        for len in [1usize, 2, 3, 10, 11, 100] {
            let p = writer.projected_size(len);
            assert!(p >= last);
            last = p;
        }
        let before = writer.projected_size(50);
        writer.write_frame(&[0; 50], 50).unwrap();
        assert!(writer.projected_size(50) > before);
    }

    #[test]
    fn test_invalid_params() {
        let sink = || Cursor::new(Vec::new());
        assert!(matches!(
            AviWriter::new(sink(), StreamParams::new(0, 2, 10, VideoCodec::Rgb24)),
            Err(AviError::InvalidConfig(_))
        ));
        assert!(matches!(
            AviWriter::new(sink(), StreamParams::new(4, 2, 0, VideoCodec::Rgb24)),
            Err(AviError::InvalidConfig(_))
        ));
        assert!(matches!(
            AviWriter::new(sink(), StreamParams::new(40_000, 2, 10, VideoCodec::Rgb24)),
            Err(AviError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_create_file() {
        let path = std::env::temp_dir().join(format!("screenrec_avi_{}.avi", uuid::Uuid::new_v4()));
        let mut writer = AviWriter::create(&path, raw_params()).unwrap();
        writer.write_frame(&[1; 24], 24).unwrap();
        drop(writer.finalize(FinalizeTiming::NominalRate).unwrap());

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(read_u32(&bytes, 4) as usize, bytes.len() - 8);
        assert_eq!(read_u32(&bytes, 48), 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let path = std::env::temp_dir()
            .join(format!("screenrec_missing_{}", uuid::Uuid::new_v4()))
            .join("out.avi");
        assert!(matches!(AviWriter::create(&path, raw_params()), Err(AviError::Io(_))));
    }

    #[test]
    fn test_drop_finalizes_open_writer() {
        let path =
            std::env::temp_dir().join(format!("screenrec_drop_{}.avi", uuid::Uuid::new_v4()));
        {
            let mut writer = AviWriter::create(&path, raw_params()).unwrap();
            writer.write_frame(&[1; 24], 24).unwrap();
            writer.write_frame(&[2; 24], 24).unwrap();
        }

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(read_u32(&bytes, 48), 2);
        assert_eq!(read_u32(&bytes, 4) as usize, bytes.len() - 8);
        std::fs::remove_file(&path).ok();
    }
}
