/*!
 * Video Frame Representation
 *
 * Raw grabbed frames and their conversion to the DIB row layout AVI expects.
 */

/// Pixel format for raw frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// BGRA 8-bit per channel
    BGRA,
    /// RGBA 8-bit per channel (what image decoders hand out)
    RGBA,
    /// RGB 24-bit
    RGB24,
}

impl PixelFormat {
    /// Get bytes per pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::BGRA | PixelFormat::RGBA => 4,
            PixelFormat::RGB24 => 3,
        }
    }

    /// Channel offsets of (r, g, b) within one pixel
    fn rgb_offsets(&self) -> (usize, usize, usize) {
        match self {
            PixelFormat::RGBA | PixelFormat::RGB24 => (0, 1, 2),
            PixelFormat::BGRA => (2, 1, 0),
        }
    }
}

/// Raw uncompressed video frame, rows stored top-down
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Frame pixel data
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: PixelFormat,
    /// Frame sequence number
    pub sequence: u64,
}

impl RawFrame {
    /// Create a new raw frame
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        sequence: u64,
    ) -> Self {
        Self {
            data,
            width,
            height,
            format,
            sequence,
        }
    }

    /// Get expected data size for this frame
    pub fn expected_size(&self) -> usize {
        (self.width * self.height) as usize * self.format.bytes_per_pixel()
    }

    /// Validate frame data size
    pub fn is_valid(&self) -> bool {
        self.data.len() == self.expected_size()
    }

    /// Copy out a sub-rectangle. Returns `None` if it does not fit.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Option<RawFrame> {
        if width == 0
            || height == 0
            || x.checked_add(width)? > self.width
            || y.checked_add(height)? > self.height
            || !self.is_valid()
        {
            return None;
        }

        let bpp = self.format.bytes_per_pixel();
        let src_stride = self.width as usize * bpp;
        let row_len = width as usize * bpp;
        let mut data = Vec::with_capacity(row_len * height as usize);
        for row in y..y + height {
            let start = row as usize * src_stride + x as usize * bpp;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }

        Some(RawFrame {
            data,
            width,
            height,
            format: self.format,
            sequence: self.sequence,
        })
    }

    /// Write the frame as a bottom-up BGR24 DIB into `out`, replacing its
    /// contents. Returns the number of bytes written.
    pub fn write_dib(&self, out: &mut Vec<u8>) -> usize {
        let bpp = self.format.bytes_per_pixel();
        let (r, g, b) = self.format.rgb_offsets();
        let stride = self.width as usize * bpp;

        out.clear();
        out.reserve(self.width as usize * self.height as usize * 3);
        for row in self.data.chunks_exact(stride).rev() {
            for px in row.chunks_exact(bpp) {
                out.push(px[b]);
                out.push(px[g]);
                out.push(px[r]);
            }
        }
        out.len()
    }

    /// Packed top-down RGB bytes, as JPEG encoders take them
    pub fn to_rgb24(&self) -> Vec<u8> {
        if self.format == PixelFormat::RGB24 {
            return self.data.clone();
        }

        let bpp = self.format.bytes_per_pixel();
        let (r, g, b) = self.format.rgb_offsets();
        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for px in self.data.chunks_exact(bpp) {
            rgb.push(px[r]);
            rgb.push(px[g]);
            rgb.push(px[b]);
        }
        rgb
    }
}
