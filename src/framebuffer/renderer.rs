// src/framebuffer/renderer.rs

//! The double-buffered pixel renderer.
//!
//! All drawing lands in the fixed-capacity back buffer; nothing becomes
//! visible until [`Renderer::swap_buffers`] copies the whole back buffer
//! into the hardware-visible front region. Coordinates are the caller's
//! contract: `put_pixel` performs no bounds check against the configured
//! geometry, and a coordinate outside the back buffer's 800x600 capacity
//! panics on the index instead of running off the end of the allocation.
//!
//! The back storage is borrowed, not owned. At roughly two megabytes it
//! must never cross a stack frame, so the caller hands in a reference to
//! static (or, in tests, leaked) memory and the renderer keeps it for its
//! lifetime.

use super::font::{Filesystem, Font, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::{DisplayGeometry, FramebufferError};
use crate::geometry::GlyphRow;

/// Back-buffer capacity, fixed regardless of the reported geometry.
pub const BACK_WIDTH: usize = 800;
pub const BACK_HEIGHT: usize = 600;
pub const BACK_PIXELS: usize = BACK_WIDTH * BACK_HEIGHT;

/// The hardware-visible framebuffer region: a sink the back buffer is
/// presented into.
pub trait FrontBuffer {
    /// Copy the whole back buffer into the visible region.
    fn present(&mut self, pixels: &[u32]);
}

/// Front buffer at the boot-reported physical address.
pub struct HardwareFront {
    base: *mut u32,
}

impl HardwareFront {
    /// Wrap the boot-reported framebuffer address.
    ///
    /// # Safety
    ///
    /// `address` must point at a mapped, writable framebuffer region large
    /// enough for the back buffer, and nothing else may write it.
    #[must_use]
    pub const unsafe fn new(address: u64) -> Self {
        Self {
            base: address as *mut u32,
        }
    }
}

// SAFETY: the pointer is a fixed device region; exclusive use is enforced
// by the renderer singleton's lock.
unsafe impl Send for HardwareFront {}

impl FrontBuffer for HardwareFront {
    fn present(&mut self, pixels: &[u32]) {
        // SAFETY: construction guaranteed a writable region of at least
        // back-buffer size; source and destination never overlap.
        unsafe {
            core::ptr::copy_nonoverlapping(pixels.as_ptr(), self.base, pixels.len());
        }
    }
}

/// Pixel renderer over borrowed off-screen storage and a front sink.
pub struct Renderer<'b, F> {
    front: F,
    back: &'b mut [u32; BACK_PIXELS],
    /// Pixels per scanline, from the boot-reported byte pitch.
    pitch: usize,
    /// Total framebuffer size in bytes.
    size: usize,
    font: Font,
}

impl<'b, F: FrontBuffer> Renderer<'b, F> {
    /// Capture the boot-reported geometry, load the glyph font and take
    /// ownership of the back storage (zeroing it).
    ///
    /// The pitch is converted from bytes to 32-bit pixels and, together
    /// with the total byte size, never changes afterwards.
    ///
    /// # Errors
    ///
    /// [`FramebufferError::UnsupportedGeometry`] when the reported
    /// geometry exceeds the back buffer's 800x600 capacity;
    /// [`FramebufferError::FontMissing`] / `FontTruncated` from the font
    /// lookup.
    pub fn initialize(
        geometry: &DisplayGeometry,
        back: &'b mut [u32; BACK_PIXELS],
        front: F,
        fs: &impl Filesystem,
    ) -> Result<Self, FramebufferError> {
        let pitch = geometry.pitch as usize / 4;
        let height = geometry.height as usize;
        if pitch > BACK_WIDTH || height > BACK_HEIGHT {
            return Err(FramebufferError::UnsupportedGeometry);
        }
        let font = Font::load(fs)?;
        back.fill(0);
        Ok(Self {
            front,
            back,
            pitch,
            size: geometry.pitch as usize * height,
            font,
        })
    }

    /// Pixels per scanline.
    #[must_use]
    pub const fn pitch(&self) -> usize {
        self.pitch
    }

    /// Framebuffer size in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Write one packed color word into the back buffer.
    ///
    /// No bounds check against the configured geometry; the caller keeps
    /// coordinates inside the declared capacity.
    pub fn put_pixel(&mut self, x: usize, y: usize, color: u32) {
        self.back[y * self.pitch + x] = color;
    }

    /// Set the first `size / 4` back-buffer words to `color`.
    pub fn fill(&mut self, color: u32) {
        self.back[..self.size / 4].fill(color);
    }

    /// Fill a rectangle pixel by pixel. Naive, but frame sizes are
    /// bounded and there is no redraw budget to meet.
    pub fn rect(&mut self, x: usize, y: usize, width: usize, height: usize, color: u32) {
        for column in x..x + width {
            for row in y..y + height {
                self.put_pixel(column, row, color);
            }
        }
    }

    /// Paint one glyph with its top-left corner at `(x, y)`, upscaled to
    /// `scale * scale` blocks per set bit. Newline is a no-op; unset bits
    /// leave the background untouched.
    pub fn put_char(&mut self, character: u8, x: usize, y: usize, color: u32, scale: usize) {
        if character == b'\n' {
            return;
        }
        let mut rows = [0u8; GLYPH_HEIGHT];
        rows.copy_from_slice(self.font.glyph(character));

        for (cy, &row) in rows.iter().enumerate() {
            let mask = GlyphRow(row);
            for cx in 0..GLYPH_WIDTH {
                if !mask.bit(cx) {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        self.put_pixel(x + cx * scale + sx, y + cy * scale + sy, color);
                    }
                }
            }
        }
    }

    /// Lay out `s` left to right with a fixed advance of `8 * scale`
    /// pixels. No wrapping, no kerning.
    pub fn write_string(&mut self, s: &str, x: usize, y: usize, color: u32, scale: usize) {
        for (i, byte) in s.bytes().enumerate() {
            self.put_char(byte, x + i * GLYPH_WIDTH * scale, y, color, scale);
        }
    }

    /// Present the back buffer. The single point where rendered content
    /// becomes visible.
    pub fn swap_buffers(&mut self) {
        self.front.present(&self.back[..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::font::{FileHandle, FONT_BYTES, FONT_FILE_NAME};
    use crate::geometry::pixel;

    struct FontFs {
        data: Vec<u8>,
    }

    impl FontFs {
        fn blank() -> Self {
            Self {
                data: vec![0u8; FONT_BYTES],
            }
        }

        /// A font whose only non-blank glyph is `character`.
        fn with_glyph(character: u8, rows: [u8; GLYPH_HEIGHT]) -> Self {
            let mut data = vec![0u8; FONT_BYTES];
            let start = character as usize * GLYPH_HEIGHT;
            data[start..start + GLYPH_HEIGHT].copy_from_slice(&rows);
            Self { data }
        }
    }

    impl Filesystem for FontFs {
        fn find_file(&self, name: &str) -> Option<FileHandle> {
            (name == FONT_FILE_NAME).then_some(FileHandle(7))
        }

        fn read_file(&self, _handle: FileHandle) -> &[u8] {
            &self.data
        }
    }

    #[derive(Default)]
    struct VecFront {
        pixels: Vec<u32>,
        presents: usize,
    }

    impl FrontBuffer for VecFront {
        fn present(&mut self, pixels: &[u32]) {
            self.pixels.clear();
            self.pixels.extend_from_slice(pixels);
            self.presents += 1;
        }
    }

    const GEOMETRY: DisplayGeometry = DisplayGeometry {
        address: 0,
        pitch: 800 * 4,
        height: 600,
    };

    /// Heap-backed storage; never build the array on the stack.
    fn back_storage() -> &'static mut [u32; BACK_PIXELS] {
        let words: &'static mut [u32] = Box::leak(vec![0u32; BACK_PIXELS].into_boxed_slice());
        words.try_into().unwrap()
    }

    fn renderer(fs: &FontFs) -> Renderer<'static, VecFront> {
        Renderer::initialize(&GEOMETRY, back_storage(), VecFront::default(), fs).unwrap()
    }

    #[test]
    fn initialize_derives_pitch_and_size_once() {
        let fs = FontFs::blank();
        let r = renderer(&fs);
        assert_eq!(r.pitch(), 800);
        assert_eq!(r.size(), 800 * 4 * 600);
    }

    #[test]
    fn initialize_rejects_geometry_beyond_back_buffer_capacity() {
        let fs = FontFs::blank();
        let wide = DisplayGeometry {
            address: 0,
            pitch: 1024 * 4,
            height: 600,
        };
        assert!(matches!(
            Renderer::initialize(&wide, back_storage(), VecFront::default(), &fs),
            Err(FramebufferError::UnsupportedGeometry)
        ));
        let tall = DisplayGeometry {
            address: 0,
            pitch: 800 * 4,
            height: 768,
        };
        assert!(matches!(
            Renderer::initialize(&tall, back_storage(), VecFront::default(), &fs),
            Err(FramebufferError::UnsupportedGeometry)
        ));
    }

    #[test]
    fn initialize_surfaces_font_errors() {
        struct EmptyFs;
        impl Filesystem for EmptyFs {
            fn find_file(&self, _name: &str) -> Option<FileHandle> {
                None
            }
            fn read_file(&self, _handle: FileHandle) -> &[u8] {
                &[]
            }
        }
        assert!(matches!(
            Renderer::initialize(&GEOMETRY, back_storage(), VecFront::default(), &EmptyFs),
            Err(FramebufferError::FontMissing)
        ));
    }

    #[test]
    fn put_pixel_then_swap_is_visible_at_exactly_one_offset() {
        let fs = FontFs::blank();
        let mut r = renderer(&fs);
        let color = pixel(10, 20, 30);
        r.put_pixel(3, 2, color);
        r.swap_buffers();

        let front = &r.front.pixels;
        assert_eq!(front.len(), BACK_PIXELS);
        assert_eq!(front[2 * 800 + 3], color);
        assert_eq!(front.iter().filter(|&&w| w != 0).count(), 1);
    }

    #[test]
    fn fill_covers_exactly_the_reported_size_and_is_idempotent() {
        let fs = FontFs::blank();
        // Smaller reported geometry than the back buffer capacity.
        let small = DisplayGeometry {
            address: 0,
            pitch: 640 * 4,
            height: 480,
        };
        let mut r =
            Renderer::initialize(&small, back_storage(), VecFront::default(), &fs).unwrap();
        let color = pixel(1, 2, 3);
        r.fill(color);
        let once: Vec<u32> = r.back.to_vec();
        r.fill(color);
        assert_eq!(r.back.to_vec(), once);

        let words = 640 * 480;
        assert!(r.back[..words].iter().all(|&w| w == color));
        assert!(r.back[words..].iter().all(|&w| w == 0));
    }

    #[test]
    fn rect_writes_exactly_its_area() {
        let fs = FontFs::blank();
        let mut r = renderer(&fs);
        let color = pixel(200, 100, 50);
        r.rect(10, 20, 7, 5, color);

        let painted = r.back.iter().filter(|&&w| w == color).count();
        assert_eq!(painted, 7 * 5);
        for x in 10..17 {
            for y in 20..25 {
                assert_eq!(r.back[y * 800 + x], color);
            }
        }
        assert_eq!(r.back[19 * 800 + 10], 0);
        assert_eq!(r.back[20 * 800 + 9], 0);
    }

    #[test]
    fn blank_glyph_leaves_the_background_untouched() {
        let fs = FontFs::blank();
        let mut r = renderer(&fs);
        r.fill(pixel(9, 9, 9));
        let before: Vec<u32> = r.back.to_vec();
        r.put_char(b'X', 100, 100, pixel(255, 255, 255), 3);
        assert_eq!(r.back.to_vec(), before);
    }

    #[test]
    fn put_char_scales_each_set_bit_into_a_block() {
        // Single set bit: top-left pixel of the glyph cell.
        let mut rows = [0u8; GLYPH_HEIGHT];
        rows[0] = 0x80;
        let fs = FontFs::with_glyph(b'A', rows);
        let mut r = renderer(&fs);
        let color = pixel(255, 0, 0);
        r.put_char(b'A', 40, 50, color, 2);

        let painted = r.back.iter().filter(|&&w| w == color).count();
        assert_eq!(painted, 4);
        for sy in 0..2 {
            for sx in 0..2 {
                assert_eq!(r.back[(50 + sy) * 800 + 40 + sx], color);
            }
        }
    }

    #[test]
    fn put_char_newline_is_a_no_op() {
        let fs = FontFs::blank();
        let mut r = renderer(&fs);
        r.put_char(b'\n', 0, 0, pixel(255, 255, 255), 1);
        assert!(r.back.iter().all(|&w| w == 0));
    }

    #[test]
    fn write_string_advances_eight_times_scale() {
        let mut rows = [0u8; GLYPH_HEIGHT];
        rows[0] = 0x80;
        let fs = FontFs::with_glyph(b'.', rows);
        let mut r = renderer(&fs);
        let color = pixel(0, 255, 0);
        r.write_string("..", 16, 0, color, 2);

        assert_eq!(r.back[16], color);
        assert_eq!(r.back[16 + 8 * 2], color);
        assert_eq!(r.back.iter().filter(|&&w| w == color).count(), 8);
    }

    #[test]
    fn swap_presents_the_entire_back_buffer_each_time() {
        let fs = FontFs::blank();
        let mut r = renderer(&fs);
        r.swap_buffers();
        r.swap_buffers();
        assert_eq!(r.front.presents, 2);
        assert_eq!(r.front.pixels.len(), BACK_PIXELS);
    }
}
