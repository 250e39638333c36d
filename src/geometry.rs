// src/geometry.rs

//! Small value types shared by the two display paths: grid/pixel
//! dimensions, cursor position, packed RGB pixels and glyph row masks.

/// Display dimensions, in grid cells or pixels depending on the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total cell/pixel count.
    #[must_use]
    pub const fn cells(&self) -> usize {
        self.width * self.height
    }
}

/// Current write position; advanced only through the defined transitions,
/// never reset implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub x: usize,
    pub y: usize,
}

impl Cursor {
    #[must_use]
    pub const fn origin() -> Self {
        Self { x: 0, y: 0 }
    }
}

/// An RGB color, packed into a 32-bit framebuffer word on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack as `0x00RRGGBB`. No alpha channel.
    #[must_use]
    pub const fn pack(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

/// Packed-RGB shorthand used throughout the framebuffer path.
#[must_use]
pub const fn pixel(r: u8, g: u8, b: u8) -> u32 {
    Rgb::new(r, g, b).pack()
}

/// One scanline of an 8-pixel-wide glyph, most significant bit leftmost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphRow(pub u8);

impl GlyphRow {
    /// Whether the pixel in `column` (0 = leftmost) is set.
    #[must_use]
    pub const fn bit(self, column: usize) -> bool {
        self.0 & (0x80 >> column) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_packs_channels_high_to_low() {
        assert_eq!(pixel(0x12, 0x34, 0x56), 0x0012_3456);
        assert_eq!(Rgb::WHITE.pack(), 0x00FF_FFFF);
        assert_eq!(Rgb::BLACK.pack(), 0);
    }

    #[test]
    fn glyph_row_is_msb_first() {
        let row = GlyphRow(0b1000_0001);
        assert!(row.bit(0));
        assert!(!row.bit(1));
        assert!(row.bit(7));
    }

    #[test]
    fn size_cell_count() {
        assert_eq!(Size::new(80, 25).cells(), 2000);
    }
}
