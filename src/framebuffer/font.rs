// src/framebuffer/font.rs

//! Bitmap font storage and the filesystem collaborator that serves it.
//!
//! The font is a flat blob of 256 glyphs, 16 bytes each: one byte per
//! scanline of an 8x16 cell, most significant bit leftmost. It is fetched
//! once at framebuffer initialization by a fixed name and read-only
//! afterwards.

use super::FramebufferError;

/// Glyph cell dimensions.
pub const GLYPH_WIDTH: usize = 8;
pub const GLYPH_HEIGHT: usize = 16;

/// One glyph per possible character value.
pub const GLYPH_COUNT: usize = 256;

/// Minimum byte length of a usable font blob.
pub const FONT_BYTES: usize = GLYPH_COUNT * GLYPH_HEIGHT;

/// Name the font resource is looked up under.
pub const FONT_FILE_NAME: &str = "DEFAULT FNT";

/// Opaque file reference returned by the filesystem collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHandle(pub u32);

/// The filesystem driver this core defers to for resource lookup.
pub trait Filesystem {
    /// Resolve `name` to a handle, if the file exists.
    fn find_file(&self, name: &str) -> Option<FileHandle>;

    /// The file's contents.
    fn read_file(&self, handle: FileHandle) -> &[u8];
}

/// An owned, validated glyph font.
pub struct Font {
    glyphs: [u8; FONT_BYTES],
}

impl Font {
    /// Copy a font out of a raw blob.
    ///
    /// # Errors
    ///
    /// [`FramebufferError::FontTruncated`] when the blob is shorter than
    /// 256 glyphs. Extra trailing bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FramebufferError> {
        if bytes.len() < FONT_BYTES {
            return Err(FramebufferError::FontTruncated);
        }
        let mut glyphs = [0u8; FONT_BYTES];
        glyphs.copy_from_slice(&bytes[..FONT_BYTES]);
        Ok(Self { glyphs })
    }

    /// Fetch the font from the filesystem collaborator by its fixed name.
    ///
    /// # Errors
    ///
    /// [`FramebufferError::FontMissing`] when the lookup fails,
    /// [`FramebufferError::FontTruncated`] when the blob is short.
    pub fn load(fs: &impl Filesystem) -> Result<Self, FramebufferError> {
        let handle = fs
            .find_file(FONT_FILE_NAME)
            .ok_or(FramebufferError::FontMissing)?;
        Self::from_bytes(fs.read_file(handle))
    }

    /// The 16 scanline masks for `character`.
    #[must_use]
    pub fn glyph(&self, character: u8) -> &[u8] {
        let start = character as usize * GLYPH_HEIGHT;
        &self.glyphs[start..start + GLYPH_HEIGHT]
    }
}
