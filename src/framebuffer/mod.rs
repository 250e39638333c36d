// src/framebuffer/mod.rs

//! Linear-framebuffer graphics: boot geometry capture, bitmap font
//! loading, and the double-buffered renderer.

pub mod font;
pub mod renderer;

use core::fmt;

use spin::{Mutex, Once};

pub use font::{FileHandle, Filesystem, Font, GLYPH_HEIGHT, GLYPH_WIDTH};
pub use renderer::{FrontBuffer, HardwareFront, Renderer, BACK_HEIGHT, BACK_PIXELS, BACK_WIDTH};

/// Framebuffer shape as reported at boot. Pitch is in bytes; the
/// renderer converts it to 32-bit pixels once at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    pub address: u64,
    pub pitch: u32,
    pub height: u32,
}

impl DisplayGeometry {
    /// Capture the bootloader-reported framebuffer.
    #[must_use]
    pub fn from_boot_frame(frame: &mut bootloader_api::info::FrameBuffer) -> Self {
        let info = frame.info();
        Self {
            address: frame.buffer_mut().as_mut_ptr() as u64,
            pitch: (info.stride * info.bytes_per_pixel) as u32,
            height: info.height as u32,
        }
    }
}

/// Graphics-path failures surfaced at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferError {
    /// The font file is absent from the boot filesystem.
    FontMissing,
    /// The font file is shorter than a full 256-glyph table.
    FontTruncated,
    /// The reported geometry exceeds the back buffer's capacity.
    UnsupportedGeometry,
}

impl FramebufferError {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FontMissing => "font file not found",
            Self::FontTruncated => "font file truncated",
            Self::UnsupportedGeometry => "unsupported framebuffer geometry",
        }
    }
}

impl fmt::Display for FramebufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage for the global renderer's back buffer. Too large to ever live
/// on a stack frame, so it sits in BSS and is lent to the renderer at
/// initialization.
struct BackStore(core::cell::UnsafeCell<[u32; BACK_PIXELS]>);

// SAFETY: the cell is borrowed exactly once, by the single-threaded boot
// path in `init`, and thereafter owned by the renderer behind its lock.
unsafe impl Sync for BackStore {}

static BACK_STORE: BackStore = BackStore(core::cell::UnsafeCell::new([0; BACK_PIXELS]));

/// The global renderer, set once by [`init`].
pub static FRAMEBUFFER: Once<Mutex<Renderer<'static, HardwareFront>>> = Once::new();

/// Bring up the renderer over the boot-reported framebuffer.
///
/// Runs on the single-threaded boot path, once. A second call returns
/// without touching the already-published renderer.
///
/// # Errors
///
/// Propagates geometry and font failures from
/// [`Renderer::initialize`].
pub fn init(geometry: &DisplayGeometry, fs: &impl Filesystem) -> Result<(), FramebufferError> {
    if FRAMEBUFFER.get().is_some() {
        return Ok(());
    }
    // SAFETY: guarded above; this is the only borrow of the storage, and
    // the address comes from the bootloader's framebuffer mapping with the
    // renderer behind FRAMEBUFFER as its only writer.
    let (back, front) = unsafe { (&mut *BACK_STORE.0.get(), HardwareFront::new(geometry.address)) };
    let renderer = Renderer::initialize(geometry, back, front, fs)?;
    FRAMEBUFFER.call_once(|| Mutex::new(renderer));
    Ok(())
}

/// Run `f` with the global renderer locked. No-op before [`init`].
pub fn with_renderer<R>(f: impl FnOnce(&mut Renderer<'static, HardwareFront>) -> R) -> Option<R> {
    FRAMEBUFFER.get().map(|lock| f(&mut lock.lock()))
}
