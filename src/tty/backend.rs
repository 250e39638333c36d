// src/tty/backend.rs

//! Cell-level access to text-mode video memory.
//!
//! The console targets the [`TextBufferAccess`] trait so the same write,
//! scroll and clear logic runs against the memory-mapped buffer at
//! `0xB8000` on hardware and against [`StubGrid`] in tests.

use core::ptr::NonNull;

/// Text-mode buffer physical address.
pub const VIDEO_MEMORY: usize = 0xB8000;

/// Grid dimensions, fixed by the display mode.
pub const TTY_WIDTH: usize = 80;
pub const TTY_HEIGHT: usize = 25;

/// Total addressable character cells.
pub const CELL_COUNT: usize = TTY_WIDTH * TTY_HEIGHT;

/// Errors from the cell layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtyError {
    /// The cell index or range lies outside the 80x25 grid.
    OutOfGrid,
}

impl TtyError {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfGrid => "cell outside the text grid",
        }
    }
}

impl core::fmt::Display for TtyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstraction over the character-cell memory. One cell is an encoded
/// `u16`: character byte in the low half, attribute byte in the high half.
pub trait TextBufferAccess {
    /// Read the encoded cell at `index`.
    ///
    /// # Errors
    ///
    /// [`TtyError::OutOfGrid`] when `index` is outside the grid.
    fn read_cell(&self, index: usize) -> Result<u16, TtyError>;

    /// Write `value` into the cell at `index`.
    ///
    /// # Errors
    ///
    /// [`TtyError::OutOfGrid`] when `index` is outside the grid.
    fn write_cell(&mut self, index: usize, value: u16) -> Result<(), TtyError>;

    /// Copy `count` cells from `src` to `dst`. The ranges may overlap.
    ///
    /// # Errors
    ///
    /// [`TtyError::OutOfGrid`] when either range leaves the grid.
    fn copy_cells(&mut self, src: usize, dst: usize, count: usize) -> Result<(), TtyError>;

    /// Fill one whole row with `value`.
    ///
    /// # Errors
    ///
    /// [`TtyError::OutOfGrid`] when `row >= TTY_HEIGHT`.
    fn fill_row(&mut self, row: usize, value: u16) -> Result<(), TtyError>;
}

/// The memory-mapped text buffer on PC hardware.
#[derive(Clone, Copy)]
pub struct TextModeBuffer {
    cells: NonNull<u16>,
}

impl TextModeBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            // SAFETY: 0xB8000 is the canonical text-mode buffer address on
            // PC-compatible systems and is never null.
            cells: unsafe { NonNull::new_unchecked(VIDEO_MEMORY as *mut u16) },
        }
    }

    const fn in_grid(index: usize, count: usize) -> bool {
        match index.checked_add(count) {
            Some(end) => end <= CELL_COUNT,
            None => false,
        }
    }
}

// SAFETY: the pointer is a fixed hardware address; exclusive use is
// enforced by the console singleton's lock.
unsafe impl Send for TextModeBuffer {}
unsafe impl Sync for TextModeBuffer {}

impl Default for TextModeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBufferAccess for TextModeBuffer {
    fn read_cell(&self, index: usize) -> Result<u16, TtyError> {
        if !Self::in_grid(index, 1) {
            return Err(TtyError::OutOfGrid);
        }
        // SAFETY: index checked against the grid; the region is device
        // memory, so the access is volatile.
        Ok(unsafe { core::ptr::read_volatile(self.cells.as_ptr().add(index)) })
    }

    fn write_cell(&mut self, index: usize, value: u16) -> Result<(), TtyError> {
        if !Self::in_grid(index, 1) {
            return Err(TtyError::OutOfGrid);
        }
        // SAFETY: see `read_cell`.
        unsafe {
            core::ptr::write_volatile(self.cells.as_ptr().add(index), value);
            core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
        }
        Ok(())
    }

    fn copy_cells(&mut self, src: usize, dst: usize, count: usize) -> Result<(), TtyError> {
        if !Self::in_grid(src, count) || !Self::in_grid(dst, count) {
            return Err(TtyError::OutOfGrid);
        }
        // SAFETY: both ranges checked; `copy` handles the overlap the
        // scroll path relies on.
        unsafe {
            core::ptr::copy(
                self.cells.as_ptr().add(src),
                self.cells.as_ptr().add(dst),
                count,
            );
        }
        Ok(())
    }

    fn fill_row(&mut self, row: usize, value: u16) -> Result<(), TtyError> {
        if row >= TTY_HEIGHT {
            return Err(TtyError::OutOfGrid);
        }
        let start = row * TTY_WIDTH;
        for offset in 0..TTY_WIDTH {
            self.write_cell(start + offset, value)?;
        }
        Ok(())
    }
}

/// Plain-memory grid standing in for video memory.
#[cfg_attr(target_arch = "x86_64", allow(dead_code))]
#[derive(Clone)]
pub struct StubGrid {
    cells: [u16; CELL_COUNT],
}

#[cfg_attr(target_arch = "x86_64", allow(dead_code))]
impl StubGrid {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: [0; CELL_COUNT],
        }
    }

    /// Read a cell without the trait's error plumbing.
    #[must_use]
    pub fn cell(&self, index: usize) -> u16 {
        self.cells[index]
    }
}

impl Default for StubGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBufferAccess for StubGrid {
    fn read_cell(&self, index: usize) -> Result<u16, TtyError> {
        self.cells.get(index).copied().ok_or(TtyError::OutOfGrid)
    }

    fn write_cell(&mut self, index: usize, value: u16) -> Result<(), TtyError> {
        match self.cells.get_mut(index) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(TtyError::OutOfGrid),
        }
    }

    fn copy_cells(&mut self, src: usize, dst: usize, count: usize) -> Result<(), TtyError> {
        let src_end = src.checked_add(count).ok_or(TtyError::OutOfGrid)?;
        let dst_end = dst.checked_add(count).ok_or(TtyError::OutOfGrid)?;
        if src_end > CELL_COUNT || dst_end > CELL_COUNT {
            return Err(TtyError::OutOfGrid);
        }
        self.cells.copy_within(src..src_end, dst);
        Ok(())
    }

    fn fill_row(&mut self, row: usize, value: u16) -> Result<(), TtyError> {
        if row >= TTY_HEIGHT {
            return Err(TtyError::OutOfGrid);
        }
        let start = row * TTY_WIDTH;
        self.cells[start..start + TTY_WIDTH].fill(value);
        Ok(())
    }
}

/// Backend wired into the global console.
#[cfg(target_arch = "x86_64")]
pub type DefaultTextBuffer = TextModeBuffer;

#[cfg(not(target_arch = "x86_64"))]
pub type DefaultTextBuffer = StubGrid;
