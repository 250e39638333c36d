// src/lib.rs

//! Bare-metal hardware presentation core.
//!
//! This crate is the hardware-facing bootstrap layer of a minimal x86
//! kernel. It owns the three process-lifetime hardware resources:
//!
//! - the interrupt descriptor table and the 8259 controller remap
//!   ([`arch::x86_64::idt`], [`arch::x86_64::pic`]),
//! - the text-mode console at `0xB8000` ([`tty`]),
//! - the double-buffered linear framebuffer ([`framebuffer`]).
//!
//! The two display modes are mutually exclusive; the boot path picks one
//! and calls its initializer. Hardware primitives (port I/O, the table
//! load, the front-buffer region, the filesystem that serves the bitmap
//! font) sit behind traits so every drawing and table-building path can be
//! exercised against plain memory.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod arch;
pub mod errors;
pub mod framebuffer;
pub mod geometry;
pub mod tty;

pub use errors::KernelError;

/// Halt the CPU until the next interrupt, forever.
#[cfg(target_arch = "x86_64")]
#[inline]
pub fn hlt_loop() -> ! {
    use crate::arch::{Cpu, X86Cpu};
    loop {
        X86Cpu::halt();
    }
}

/// Install the interrupt dispatch table and remap the controllers.
///
/// Must run exactly once, before interrupts are first enabled. Interrupts
/// stay masked for the whole build-and-load window and are re-enabled on
/// return.
#[cfg(target_arch = "x86_64")]
pub fn init_interrupts() {
    arch::x86_64::idt::init();
}

/// Bring up framebuffer display mode.
///
/// Captures the boot-reported geometry, loads the bitmap font from the
/// filesystem collaborator and publishes the global renderer.
///
/// # Errors
///
/// Fails when the font resource is missing or truncated, or when the
/// reported geometry exceeds the fixed back-buffer capacity.
pub fn init_framebuffer(
    geometry: &framebuffer::DisplayGeometry,
    fs: &impl framebuffer::font::Filesystem,
) -> Result<(), KernelError> {
    framebuffer::init(geometry, fs)?;
    Ok(())
}
