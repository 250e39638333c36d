// src/errors.rs

//! Unified error types.
//!
//! Only the collaborator boundaries (filesystem, boot geometry, buffer
//! indices) are fallible; the hardware-facing primitives stay unchecked by
//! contract.

use crate::framebuffer::FramebufferError;
use crate::tty::TtyError;
use core::fmt;

/// Top-level error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// Text console error.
    Tty(TtyError),
    /// Framebuffer subsystem error.
    Framebuffer(FramebufferError),
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::Tty(e) => write!(f, "tty error: {}", e),
            KernelError::Framebuffer(e) => write!(f, "framebuffer error: {}", e),
        }
    }
}

impl From<TtyError> for KernelError {
    fn from(e: TtyError) -> Self {
        KernelError::Tty(e)
    }
}

impl From<FramebufferError> for KernelError {
    fn from(e: FramebufferError) -> Self {
        KernelError::Framebuffer(e)
    }
}
