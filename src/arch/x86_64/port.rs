// src/arch/x86_64/port.rs

//! Byte-wide I/O port access.
//!
//! The port space is modeled as a capability ([`PortBus`]) rather than as
//! free functions so that the hardware protocols built on top of it (the
//! controller remap sequence, the CRTC cursor updates) can be driven
//! against a recording double and checked write-for-write.

/// Synchronous single-byte access to the I/O port space.
///
/// Implementations are trusted primitives: no port number is validated
/// here, matching the hardware contract.
pub trait PortBus {
    /// Write one byte to `port`.
    fn write_port(&mut self, port: u16, value: u8);

    /// Read one byte from `port`.
    fn read_port(&mut self, port: u16) -> u8;
}

/// The real I/O port space, via `in`/`out`.
#[cfg(target_arch = "x86_64")]
pub struct IoPortBus;

#[cfg(target_arch = "x86_64")]
impl IoPortBus {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[cfg(target_arch = "x86_64")]
impl Default for IoPortBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "x86_64")]
impl PortBus for IoPortBus {
    fn write_port(&mut self, port: u16, value: u8) {
        // SAFETY: single-byte port writes are synchronous and do not touch
        // memory; which ports are safe to program is the caller's contract.
        unsafe {
            core::arch::asm!(
                "out dx, al",
                in("dx") port,
                in("al") value,
                options(nomem, nostack, preserves_flags)
            );
        }
    }

    fn read_port(&mut self, port: u16) -> u8 {
        let value: u8;
        // SAFETY: see `write_port`.
        unsafe {
            core::arch::asm!(
                "in al, dx",
                in("dx") port,
                out("al") value,
                options(nomem, nostack, preserves_flags)
            );
        }
        value
    }
}

/// Capacity of the recording double's write log.
const RECORD_CAPACITY: usize = 2048;

/// In-memory double that logs every write in order.
///
/// Reads return zero. Writes beyond the log capacity are counted but not
/// stored.
#[cfg_attr(target_arch = "x86_64", allow(dead_code))]
pub struct RecordingBus {
    writes: [(u16, u8); RECORD_CAPACITY],
    len: usize,
    reads: usize,
}

#[cfg_attr(target_arch = "x86_64", allow(dead_code))]
impl RecordingBus {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            writes: [(0, 0); RECORD_CAPACITY],
            len: 0,
            reads: 0,
        }
    }

    /// Every `(port, value)` write recorded so far, in issue order.
    #[must_use]
    pub fn writes(&self) -> &[(u16, u8)] {
        let stored = if self.len < RECORD_CAPACITY {
            self.len
        } else {
            RECORD_CAPACITY
        };
        &self.writes[..stored]
    }

    /// Total number of writes issued, including any past capacity.
    #[must_use]
    pub const fn write_count(&self) -> usize {
        self.len
    }

    /// Number of reads issued.
    #[must_use]
    pub const fn read_count(&self) -> usize {
        self.reads
    }
}

impl Default for RecordingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl PortBus for RecordingBus {
    fn write_port(&mut self, port: u16, value: u8) {
        if self.len < RECORD_CAPACITY {
            self.writes[self.len] = (port, value);
        }
        self.len += 1;
    }

    fn read_port(&mut self, _port: u16) -> u8 {
        self.reads += 1;
        0
    }
}

/// Bus wired into the global console: the real port space on hardware
/// builds, the recording double elsewhere.
#[cfg(target_arch = "x86_64")]
pub type DefaultPortBus = IoPortBus;

#[cfg(not(target_arch = "x86_64"))]
pub type DefaultPortBus = RecordingBus;
