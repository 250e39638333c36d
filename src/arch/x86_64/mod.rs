// src/arch/x86_64/mod.rs

//! x86 hardware-layout code: port I/O, the interrupt descriptor table and
//! the 8259 interrupt controllers.
//!
//! The binary layouts here are hardware-defined; the modules compile on
//! any target so the table/remap logic stays host-testable, while the
//! pieces that execute privileged instructions are gated on
//! `target_arch = "x86_64"`.

#[cfg(target_arch = "x86_64")]
pub mod cpu;
pub mod idt;
pub mod pic;
pub mod port;
