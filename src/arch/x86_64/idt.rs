// src/arch/x86_64/idt.rs

//! Interrupt descriptor table builder.
//!
//! The table is the hardware-defined 256-slot array of 8-byte gate
//! descriptors (32-bit protected-mode layout: handler address split into
//! 16-bit halves around the selector, reserved byte and access flags).
//! `install` builds it in one pass (zero-fill, populate the CPU exception
//! and remapped hardware ranges, remap the controllers, hand the pointer
//! to the load primitive) and the caller keeps interrupts masked for the
//! whole window. An interrupt delivered mid-build would dispatch through a
//! zeroed or half-written gate, which the processor answers with a fault
//! there is no coming back from.
//!
//! There is no error channel anywhere in this module. A malformed
//! descriptor is not recoverable; correctness is the caller's side of the
//! contract.

use crate::arch::x86_64::pic::ChainedPics;
use crate::arch::x86_64::port::PortBus;
use core::sync::atomic::{AtomicU32, Ordering};
use spin::Mutex;

/// Slot count, fixed by hardware.
pub const IDT_ENTRIES: usize = 256;

/// Code-segment selector every installed gate references.
pub const KERNEL_CODE_SELECTOR: u16 = 0x08;

/// Access flags for an installed gate: present, ring 0, 32-bit interrupt
/// gate.
pub const INTERRUPT_GATE_FLAGS: u8 = 0x8E;

/// Last CPU exception vector that gets a gate.
pub const EXCEPTION_LAST: u8 = 19;
/// First hardware interrupt vector after the controller remap.
pub const IRQ_FIRST: u8 = 32;
/// Last hardware interrupt vector.
pub const IRQ_LAST: u8 = 47;

/// One gate descriptor, exactly as the processor reads it.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdtEntry {
    handler_low: u16,
    selector: u16,
    reserved: u8,
    flags: u8,
    handler_high: u16,
}

impl IdtEntry {
    /// The all-zero gate left in every unused slot.
    pub const MISSING: Self = Self {
        handler_low: 0,
        selector: 0,
        reserved: 0,
        flags: 0,
        handler_high: 0,
    };

    const fn new(handler: u32, selector: u16, flags: u8) -> Self {
        Self {
            handler_low: handler as u16,
            selector,
            reserved: 0,
            flags,
            handler_high: (handler >> 16) as u16,
        }
    }

    /// Recombine the 16-bit halves into the handler address.
    #[must_use]
    pub const fn handler_address(&self) -> u32 {
        self.handler_low as u32 | (self.handler_high as u32) << 16
    }

    #[must_use]
    pub const fn selector(&self) -> u16 {
        self.selector
    }

    #[must_use]
    pub const fn flags(&self) -> u8 {
        self.flags
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.handler_low == 0
            && self.selector == 0
            && self.reserved == 0
            && self.flags == 0
            && self.handler_high == 0
    }
}

/// The value handed to the table-load primitive: byte limit and base
/// address, in the shape the hardware consumes.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdtPointer {
    /// Table size in bytes, minus one.
    pub limit: u16,
    /// Table base address. Protected-mode kernels are 32-bit; on wider
    /// targets this truncates, which only matters to the hardware load
    /// path.
    pub base: u32,
}

/// Primitive that points the processor at a populated table.
///
/// Callers guarantee the table behind the pointer is fully populated
/// before invoking this.
pub trait TableLoader {
    fn load(&mut self, pointer: IdtPointer);
}

/// The real load primitive (`lidt`).
#[cfg(target_arch = "x86_64")]
pub struct Lidt;

#[cfg(target_arch = "x86_64")]
impl TableLoader for Lidt {
    fn load(&mut self, pointer: IdtPointer) {
        let operand = &pointer as *const IdtPointer;
        // SAFETY: the pointer value describes a fully populated,
        // process-lifetime table (caller contract), and interrupts are
        // masked around the load.
        unsafe {
            core::arch::asm!(
                "lidt [{}]",
                in(reg) operand,
                options(readonly, nostack, preserves_flags)
            );
        }
    }
}

/// Double that captures the pointer instead of loading it.
#[cfg_attr(target_arch = "x86_64", allow(dead_code))]
#[derive(Default)]
pub struct RecordingLoader {
    loaded: Option<IdtPointer>,
}

#[cfg_attr(target_arch = "x86_64", allow(dead_code))]
impl RecordingLoader {
    #[must_use]
    pub const fn new() -> Self {
        Self { loaded: None }
    }

    /// The pointer handed over by the last `load`, if any.
    #[must_use]
    pub const fn loaded(&self) -> Option<IdtPointer> {
        self.loaded
    }
}

impl TableLoader for RecordingLoader {
    fn load(&mut self, pointer: IdtPointer) {
        self.loaded = Some(pointer);
    }
}

/// A per-vector trampoline entry point.
pub type Trampoline = extern "C" fn();

/// Expands a vector list into `(vector, entry point)` pairs, one distinct
/// function per vector.
macro_rules! trampoline_table {
    ($($vector:literal),* $(,)?) => {
        [$(
            ($vector, {
                extern "C" fn entry() {
                    dispatch($vector);
                }
                entry as Trampoline
            }),
        )*]
    };
}

/// Statically declared entry points for every installed vector: CPU
/// exceptions 0..=19 and remapped hardware interrupts 32..=47.
///
/// The bodies are diagnostic stubs; real service routines (and their
/// end-of-interrupt signalling) live outside this core.
pub static TRAMPOLINES: [(u8, Trampoline); 36] = trampoline_table![
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 32, 33, 34, 35, 36, 37,
    38, 39, 40, 41, 42, 43, 44, 45, 46, 47,
];

const COUNT_ZERO: AtomicU32 = AtomicU32::new(0);
static DISPATCH_COUNTS: [AtomicU32; IDT_ENTRIES] = [COUNT_ZERO; IDT_ENTRIES];

fn dispatch(vector: u8) {
    DISPATCH_COUNTS[vector as usize].fetch_add(1, Ordering::Relaxed);
}

/// How many times `vector`'s trampoline has fired.
#[must_use]
pub fn interrupt_count(vector: u8) -> u32 {
    DISPATCH_COUNTS[vector as usize].load(Ordering::Relaxed)
}

/// The 256-slot dispatch table. One instance owns the hardware resource
/// for the process lifetime; operations take it by reference so tests can
/// build and inspect their own.
#[repr(C)]
pub struct InterruptTable {
    entries: [IdtEntry; IDT_ENTRIES],
}

impl InterruptTable {
    /// A table with every slot zeroed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [IdtEntry::MISSING; IDT_ENTRIES],
        }
    }

    /// Zero every slot.
    pub fn clear(&mut self) {
        self.entries = [IdtEntry::MISSING; IDT_ENTRIES];
    }

    /// Write one gate descriptor.
    ///
    /// The vector range is enforced by the type; everything else is the
    /// caller's contract. A bad selector or flag byte is undefined
    /// hardware behavior once the table is live.
    pub fn set_entry(&mut self, vector: u8, handler: u32, selector: u16, flags: u8) {
        self.entries[vector as usize] = IdtEntry::new(handler, selector, flags);
    }

    /// Read back one slot.
    #[must_use]
    pub fn entry(&self, vector: u8) -> IdtEntry {
        self.entries[vector as usize]
    }

    /// Zero-fill, then gate every trampoline vector with the fixed
    /// selector and flags.
    pub fn populate(&mut self) {
        self.clear();
        for &(vector, trampoline) in TRAMPOLINES.iter() {
            self.set_entry(
                vector,
                trampoline as usize as u32,
                KERNEL_CODE_SELECTOR,
                INTERRUPT_GATE_FLAGS,
            );
        }
    }

    /// The pointer value the load primitive consumes.
    #[must_use]
    pub fn pointer(&self) -> IdtPointer {
        IdtPointer {
            limit: (core::mem::size_of::<IdtEntry>() * IDT_ENTRIES - 1) as u16,
            base: self.entries.as_ptr() as usize as u32,
        }
    }

    /// Build and activate the table: populate every trampoline vector,
    /// issue the controller remap, then hand the pointer to the loader.
    ///
    /// Interrupts must be masked from before this call until after it
    /// returns; see the module docs.
    pub fn install<B: PortBus, L: TableLoader>(
        &mut self,
        pics: &ChainedPics,
        bus: &mut B,
        loader: &mut L,
    ) {
        self.populate();
        pics.remap(bus);
        loader.load(self.pointer());
    }
}

impl Default for InterruptTable {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-lifetime table instance.
pub static INTERRUPT_TABLE: Mutex<InterruptTable> = Mutex::new(InterruptTable::new());

/// Install the global table through the real hardware primitives.
///
/// Masks interrupts for the whole build-and-load window and re-enables
/// them once the table pointer is live and the controllers are remapped.
#[cfg(target_arch = "x86_64")]
pub fn init() {
    use crate::arch::x86_64::pic::PICS;
    use crate::arch::x86_64::port::IoPortBus;
    use crate::arch::{Cpu, X86Cpu};

    X86Cpu::disable_interrupts();
    {
        let pics = PICS.lock();
        let mut bus = IoPortBus::new();
        let mut loader = Lidt;
        INTERRUPT_TABLE.lock().install(&pics, &mut bus, &mut loader);
    }
    X86Cpu::enable_interrupts();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::x86_64::pic::{ChainedPics, PIC_1_OFFSET, PIC_2_OFFSET};
    use crate::arch::x86_64::port::RecordingBus;

    fn installed_vector(vector: u8) -> bool {
        vector <= EXCEPTION_LAST || (IRQ_FIRST..=IRQ_LAST).contains(&vector)
    }

    fn trampoline_address(vector: u8) -> u32 {
        let (_, entry) = TRAMPOLINES
            .iter()
            .find(|(v, _)| *v == vector)
            .copied()
            .expect("vector has a trampoline");
        entry as usize as u32
    }

    #[test]
    fn install_gates_exactly_the_declared_vectors() {
        let mut table = InterruptTable::new();
        let pics = ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET);
        let mut bus = RecordingBus::new();
        let mut loader = RecordingLoader::new();
        table.install(&pics, &mut bus, &mut loader);

        for vector in 0..=u8::MAX {
            let entry = table.entry(vector);
            if installed_vector(vector) {
                assert_eq!(entry.handler_address(), trampoline_address(vector));
                assert_eq!(entry.selector(), KERNEL_CODE_SELECTOR);
                assert_eq!(entry.flags(), INTERRUPT_GATE_FLAGS);
            } else {
                assert!(entry.is_missing(), "vector {vector} should stay zeroed");
            }
        }
    }

    #[test]
    fn install_remaps_controllers_and_loads_pointer() {
        let mut table = InterruptTable::new();
        let pics = ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET);
        let mut bus = RecordingBus::new();
        let mut loader = RecordingLoader::new();
        table.install(&pics, &mut bus, &mut loader);

        // Full remap sequence went out on the port bus.
        assert_eq!(bus.write_count(), 10);

        let pointer = loader.loaded().expect("pointer handed to the loader");
        let limit = pointer.limit;
        let base = pointer.base;
        assert_eq!(limit, (8 * IDT_ENTRIES - 1) as u16);
        let expected_base = table.pointer().base;
        assert_eq!(base, expected_base);
    }

    #[test]
    fn set_entry_splits_and_recombines_the_handler_address() {
        let mut table = InterruptTable::new();
        table.set_entry(0x80, 0xDEAD_BEEF, KERNEL_CODE_SELECTOR, INTERRUPT_GATE_FLAGS);

        let entry = table.entry(0x80);
        assert_eq!(entry.handler_address(), 0xDEAD_BEEF);
        assert_eq!(entry.handler_address() & 0xFFFF, 0xBEEF);
        assert_eq!(entry.handler_address() >> 16, 0xDEAD);
    }

    #[test]
    fn clear_returns_every_slot_to_missing() {
        let mut table = InterruptTable::new();
        table.populate();
        table.clear();
        for vector in 0..=u8::MAX {
            assert!(table.entry(vector).is_missing());
        }
    }

    #[test]
    fn entry_size_and_pointer_limit_match_the_hardware_layout() {
        assert_eq!(core::mem::size_of::<IdtEntry>(), 8);
        let table = InterruptTable::new();
        let limit = table.pointer().limit;
        assert_eq!(limit, 2047);
    }

    #[test]
    fn trampolines_count_their_dispatches() {
        let (vector, entry) = TRAMPOLINES
            .iter()
            .find(|(v, _)| *v == 33)
            .copied()
            .unwrap();
        let before = interrupt_count(vector);
        entry();
        entry();
        assert!(interrupt_count(vector) >= before + 2);
    }
}
