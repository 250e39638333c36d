// src/arch/x86_64/pic.rs

//! 8259 Programmable Interrupt Controller pair.
//!
//! The remap sequence moves the hardware IRQ lines away from the CPU
//! exception range: master lines land on vectors 32..=39, slave lines on
//! 40..=47. The sequence is a fixed run of ten byte writes and must not be
//! interleaved with anything else on the command/data ports, so the caller
//! keeps interrupts masked for its duration.

use crate::arch::x86_64::port::PortBus;
use spin::Mutex;

/// Master PIC command port.
const PIC1_COMMAND: u16 = 0x20;
/// Master PIC data port.
const PIC1_DATA: u16 = 0x21;
/// Slave PIC command port.
const PIC2_COMMAND: u16 = 0xA0;
/// Slave PIC data port.
const PIC2_DATA: u16 = 0xA1;

/// Start-initialization command (ICW1).
const ICW1_INIT: u8 = 0x10;
/// Master ICW3: slave attached on IRQ line 2.
const ICW3_SLAVE_ON_IRQ2: u8 = 0x04;
/// Slave ICW3: cascade identity 2.
const ICW3_CASCADE_ID: u8 = 0x02;
/// ICW4: 8086/88 mode.
const ICW4_8086: u8 = 0x01;
/// Interrupt mask with every line enabled.
const MASK_NONE: u8 = 0x00;
/// End-of-interrupt command.
const PIC_EOI: u8 = 0x20;

/// Vector base for the master controller after remapping.
pub const PIC_1_OFFSET: u8 = 0x20;
/// Vector base for the slave controller after remapping.
pub const PIC_2_OFFSET: u8 = 0x28;

struct Pic {
    offset: u8,
    command: u16,
    data: u16,
}

impl Pic {
    const fn handles_interrupt(&self, vector: u8) -> bool {
        self.offset <= vector && vector < self.offset + 8
    }
}

/// The cascaded master/slave controller pair.
pub struct ChainedPics {
    pics: [Pic; 2],
}

impl ChainedPics {
    /// Controller pair with the given vector bases.
    #[must_use]
    pub const fn new(offset1: u8, offset2: u8) -> Self {
        Self {
            pics: [
                Pic {
                    offset: offset1,
                    command: PIC1_COMMAND,
                    data: PIC1_DATA,
                },
                Pic {
                    offset: offset2,
                    command: PIC2_COMMAND,
                    data: PIC2_DATA,
                },
            ],
        }
    }

    /// Issue the full remap sequence: initialize, vector bases, cascade
    /// wiring, 8086 mode, then clear both masks. Exactly ten byte writes.
    ///
    /// Interrupts must stay masked while this runs; an interrupt delivered
    /// between two of these writes leaves the controller half-programmed.
    pub fn remap<B: PortBus>(&self, bus: &mut B) {
        let [master, slave] = &self.pics;

        bus.write_port(master.command, ICW1_INIT);
        bus.write_port(slave.command, ICW1_INIT);

        bus.write_port(master.data, master.offset);
        bus.write_port(slave.data, slave.offset);

        bus.write_port(master.data, ICW3_SLAVE_ON_IRQ2);
        bus.write_port(slave.data, ICW3_CASCADE_ID);

        bus.write_port(master.data, ICW4_8086);
        bus.write_port(slave.data, ICW4_8086);

        bus.write_port(master.data, MASK_NONE);
        bus.write_port(slave.data, MASK_NONE);
    }

    /// Whether `vector` belongs to either controller's remapped range.
    #[must_use]
    pub fn handles_interrupt(&self, vector: u8) -> bool {
        self.pics.iter().any(|p| p.handles_interrupt(vector))
    }

    /// Signal end-of-interrupt for `vector`.
    ///
    /// A slave-range vector is acknowledged on both controllers, slave
    /// first; a master-range vector on the master only. Vectors outside
    /// both ranges are ignored.
    pub fn notify_end_of_interrupt<B: PortBus>(&self, bus: &mut B, vector: u8) {
        if !self.handles_interrupt(vector) {
            return;
        }
        if self.pics[1].handles_interrupt(vector) {
            bus.write_port(self.pics[1].command, PIC_EOI);
        }
        bus.write_port(self.pics[0].command, PIC_EOI);
    }
}

/// Global controller pair, remapped to vectors 32 and 40.
pub static PICS: Mutex<ChainedPics> = Mutex::new(ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET));
