// src/tty/console.rs

//! The stateful character-grid renderer.
//!
//! Writes go straight into the cell backend at the cursor's linear
//! position; the cursor advances through the defined transitions only.
//! Two long-standing quirks of this console are part of its contract and
//! are kept as-is: `clear` leaves the cursor where it was, and running off
//! the right edge wraps without a scroll check; only the newline path
//! tests the bottom of the grid. After a wrap on the last row the cursor
//! rests one row past the grid and further writes fall outside the cell
//! range until the caller repositions it; the backend rejects those writes
//! and the console drops the error, which is as close as safe code gets to
//! the overrun this used to be.

use super::backend::{TextBufferAccess, TTY_HEIGHT, TTY_WIDTH};
use super::color::ColorCode;
use crate::arch::x86_64::port::PortBus;
use crate::geometry::{Cursor, Size};
use core::fmt;

/// CRT controller index register.
const CRTC_INDEX: u16 = 0x3D4;
/// CRT controller data register.
const CRTC_DATA: u16 = 0x3D5;
/// Cursor location registers, low and high byte.
const CURSOR_LOW: u8 = 0x0F;
const CURSOR_HIGH: u8 = 0x0E;

/// Text console over a cell backend and a port bus.
pub struct Console<B, P> {
    size: Size,
    cursor: Cursor,
    color: ColorCode,
    buffer: B,
    bus: P,
}

impl<B, P> Console<B, P> {
    #[must_use]
    pub const fn new(buffer: B, bus: P) -> Self {
        Self {
            size: Size::new(TTY_WIDTH, TTY_HEIGHT),
            cursor: Cursor::origin(),
            color: ColorCode::normal(),
            buffer,
            bus,
        }
    }

    /// Current cursor position.
    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Active color attribute.
    #[must_use]
    pub const fn color(&self) -> ColorCode {
        self.color
    }

    /// Move the cursor. No validation against the grid.
    pub fn set_cursor(&mut self, x: usize, y: usize) {
        self.cursor = Cursor { x, y };
    }

    /// Change the active color. No validation.
    pub fn set_color(&mut self, color: ColorCode) {
        self.color = color;
    }

    const fn encode(byte: u8, color: ColorCode) -> u16 {
        (color.as_u8() as u16) << 8 | byte as u16
    }

    const fn linear_index(&self) -> usize {
        self.cursor.y * self.size.width + self.cursor.x
    }
}

impl<B: TextBufferAccess, P: PortBus> Console<B, P> {
    /// Write one character at the cursor and advance it.
    ///
    /// Newline moves to column 0 of the next row, blanks the landing cell
    /// with the active color, and scrolls when the new row falls below the
    /// grid. Any other byte is stored verbatim with the active attribute;
    /// crossing the right edge wraps to the next row without a scroll
    /// check. Either way the hardware cursor register pair is updated
    /// afterwards.
    pub fn write_character(&mut self, byte: u8) {
        match byte {
            b'\n' => {
                self.cursor.x = 0;
                self.cursor.y += 1;
                let blank = Self::encode(b' ', self.color);
                let _ = self.buffer.write_cell(self.linear_index(), blank);
                if self.cursor.y >= self.size.height {
                    self.cursor.y -= 1;
                    self.scroll_up();
                }
            }
            byte => {
                let encoded = Self::encode(byte, self.color);
                let _ = self.buffer.write_cell(self.linear_index(), encoded);
                self.cursor.x += 1;
                if self.cursor.x >= self.size.width {
                    self.cursor.x = 0;
                    self.cursor.y += 1;
                }
            }
        }
        self.sync_hardware_cursor();
    }

    /// Write every byte of `s` in sequence.
    pub fn write_string(&mut self, s: &str) {
        for byte in s.bytes() {
            self.write_character(byte);
        }
    }

    /// Blank every cell with the active color. The cursor stays put.
    pub fn clear(&mut self) {
        let blank = Self::encode(b' ', self.color);
        for index in 0..self.size.cells() {
            let _ = self.buffer.write_cell(index, blank);
        }
    }

    /// Move rows 1.. up by one and blank the last row with the active
    /// color. The row count never changes.
    pub fn scroll_up(&mut self) {
        let width = self.size.width;
        let _ = self
            .buffer
            .copy_cells(width, 0, width * (self.size.height - 1));
        let _ = self
            .buffer
            .fill_row(self.size.height - 1, Self::encode(b' ', self.color));
    }

    /// Push the cursor's linear position into the CRT controller so the
    /// blinking hardware cursor tracks every mutation. Two index/data
    /// write pairs; an interrupt handler touching these ports must not run
    /// between them.
    fn sync_hardware_cursor(&mut self) {
        let position = self.cursor.y * self.size.width + self.cursor.x;
        self.bus.write_port(CRTC_INDEX, CURSOR_LOW);
        self.bus.write_port(CRTC_DATA, (position & 0xFF) as u8);
        self.bus.write_port(CRTC_INDEX, CURSOR_HIGH);
        self.bus.write_port(CRTC_DATA, ((position >> 8) & 0xFF) as u8);
    }
}

impl<B: TextBufferAccess, P: PortBus> fmt::Write for Console<B, P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_string(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::x86_64::port::RecordingBus;
    use crate::tty::backend::StubGrid;
    use crate::tty::color::VgaColor;

    fn console() -> Console<StubGrid, RecordingBus> {
        Console::new(StubGrid::new(), RecordingBus::new())
    }

    fn encode(byte: u8, color: ColorCode) -> u16 {
        (color.as_u8() as u16) << 8 | byte as u16
    }

    #[test]
    fn newline_places_next_character_at_start_of_next_row() {
        let mut console = console();
        let color = ColorCode::new(VgaColor::Yellow, VgaColor::Blue);
        console.set_color(color);
        console.write_character(b'\n');
        console.write_character(b'A');

        assert_eq!(console.buffer.cell(TTY_WIDTH), encode(b'A', color));
        assert_eq!(console.cursor(), Cursor { x: 1, y: 1 });
    }

    #[test]
    fn writing_a_full_row_wraps_to_next_row_without_scrolling() {
        let mut console = console();
        // Sentinel in the top-left cell; a scroll would move it away.
        console.write_character(b'S');
        console.set_cursor(0, 5);
        for _ in 0..TTY_WIDTH {
            console.write_character(b'x');
        }
        assert_eq!(console.cursor(), Cursor { x: 0, y: 6 });
        assert_eq!(console.buffer.cell(0), encode(b'S', ColorCode::normal()));
    }

    #[test]
    fn right_edge_wrap_on_last_row_leaves_cursor_past_the_grid() {
        let mut console = console();
        console.set_cursor(TTY_WIDTH - 1, TTY_HEIGHT - 1);
        console.write_character(b'A');
        assert_eq!(console.cursor(), Cursor { x: 0, y: TTY_HEIGHT });

        // Follow-up writes fall outside the cell range and are dropped.
        console.write_character(b'B');
        for index in 0..TTY_WIDTH * TTY_HEIGHT {
            let cell = console.buffer.cell(index);
            assert_ne!(cell, encode(b'B', ColorCode::normal()), "index {index}");
        }
    }

    #[test]
    fn newline_on_bottom_row_scrolls() {
        let mut console = console();
        console.write_character(b'T');
        console.set_cursor(0, TTY_HEIGHT - 1);
        console.write_character(b'\n');

        // Row 0 now holds what row 1 held (blank), and the cursor is back
        // on the bottom row.
        assert_eq!(console.cursor(), Cursor { x: 0, y: TTY_HEIGHT - 1 });
        assert_ne!(console.buffer.cell(0), encode(b'T', ColorCode::normal()));
    }

    #[test]
    fn scroll_up_shifts_rows_and_blanks_the_last() {
        let mut console = console();
        let color = ColorCode::new(VgaColor::LightGreen, VgaColor::Black);
        console.set_color(color);
        for col in 0..TTY_WIDTH {
            console.set_cursor(col, 0);
            console.write_character(b'0');
            console.set_cursor(col, 1);
            console.write_character(b'1');
        }

        console.scroll_up();

        for col in 0..TTY_WIDTH {
            assert_eq!(console.buffer.cell(col), encode(b'1', color));
            assert_eq!(
                console.buffer.cell((TTY_HEIGHT - 1) * TTY_WIDTH + col),
                encode(b' ', color)
            );
        }
    }

    #[test]
    fn clear_blanks_every_cell_but_keeps_the_cursor() {
        let mut console = console();
        console.write_string("hello");
        let before = console.cursor();
        console.clear();

        assert_eq!(console.cursor(), before);
        for index in 0..TTY_WIDTH * TTY_HEIGHT {
            assert_eq!(console.buffer.cell(index), encode(b' ', ColorCode::normal()));
        }
    }

    #[test]
    fn every_write_updates_the_hardware_cursor_registers() {
        let mut console = console();
        console.write_character(b'A');
        assert_eq!(
            console.bus.writes(),
            &[(0x3D4, 0x0F), (0x3D5, 1), (0x3D4, 0x0E), (0x3D5, 0)]
        );
    }

    #[test]
    fn hardware_cursor_position_splits_into_bytes() {
        let mut console = console();
        console.set_cursor(5, 10);
        console.write_character(b'A');
        // Position 10 * 80 + 6 = 806 = 0x326 after the advance.
        assert_eq!(
            console.bus.writes(),
            &[(0x3D4, 0x0F), (0x3D5, 0x26), (0x3D4, 0x0E), (0x3D5, 0x03)]
        );
    }

    #[test]
    fn write_string_is_sequential_character_writes() {
        let mut console = console();
        console.write_string("ab\ncd");
        assert_eq!(console.buffer.cell(0), encode(b'a', ColorCode::normal()));
        assert_eq!(console.buffer.cell(1), encode(b'b', ColorCode::normal()));
        assert_eq!(console.buffer.cell(TTY_WIDTH), encode(b'c', ColorCode::normal()));
        assert_eq!(console.buffer.cell(TTY_WIDTH + 1), encode(b'd', ColorCode::normal()));
        assert_eq!(console.cursor(), Cursor { x: 2, y: 1 });
    }
}
