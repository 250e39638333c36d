// src/tty/mod.rs

//! Text-mode console driver.
//!
//! An 80x25 character grid over memory-mapped video memory, with cursor
//! and color state, scroll-on-overflow and a hardware cursor kept in sync
//! through the CRT controller ports. The global instance backs the
//! `print!`/`println!` macros.
//!
//! # Locking
//!
//! All access to the global console goes through [`with_console`], which
//! masks interrupts for the critical section: both the two-step CRTC
//! cursor protocol and the lock itself must not be interleaved with an
//! interrupt handler printing.

pub mod backend;
pub mod color;
pub mod console;

pub use backend::{TextBufferAccess, TtyError, CELL_COUNT, TTY_HEIGHT, TTY_WIDTH};
pub use color::{ColorCode, VgaColor};
pub use console::Console;

use crate::arch::x86_64::port::DefaultPortBus;
use backend::DefaultTextBuffer;
use core::fmt;
use spin::Mutex;

/// The process-lifetime console instance.
static CONSOLE: Mutex<Console<DefaultTextBuffer, DefaultPortBus>> =
    Mutex::new(Console::new(DefaultTextBuffer::new(), DefaultPortBus::new()));

/// Run `f` against the global console with interrupts masked.
fn with_console<F, R>(f: F) -> R
where
    F: FnOnce(&mut Console<DefaultTextBuffer, DefaultPortBus>) -> R,
{
    #[cfg(target_arch = "x86_64")]
    {
        x86_64::instructions::interrupts::without_interrupts(|| f(&mut CONSOLE.lock()))
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        f(&mut CONSOLE.lock())
    }
}

/// Global print! macro.
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ({
        $crate::tty::_print(format_args!($($arg)*))
    });
}

/// Global println! macro.
#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($fmt:expr) => ($crate::print!(concat!($fmt, "\n")));
    ($fmt:expr, $($arg:tt)*) => ($crate::print!(concat!($fmt, "\n"), $($arg)*));
}

/// Print function called by the macros.
#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    with_console(|console| {
        use core::fmt::Write;
        let _ = console.write_fmt(args);
    });
}

/// Blank the screen with the active color. The cursor is not moved;
/// callers reposition it explicitly.
pub fn clear() {
    with_console(Console::clear);
}

/// Set the active color attribute.
pub fn set_color(color: ColorCode) {
    with_console(|console| console.set_color(color));
}

/// Move the cursor.
pub fn set_cursor(x: usize, y: usize) {
    with_console(|console| console.set_cursor(x, y));
}

/// Write a string at the current cursor position.
pub fn write_string(s: &str) {
    with_console(|console| console.write_string(s));
}
