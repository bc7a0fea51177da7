//! A CHIP-8 interpreter core, plus the bits needed to host it in a terminal.
//!
//! ## Design
//!
//! * the interpreter owns all machine state and knows nothing of wallclock
//!   time; the host calls `.step()` as often as it likes and
//!   `.tick_timers()` at 60Hz
//! * quirks that differ between the COSMAC VIP and later interpreters are
//!   configuration, handed over when the interpreter is built
//! * display, input and audio are traits, so the interpreter doesn't need to
//!   know how the screen, keyboard or speaker work
//! * the environment wires an interpreter to a display, input and sound and
//!   runs the main loop
//!
//! Model
//!
//! ```text
//! Environment
//!  |-- display, input, sound, config
//!  |-- interpreter(font, program, quirks)
//!  |    |-- memory map
//!  |    |-- instruction set
//!  |    `-- framebuffer, keypad
//!  `-- main loop
//! ```
pub mod display;
pub mod environment;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod quirks;
pub mod sound;

pub use error::{Chip8Error, Result};
pub use interpreter::{Chip8Interpreter, HaltReason, State, StepOutcome};
pub use quirks::Quirks;
