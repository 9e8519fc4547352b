///
/// ## Design
///
/// * the core is fetch/decode/execute and nothing else: no pixels, no
///   timers, no keypad, no sound
/// * one instruction per step; a step either completes or fails, there are
///   no half-executed instructions to observe
/// * abstract display so can plug alternatives; the core only ever asks it
///   to clear
/// * unsigned fixed-width everywhere: u8 registers, u16 addresses, with the
///   nibbles masked out explicitly
/// * crashes (bad program counter, stack overflow) come back as errors;
///   unknown opcodes and oversized programs are logged and lived with
///
/// Model
///
/// Machine
///  |-- memory map (4K, program at 0x200, cursor = program counter)
///  |-- interpreter(display)
///  |    |-- registers V0-VF, I
///  |    |-- return stack (15 deep)
///  |    `-- instruction decoding
///  `-- run loop
///       |-- while !cancel.is_cancelled() && steps < max_steps {
///       |     interpreter.step(&mut memory)?;
///       |     sleep(step_interval);
///       |   }
///       `-- close() on drop
pub mod config;
pub mod display;
pub mod error;
pub mod instruction;
pub mod interpreter;
pub mod machine;
pub mod memory;
pub mod registers;

pub use config::MachineConfig;
pub use error::{Result, VmError};
pub use instruction::{Instruction, Opcode};
pub use machine::{CancelToken, Lifecycle, Machine, RunOutcome};
