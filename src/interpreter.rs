/// # interpreter
///
/// fetch/decode/execute for the CHIP-8, one instruction per `step()`.
///
/// The interpreter owns V0-VF, I and the return stack but not memory:
/// each step is handed the memory image to run against, which keeps the
/// borrow of the program counter to exactly one place at a time.
///
/// Every instruction is two bytes, read in program order. A "skip"
/// moves the cursor on by one more instruction, i.e. another two bytes.
use crate::display::Display;
use crate::error::{Result, VmError};
use crate::instruction::{Instruction, Opcode};
use crate::memory::{Chip8MemoryMap, CHIP8_PROGRAM_ADDR};
use crate::registers::{CallStack, RegisterFile};
use log::{info, trace, warn};

/// how far a skip moves the cursor
const INSTRUCTION_WIDTH: u16 = 2;

pub struct Chip8Interpreter<'a> {
    registers: RegisterFile,
    stack: CallStack,
    display: &'a mut dyn Display,
    unknown_opcodes: u64,
}

impl<'a> Chip8Interpreter<'a> {
    pub fn new(display: &'a mut dyn Display) -> Chip8Interpreter<'a> {
        Chip8Interpreter {
            registers: RegisterFile::new(),
            stack: CallStack::new(),
            display,
            unknown_opcodes: 0,
        }
    }

    /// run one instruction; any error out of here means the program has crashed.
    /// a failed step leaves the cursor and the stack where they were
    pub fn step(&mut self, memory: &mut Chip8MemoryMap) -> Result<Instruction> {
        let pc = memory.cursor();
        match self.fetch_and_execute(pc, memory) {
            Ok(instruction) => Ok(instruction),
            Err(e) => {
                // the cursor only moves once the first byte has been read, so
                // pc is a valid address whenever it needs putting back
                if memory.cursor() != pc {
                    memory.seek(pc)?;
                }
                Err(e)
            }
        }
    }

    fn fetch_and_execute(&mut self, pc: u16, memory: &mut Chip8MemoryMap) -> Result<Instruction> {
        let low = memory.read_byte()?;
        let high = memory.read_byte()?;
        let instruction = Instruction::decode(Opcode::new(low, high));
        trace!("0x{:03x}: {}", pc, instruction);
        self.execute(instruction, memory)?;
        Ok(instruction)
    }

    fn execute(&mut self, instruction: Instruction, memory: &mut Chip8MemoryMap) -> Result<()> {
        use Instruction::*;
        match instruction {
            ClearScreen => self.display.clear().map_err(VmError::Display)?,
            Return => {
                let addr = self.stack.peek().unwrap_or(CHIP8_PROGRAM_ADDR);
                memory.seek(addr)?;
                self.stack.pop();
            }
            SystemCall(addr) => info!("SYS 0x{:03x}", addr),
            Jump(addr) => memory.seek(addr)?,
            Call(addr) => {
                let ret = memory.cursor();
                memory.seek(addr)?;
                self.stack.push(ret)?;
            }
            SkipIfEqual { x, value } => {
                if self.registers.get(x)? == value {
                    memory.advance(INSTRUCTION_WIDTH)?;
                }
            }
            SkipIfNotEqual { x, value } => {
                if self.registers.get(x)? != value {
                    memory.advance(INSTRUCTION_WIDTH)?;
                }
            }
            SkipIfRegistersEqual { x, y } => {
                if self.registers.get(x)? == self.registers.get(y)? {
                    memory.advance(INSTRUCTION_WIDTH)?;
                }
            }
            SkipIfRegistersNotEqual { x, y } => {
                if self.registers.get(x)? != self.registers.get(y)? {
                    memory.advance(INSTRUCTION_WIDTH)?;
                }
            }
            SetRegister { x, value } => self.registers.set(x, value)?,
            AddToRegister { x, value } => self.registers.increment(x, value)?,
            SetIndex(addr) => self.registers.set_index(addr),
            Unknown(op) => {
                // not fatal: carry on with the next instruction
                self.unknown_opcodes += 1;
                warn!(
                    "unrecognised opcode {} at 0x{:03x}",
                    op,
                    memory.cursor() - INSTRUCTION_WIDTH
                );
            }
        }
        Ok(())
    }

    /// back to power-on state, ready for a freshly loaded program
    pub fn reset(&mut self) {
        self.registers = RegisterFile::new();
        self.stack = CallStack::new();
        self.unknown_opcodes = 0;
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    /// how many opcodes have been skipped over because nothing handles them
    pub fn unknown_opcodes(&self) -> u64 {
        self.unknown_opcodes
    }
}
