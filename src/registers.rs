/// # registers
///
/// The CHIP-8 programmer's model, as opposed to the RCA 1802 underneath it:
///  * V0-VF: sixteen 8bit general purpose registers, addressed by a nibble
///  * I: 12bit index register (a plain field here, only moved via its setter)
///  * a return-address stack, 15 frames deep
///
/// On the COSMAC VIP the stack lived in RAM just under the work area; here
/// it's its own thing so a runaway CALL can't scribble on the program.
use crate::error::{Result, VmError};

pub const CHIP8_REGISTER_COUNT: usize = 16;
pub const CHIP8_STACK_DEPTH: usize = 15;

/// I only ever holds a 12bit address
const INDEX_MASK: u16 = 0x0fff;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterFile {
    v: [u8; CHIP8_REGISTER_COUNT],
    i: u16,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: u8) -> Result<u8> {
        self.v
            .get(index as usize)
            .copied()
            .ok_or(VmError::InvalidRegister(index))
    }

    pub fn set(&mut self, index: u8, value: u8) -> Result<()> {
        let reg = self
            .v
            .get_mut(index as usize)
            .ok_or(VmError::InvalidRegister(index))?;
        *reg = value;
        Ok(())
    }

    /// add with 8bit wraparound; the carry is thrown away
    pub fn increment(&mut self, index: u8, delta: u8) -> Result<()> {
        let value = self.get(index)?;
        self.set(index, value.wrapping_add(delta))
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn set_index(&mut self, addr: u16) {
        self.i = addr & INDEX_MASK;
    }

    /// all of V0-VF, mostly for debugging and tests
    pub fn as_slice(&self) -> &[u8] {
        &self.v
    }
}

/// Bounded stack of return addresses. Overflow is fatal; underflow is
/// left to the caller (RET has its own fallback).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStack {
    frames: Vec<u16>,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack {
            frames: Vec::with_capacity(CHIP8_STACK_DEPTH),
        }
    }

    pub fn push(&mut self, addr: u16) -> Result<()> {
        if self.frames.len() >= CHIP8_STACK_DEPTH {
            return Err(VmError::StackOverflow(self.frames.len()));
        }
        self.frames.push(addr);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<u16> {
        self.frames.pop()
    }

    /// the frame `pop` would return, left in place
    pub fn peek(&self) -> Option<u16> {
        self.frames.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_zeroed() {
        let r = RegisterFile::new();
        assert_eq!(r.as_slice(), &[0; 16]);
        assert_eq!(r.index(), 0);
    }

    #[test]
    fn test_all_sixteen_addressable() -> Result<()> {
        let mut r = RegisterFile::new();
        for i in 0..16u8 {
            r.set(i, i * 3)?;
        }
        assert_eq!(r.get(0xf)?, 45);
        assert_eq!(r.get(0x0)?, 0);
        Ok(())
    }

    #[test]
    fn test_bad_register_index() {
        let mut r = RegisterFile::new();
        assert!(matches!(r.get(16), Err(VmError::InvalidRegister(16))));
        assert!(matches!(r.set(0x20, 1), Err(VmError::InvalidRegister(0x20))));
    }

    #[test]
    fn test_increment_wraps() -> Result<()> {
        let mut r = RegisterFile::new();
        for i in 0..16u8 {
            for (v1, v2) in [(0u8, 0u8), (200, 100), (255, 1), (255, 255), (17, 3)] {
                r.set(i, v1)?;
                r.increment(i, v2)?;
                assert_eq!(r.get(i)?, ((v1 as u16 + v2 as u16) % 256) as u8);
            }
        }
        Ok(())
    }

    #[test]
    fn test_index_is_twelve_bits() {
        let mut r = RegisterFile::new();
        r.set_index(0x0234);
        assert_eq!(r.index(), 0x234);
        r.set_index(0xf234);
        assert_eq!(r.index(), 0x234);
    }

    #[test]
    fn test_stack_lifo() -> Result<()> {
        let mut s = CallStack::new();
        s.push(0x202)?;
        s.push(0x304)?;
        assert_eq!(s.depth(), 2);
        assert_eq!(s.peek(), Some(0x304));
        assert_eq!(s.depth(), 2);
        assert_eq!(s.pop(), Some(0x304));
        assert_eq!(s.pop(), Some(0x202));
        assert_eq!(s.pop(), None);
        assert!(s.is_empty());
        Ok(())
    }

    #[test]
    fn test_stack_overflow() -> Result<()> {
        let mut s = CallStack::new();
        for n in 0..15 {
            s.push(0x200 + n * 2)?;
        }
        assert!(matches!(s.push(0x300), Err(VmError::StackOverflow(15))));
        assert_eq!(s.depth(), 15);
        assert_eq!(s.pop(), Some(0x21c));
        Ok(())
    }
}
