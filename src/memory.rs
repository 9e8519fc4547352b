use crate::error::{Result, VmError};
use log::{trace, warn};
use std::io;
use std::ops::Range;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the memory map. Slice access is bounds-checked; nothing in
/// here panics on a bad address.
pub trait MemoryMap {
    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: u16) -> Result<()> {
        let bytes = self.get_rw_slice(addr, data.len())?;
        bytes.copy_from_slice(data);
        Ok(())
    }

    /// get a big-endian two-byte word, i.e. an opcode as it sits in memory
    fn get_word(&self, addr: u16) -> Result<u16> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(((word[0] as u16) << 8) | (word[1] as u16))
    }

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8]>;

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8]>;
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: u16 = 4096;

/// where the program is loaded, and where the cursor starts
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// the most program that will fit above the interpreter area
pub const CHIP8_PROGRAM_CAPACITY: usize = (CHIP8_RAM_SIZE_BYTES - CHIP8_PROGRAM_ADDR) as usize;

/// What a load actually did with the bytes it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub discarded: usize,
}

impl LoadSummary {
    pub fn truncated(&self) -> bool {
        self.discarded > 0
    }
}

/// The CHIP-8 4K memory image plus the program counter that walks it.
///
///   0x0000-0x01ff  interpreter (left zeroed; nothing lives here)
///   0x0200-0x0fff  program
///
/// The cursor lives in [0, 4096]. It may sit *at* 4096 after the last
/// byte has been read, but any read from there fails.
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
    cursor: u16,
}

impl MemoryMap for Chip8MemoryMap {
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8]> {
        let r = self.range(addr, len)?;
        Ok(&mut self.bytes[r])
    }

    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8]> {
        let r = self.range(addr, len)?;
        Ok(&self.bytes[r])
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip8MemoryMap {
    /// zeroed memory, cursor at the program start
    pub fn new() -> Self {
        Chip8MemoryMap {
            bytes: vec![0u8; CHIP8_RAM_SIZE_BYTES as usize].into_boxed_slice(),
            cursor: CHIP8_PROGRAM_ADDR,
        }
    }

    fn range(&self, addr: u16, len: usize) -> Result<Range<usize>> {
        let start = addr as usize;
        let end = start.saturating_add(len);
        if end > self.bytes.len() {
            return Err(VmError::InvalidAddress(end));
        }
        Ok(start..end)
    }

    /// load a CHIP-8 program at 0x200, dropping whatever doesn't fit
    pub fn load(&mut self, program: &[u8]) -> LoadSummary {
        let start = CHIP8_PROGRAM_ADDR as usize;
        let loaded = program.len().min(CHIP8_PROGRAM_CAPACITY);
        let discarded = program.len() - loaded;

        self.bytes[start..].fill(0);
        self.bytes[start..start + loaded].copy_from_slice(&program[..loaded]);
        self.cursor = CHIP8_PROGRAM_ADDR;

        if discarded > 0 {
            warn!(
                "program is {} bytes but only {} fit above 0x{:03x}; truncated {} bytes",
                program.len(),
                CHIP8_PROGRAM_CAPACITY,
                CHIP8_PROGRAM_ADDR,
                discarded
            );
        }
        trace!("loaded {} program bytes", loaded);
        LoadSummary { loaded, discarded }
    }

    /// load a program of unknown length from a reader
    pub fn load_from(&mut self, reader: &mut impl io::Read) -> Result<LoadSummary> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(self.load(&buf))
    }

    /// the byte under the cursor; moves the cursor on by one
    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = *self
            .bytes
            .get(self.cursor as usize)
            .ok_or(VmError::OutOfBounds(self.cursor))?;
        self.cursor += 1;
        Ok(byte)
    }

    /// move the cursor to an absolute address
    pub fn seek(&mut self, addr: u16) -> Result<()> {
        if addr as usize >= self.bytes.len() {
            return Err(VmError::InvalidAddress(addr as usize));
        }
        self.cursor = addr;
        Ok(())
    }

    /// move the cursor forward; the destination must be a valid address
    pub fn advance(&mut self, count: u16) -> Result<()> {
        let target = self.cursor as usize + count as usize;
        if target >= self.bytes.len() {
            return Err(VmError::InvalidAddress(target));
        }
        self.cursor = target as u16;
        Ok(())
    }

    pub fn cursor(&self) -> u16 {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }
}
