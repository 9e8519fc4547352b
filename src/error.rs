use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VmError>;

/// Everything that can stop the machine, or be refused by it.
///
/// Unknown opcodes and oversized programs are not in here: both are
/// absorbed where they happen and only logged.
#[derive(Debug, Error)]
pub enum VmError {
    /// the cursor was at or past the end of memory when a byte was read
    #[error("read at 0x{0:04x} is past the end of memory")]
    OutOfBounds(u16),
    /// a seek, skip or slice landed outside memory
    #[error("address 0x{0:04x} is outside memory")]
    InvalidAddress(usize),
    #[error("call stack overflow ({0} frames)")]
    StackOverflow(usize),
    #[error("register index {0} is out of range")]
    InvalidRegister(u8),
    #[error("machine has no program loaded")]
    Uninitialized,
    #[error("machine is closed")]
    Closed,
    /// the CLS hook failed
    #[error("display error: {0}")]
    Display(#[source] io::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl VmError {
    /// fatal errors mean the program has crashed; the rest are misuse of the API
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VmError::OutOfBounds(_)
                | VmError::InvalidAddress(_)
                | VmError::StackOverflow(_)
                | VmError::Display(_)
        )
    }
}
