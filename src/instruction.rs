use std::fmt;

/// The fields packed into an opcode pair. Every field is masked out
/// explicitly so nothing is ever sign-extended into the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub low: u8,
    pub high: u8,
}

impl Opcode {
    pub fn new(low: u8, high: u8) -> Self {
        Opcode { low, high }
    }

    /// the whole thing as it'd appear in a listing, e.g. 0x00ee
    pub fn word(&self) -> u16 {
        ((self.low as u16) << 8) | self.high as u16
    }

    /// opcode class, top 4 bits of the first byte
    pub fn nibble(&self) -> u8 {
        self.low >> 4
    }

    pub fn x(&self) -> u8 {
        self.low & 0x0f
    }

    pub fn y(&self) -> u8 {
        self.high >> 4
    }

    /// 12bit immediate address, x as the top 4 bits
    pub fn address(&self) -> u16 {
        ((self.x() as u16) << 8) | self.high as u16
    }

    pub fn immediate(&self) -> u8 {
        self.high
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.word())
    }
}

/// Everything the core knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 0NNN
    SystemCall(u16),
    /// 1NNN
    Jump(u16),
    /// 2NNN
    Call(u16),
    /// 3XNN
    SkipIfEqual { x: u8, value: u8 },
    /// 4XNN
    SkipIfNotEqual { x: u8, value: u8 },
    /// 5XY0
    SkipIfRegistersEqual { x: u8, y: u8 },
    /// 6XNN
    SetRegister { x: u8, value: u8 },
    /// 7XNN
    AddToRegister { x: u8, value: u8 },
    /// 9XY0
    SkipIfRegistersNotEqual { x: u8, y: u8 },
    /// ANNN
    SetIndex(u16),
    /// anything else
    Unknown(Opcode),
}

impl Instruction {
    pub fn decode(op: Opcode) -> Self {
        use Instruction::*;

        // the two opcodes with no operands
        if op.low == 0x00 {
            match op.high {
                0xe0 => return ClearScreen,
                0xee => return Return,
                _ => {}
            }
        }

        let x = op.x();
        match op.nibble() {
            0x0 => SystemCall(op.address()),
            0x1 => Jump(op.address()),
            0x2 => Call(op.address()),
            0x3 => SkipIfEqual { x, value: op.immediate() },
            0x4 => SkipIfNotEqual { x, value: op.immediate() },
            0x5 => SkipIfRegistersEqual { x, y: op.y() },
            0x6 => SetRegister { x, value: op.immediate() },
            0x7 => AddToRegister { x, value: op.immediate() },
            0x9 => SkipIfRegistersNotEqual { x, y: op.y() },
            0xa => SetIndex(op.address()),
            _ => Unknown(op),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            SystemCall(a) => write!(f, "SYS 0x{:03X}", a),
            Jump(a) => write!(f, "JP 0x{:03X}", a),
            Call(a) => write!(f, "CALL 0x{:03X}", a),
            SkipIfEqual { x, value } => write!(f, "SE V{:X}, 0x{:02X}", x, value),
            SkipIfNotEqual { x, value } => write!(f, "SNE V{:X}, 0x{:02X}", x, value),
            SkipIfRegistersEqual { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            SetRegister { x, value } => write!(f, "LD V{:X}, 0x{:02X}", x, value),
            AddToRegister { x, value } => write!(f, "ADD V{:X}, 0x{:02X}", x, value),
            SkipIfRegistersNotEqual { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            SetIndex(a) => write!(f, "LD I, 0x{:03X}", a),
            Unknown(op) => write!(f, "??? {}", op),
        }
    }
}
