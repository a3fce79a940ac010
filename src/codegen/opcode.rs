use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::Display;

/// The subset of EVM instructions the generator emits.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, Display)]
#[repr(u8)]
pub enum Opcode {
    STOP = 0x00,
    LT = 0x10,
    EQ = 0x14,
    ISZERO = 0x15,
    SHR = 0x1c,
    CALLVALUE = 0x34,
    CALLDATALOAD = 0x35,
    CALLDATASIZE = 0x36,
    CODECOPY = 0x39,
    POP = 0x50,
    MSTORE = 0x52,
    JUMP = 0x56,
    JUMPI = 0x57,
    JUMPDEST = 0x5b,
    PUSH1 = 0x60,
    PUSH2 = 0x61,
    PUSH3 = 0x62,
    PUSH4 = 0x63,
    DUP1 = 0x80,
    DUP3 = 0x82,
    RETURN = 0xf3,
    REVERT = 0xfd,
}

impl Opcode {
    /// Number of immediate bytes following the opcode.
    pub fn immediate_len(self) -> usize {
        match self {
            Opcode::PUSH1 => 1,
            Opcode::PUSH2 => 2,
            Opcode::PUSH3 => 3,
            Opcode::PUSH4 => 4,
            _ => 0,
        }
    }

    /// The PUSH carrying exactly `len` immediate bytes.
    pub fn push_of_len(len: usize) -> Option<Opcode> {
        match len {
            1 => Some(Opcode::PUSH1),
            2 => Some(Opcode::PUSH2),
            3 => Some(Opcode::PUSH3),
            4 => Some(Opcode::PUSH4),
            _ => None,
        }
    }

    /// The narrowest PUSH which holds `value`. There is no zero-width push, so
    /// zero takes one byte.
    pub fn narrowest_push(value: u32) -> Opcode {
        match value {
            0..=0xff => Opcode::PUSH1,
            0x100..=0xffff => Opcode::PUSH2,
            0x1_0000..=0xff_ffff => Opcode::PUSH3,
            _ => Opcode::PUSH4,
        }
    }
}
