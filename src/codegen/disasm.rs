use std::fmt::Write;

use crate::codegen::opcode::Opcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction<'a> {
    pub offset: usize,
    /// The raw byte when it isn't an opcode the generator knows about.
    pub opcode: Result<Opcode, u8>,
    /// Shorter than the push width if the code ends early.
    pub immediate: &'a [u8],
}

impl Instruction<'_> {
    /// The immediate as a big-endian number.
    pub fn immediate_value(&self) -> usize {
        self.immediate
            .iter()
            .fold(0, |acc, &byte| (acc << 8) | usize::from(byte))
    }
}

pub fn disassemble(code: &[u8]) -> Vec<Instruction<'_>> {
    let mut instructions = Vec::with_capacity(code.len() / 2);
    let mut offset = 0;
    while offset < code.len() {
        let byte = code[offset];
        let opcode = Opcode::try_from(byte).map_err(|_| byte);
        let width = opcode.map_or(0, Opcode::immediate_len);
        let end = (offset + 1 + width).min(code.len());
        instructions.push(Instruction {
            offset,
            opcode,
            immediate: &code[offset + 1..end],
        });
        offset = end;
    }
    instructions
}

/// Renders one `offset: MNEMONIC [immediate]` line per instruction.
pub fn listing(code: &[u8]) -> String {
    let mut buf = String::with_capacity(code.len() * 12);
    for instruction in disassemble(code) {
        // Writing into a `String` can't fail.
        let _ = write!(buf, "{:04x}: ", instruction.offset);
        let _ = match instruction.opcode {
            Ok(opcode) => write!(buf, "{opcode}"),
            Err(byte) => write!(buf, "UNKNOWN(0x{byte:02x})"),
        };
        if !instruction.immediate.is_empty() {
            let _ = write!(buf, " 0x{}", super::hex(instruction.immediate));
        }
        buf.push('\n');
    }
    buf
}
