use serde::Serialize;

use crate::{ast::Program, error::ResourceError};

pub mod abi;
pub mod assembler;
pub mod disasm;
pub mod evm;
pub mod opcode;
pub mod selector;

pub use abi::AbiFunction;

/// The compiler output for one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledContract {
    pub contract_name: String,
    pub abi: Vec<AbiFunction>,
    /// Lowercase hex, no `0x` prefix.
    pub creation_bytecode: String,
    /// Lowercase hex, no `0x` prefix.
    pub runtime_bytecode: String,
}

/// Generates every contract independently, in declaration order.
pub fn generate(program: &Program) -> Result<Vec<CompiledContract>, ResourceError> {
    program
        .contracts
        .iter()
        .map(|contract| {
            let runtime = evm::runtime_code(contract)?;
            let creation = evm::creation_code(&runtime)?;
            Ok(CompiledContract {
                contract_name: contract.name.to_string(),
                abi: abi::build(contract),
                creation_bytecode: hex(&creation),
                runtime_bytecode: hex(&runtime),
            })
        })
        .collect()
}

pub fn hex(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut buf = String::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        buf.push(DIGITS[usize::from(byte >> 4)].into());
        buf.push(DIGITS[usize::from(byte & 0xf)].into());
    }
    buf
}

/// Inverse of [`hex`]. Accepts either case; fails on odd lengths or non-hex
/// digits.
pub fn decode_hex(s: &str) -> Option<Vec<u8>> {
    fn digit(c: u8) -> Option<u8> {
        match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'a'..=b'f' => Some(c - b'a' + 10),
            b'A'..=b'F' => Some(c - b'A' + 10),
            _ => None,
        }
    }

    if s.len() % 2 != 0 {
        return None;
    }
    s.as_bytes()
        .chunks_exact(2)
        .map(|pair| Some(digit(pair[0])? << 4 | digit(pair[1])?))
        .collect()
}
