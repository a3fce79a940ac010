use crate::{
    ast::{ContractDefinition, FunctionDefinition},
    codegen::{
        assembler::{Assembler, Label, MAX_JUMP_TARGET},
        opcode::Opcode::{self, *},
        selector::selector,
    },
    error::ResourceError,
};

/// Size of the deploy-time code which precedes the runtime code.
pub const CREATION_PREAMBLE_LEN: usize = 14;

/// Word-aligned offset at which argument `i` sits, right after the selector.
fn calldata_offset(i: usize) -> u32 {
    u32::try_from(4 + 32 * i).unwrap_or(u32::MAX)
}

/// The code kept on chain: a selector dispatcher followed by one stub per
/// function, in declaration order.
///
/// Function bodies are not lowered. A stub only rejects unexpected value
/// transfers, loads its arguments and returns a zero word if the function
/// declares a return type.
pub fn runtime_code(contract: &ContractDefinition) -> Result<Vec<u8>, ResourceError> {
    let mut asm = Assembler::new();
    let functions: Vec<(&FunctionDefinition, Label)> = contract
        .functions
        .iter()
        .filter(|function| !function.is_constructor)
        .map(|function| (function, asm.new_label()))
        .collect();
    let unmatched = asm.new_label();
    let no_data = asm.new_label();

    // Free memory pointer.
    asm.push(0x80).push(0x40).op(MSTORE);

    asm.op(CALLDATASIZE)
        .op(ISZERO)
        .push_label(no_data)
        .op(JUMPI);

    // Keep the leading four bytes of call data.
    asm.push(0).op(CALLDATALOAD).push(0xe0).op(SHR);

    for &(function, entry) in &functions {
        let selector = u32::from_be_bytes(selector(function));
        asm.op(DUP1)
            .push_fixed(PUSH4, selector)
            .op(EQ)
            .push_label(entry)
            .op(JUMPI);
    }

    asm.jumpdest(unmatched);
    revert_empty(&mut asm);

    asm.jumpdest(no_data).op(STOP);

    for &(function, entry) in &functions {
        asm.jumpdest(entry);
        function_stub(&mut asm, function);
    }

    let code = asm.assemble()?;
    log::debug!(
        "runtime code of {}: {} bytes, {} dispatch entries",
        contract.name,
        code.len(),
        functions.len()
    );
    Ok(code)
}

fn function_stub(asm: &mut Assembler, function: &FunctionDefinition) {
    if !function.is_payable {
        let ok = asm.new_label();
        asm.op(CALLVALUE)
            .op(DUP1)
            .op(ISZERO)
            .push_label(ok)
            .op(JUMPI);
        revert_empty(asm);
        asm.jumpdest(ok).op(POP);
    }

    for i in 0..function.parameters.len() {
        asm.push(calldata_offset(i)).op(CALLDATALOAD);
    }

    if function.return_type.is_some() {
        asm.push(0).push(0).op(MSTORE);
        asm.push(0x20).push(0).op(RETURN);
    } else {
        asm.op(STOP);
    }
}

fn revert_empty(asm: &mut Assembler) {
    asm.push(0).op(DUP1).op(REVERT);
}

/// The code run once at deployment: it copies the runtime code, which is
/// appended right after it, to memory and returns it.
pub fn creation_code(runtime: &[u8]) -> Result<Vec<u8>, ResourceError> {
    let len = u16::try_from(runtime.len()).map_err(|_| ResourceError::CodeTooLarge {
        len: runtime.len(),
        limit: MAX_JUMP_TARGET,
    })?;
    let len = u32::from(len);

    let mut asm = Assembler::new();
    asm.push_fixed(PUSH2, len)
        .push_fixed(PUSH1, CREATION_PREAMBLE_LEN as u32)
        .push(0)
        .op(CODECOPY);
    asm.push_fixed(PUSH2, len).push(0).op(Opcode::RETURN);

    let mut code = asm.assemble()?;
    debug_assert_eq!(code.len(), CREATION_PREAMBLE_LEN);
    code.extend_from_slice(runtime);
    Ok(code)
}
