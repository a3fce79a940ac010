use sha3::{Digest, Keccak256};

use crate::ast::FunctionDefinition;

/// The dispatch key of a function: the first four bytes of the Keccak-256
/// hash of its signature.
pub type Selector = [u8; 4];

/// The canonical signature, `name(type1,type2,...)`.
pub fn signature(function: &FunctionDefinition) -> String {
    let types: Vec<String> = function.parameter_types().map(ToString::to_string).collect();
    format!("{}({})", function.name, types.join(","))
}

pub fn selector_of(signature: &str) -> Selector {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn selector(function: &FunctionDefinition) -> Selector {
    let signature = signature(function);
    let selector = selector_of(&signature);
    log::trace!("selector of {signature} is {}", super::hex(&selector));
    selector
}
