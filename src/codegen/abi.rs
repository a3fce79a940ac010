use serde::Serialize;
use strum::Display;

use crate::ast::{ContractDefinition, FunctionDefinition, Parameter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiFunction {
    /// Empty for the constructor.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FunctionKind,
    pub state_mutability: StateMutability,
    pub inputs: Vec<AbiParameter>,
    pub outputs: Vec<AbiParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbiParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FunctionKind {
    Function,
    Constructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StateMutability {
    Payable,
    View,
    Pure,
    Nonpayable,
}

impl StateMutability {
    /// `payable` wins over `view`, which wins over `pure`.
    pub fn of(function: &FunctionDefinition) -> StateMutability {
        if function.is_payable {
            StateMutability::Payable
        } else if function.is_view {
            StateMutability::View
        } else if function.is_pure {
            StateMutability::Pure
        } else {
            StateMutability::Nonpayable
        }
    }
}

/// One entry per function, in declaration order.
pub fn build(contract: &ContractDefinition) -> Vec<AbiFunction> {
    contract.functions.iter().map(describe).collect()
}

fn describe(function: &FunctionDefinition) -> AbiFunction {
    let inputs = function.parameters.iter().map(input).collect();

    if function.is_constructor {
        let state_mutability = if function.is_payable {
            StateMutability::Payable
        } else {
            StateMutability::Nonpayable
        };
        return AbiFunction {
            name: String::new(),
            kind: FunctionKind::Constructor,
            state_mutability,
            inputs,
            outputs: Vec::new(),
        };
    }

    let outputs = function
        .return_type
        .iter()
        .map(|ty| AbiParameter {
            name: String::new(),
            type_name: ty.to_string(),
        })
        .collect();

    AbiFunction {
        name: function.name.to_string(),
        kind: FunctionKind::Function,
        state_mutability: StateMutability::of(function),
        inputs,
        outputs,
    }
}

fn input(param: &Parameter) -> AbiParameter {
    AbiParameter {
        name: param.name.to_string(),
        type_name: param.type_name.to_string(),
    }
}
