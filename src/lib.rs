/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The checker walks a parsed AST and rejects programs which violate the
/// language rules (ownership, mutability, scoping), without modifying it.
pub mod checker;

/// The code generator maps a checked AST into, per contract, an ABI and the
/// creation and runtime bytecode.
pub mod codegen;

pub mod ast;
pub mod error;
pub mod token;
pub mod types;

pub mod util {
    pub mod tree;
    #[cfg(test)]
    pub(crate) mod test_utils;
}

pub use codegen::CompiledContract;
pub use error::{Error, ResourceError};

/// Bounds on the work a single compilation may do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum source length, in bytes.
    pub max_source_len: usize,
    /// Maximum nesting of blocks and expressions.
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_source_len: 1024 * 1024,
            max_depth: 256,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub limits: Limits,
}

/// Compiles every contract in `src`, in declaration order.
pub fn compile(src: &str) -> Result<Vec<CompiledContract>, Error> {
    compile_with(src, &Options::default())
}

pub fn compile_with(src: &str, options: &Options) -> Result<Vec<CompiledContract>, Error> {
    let program = parser::parse_program(src, &mut Vec::new(), &options.limits)?;
    checker::check(&program)?;
    let compiled = codegen::generate(&program)?;
    log::debug!("compiled {} contract(s)", compiled.len());
    Ok(compiled)
}
