use thiserror::Error;

use crate::{checker, lexer, parser, token::Spanned};

/// Any error which aborts a compilation. There are no partial results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("lex error: {0}")]
    Lex(#[from] Spanned<lexer::Error>),

    #[error("parse error: {0}")]
    Parse(#[from] Spanned<parser::Error>),

    #[error("semantic error: {0}")]
    Semantic(#[from] Spanned<checker::Error>),

    #[error("resource limit exceeded: {0}")]
    Resource(#[from] ResourceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("source is {len} bytes long, the limit is {limit}")]
    SourceTooLarge { len: usize, limit: usize },

    #[error("nesting is deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("generated code is {len} bytes long, jump targets are limited to {limit}")]
    CodeTooLarge { len: usize, limit: usize },
}
