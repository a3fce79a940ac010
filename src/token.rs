use std::{fmt, ops::Range};

use serde::Serialize;

#[derive(Copy, Clone)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
    lo: usize,
    len: u32,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, pos: Position) -> Token {
        Token {
            kind,
            pos,
            len: span.len,
            lo: span.lo,
        }
    }

    pub fn span(&self) -> Span {
        Span {
            len: self.len,
            lo: self.lo,
        }
    }

    /// Returns the source text this token was lexed from.
    pub fn text<'src>(&self, src: &'src str) -> &'src str {
        self.span().substr(src)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {}, {})", self.kind, self.span(), self.pos)
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Span {
    pub len: u32,
    pub lo: usize,
}

impl Span {
    pub fn new_of_bounds(Range { start: lo, end: hi }: Range<usize>) -> Span {
        debug_assert!(hi >= lo);
        // Source length is bounded by `Limits::max_source_len`, far below u32.
        let len = u32::try_from(hi - lo).unwrap_or(u32::MAX);
        Self::new_of_length(lo, len)
    }

    pub fn new_of_length(lo: usize, len: u32) -> Span {
        Span { len, lo }
    }

    pub fn hi(&self) -> usize {
        self.lo + self.len as usize
    }

    /// Shrinks (or grows) the span at both ends.
    pub fn offset(&self, lo_delta: isize, hi_delta: isize) -> Span {
        let lo = self.lo.saturating_add_signed(lo_delta);
        let hi = self.hi().saturating_add_signed(hi_delta).max(lo);
        Span::new_of_bounds(lo..hi)
    }

    pub fn substr<'src>(&self, src: &'src str) -> &'src str {
        &src[self.lo..self.hi()]
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, len: {})", self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = self.hi();
        write!(f, "{lo}..{hi}")
    }
}

/// A 1-based line and column pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const START: Position = Position { line: 1, column: 1 };

    pub const fn new(line: u32, column: u32) -> Position {
        Position { line, column }
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { pos: self, inner }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A value tagged with the source position it refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub pos: Position,
    pub inner: T,
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}, column {}", self.inner, self.pos.line, self.pos.column)
    }
}

impl<T: fmt::Debug + fmt::Display> std::error::Error for Spanned<T> {}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Contract,
    Def,
    Struct,
    If,
    Else,
    While,
    For,
    Return,
    Break,
    Continue,
    Payable,
    View,
    Pure,
    OnlyOwner,
    Memory,
    Storage,

    True,
    False,

    /// `{`, also spelled `begin`.
    LBrace,
    /// `}`, also spelled `end`.
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Semicolon,
    Comma,
    Dot,
    /// `->`
    Arrow,
    /// `=>`
    FatArrow,

    /// `=`
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Amp,
    Pipe,
    Tilde,
    Bang,
    Question,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,

    Identifier,
    Number,
    String,
    /// A string literal which contains at least one escape sequence.
    EscapedString,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lexeme() {
            Some(lexeme) => write!(f, "'{lexeme}'"),
            None => match self {
                TokenKind::Identifier => f.write_str("identifier"),
                TokenKind::Number => f.write_str("number literal"),
                TokenKind::String | TokenKind::EscapedString => f.write_str("string literal"),
                _ => f.write_str("end of input"),
            },
        }
    }
}

impl TokenKind {
    /// The fixed spelling of this token kind, if it has one.
    pub fn lexeme(self) -> Option<&'static str> {
        use TokenKind::*;
        let s = match self {
            Contract => "contract",
            Def => "def",
            Struct => "struct",
            If => "if",
            Else => "else",
            While => "while",
            For => "for",
            Return => "return",
            Break => "break",
            Continue => "continue",
            Payable => "payable",
            View => "view",
            Pure => "pure",
            OnlyOwner => "onlyOwner",
            Memory => "memory",
            Storage => "storage",
            True => "true",
            False => "false",
            LBrace => "{",
            RBrace => "}",
            LBracket => "[",
            RBracket => "]",
            LParen => "(",
            RParen => ")",
            Colon => ":",
            Semicolon => ";",
            Comma => ",",
            Dot => ".",
            Arrow => "->",
            FatArrow => "=>",
            Assign => "=",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            Caret => "^",
            Amp => "&",
            Pipe => "|",
            Tilde => "~",
            Bang => "!",
            Question => "?",
            Less => "<",
            Greater => ">",
            LessEq => "<=",
            GreaterEq => ">=",
            EqEq => "==",
            NotEq => "!=",
            AndAnd => "&&",
            OrOr => "||",
            Identifier | Number | String | EscapedString | Eof => return None,
        };
        Some(s)
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "contract" => TokenKind::Contract,
    "def" => TokenKind::Def,
    "struct" => TokenKind::Struct,
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "while" => TokenKind::While,
    "for" => TokenKind::For,
    "return" => TokenKind::Return,
    "break" => TokenKind::Break,
    "continue" => TokenKind::Continue,
    "payable" => TokenKind::Payable,
    "view" => TokenKind::View,
    "pure" => TokenKind::Pure,
    "onlyOwner" => TokenKind::OnlyOwner,
    "memory" => TokenKind::Memory,
    "storage" => TokenKind::Storage,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
    "begin" => TokenKind::LBrace,
    "end" => TokenKind::RBrace,
};

/// Two-character operators. Looked up before the single-character ones so
/// that the longest match always wins.
pub static DOUBLE_CHAR_OPERATORS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "->" => TokenKind::Arrow,
    "=>" => TokenKind::FatArrow,
    "==" => TokenKind::EqEq,
    "!=" => TokenKind::NotEq,
    "<=" => TokenKind::LessEq,
    ">=" => TokenKind::GreaterEq,
    "&&" => TokenKind::AndAnd,
    "||" => TokenKind::OrOr,
};
