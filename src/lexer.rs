use std::{fmt, iter::Peekable};

use crate::token::{Position, Span, Spanned, Token, TokenKind, DOUBLE_CHAR_OPERATORS, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

pub type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Lexes the provided string, producing the tokens into the provided buffer.
///
/// The buffer always ends with a [`TokenKind::Eof`] token on success.
pub fn lex(src: &str, tokens: &mut Vec<Token>) -> Result<()> {
    Lexer::new(src, tokens).lex()
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn lex_in_new(src: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex(src, &mut tokens)?;
    Ok(tokens)
}

struct Lexer<'src, 'tok> {
    src: &'src str,
    iter: Peekable<std::str::Chars<'src>>,
    cursor: usize,
    current_lo: usize,
    line: u32,
    column: u32,
    current_pos: Position,
    tokens: &'tok mut Vec<Token>,
}

impl Lexer<'_, '_> {
    /// Scans the source string until the input is exhausted.
    fn lex(mut self) -> Result<()> {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        loop {
            let Some(next) = self.scan_token_kind()? else {
                continue;
            };
            self.produce(next);
            if next == TokenKind::Eof {
                break;
            }
        }
        log::debug!("lexed {} tokens", self.tokens.len());
        Ok(())
    }

    /// Tries to scan the current character. Returns `None` for trivia, which
    /// is never produced.
    fn scan_token_kind(&mut self) -> Result<Option<TokenKind>> {
        use TokenKind::*;
        if self.iter.peek().is_none() {
            self.mark_advance();
            return Ok(Some(Eof));
        }
        let current = self.mark_advance();
        if let Some(double) = self.double_char_operator(current) {
            self.advance();
            return Ok(Some(double));
        }
        let kind = match current {
            '{' => LBrace,
            '}' => RBrace,
            '[' => LBracket,
            ']' => RBracket,
            '(' => LParen,
            ')' => RParen,
            ':' => Colon,
            ';' => Semicolon,
            ',' => Comma,
            '.' => Dot,
            '=' => Assign,
            '+' => Plus,
            '-' => Minus,
            '*' => Star,
            '/' => Slash,
            '%' => Percent,
            '^' => Caret,
            '&' => Amp,
            '|' => Pipe,
            '~' => Tilde,
            '!' => Bang,
            '?' => Question,
            '<' => Less,
            '>' => Greater,
            '#' => {
                self.inline_comment();
                return Ok(None);
            }
            '"' => self.string()?,
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier_or_keyword(),
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_whitespace() => {
                self.whitespace();
                return Ok(None);
            }
            c => return Err(self.current_pos.wrap(Error::UnexpectedChar(c))),
        };
        Ok(Some(kind))
    }

    fn double_char_operator(&mut self, first: char) -> Option<TokenKind> {
        let second = self.peek();
        if !first.is_ascii_punctuation() || !second.is_ascii_punctuation() {
            return None;
        }
        let mut buf = [0; 2];
        first.encode_utf8(&mut buf[..1]);
        second.encode_utf8(&mut buf[1..]);
        let pair = std::str::from_utf8(&buf).ok()?;
        DOUBLE_CHAR_OPERATORS.get(pair).copied()
    }

    /// Lexes a string token, validating its escape sequences.
    ///
    /// Escapes are only *validated* here. They are performed by
    /// [`extract::escaped_string`] once the parser asks for the value, so
    /// strings without escapes never pay for a new buffer.
    fn string(&mut self) -> Result<TokenKind> {
        // Whether any escaping did happen inside this string token
        let mut has_escaped = false;
        // Whether the current character is being escaped
        let mut is_escaping = false;
        loop {
            let pos = self.pos();
            let at_end = self.cursor >= self.src.len();
            let current = self.advance();
            match (is_escaping, current) {
                (_, '\0') if at_end => {
                    return Err(self.current_pos.wrap(Error::UnterminatedString));
                }
                (false, '"') => {
                    return Ok(if has_escaped {
                        TokenKind::EscapedString
                    } else {
                        TokenKind::String
                    });
                }
                // A raw line break never belongs to a string, escaped or not.
                (_, '\n') => return Err(pos.wrap(Error::UnescapedLineBreak)),
                (false, '\\') => {
                    has_escaped = true;
                    is_escaping = true;
                }
                (true, c) => {
                    if !matches!(c, 'n' | 't' | 'r' | '\\' | '"') {
                        return Err(pos.wrap(Error::InvalidEscape(c)));
                    }
                    is_escaping = false;
                }
                (false, _) => {}
            }
        }
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        let valid_identifier_suffix = |c: char| c.is_ascii_alphanumeric() || c == '_';

        while valid_identifier_suffix(self.peek()) {
            self.advance();
        }
        KEYWORDS
            .get(self.substr())
            .copied()
            .unwrap_or(TokenKind::Identifier)
    }

    /// Lexes `digits ['.' digits]`. A dot only belongs to the number when a
    /// digit follows it, so `a[0].b` still lexes the member access.
    fn number(&mut self) -> Result<TokenKind> {
        self.digits();
        if self.peek() == '.' && self.peek_second().is_ascii_digit() {
            self.advance();
            self.digits();
            if self.peek() == '.' && self.peek_second().is_ascii_digit() {
                return Err(self.pos().wrap(Error::MalformedNumber));
            }
        }
        Ok(TokenKind::Number)
    }

    fn digits(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
    }

    fn whitespace(&mut self) {
        while self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn inline_comment(&mut self) {
        while !matches!(self.peek(), '\n' | '\0') {
            self.advance();
        }
    }
}

impl Lexer<'_, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok mut Vec<Token>) -> Lexer<'src, 'tok> {
        Lexer {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            current_lo: 0,
            line: 1,
            column: 1,
            current_pos: Position::START,
            tokens,
        }
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> char {
        self.current_lo = self.cursor;
        self.current_pos = self.pos();
        self.advance()
    }

    /// Returns the next character and advances the iterator, keeping the line
    /// and column counters in sync.
    fn advance(&mut self) -> char {
        match self.iter.next() {
            Some(c) => {
                self.cursor += c.len_utf8();
                if c == '\n' {
                    self.line += 1;
                    self.column = 1;
                } else {
                    self.column += 1;
                }
                c
            }
            None => '\0',
        }
    }

    /// Returns the next character without advancing the iterator.
    fn peek(&mut self) -> char {
        self.iter.peek().copied().unwrap_or('\0')
    }

    /// Returns the character after the next one without advancing.
    fn peek_second(&self) -> char {
        self.iter.clone().nth(1).unwrap_or('\0')
    }

    /// Position of the next character to be consumed.
    fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(self.current_lo..self.cursor)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        self.span().substr(self.src)
    }

    /// Produces a token using the marked bounds.
    fn produce(&mut self, kind: TokenKind) {
        self.tokens
            .push(Token::new(kind, self.span(), self.current_pos));
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnexpectedChar(char),
    UnterminatedString,
    UnescapedLineBreak,
    InvalidEscape(char),
    MalformedNumber,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedChar(c) => write!(f, "unexpected character {c:?}"),
            Error::UnterminatedString => write!(f, "unterminated string literal"),
            Error::UnescapedLineBreak => {
                write!(f, "unterminated string literal (unexpected newline)")
            }
            Error::InvalidEscape(c) => write!(f, "invalid escape sequence \\{c}"),
            Error::MalformedNumber => write!(f, "malformed number literal (second decimal point)"),
        }
    }
}

pub mod extract {
    use super::*;

    pub fn ident(token: Token, src: &str) -> Box<str> {
        debug_assert_eq!(token.kind, TokenKind::Identifier);
        token.text(src).into()
    }

    pub fn number(token: Token, src: &str) -> Box<str> {
        debug_assert_eq!(token.kind, TokenKind::Number);
        token.text(src).into()
    }

    pub fn string(token: Token, src: &str) -> Box<str> {
        debug_assert_eq!(token.kind, TokenKind::String);
        token.span().offset(1, -1).substr(src).into()
    }

    pub fn escaped_string(token: Token, src: &str) -> Box<str> {
        debug_assert_eq!(token.kind, TokenKind::EscapedString);
        let s = token.span().offset(1, -1).substr(src);
        perform_escape(s).into_boxed_str()
    }
}

fn perform_escape(raw: &str) -> String {
    let mut buf = String::with_capacity(raw.len());
    let mut escaped = false;
    for char in raw.chars() {
        let char = match (escaped, char) {
            (true, 'n') => '\n',
            (true, 't') => '\t',
            (true, 'r') => '\r',
            (false, '\\') => {
                escaped = true;
                continue;
            }
            // `\\` and `\"` map to themselves.
            (_, char) => char,
        };
        escaped = false;
        buf.push(char);
    }
    // This function is only called if the string token contains at least one
    // escape sequence
    debug_assert!(buf.len() < raw.len(), "original string MUST be greater");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_showcase_no_errors() {
        let input = include_str!("../demos/showcase.nl");
        let tokens = lex_in_new(input).expect("showcase must lex");
        assert!(tokens.last().is_some_and(Token::is_eof));
    }

    #[test]
    fn tests_with_position() {
        use TokenKind::*;
        let cases = cases!(match .. {
            "{}[]()" => [
                (LBrace, 1:1),
                (RBrace, 1:2),
                (LBracket, 1:3),
                (RBracket, 1:4),
                (LParen, 1:5),
                (RParen, 1:6),
                (Eof, 1:7),
            ],
            ":;,.->=>" => [
                (Colon, 1:1),
                (Semicolon, 1:2),
                (Comma, 1:3),
                (Dot, 1:4),
                (Arrow, 1:5),
                (FatArrow, 1:7),
                (Eof, 1:9),
            ],
            "= + - * / % ^ & | ~ ! ? < >" => [
                (Assign, 1:1),
                (Plus, 1:3),
                (Minus, 1:5),
                (Star, 1:7),
                (Slash, 1:9),
                (Percent, 1:11),
                (Caret, 1:13),
                (Amp, 1:15),
                (Pipe, 1:17),
                (Tilde, 1:19),
                (Bang, 1:21),
                (Question, 1:23),
                (Less, 1:25),
                (Greater, 1:27),
                (Eof, 1:28),
            ],
            "<= >= == != && ||" => [
                (LessEq, 1:1),
                (GreaterEq, 1:4),
                (EqEq, 1:7),
                (NotEq, 1:10),
                (AndAnd, 1:13),
                (OrOr, 1:16),
                (Eof, 1:18),
            ],
            "===<<=>" => [
                (EqEq, 1:1),
                (Assign, 1:3),
                (Less, 1:4),
                (LessEq, 1:5),
                (Greater, 1:7),
                (Eof, 1:8),
            ],
            "contract def struct\nif else while for\nreturn break continue" => [
                (Contract, 1:1),
                (Def, 1:10),
                (Struct, 1:14),
                (If, 2:1),
                (Else, 2:4),
                (While, 2:9),
                (For, 2:15),
                (Return, 3:1),
                (Break, 3:8),
                (Continue, 3:14),
                (Eof, 3:22),
            ],
            "payable view pure onlyOwner memory storage true false" => [
                (Payable, 1:1),
                (View, 1:9),
                (Pure, 1:14),
                (OnlyOwner, 1:19),
                (Memory, 1:29),
                (Storage, 1:36),
                (True, 1:44),
                (False, 1:49),
                (Eof, 1:54),
            ],
            "begin end onlyowner Contract _x a1_b" => [
                (LBrace, 1:1),
                (RBrace, 1:7),
                (Identifier, 1:11),
                (Identifier, 1:21),
                (Identifier, 1:30),
                (Identifier, 1:33),
                (Eof, 1:37),
            ],
            "0 42 3.14 1.x" => [
                (Number, 1:1),
                (Number, 1:3),
                (Number, 1:6),
                (Number, 1:11),
                (Dot, 1:12),
                (Identifier, 1:13),
                (Eof, 1:14),
            ],
            r#""" "hi" "a\"b" "\n\t\r\\""# => [
                (String, 1:1),
                (String, 1:4),
                (EscapedString, 1:9),
                (EscapedString, 1:16),
                (Eof, 1:26),
            ],
            "a # comment == \"\n  b" => [
                (Identifier, 1:1),
                (Identifier, 2:3),
                (Eof, 2:4),
            ],
            "" => [(Eof, 1:1)],
        });

        for (input, expected) in cases {
            let lexed: Vec<_> = lex_in_new(input)
                .unwrap()
                .into_iter()
                .map(|t| (t.kind, t.pos))
                .collect();
            assert_eq!(&lexed, expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_token_text() {
        let src = "count: uint256;";
        let tokens = lex_in_new(src).unwrap();
        let texts: Vec<_> = tokens.iter().map(|t| t.text(src)).collect();
        assert_eq!(texts, ["count", ":", "uint256", ";", ""]);
    }

    #[test]
    fn test_errors() {
        let cases = [
            ("a @ b", Position::new(1, 3).wrap(Error::UnexpectedChar('@'))),
            ("\"open", Position::new(1, 1).wrap(Error::UnterminatedString)),
            ("x = \"ab\ncd\"", Position::new(1, 8).wrap(Error::UnescapedLineBreak)),
            (r#""bad \q""#, Position::new(1, 7).wrap(Error::InvalidEscape('q'))),
            ("1.2.3", Position::new(1, 4).wrap(Error::MalformedNumber)),
        ];
        for (input, expected) in cases {
            assert_eq!(lex_in_new(input).unwrap_err(), expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_perform_escape() {
        assert_eq!(perform_escape(r#"a\nb\t\"c\"\\"#), "a\nb\t\"c\"\\");
        assert_eq!(perform_escape(r"\r"), "\r");
    }

    macro_rules! cases {
        (match .. {
            $($str:expr => [$(($kind:expr, $line:literal : $col:literal)),* $(,)?]),* $(,)?
        }) => {{
            &[$((
                $str,
                vec![$(($kind, Position::new($line, $col))),*],
            )),*]
        }};
    }
    use cases;
}
