use std::fmt;

use crate::{
    ast::{
        Assignment, BinaryOperator, BitwiseOperator, ContractDefinition, Expr, ExprKind,
        FunctionDefinition, Ident, Literal, LogicalOperator, Parameter, Program, Property,
        ReturnType, StorageLocation, Stmt, StmtKind, StructDefinition, StructField, TypeName,
        UnaryOperator, VariableDeclaration, CONSTRUCTOR,
    },
    error::{Error as CompileError, ResourceError},
    lexer::{self, extract},
    token::{Position, Span, Token, TokenKind},
    types::well_known,
    Limits,
};

type Result<T, E = CompileError> = std::result::Result<T, E>;

/// Lexes and parses a whole compilation unit.
pub fn parse_program(src: &str, tokens: &mut Vec<Token>, limits: &Limits) -> Result<Program> {
    parse(src, tokens, limits, Parser::parse_program)
}

/// Lexes and parses a single expression, which must span the whole input.
pub fn parse_expr(src: &str, tokens: &mut Vec<Token>, limits: &Limits) -> Result<Expr> {
    parse(src, tokens, limits, |p| {
        let expr = p.parse_expr()?;
        p.consume(TokenKind::Eof)?;
        Ok(expr)
    })
}

fn parse<'src, 'tok, T>(
    src: &'src str,
    tokens: &'tok mut Vec<Token>,
    limits: &Limits,
    f: impl for<'a> FnOnce(&'a mut Parser<'src, 'tok>) -> Result<T>,
) -> Result<T> {
    assert!(tokens.is_empty(), "must pass clean tokens buffer");
    if src.len() > limits.max_source_len {
        return Err(ResourceError::SourceTooLarge {
            len: src.len(),
            limit: limits.max_source_len,
        }
        .into());
    }

    lexer::lex(src, tokens)?;
    let mut p = Parser::new(src, tokens, limits.max_depth);
    f(&mut p)
}

struct Parser<'src, 'tok> {
    src: &'src str,
    tokens: &'tok [Token],
    cursor: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser<'_, '_> {
    fn parse_program(&mut self) -> Result<Program> {
        let mut contracts = Vec::with_capacity(4);
        while self.except([]) {
            contracts.push(self.parse_contract()?);
        }
        let eof = self.consume(TokenKind::Eof)?;
        if contracts.is_empty() {
            return Err(eof.pos.wrap(Error::EmptyProgram).into());
        }
        log::debug!("parsed {} contract(s)", contracts.len());
        Ok(Program { contracts })
    }

    fn parse_contract(&mut self) -> Result<ContractDefinition> {
        self.consume(TokenKind::Contract)?;
        let name = self.parse_ident()?;
        self.consume(TokenKind::LBrace)?;

        let mut state_vars = Vec::new();
        let mut functions = Vec::new();
        let mut structs = Vec::new();
        while self.except([TokenKind::RBrace]) {
            match self.peek().kind {
                TokenKind::Def => functions.push(self.parse_function()?),
                TokenKind::Struct => structs.push(self.parse_struct()?),
                _ => state_vars.push(self.parse_state_var()?),
            }
        }
        self.consume(TokenKind::RBrace)?;

        Ok(ContractDefinition {
            name,
            state_vars,
            functions,
            structs,
        })
    }

    fn parse_state_var(&mut self) -> Result<VariableDeclaration> {
        let name = self.parse_ident()?;
        self.consume(TokenKind::Colon)?;
        let type_name = self.parse_type()?;
        let storage_location = if self.take(TokenKind::Memory) {
            Some(StorageLocation::Memory)
        } else if self.take(TokenKind::Storage) {
            Some(StorageLocation::Storage)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon)?;
        Ok(VariableDeclaration {
            name,
            type_name,
            storage_location,
        })
    }

    fn parse_type(&mut self) -> Result<TypeName> {
        if self.is_contextual(well_known::MAPPING) {
            return self.nested(Parser::parse_mapping);
        }
        let mut ty = TypeName::Elementary(self.parse_ident()?.name);
        while self.take(TokenKind::LBracket) {
            self.consume(TokenKind::RBracket)?;
            ty = TypeName::Array(Box::new(ty));
        }
        Ok(ty)
    }

    fn parse_mapping(&mut self) -> Result<TypeName> {
        self.advance(); // `mapping`
        self.consume(TokenKind::LParen)?;
        let key = self.parse_ident()?.name;
        self.consume(TokenKind::Arrow)?;
        let value = self.parse_type()?;
        self.consume(TokenKind::RParen)?;
        Ok(TypeName::Mapping {
            key,
            value: Box::new(value),
        })
    }

    fn parse_function(&mut self) -> Result<FunctionDefinition> {
        self.consume(TokenKind::Def)?;
        let name = self.parse_ident()?;

        self.consume(TokenKind::LParen)?;
        let parameters = self.parse_list(TokenKind::RParen, Parser::parse_parameter)?;
        self.consume(TokenKind::RParen)?;

        let mut is_payable = false;
        let mut is_view = false;
        let mut is_pure = false;
        let mut is_only_owner = false;
        loop {
            let token = self.peek();
            let flag = match token.kind {
                TokenKind::Payable => &mut is_payable,
                TokenKind::View => &mut is_view,
                TokenKind::Pure => &mut is_pure,
                TokenKind::OnlyOwner => &mut is_only_owner,
                _ => break,
            };
            if *flag {
                let error = Error::DuplicateModifier {
                    modifier: token.kind,
                };
                return Err(token.pos.wrap(error).into());
            }
            *flag = true;
            self.advance();
        }

        let return_type = if self.take(TokenKind::Arrow) {
            Some(self.parse_return_type()?)
        } else {
            None
        };
        let body = self.parse_block()?;

        Ok(FunctionDefinition {
            is_constructor: name.as_str() == CONSTRUCTOR,
            name,
            parameters,
            return_type,
            is_payable,
            is_view,
            is_pure,
            is_only_owner,
            body,
        })
    }

    fn parse_parameter(&mut self) -> Result<Parameter> {
        let name = self.parse_ident()?;
        self.consume(TokenKind::Colon)?;
        let type_name = self.parse_type()?;
        let default_value = if self.take(TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Parameter {
            name,
            type_name,
            default_value,
        })
    }

    fn parse_return_type(&mut self) -> Result<ReturnType> {
        if !self.take(TokenKind::LParen) {
            return Ok(ReturnType::Single(self.parse_ident()?.name));
        }
        let types = self.parse_list(TokenKind::RParen, |p| Ok(p.parse_ident()?.name))?;
        self.consume(TokenKind::RParen)?;
        Ok(ReturnType::Tuple(types))
    }

    fn parse_struct(&mut self) -> Result<StructDefinition> {
        self.consume(TokenKind::Struct)?;
        let name = self.parse_ident()?;
        self.consume(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while self.except([TokenKind::RBrace]) {
            let name = self.parse_ident()?;
            self.consume(TokenKind::Colon)?;
            let type_name = self.parse_type()?;
            self.consume(TokenKind::Semicolon)?;
            fields.push(StructField { name, type_name });
        }
        self.consume(TokenKind::RBrace)?;
        Ok(StructDefinition { name, fields })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        self.consume(TokenKind::LBrace)?;
        let body = self.nested(|p| {
            let mut body = Vec::new();
            while p.except([TokenKind::RBrace]) {
                body.push(p.parse_stmt()?);
            }
            Ok(body)
        })?;
        self.consume(TokenKind::RBrace)?;
        Ok(body)
    }

    /// Keyword-led statements dispatch to their own routine. Anything else is
    /// parsed as an expression first, which becomes the target if an `=`
    /// follows. This is what allows targets such as `a[i].b`.
    fn parse_stmt(&mut self) -> Result<Stmt> {
        let token = self.peek();
        let kind = match token.kind {
            TokenKind::If => return self.parse_if(),
            TokenKind::For => return self.parse_for(),
            TokenKind::While => {
                self.advance();
                let condition = self.parse_expr()?;
                let body = self.parse_block()?;
                StmtKind::While { condition, body }
            }
            TokenKind::Return => {
                self.advance();
                let expression = if self.is_stmt_end() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                StmtKind::Return { expression }
            }
            TokenKind::Break => {
                self.advance();
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                StmtKind::Continue
            }
            _ => {
                let expr = self.parse_expr()?;
                if self.take(TokenKind::Assign) {
                    let value = self.parse_expr()?;
                    StmtKind::Assignment(Assignment {
                        var_name: expr,
                        expression: value,
                    })
                } else {
                    StmtKind::Expression { expression: expr }
                }
            }
        };
        self.take(TokenKind::Semicolon);
        Ok(Stmt {
            kind,
            pos: token.pos,
        })
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        let token = self.consume(TokenKind::If)?;
        let condition = self.parse_expr()?;
        let then_block = self.parse_block()?;

        let else_block = if self.take(TokenKind::Else) {
            let next = self.peek();
            match next.kind {
                TokenKind::LBrace => Some(self.parse_block()?),
                // else-if chains are a nested if in a single-statement block.
                TokenKind::If => Some(vec![self.nested(Parser::parse_if)?]),
                actual => {
                    return Err(next.pos.wrap(Error::UnexpectedAfterElse { actual }).into());
                }
            }
        } else {
            None
        };

        Ok(Stmt {
            kind: StmtKind::If {
                condition,
                then_block,
                else_block,
            },
            pos: token.pos,
        })
    }

    /// `for i = start to end [step s] { ... }`, normalized into an
    /// initialization, a condition (the upper bound) and an increment
    /// `i = i + s` (with `s` defaulting to `1`).
    fn parse_for(&mut self) -> Result<Stmt> {
        let token = self.consume(TokenKind::For)?;

        let var = self.peek();
        if var.kind != TokenKind::Identifier {
            return Err(self.malformed_for("a loop variable"));
        }
        self.advance();
        let var_name = extract::ident(var, self.src);
        let var_expr = || {
            let name = var_name.clone();
            Expr::new(ExprKind::Identifier { name }, var.pos)
        };

        if !self.take(TokenKind::Assign) {
            return Err(self.malformed_for("'=' after the loop variable"));
        }
        let start = self.parse_expr()?;

        if !self.take_contextual("to") {
            return Err(self.malformed_for("'to'"));
        }
        let condition = self.parse_expr()?;

        let step = if self.take_contextual("step") {
            self.parse_expr()?
        } else {
            let one = Literal::Number("1".into());
            Expr::new(ExprKind::Literal { value: one }, var.pos)
        };
        let body = self.parse_block()?;

        let increment = Assignment {
            var_name: var_expr(),
            expression: Expr::new(
                ExprKind::BinaryOp {
                    left: Box::new(var_expr()),
                    operator: BinaryOperator::Add,
                    right: Box::new(step),
                },
                var.pos,
            ),
        };
        let initialization = Assignment {
            var_name: var_expr(),
            expression: start,
        };

        Ok(Stmt {
            kind: StmtKind::For {
                initialization,
                condition,
                increment,
                body,
            },
            pos: token.pos,
        })
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.nested(Parser::parse_ternary)
    }

    fn parse_ternary(&mut self) -> Result<Expr> {
        let condition = self.parse_logical()?;
        if !self.take(TokenKind::Question) {
            return Ok(condition);
        }
        let true_branch = self.parse_expr()?;
        self.consume(TokenKind::Colon)?;
        let false_branch = self.parse_expr()?;
        let pos = condition.pos;
        let kind = ExprKind::TernaryOp {
            condition: Box::new(condition),
            true_branch: Box::new(true_branch),
            false_branch: Box::new(false_branch),
        };
        Ok(Expr::new(kind, pos))
    }

    fn parse_logical(&mut self) -> Result<Expr> {
        self.parse_left_assoc(
            Parser::parse_bitwise,
            |kind| match kind {
                TokenKind::AndAnd => Some(LogicalOperator::And),
                TokenKind::OrOr => Some(LogicalOperator::Or),
                _ => None,
            },
            |left, operator, right| ExprKind::LogicalOp {
                left,
                operator,
                right,
            },
        )
    }

    fn parse_bitwise(&mut self) -> Result<Expr> {
        self.parse_left_assoc(
            Parser::parse_comparison,
            |kind| match kind {
                TokenKind::Amp => Some(BitwiseOperator::And),
                TokenKind::Pipe => Some(BitwiseOperator::Or),
                TokenKind::Caret => Some(BitwiseOperator::Xor),
                _ => None,
            },
            |left, operator, right| ExprKind::BitwiseOp {
                left,
                operator,
                right,
            },
        )
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        self.parse_left_assoc(
            Parser::parse_additive,
            |kind| match kind {
                TokenKind::Less => Some(BinaryOperator::Lt),
                TokenKind::Greater => Some(BinaryOperator::Gt),
                TokenKind::EqEq => Some(BinaryOperator::Eq),
                TokenKind::NotEq => Some(BinaryOperator::Ne),
                TokenKind::LessEq => Some(BinaryOperator::Le),
                TokenKind::GreaterEq => Some(BinaryOperator::Ge),
                _ => None,
            },
            binary,
        )
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        self.parse_left_assoc(
            Parser::parse_multiplicative,
            |kind| match kind {
                TokenKind::Plus => Some(BinaryOperator::Add),
                TokenKind::Minus => Some(BinaryOperator::Sub),
                _ => None,
            },
            binary,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        self.parse_left_assoc(
            Parser::parse_unary,
            |kind| match kind {
                TokenKind::Star => Some(BinaryOperator::Mul),
                TokenKind::Slash => Some(BinaryOperator::Div),
                TokenKind::Percent => Some(BinaryOperator::Rem),
                _ => None,
            },
            binary,
        )
    }

    /// Parses one precedence level: operands from the next tighter level,
    /// folded to the left while the current token is one of this level's
    /// operators.
    fn parse_left_assoc<Op>(
        &mut self,
        mut operand: impl FnMut(&mut Self) -> Result<Expr>,
        operator: impl Fn(TokenKind) -> Option<Op>,
        build: impl Fn(Box<Expr>, Op, Box<Expr>) -> ExprKind,
    ) -> Result<Expr> {
        let base_depth = self.depth;
        let mut left = operand(self)?;
        while let Some(op) = operator(self.peek().kind) {
            // Each fold makes the tree one level deeper.
            self.descend()?;
            self.advance();
            let right = operand(self)?;
            let pos = left.pos;
            left = Expr::new(build(Box::new(left), op, Box::new(right)), pos);
        }
        self.depth = base_depth;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let token = self.peek();
        let operator = match token.kind {
            TokenKind::Bang => UnaryOperator::Not,
            TokenKind::Minus => UnaryOperator::Neg,
            TokenKind::Tilde => UnaryOperator::BitNot,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.nested(Parser::parse_unary)?;
        let kind = ExprKind::UnaryOp {
            operator,
            operand: Box::new(operand),
        };
        Ok(Expr::new(kind, token.pos))
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.advance();
        let kind = match token.kind {
            TokenKind::Number => literal(Literal::Number(extract::number(token, self.src))),
            TokenKind::String => literal(Literal::String(extract::string(token, self.src))),
            TokenKind::EscapedString => {
                literal(Literal::String(extract::escaped_string(token, self.src)))
            }
            TokenKind::True => literal(Literal::Bool(true)),
            TokenKind::False => literal(Literal::Bool(false)),

            // Array literal: [ expr, ... ]
            TokenKind::LBracket => {
                let elements = self.parse_list(TokenKind::RBracket, Parser::parse_expr)?;
                self.consume(TokenKind::RBracket)?;
                ExprKind::ArrayLiteral { elements }
            }

            // Object literal: { key: expr, ... }
            TokenKind::LBrace => {
                let properties = self.parse_list(TokenKind::RBrace, Parser::parse_property)?;
                self.consume(TokenKind::RBrace)?;
                ExprKind::ObjectLiteral { properties }
            }

            TokenKind::Identifier => {
                let name = extract::ident(token, self.src);
                let ident = Expr::new(ExprKind::Identifier { name }, token.pos);
                return self.parse_postfix(ident);
            }

            TokenKind::LParen => return self.parse_parenthesized(token.pos),

            other => {
                let error = Error::UnexpectedTokenInExpr { token: other };
                return Err(token.pos.wrap(error).into());
            }
        };
        Ok(Expr::new(kind, token.pos))
    }

    /// Member access, index access and calls, chained left to right.
    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr> {
        let base_depth = self.depth;
        loop {
            let kind = match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    let member = self.parse_ident()?.name;
                    ExprKind::MemberAccess {
                        object: Box::new(expr),
                        member,
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.consume(TokenKind::RBracket)?;
                    ExprKind::IndexAccess {
                        object: Box::new(expr),
                        index: Box::new(index),
                    }
                }
                TokenKind::LParen => {
                    self.advance();
                    let arguments = self.parse_list(TokenKind::RParen, Parser::parse_expr)?;
                    self.consume(TokenKind::RParen)?;
                    ExprKind::FunctionCall {
                        callee: Box::new(expr),
                        arguments,
                    }
                }
                _ => break,
            };
            self.descend()?;
            let pos = match &kind {
                ExprKind::MemberAccess { object, .. }
                | ExprKind::IndexAccess { object, .. }
                | ExprKind::FunctionCall { callee: object, .. } => object.pos,
                _ => unreachable!(),
            };
            expr = Expr::new(kind, pos);
        }
        self.depth = base_depth;
        Ok(expr)
    }

    /// `( expr )` is grouping. `()`, and any list with a comma in it, is a
    /// tuple.
    fn parse_parenthesized(&mut self, pos: Position) -> Result<Expr> {
        let mut elements = Vec::new();
        let mut has_comma = false;
        while self.except([TokenKind::RParen]) {
            elements.push(self.parse_expr()?);
            if !self.take(TokenKind::Comma) {
                break;
            }
            has_comma = true;
        }
        self.consume(TokenKind::RParen)?;

        if !has_comma && elements.len() == 1 {
            if let Some(inner) = elements.pop() {
                return Ok(inner);
            }
        }
        Ok(Expr::new(ExprKind::Tuple { elements }, pos))
    }

    fn parse_property(&mut self) -> Result<Property> {
        let key = self.parse_ident()?.name;
        self.consume(TokenKind::Colon)?;
        let value = self.parse_expr()?;
        Ok(Property { key, value })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(Ident {
            name: extract::ident(token, self.src),
            pos: token.pos,
        })
    }

    /// Parses `item (, item)*` up to, but not including, `end`. A trailing
    /// comma is accepted.
    fn parse_list<T>(
        &mut self,
        end: TokenKind,
        mut f: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while self.except([end]) {
            items.push(f(self)?);
            if !self.take(TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }
}

fn literal(value: Literal) -> ExprKind {
    ExprKind::Literal { value }
}

fn binary(left: Box<Expr>, operator: BinaryOperator, right: Box<Expr>) -> ExprKind {
    ExprKind::BinaryOp {
        left,
        operator,
        right,
    }
}

impl Parser<'_, '_> {
    fn new<'src, 'tok>(
        src: &'src str,
        tokens: &'tok [Token],
        max_depth: usize,
    ) -> Parser<'src, 'tok> {
        Parser {
            src,
            tokens,
            cursor: 0,
            depth: 0,
            max_depth,
        }
    }

    /// Runs `f` one nesting level deeper, failing if that exceeds the limit.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.descend()?;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn descend(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            let error = ResourceError::NestingTooDeep {
                limit: self.max_depth,
            };
            return Err(error.into());
        }
        self.depth += 1;
        Ok(())
    }

    /// Returns the current token.
    #[inline]
    fn peek(&self) -> Token {
        match self.tokens.get(self.cursor) {
            Some(token) => *token,
            None => {
                let span = Span::new_of_length(self.src.len(), 0);
                Token::new(TokenKind::Eof, span, Position::START)
            }
        }
    }

    /// Returns the current token and advances. Never advances past the end.
    fn advance(&mut self) -> Token {
        let c = self.peek();
        if !c.is_eof() {
            self.cursor += 1;
        }
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one. If not, fails.
    fn consume(&mut self, expect: TokenKind) -> Result<Token> {
        let c = self.peek();
        if self.is(expect) {
            self.advance();
            Ok(c)
        } else {
            let error = Error::Unexpected {
                actual: c.kind,
                expected: expect,
            };
            Err(c.pos.wrap(error).into())
        }
    }

    /// Whether the current token is the identifier `word`, which acts as a
    /// keyword in this position only.
    fn is_contextual(&self, word: &str) -> bool {
        let c = self.peek();
        c.kind == TokenKind::Identifier && c.text(self.src) == word
    }

    fn take_contextual(&mut self, word: &str) -> bool {
        if self.is_contextual(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Returns true while the current token does *not* match one of the
    /// provided ones. [`TokenKind::Eof`] is implicitly included in the list.
    ///
    /// This won't advance the cursor.
    fn except(&self, except: impl IntoIterator<Item = TokenKind>) -> bool {
        let c = self.peek();
        if c.kind == TokenKind::Eof {
            return false;
        }
        except.into_iter().all(|e| c.kind != e)
    }

    fn is_stmt_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        )
    }

    fn malformed_for(&self, expected: &'static str) -> CompileError {
        let c = self.peek();
        c.pos
            .wrap(Error::MalformedFor {
                expected,
                actual: c.kind,
            })
            .into()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    UnexpectedTokenInExpr {
        token: TokenKind,
    },
    UnexpectedAfterElse {
        actual: TokenKind,
    },
    MalformedFor {
        expected: &'static str,
        actual: TokenKind,
    },
    DuplicateModifier {
        modifier: TokenKind,
    },
    EmptyProgram,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unexpected { actual, expected } => {
                write!(f, "expected token {expected}, but got {actual}")
            }
            Error::UnexpectedTokenInExpr { token } => {
                write!(f, "unexpected token {token} in expression")
            }
            Error::UnexpectedAfterElse { actual } => {
                write!(f, "expected '{{' or 'if' after 'else', but got {actual}")
            }
            Error::MalformedFor { expected, actual } => {
                write!(f, "malformed for loop: expected {expected}, but got {actual}")
            }
            Error::DuplicateModifier { modifier } => {
                write!(f, "modifier {modifier} given more than once")
            }
            Error::EmptyProgram => write!(f, "expected at least one contract"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::tree_tests;

    tree_tests!(
        use parser;

        fn test_simple_expression() {
            let expr = "(1 * 2 + 3) - (1 + 2 * 3)";
            let tree_ok = "
                binary - (1:2)
                  binary + (1:2)
                    binary * (1:2)
                      number 1 (1:2)
                      number 2 (1:6)
                    number 3 (1:10)
                  binary + (1:16)
                    number 1 (1:16)
                    binary * (1:20)
                      number 2 (1:20)
                      number 3 (1:24)
            ";
        }

        fn test_identifier_expr() {
            let expr = "myVar";
            let tree_ok = "ident myVar (1:1)";
        }

        fn test_decimal_literal_expr() {
            let expr = "3.25";
            let tree_ok = "number 3.25 (1:1)";
        }

        fn test_string_literal_expr() {
            let expr = r#""hello world""#;
            let tree_ok = r#"string "hello world" (1:1)"#;
        }

        fn test_escaped_string_literal_expr() {
            let expr = r#""hello\n\"world\"""#;
            let tree_ok = r#"string "hello\n\"world\"" (1:1)"#;
        }

        fn test_boolean_exprs() {
            let expr = "true && false";
            let tree_ok = "
                logical && (1:1)
                  bool true (1:1)
                  bool false (1:9)
            ";
        }

        fn test_precedence_chain() {
            let expr = "a || b & c == d + e * -f";
            let tree_ok = "
                logical || (1:1)
                  ident a (1:1)
                  bitwise & (1:6)
                    ident b (1:6)
                    binary == (1:10)
                      ident c (1:10)
                      binary + (1:15)
                        ident d (1:15)
                        binary * (1:19)
                          ident e (1:19)
                          unary - (1:23)
                            ident f (1:24)
            ";
        }

        fn test_left_associativity() {
            let expr = "a - b - c % d % e";
            let tree_ok = "
                binary - (1:1)
                  binary - (1:1)
                    ident a (1:1)
                    ident b (1:5)
                  binary % (1:9)
                    binary % (1:9)
                      ident c (1:9)
                      ident d (1:13)
                    ident e (1:17)
            ";
        }

        fn test_logical_operators_share_level() {
            let expr = "a && b || c";
            let tree_ok = "
                logical || (1:1)
                  logical && (1:1)
                    ident a (1:1)
                    ident b (1:6)
                  ident c (1:11)
            ";
        }

        fn test_nested_unary() {
            let expr = "!!~x";
            let tree_ok = "
                unary ! (1:1)
                  unary ! (1:2)
                    unary ~ (1:3)
                      ident x (1:4)
            ";
        }

        fn test_ternary() {
            let expr = "a > b ? a : c ? d : e";
            let tree_ok = "
                ternary (1:1)
                  binary > (1:1)
                    ident a (1:1)
                    ident b (1:5)
                  ident a (1:9)
                  ternary (1:13)
                    ident c (1:13)
                    ident d (1:17)
                    ident e (1:21)
            ";
        }

        fn test_postfix_chain() {
            let expr = "a.b[i](x, 1).c";
            let tree_ok = "
                member .c (1:1)
                  call (1:1)
                    index (1:1)
                      member .b (1:1)
                        ident a (1:1)
                      ident i (1:5)
                    ident x (1:8)
                    number 1 (1:11)
            ";
        }

        fn test_tuple_and_grouping() {
            let expr = "((a), (b,), (), (c, d))";
            let tree_ok = "
                tuple (1:1)
                  ident a (1:3)
                  tuple (1:7)
                    ident b (1:8)
                  tuple (1:13)
                  tuple (1:17)
                    ident c (1:18)
                    ident d (1:21)
            ";
        }

        fn test_array_and_object_literals() {
            let expr = "[1, {x: 2, y: []}, {}]";
            let tree_ok = "
                array (1:1)
                  number 1 (1:2)
                  object (1:5)
                    property x
                      number 2 (1:9)
                    property y
                      array (1:15)
                  object (1:20)
            ";
        }

        fn test_unexpected_token_in_expr() {
            let expr = "1 + ;";
            let expected_errors = &["1:5: unexpected token ';' in expression"];
        }

        fn test_trailing_garbage() {
            let expr = "a b";
            let expected_errors = &["1:3: expected token end of input, but got identifier"];
        }

        fn test_contract_members() {
            let program = "
                contract Bank {
                    owner: address storage;
                    balances: mapping(address -> mapping(uint256 -> bool)) storage;
                    history: uint256[] memory;
                    struct Account {
                        id: uint256;
                        flags: mapping(uint8 -> bool);
                    }
                    total: uint256;
                }
            ";
            let tree_ok = "
                contract Bank (2:26)
                  state owner: address storage (3:21)
                  state balances: mapping(address -> mapping(uint256 -> bool)) storage (4:21)
                  state history: uint256[] memory (5:21)
                  state total: uint256 (10:21)
                  struct Account (6:28)
                    field id: uint256
                    field flags: mapping(uint8 -> bool)
            ";
        }

        fn test_function_signature() {
            let program = "
                contract C {
                    def constructor(a: uint256) payable { }
                    def f(x: uint256, y: address = 0) view onlyOwner -> (uint256, bool) { }
                    def g() pure -> uint256 { return 1; }
                }
            ";
            let tree_ok = "
                contract C (2:26)
                  constructor(a: uint256) payable (3:25)
                  function f(x: uint256, y: address) view onlyOwner -> (uint256,bool) (4:25)
                    default y
                      number 0 (4:52)
                  function g() pure -> uint256 (5:25)
                    return (5:47)
                      number 1 (5:54)
            ";
        }

        fn test_duplicate_modifier() {
            let program = "contract C { def f() view pure view { } }";
            let expected_errors = &["1:32: modifier 'view' given more than once"];
        }

        fn test_statements() {
            let program = "
                contract C {
                    def f() {
                        a[i].b = x + 1;
                        foo(1)
                        while x < 10 { break; continue }
                        return
                    }
                }
            ";
            let tree_ok = "
                contract C (2:26)
                  function f() (3:25)
                    assign (4:25)
                      member .b (4:25)
                        index (4:25)
                          ident a (4:25)
                          ident i (4:27)
                      binary + (4:34)
                        ident x (4:34)
                        number 1 (4:38)
                    expr (5:25)
                      call (5:25)
                        ident foo (5:25)
                        number 1 (5:29)
                    while (6:25)
                      binary < (6:31)
                        ident x (6:31)
                        number 10 (6:35)
                      do
                        break (6:40)
                        continue (6:47)
                    return (7:25)
            ";
        }

        fn test_else_if_chain() {
            let program = "
                contract C {
                    def f() {
                        if a { x = 1; } else if b { x = 2; } else { x = 3; }
                    }
                }
            ";
            let tree_ok = "
                contract C (2:26)
                  function f() (3:25)
                    if (4:25)
                      ident a (4:28)
                      then
                        assign (4:32)
                          ident x (4:32)
                          number 1 (4:36)
                      else
                        if (4:46)
                          ident b (4:49)
                          then
                            assign (4:53)
                              ident x (4:53)
                              number 2 (4:57)
                          else
                            assign (4:69)
                              ident x (4:69)
                              number 3 (4:73)
            ";
        }

        fn test_unexpected_after_else() {
            let program = "contract C { def f() { if a { } else while } }";
            let expected_errors = &["1:38: expected '{' or 'if' after 'else', but got 'while'"];
        }

        fn test_for_default_step() {
            let program = "
                contract C {
                    def f() {
                        for i = 0 to 10 { }
                    }
                }
            ";
            let tree_ok = "
                contract C (2:26)
                  function f() (3:25)
                    for (4:25)
                      assign (4:29)
                        ident i (4:29)
                        number 0 (4:33)
                      number 10 (4:38)
                      assign (4:29)
                        ident i (4:29)
                        binary + (4:29)
                          ident i (4:29)
                          number 1 (4:29)
                      do
            ";
        }

        fn test_for_explicit_step() {
            let program = "contract C { def f() { for i = n to m step 2 { g(i) } } }";
            let tree_ok = "
                contract C (1:10)
                  function f() (1:18)
                    for (1:24)
                      assign (1:28)
                        ident i (1:28)
                        ident n (1:32)
                      ident m (1:37)
                      assign (1:28)
                        ident i (1:28)
                        binary + (1:28)
                          ident i (1:28)
                          number 2 (1:44)
                      do
                        expr (1:48)
                          call (1:48)
                            ident g (1:48)
                            ident i (1:50)
            ";
        }

        fn test_for_missing_to() {
            let program = "contract C { def f() { for i = 0 until 10 { } } }";
            let expected_errors = &["1:34: malformed for loop: expected 'to', but got identifier"];
        }

        fn test_for_missing_assign() {
            let program = "contract C { def f() { for i to 10 { } } }";
            let expected_errors = &["1:30: malformed for loop: expected '=' after the loop variable, but got identifier"];
        }

        fn test_begin_end_blocks() {
            let program = "contract C begin def f() begin return end end";
            let tree_ok = "
                contract C (1:10)
                  function f() (1:22)
                    return (1:32)
            ";
        }

        fn test_missing_semicolon_after_state_var() {
            let program = "contract C { x: uint256 }";
            let expected_errors = &["1:25: expected token ';', but got '}'"];
        }

        fn test_empty_program() {
            let program = "  # nothing here\n";
            let expected_errors = &["2:1: expected at least one contract"];
        }

        fn test_multiple_contracts() {
            let program = "contract A { } contract B { }";
            let tree_ok = "
                contract A (1:10)
                contract B (1:25)
            ";
        }
    );

    #[test]
    fn test_nesting_limit() {
        use crate::{error::ResourceError, Error, Limits};

        let limits = Limits {
            max_depth: 16,
            ..Limits::default()
        };
        let deep = format!("{}x{}", "(".repeat(64), ")".repeat(64));
        let error = super::parse_expr(&deep, &mut Vec::new(), &limits).unwrap_err();
        assert_eq!(error, Error::from(ResourceError::NestingTooDeep { limit: 16 }));

        let long_chain = vec!["1"; 64].join(" + ");
        let error = super::parse_expr(&long_chain, &mut Vec::new(), &limits).unwrap_err();
        assert_eq!(error, Error::from(ResourceError::NestingTooDeep { limit: 16 }));

        let shallow = "(((x)))";
        assert!(super::parse_expr(shallow, &mut Vec::new(), &limits).is_ok());
    }

    #[test]
    fn test_source_limit() {
        use crate::{error::ResourceError, Error, Limits};

        let limits = Limits {
            max_source_len: 8,
            ..Limits::default()
        };
        let error =
            super::parse_program("contract C { }", &mut Vec::new(), &limits).unwrap_err();
        let expected = ResourceError::SourceTooLarge { len: 14, limit: 8 };
        assert_eq!(error, Error::from(expected));
    }
}
