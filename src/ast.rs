// program ::= contract+
// contract ::= 'contract' ID '{' (state_var | function | struct)* '}'
// state_var ::= ID ':' type ['memory' | 'storage'] ';'
// type ::= 'mapping' '(' ID '->' (type_mapping | ID) ')'
//        | ID ('[' ']')*
// function ::= 'def' ID '(' [param (',' param)*] ')' modifier* ['->' return_ty] block
// param ::= ID ':' type ['=' expr]
// modifier ::= 'payable' | 'view' | 'pure' | 'onlyOwner'
// return_ty ::= ID | '(' [ID (',' ID)*] ')'
// struct ::= 'struct' ID '{' (ID ':' type ';')* '}'
// block ::= '{' stmt* '}'
// stmt ::= 'if' expr block ['else' (block | if_stmt)]
//        | 'while' expr block
//        | 'for' ID '=' expr 'to' expr ['step' expr] block
//        | 'break' [';'] | 'continue' [';']
//        | 'return' [expr] [';']
//        | expr ['=' expr] [';']
// expr ::= logical ['?' expr ':' expr]
// logical ::= bitwise (('&&' | '||') bitwise)*
// bitwise ::= comparison (('&' | '|' | '^') comparison)*
// comparison ::= additive (('<' | '>' | '==' | '!=' | '<=' | '>=') additive)*
// additive ::= multiplicative (('+' | '-') multiplicative)*
// multiplicative ::= unary (('*' | '/' | '%') unary)*
// unary ::= ('!' | '-' | '~') unary | primary
// primary ::= NUMBER | STRING | 'true' | 'false'
//           | '[' [expr (',' expr)*] ']'
//           | '{' [ID ':' expr (',' ID ':' expr)*] '}'
//           | ID ('.' ID | '[' expr ']' | '(' [expr (',' expr)*] ')')*
//           | '(' expr ')'
//           | '(' [expr (',' expr)* [',']] ')'

use std::fmt;

use serde::Serialize;

use crate::token::Position;

/// Name of the function which acts as the contract constructor.
pub const CONSTRUCTOR: &str = "constructor";

#[derive(Debug, PartialEq, Default, Serialize)]
pub struct Program {
    pub contracts: Vec<ContractDefinition>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDefinition {
    pub name: Ident,
    pub state_vars: Vec<VariableDeclaration>,
    pub functions: Vec<FunctionDefinition>,
    pub structs: Vec<StructDefinition>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDeclaration {
    pub name: Ident,
    pub type_name: TypeName,
    pub storage_location: Option<StorageLocation>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
    Memory,
    Storage,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    pub name: Ident,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<ReturnType>,
    pub is_constructor: bool,
    pub is_payable: bool,
    pub is_view: bool,
    pub is_pure: bool,
    pub is_only_owner: bool,
    pub body: Vec<Stmt>,
}

impl FunctionDefinition {
    /// Parameter types in declaration order, as written in signatures.
    pub fn parameter_types(&self) -> impl Iterator<Item = &TypeName> {
        self.parameters.iter().map(|p| &p.type_name)
    }
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: Ident,
    pub type_name: TypeName,
    pub default_value: Option<Expr>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReturnType {
    Single(Box<str>),
    Tuple(Vec<Box<str>>),
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Single(ty) => f.write_str(ty),
            ReturnType::Tuple(types) => write!(f, "({})", types.join(",")),
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct StructDefinition {
    pub name: Ident,
    pub fields: Vec<StructField>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct StructField {
    pub name: Ident,
    #[serde(rename = "type")]
    pub type_name: TypeName,
}

/// A type as written in the source.
///
/// Serializes (and displays) to the string encoding used by signatures and
/// the ABI: `uint256`, `address[]`, `mapping(address -> uint256)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeName {
    Elementary(Box<str>),
    Array(Box<TypeName>),
    Mapping {
        key: Box<str>,
        value: Box<TypeName>,
    },
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Elementary(name) => f.write_str(name),
            TypeName::Array(element) => write!(f, "{element}[]"),
            TypeName::Mapping { key, value } => write!(f, "mapping({key} -> {value})"),
        }
    }
}

impl Serialize for TypeName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Stmt {
    #[serde(flatten)]
    pub kind: StmtKind,
    pub pos: Position,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum StmtKind {
    #[serde(rename = "VariableAssignment")]
    Assignment(Assignment),
    #[serde(rename = "IfStatement", rename_all = "camelCase")]
    If {
        condition: Expr,
        then_block: Vec<Stmt>,
        else_block: Option<Vec<Stmt>>,
    },
    #[serde(rename = "WhileStatement")]
    While { condition: Expr, body: Vec<Stmt> },
    /// Always normalized to `initialization; while condition { body; increment }`
    /// shape, whichever surface form declared it.
    #[serde(rename = "ForStatement")]
    For {
        initialization: Assignment,
        condition: Expr,
        increment: Assignment,
        body: Vec<Stmt>,
    },
    #[serde(rename = "BreakStatement")]
    Break,
    #[serde(rename = "ContinueStatement")]
    Continue,
    #[serde(rename = "ReturnStatement")]
    Return { expression: Option<Expr> },
    #[serde(rename = "ExpressionStatement")]
    Expression { expression: Expr },
}

impl StmtKind {
    pub fn is_loop(&self) -> bool {
        matches!(self, StmtKind::While { .. } | StmtKind::For { .. })
    }
}

/// `target = value`, where the target is an identifier, member access or
/// index access expression.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub var_name: Expr,
    pub expression: Expr,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Expr {
    #[serde(flatten)]
    pub kind: ExprKind,
    pub pos: Position,
}

impl Expr {
    pub fn new(kind: ExprKind, pos: Position) -> Expr {
        Expr { kind, pos }
    }
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ExprKind {
    Literal {
        value: Literal,
    },
    Identifier {
        name: Box<str>,
    },
    BinaryOp {
        left: Box<Expr>,
        operator: BinaryOperator,
        right: Box<Expr>,
    },
    UnaryOp {
        operator: UnaryOperator,
        operand: Box<Expr>,
    },
    #[serde(rename_all = "camelCase")]
    TernaryOp {
        condition: Box<Expr>,
        true_branch: Box<Expr>,
        false_branch: Box<Expr>,
    },
    BitwiseOp {
        left: Box<Expr>,
        operator: BitwiseOperator,
        right: Box<Expr>,
    },
    LogicalOp {
        left: Box<Expr>,
        operator: LogicalOperator,
        right: Box<Expr>,
    },
    MemberAccess {
        object: Box<Expr>,
        member: Box<str>,
    },
    IndexAccess {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    FunctionCall {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Tuple {
        elements: Vec<Expr>,
    },
    ArrayLiteral {
        elements: Vec<Expr>,
    },
    ObjectLiteral {
        properties: Vec<Property>,
    },
}

impl ExprKind {
    /// The node name, as used for the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Literal { .. } => "Literal",
            ExprKind::Identifier { .. } => "Identifier",
            ExprKind::BinaryOp { .. } => "BinaryOp",
            ExprKind::UnaryOp { .. } => "UnaryOp",
            ExprKind::TernaryOp { .. } => "TernaryOp",
            ExprKind::BitwiseOp { .. } => "BitwiseOp",
            ExprKind::LogicalOp { .. } => "LogicalOp",
            ExprKind::MemberAccess { .. } => "MemberAccess",
            ExprKind::IndexAccess { .. } => "IndexAccess",
            ExprKind::FunctionCall { .. } => "FunctionCall",
            ExprKind::Tuple { .. } => "Tuple",
            ExprKind::ArrayLiteral { .. } => "ArrayLiteral",
            ExprKind::ObjectLiteral { .. } => "ObjectLiteral",
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Number(Box<str>),
    String(Box<str>),
    Bool(bool),
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Property {
    pub key: Box<str>,
    pub value: Expr,
}

macro_rules! operators {
    ($(
        $name:ident {
            $($variant:ident => $symbol:literal),* $(,)?
        }
    )*) => {
        $(
            #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
            pub enum $name {
                $(#[serde(rename = $symbol)] $variant),*
            }

            impl $name {
                pub fn symbol(self) -> &'static str {
                    match self {
                        $($name::$variant => $symbol),*
                    }
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.symbol())
                }
            }
        )*
    };
}

operators! {
    BinaryOperator {
        Add => "+",
        Sub => "-",
        Mul => "*",
        Div => "/",
        Rem => "%",
        Lt => "<",
        Gt => ">",
        Eq => "==",
        Ne => "!=",
        Le => "<=",
        Ge => ">=",
    }
    UnaryOperator {
        Not => "!",
        Neg => "-",
        BitNot => "~",
    }
    BitwiseOperator {
        And => "&",
        Or => "|",
        Xor => "^",
    }
    LogicalOperator {
        And => "&&",
        Or => "||",
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Ident {
    pub name: Box<str>,
    pub pos: Position,
}

impl Ident {
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
