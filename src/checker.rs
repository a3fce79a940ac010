use std::{collections::HashMap, fmt};

use crate::{
    ast::{
        Assignment, ContractDefinition, Expr, ExprKind, FunctionDefinition, Program, ReturnType,
        Stmt, StmtKind, TypeName,
    },
    token::{Position, Spanned},
    types::well_known,
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Validates every contract in the program, stopping at the first violation.
///
/// The program is only read, never rewritten.
pub fn check(program: &Program) -> Result<()> {
    for contract in &program.contracts {
        let checker = Checker::new(contract)?;
        for function in &contract.functions {
            checker.check_function(function)?;
        }
        log::debug!("checked contract {}", contract.name);
    }
    Ok(())
}

struct Checker<'p> {
    state_vars: HashMap<&'p str, &'p TypeName>,
    has_owner: bool,
}

/// Per-function state while its body is walked.
struct FunctionScope<'p> {
    function: &'p FunctionDefinition,
    /// Whether any loop statement appears directly in the function body. This
    /// is all `break` and `continue` look at, wherever they are nested.
    has_top_level_loop: bool,
    /// Variables introduced by the `for` loops currently being checked.
    loop_vars: Vec<&'p str>,
}

impl<'p> Checker<'p> {
    /// Builds the state variable table, rejecting duplicate names and
    /// unsupported types.
    fn new(contract: &'p ContractDefinition) -> Result<Checker<'p>> {
        let mut state_vars = HashMap::with_capacity(contract.state_vars.len());
        for var in &contract.state_vars {
            check_type(&var.type_name, var.name.pos)?;
            if state_vars
                .insert(var.name.as_str(), &var.type_name)
                .is_some()
            {
                let error = Error::DuplicateStateVariable {
                    name: var.name.name.clone(),
                };
                return Err(var.name.pos.wrap(error));
            }
        }

        let has_owner = state_vars
            .get(well_known::OWNER)
            .is_some_and(|ty| ty.is_elementary(well_known::ADDRESS));

        Ok(Checker {
            state_vars,
            has_owner,
        })
    }

    fn check_function(&self, function: &'p FunctionDefinition) -> Result<()> {
        let pos = function.name.pos;
        let name = || function.name.name.clone();

        if function.is_constructor && function.return_type.is_some() {
            return Err(pos.wrap(Error::ConstructorWithReturnType));
        }
        if function.is_only_owner && !self.has_owner {
            return Err(pos.wrap(Error::MissingOwner { function: name() }));
        }
        if function.is_payable && (function.is_view || function.is_pure) {
            return Err(pos.wrap(Error::MutabilityConflict { function: name() }));
        }

        for param in &function.parameters {
            check_type(&param.type_name, param.name.pos)?;
            if let Some(default) = &param.default_value {
                check_expr(default)?;
            }
        }

        let mut scope = FunctionScope {
            function,
            has_top_level_loop: function.body.iter().any(|stmt| stmt.kind.is_loop()),
            loop_vars: Vec::new(),
        };
        self.check_block(&mut scope, &function.body)
    }

    fn check_block(&self, scope: &mut FunctionScope<'p>, block: &'p [Stmt]) -> Result<()> {
        block
            .iter()
            .try_for_each(|stmt| self.check_stmt(scope, stmt))
    }

    fn check_stmt(&self, scope: &mut FunctionScope<'p>, stmt: &'p Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Assignment(assignment) => self.check_assignment(scope, assignment),
            StmtKind::If {
                condition,
                then_block,
                else_block,
            } => {
                check_expr(condition)?;
                self.check_block(scope, then_block)?;
                if let Some(else_block) = else_block {
                    self.check_block(scope, else_block)?;
                }
                Ok(())
            }
            StmtKind::While { condition, body } => {
                check_expr(condition)?;
                self.check_block(scope, body)
            }
            StmtKind::For {
                initialization,
                condition,
                increment,
                body,
            } => {
                // The loop variable is declared by the initialization itself.
                let loop_var = root_name(&initialization.var_name)?;
                check_expr(&initialization.expression)?;
                scope.loop_vars.push(loop_var);

                check_expr(condition)?;
                self.check_assignment(scope, increment)?;
                self.check_block(scope, body)?;

                scope.loop_vars.pop();
                Ok(())
            }
            StmtKind::Break => {
                if scope.has_top_level_loop {
                    Ok(())
                } else {
                    Err(stmt.pos.wrap(Error::BreakOutsideLoop))
                }
            }
            StmtKind::Continue => {
                if scope.has_top_level_loop {
                    Ok(())
                } else {
                    Err(stmt.pos.wrap(Error::ContinueOutsideLoop))
                }
            }
            StmtKind::Return { expression } => {
                let Some(expression) = expression else {
                    return Ok(());
                };
                let function = scope.function;
                let Some(return_type) = &function.return_type else {
                    let error = Error::UnexpectedReturnValue {
                        function: function.name.name.clone(),
                    };
                    return Err(stmt.pos.wrap(error));
                };
                check_expr(expression)?;
                check_return_arity(return_type, expression)
            }
            StmtKind::Expression { expression } => {
                if !matches!(expression.kind, ExprKind::FunctionCall { .. }) {
                    let error = Error::UnsupportedStatement {
                        kind: expression.kind.name(),
                    };
                    return Err(stmt.pos.wrap(error));
                }
                check_expr(expression)
            }
        }
    }

    fn check_assignment(&self, scope: &FunctionScope<'p>, assignment: &'p Assignment) -> Result<()> {
        let target = &assignment.var_name;
        let name = root_name(target)?;
        if !self.state_vars.contains_key(name) && !scope.loop_vars.contains(&name) {
            let error = Error::UndefinedVariable { name: name.into() };
            return Err(target.pos.wrap(error));
        }
        check_target_indices(target)?;
        check_expr(&assignment.expression)
    }
}

/// Resolves an assignment target (`a`, `a.b`, `a[i]`, ...) to the name of
/// the variable at its root.
fn root_name(target: &Expr) -> Result<&str> {
    match &target.kind {
        ExprKind::Identifier { name } => Ok(name),
        ExprKind::MemberAccess { object, .. } | ExprKind::IndexAccess { object, .. } => {
            root_name(object)
        }
        other => {
            let error = Error::InvalidAssignmentTarget { kind: other.name() };
            Err(target.pos.wrap(error))
        }
    }
}

fn check_target_indices(target: &Expr) -> Result<()> {
    match &target.kind {
        ExprKind::MemberAccess { object, .. } => check_target_indices(object),
        ExprKind::IndexAccess { object, index } => {
            check_expr(index)?;
            check_target_indices(object)
        }
        _ => Ok(()),
    }
}

fn check_return_arity(return_type: &ReturnType, value: &Expr) -> Result<()> {
    let ExprKind::Tuple { elements } = &value.kind else {
        return Ok(());
    };
    let expected = match return_type {
        ReturnType::Tuple(types) => types.len(),
        ReturnType::Single(_) if elements.len() <= 1 => return Ok(()),
        ReturnType::Single(_) => 1,
    };
    if elements.len() == expected {
        return Ok(());
    }
    let error = Error::ReturnArityMismatch {
        expected,
        actual: elements.len(),
    };
    Err(value.pos.wrap(error))
}

fn check_type(type_name: &TypeName, pos: Position) -> Result<()> {
    if type_name.is_supported() {
        Ok(())
    } else {
        let error = Error::UnsupportedType {
            type_name: type_name.clone(),
        };
        Err(pos.wrap(error))
    }
}

/// Walks every sub-expression. Identifiers are not resolved here, only
/// assignment targets are.
fn check_expr(expr: &Expr) -> Result<()> {
    match &expr.kind {
        ExprKind::Literal { .. } | ExprKind::Identifier { .. } => Ok(()),
        ExprKind::BinaryOp { left, right, .. }
        | ExprKind::BitwiseOp { left, right, .. }
        | ExprKind::LogicalOp { left, right, .. } => {
            check_expr(left)?;
            check_expr(right)
        }
        ExprKind::UnaryOp { operand, .. } => check_expr(operand),
        ExprKind::TernaryOp {
            condition,
            true_branch,
            false_branch,
        } => {
            check_expr(condition)?;
            check_expr(true_branch)?;
            check_expr(false_branch)
        }
        ExprKind::MemberAccess { object, .. } => check_expr(object),
        ExprKind::IndexAccess { object, index } => {
            check_expr(object)?;
            check_expr(index)
        }
        ExprKind::FunctionCall { callee, arguments } => {
            match &callee.kind {
                ExprKind::Identifier { .. } => {}
                ExprKind::MemberAccess { object, .. } => check_expr(object)?,
                other => {
                    let error = Error::UnsupportedExpression { kind: other.name() };
                    return Err(callee.pos.wrap(error));
                }
            }
            arguments.iter().try_for_each(check_expr)
        }
        ExprKind::Tuple { elements } => {
            if elements.is_empty() {
                return Err(expr.pos.wrap(Error::EmptyTuple));
            }
            elements.iter().try_for_each(check_expr)
        }
        ExprKind::ArrayLiteral { elements } => elements.iter().try_for_each(check_expr),
        ExprKind::ObjectLiteral { properties } => properties
            .iter()
            .try_for_each(|property| check_expr(&property.value)),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    DuplicateStateVariable { name: Box<str> },
    ConstructorWithReturnType,
    MissingOwner { function: Box<str> },
    MutabilityConflict { function: Box<str> },
    UnsupportedType { type_name: TypeName },
    UndefinedVariable { name: Box<str> },
    InvalidAssignmentTarget { kind: &'static str },
    BreakOutsideLoop,
    ContinueOutsideLoop,
    UnexpectedReturnValue { function: Box<str> },
    ReturnArityMismatch { expected: usize, actual: usize },
    UnsupportedStatement { kind: &'static str },
    UnsupportedExpression { kind: &'static str },
    EmptyTuple,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateStateVariable { name } => {
                write!(f, "duplicate state variable '{name}'")
            }
            Error::ConstructorWithReturnType => write!(f, "constructor cannot have a return type"),
            Error::MissingOwner { function } => write!(
                f,
                "function '{function}' is onlyOwner, but no 'owner: address' variable found"
            ),
            Error::MutabilityConflict { function } => write!(
                f,
                "function '{function}' cannot be payable and view/pure at the same time"
            ),
            Error::UnsupportedType { type_name } => {
                write!(f, "unknown or unsupported type '{type_name}'")
            }
            Error::UndefinedVariable { name } => write!(f, "undefined variable '{name}'"),
            Error::InvalidAssignmentTarget { kind } => write!(f, "cannot assign to {kind}"),
            Error::BreakOutsideLoop => write!(f, "'break' used outside of a loop"),
            Error::ContinueOutsideLoop => write!(f, "'continue' used outside of a loop"),
            Error::UnexpectedReturnValue { function } => write!(
                f,
                "function '{function}' does not expect a return value, but return expression found"
            ),
            Error::ReturnArityMismatch { expected, actual } => write!(
                f,
                "return type has {expected} element(s), but {actual} were returned"
            ),
            Error::UnsupportedStatement { kind } => {
                write!(f, "unsupported statement: {kind} (only calls may stand alone)")
            }
            Error::UnsupportedExpression { kind } => {
                write!(f, "unsupported expression: {kind} is not callable")
            }
            Error::EmptyTuple => write!(f, "tuples must have at least one element"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::tree_tests;

    tree_tests!(
        use checker;

        fn test_duplicate_state_variable() {
            let program = "contract C { x: uint256; y: bool; x: address; }";
            let expected_errors = &["1:35: duplicate state variable 'x'"];
        }

        fn test_constructor_with_return_type() {
            let program = "contract C { def constructor() -> uint256 { } }";
            let expected_errors = &["1:18: constructor cannot have a return type"];
        }

        fn test_only_owner_without_owner() {
            let program = "contract C { x: uint256; def f() onlyOwner { } }";
            let expected_errors = &["1:30: function 'f' is onlyOwner, but no 'owner: address' variable found"];
        }

        fn test_only_owner_with_wrongly_typed_owner() {
            let program = "contract C { owner: uint256; def f() onlyOwner { } }";
            let expected_errors = &["1:34: function 'f' is onlyOwner, but no 'owner: address' variable found"];
        }

        fn test_only_owner_with_owner() {
            let program = "contract C { owner: address; def f() onlyOwner { owner = 0 } }";
            let tree_ok = "
                contract C (1:10)
                  state owner: address (1:14)
                  function f() onlyOwner (1:34)
                    assign (1:50)
                      ident owner (1:50)
                      number 0 (1:58)
            ";
        }

        fn test_payable_view_conflict() {
            let program = "contract C { def f() payable view { } }";
            let expected_errors = &["1:18: function 'f' cannot be payable and view/pure at the same time"];
        }

        fn test_payable_pure_conflict() {
            let program = "contract C { def f() pure payable { } }";
            let expected_errors = &["1:18: function 'f' cannot be payable and view/pure at the same time"];
        }

        fn test_unsupported_parameter_type() {
            let program = "contract C { def f(a: uint256, p: Point) { } }";
            let expected_errors = &["1:32: unknown or unsupported type 'Point'"];
        }

        fn test_unsupported_state_type() {
            let program = "contract C { xs: uint256[][]; }";
            let expected_errors = &["1:14: unknown or unsupported type 'uint256[][]'"];
        }

        fn test_mapping_types_only_checked_for_shape() {
            let program = "
                contract C {
                    m: mapping(Anything -> mapping(address -> Whatever[]));
                    def f(m2: mapping(address -> uint256)) { }
                }
            ";
            let expected_errors = &[];
        }

        fn test_undefined_variable() {
            let program = "contract C { x: uint256; def f() { y = 1; } }";
            let expected_errors = &["1:36: undefined variable 'y'"];
        }

        fn test_nested_assignment_targets() {
            let program = "contract C { m: mapping(address -> uint256); def f(a: address) { m[a] = 1; m.x[a].y = 2 } }";
            let expected_errors = &[];
        }

        fn test_parameters_are_not_assignable() {
            let program = "contract C { def f(a: uint256) { a = 1 } }";
            let expected_errors = &["1:34: undefined variable 'a'"];
        }

        fn test_invalid_assignment_target() {
            let program = "contract C { def f() { g().x = 1 } }";
            let expected_errors = &["1:24: cannot assign to FunctionCall"];
        }

        fn test_for_loop_variable_scope() {
            let program = "
                contract C {
                    total: uint256;
                    def f() {
                        for i = 0 to 10 step 2 { total = total + i; i = i + 1 }
                    }
                }
            ";
            let expected_errors = &[];
        }

        fn test_for_loop_variable_out_of_scope() {
            let program = "contract C { def f() { for i = 0 to 3 { } i = 1 } }";
            let expected_errors = &["1:43: undefined variable 'i'"];
        }

        fn test_break_outside_loop() {
            let program = "contract C { def f() { break } }";
            let expected_errors = &["1:24: 'break' used outside of a loop"];
        }

        fn test_continue_outside_loop() {
            let program = "contract C { def f() { if true { continue } } }";
            let expected_errors = &["1:34: 'continue' used outside of a loop"];
        }

        fn test_break_check_is_shallow() {
            let program = "contract C { def f() { if true { break } while true { } } }";
            let expected_errors = &[];
        }

        fn test_return_value_without_return_type() {
            let program = "contract C { def f() { return 1 } }";
            let expected_errors = &["1:24: function 'f' does not expect a return value, but return expression found"];
        }

        fn test_bare_return_is_always_allowed() {
            let program = "contract C { def f() -> uint256 { return } def g() { return; } }";
            let expected_errors = &[];
        }

        fn test_tuple_return_arity() {
            let program = "contract C { def f() -> (uint256, bool) { return (1, true, 2) } }";
            let expected_errors = &["1:50: return type has 2 element(s), but 3 were returned"];
        }

        fn test_tuple_returned_from_scalar() {
            let program = "contract C { def f() -> uint256 { return (1, 2) } }";
            let expected_errors = &["1:42: return type has 1 element(s), but 2 were returned"];
        }

        fn test_matching_returns() {
            let program = "contract C { def f() -> (uint256, bool) { return (1, true) } def g() -> uint256 { return (1) } }";
            let expected_errors = &[];
        }

        fn test_empty_tuple() {
            let program = "contract C { def f() { g(()) } }";
            let expected_errors = &["1:26: tuples must have at least one element"];
        }

        fn test_empty_array_literal_is_allowed() {
            let program = "contract C { def f() { g([], {a: [1, 2]}) } }";
            let expected_errors = &[];
        }

        fn test_expression_statement_must_be_call() {
            let program = "contract C { def f() { 1 + 2 } }";
            let expected_errors = &["1:24: unsupported statement: BinaryOp (only calls may stand alone)"];
        }

        fn test_callee_must_be_name() {
            let program = "contract C { def f() { x[0](1) } }";
            let expected_errors = &["1:24: unsupported expression: IndexAccess is not callable"];
        }

        fn test_default_values_are_checked() {
            let program = "contract C { def f(a: uint256 = ()) { } }";
            let expected_errors = &["1:33: tuples must have at least one element"];
        }

        fn test_first_error_wins() {
            let program = "
                contract A { x: uint256; x: uint256; }
                contract B { def f() payable view { } }
            ";
            let expected_errors = &["2:42: duplicate state variable 'x'"];
        }
    );
}
