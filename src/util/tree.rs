use std::fmt::{Result, Write};

use crate::ast::*;

const INDENT_WIDTH: usize = 2;

pub fn print_program_string(program: &Program) -> String {
    let mut buf = String::with_capacity(1024);
    // Writing into a `String` can't fail.
    let _ = print_program(&mut buf, program);
    buf
}

pub fn print_expr_string(expr: &Expr) -> String {
    let mut buf = String::with_capacity(512);
    let _ = print_expr(&mut buf, 0, expr);
    buf
}

pub fn print_program(w: &mut impl Write, program: &Program) -> Result {
    for contract in &program.contracts {
        print_contract(w, 0, contract)?;
    }
    Ok(())
}

fn print_contract(w: &mut impl Write, i: usize, contract: &ContractDefinition) -> Result {
    sp(w, i)?;
    writeln!(w, "contract {} ({})", contract.name, contract.name.pos)?;
    for var in &contract.state_vars {
        sp(w, i + 1)?;
        write!(w, "state {}: {}", var.name, var.type_name)?;
        match var.storage_location {
            Some(StorageLocation::Memory) => write!(w, " memory")?,
            Some(StorageLocation::Storage) => write!(w, " storage")?,
            None => {}
        }
        writeln!(w, " ({})", var.name.pos)?;
    }
    for def in &contract.structs {
        sp(w, i + 1)?;
        writeln!(w, "struct {} ({})", def.name, def.name.pos)?;
        for field in &def.fields {
            sp(w, i + 2)?;
            writeln!(w, "field {}: {}", field.name, field.type_name)?;
        }
    }
    for function in &contract.functions {
        print_function(w, i + 1, function)?;
    }
    Ok(())
}

fn print_function(w: &mut impl Write, i: usize, function: &FunctionDefinition) -> Result {
    sp(w, i)?;
    if function.is_constructor {
        write!(w, "constructor(")?;
    } else {
        write!(w, "function {}(", function.name)?;
    }
    for (idx, param) in function.parameters.iter().enumerate() {
        if idx > 0 {
            write!(w, ", ")?;
        }
        write!(w, "{}: {}", param.name, param.type_name)?;
    }
    write!(w, ")")?;
    let modifiers = [
        (function.is_payable, "payable"),
        (function.is_view, "view"),
        (function.is_pure, "pure"),
        (function.is_only_owner, "onlyOwner"),
    ];
    for (_, modifier) in modifiers.iter().filter(|(set, _)| *set) {
        write!(w, " {modifier}")?;
    }
    if let Some(ret) = &function.return_type {
        write!(w, " -> {ret}")?;
    }
    writeln!(w, " ({})", function.name.pos)?;

    for param in &function.parameters {
        if let Some(default) = &param.default_value {
            sp(w, i + 1)?;
            writeln!(w, "default {}", param.name)?;
            print_expr(w, i + 2, default)?;
        }
    }
    print_block(w, i + 1, &function.body)
}

fn print_block(w: &mut impl Write, i: usize, block: &[Stmt]) -> Result {
    for stmt in block {
        print_stmt(w, i, stmt)?;
    }
    Ok(())
}

fn print_stmt(w: &mut impl Write, i: usize, stmt: &Stmt) -> Result {
    sp(w, i)?;
    match &stmt.kind {
        StmtKind::Assignment(assignment) => {
            writeln!(w, "assign ({})", stmt.pos)?;
            print_assignment_operands(w, i + 1, assignment)?;
        }
        StmtKind::If {
            condition,
            then_block,
            else_block,
        } => {
            writeln!(w, "if ({})", stmt.pos)?;
            print_expr(w, i + 1, condition)?;
            sp(w, i + 1)?;
            writeln!(w, "then")?;
            print_block(w, i + 2, then_block)?;
            if let Some(else_block) = else_block {
                sp(w, i + 1)?;
                writeln!(w, "else")?;
                print_block(w, i + 2, else_block)?;
            }
        }
        StmtKind::While { condition, body } => {
            writeln!(w, "while ({})", stmt.pos)?;
            print_expr(w, i + 1, condition)?;
            print_do(w, i + 1, body)?;
        }
        StmtKind::For {
            initialization,
            condition,
            increment,
            body,
        } => {
            writeln!(w, "for ({})", stmt.pos)?;
            print_assignment(w, i + 1, initialization)?;
            print_expr(w, i + 1, condition)?;
            print_assignment(w, i + 1, increment)?;
            print_do(w, i + 1, body)?;
        }
        StmtKind::Break => writeln!(w, "break ({})", stmt.pos)?,
        StmtKind::Continue => writeln!(w, "continue ({})", stmt.pos)?,
        StmtKind::Return { expression } => {
            writeln!(w, "return ({})", stmt.pos)?;
            if let Some(expression) = expression {
                print_expr(w, i + 1, expression)?;
            }
        }
        StmtKind::Expression { expression } => {
            writeln!(w, "expr ({})", stmt.pos)?;
            print_expr(w, i + 1, expression)?;
        }
    }
    Ok(())
}

fn print_do(w: &mut impl Write, i: usize, body: &[Stmt]) -> Result {
    sp(w, i)?;
    writeln!(w, "do")?;
    print_block(w, i + 1, body)
}

/// For-loop clauses have no statement of their own, so they take the position
/// of their target.
fn print_assignment(w: &mut impl Write, i: usize, assignment: &Assignment) -> Result {
    sp(w, i)?;
    writeln!(w, "assign ({})", assignment.var_name.pos)?;
    print_assignment_operands(w, i + 1, assignment)
}

fn print_assignment_operands(w: &mut impl Write, i: usize, assignment: &Assignment) -> Result {
    print_expr(w, i, &assignment.var_name)?;
    print_expr(w, i, &assignment.expression)
}

pub fn print_expr(w: &mut impl Write, i: usize, expr: &Expr) -> Result {
    sp(w, i)?;
    let pos = expr.pos;
    match &expr.kind {
        ExprKind::Literal { value } => match value {
            Literal::Number(n) => writeln!(w, "number {n} ({pos})")?,
            Literal::String(s) => writeln!(w, "string {s:?} ({pos})")?,
            Literal::Bool(b) => writeln!(w, "bool {b} ({pos})")?,
        },
        ExprKind::Identifier { name } => writeln!(w, "ident {name} ({pos})")?,
        ExprKind::BinaryOp {
            left,
            operator,
            right,
        } => {
            writeln!(w, "binary {operator} ({pos})")?;
            print_expr(w, i + 1, left)?;
            print_expr(w, i + 1, right)?;
        }
        ExprKind::BitwiseOp {
            left,
            operator,
            right,
        } => {
            writeln!(w, "bitwise {operator} ({pos})")?;
            print_expr(w, i + 1, left)?;
            print_expr(w, i + 1, right)?;
        }
        ExprKind::LogicalOp {
            left,
            operator,
            right,
        } => {
            writeln!(w, "logical {operator} ({pos})")?;
            print_expr(w, i + 1, left)?;
            print_expr(w, i + 1, right)?;
        }
        ExprKind::UnaryOp { operator, operand } => {
            writeln!(w, "unary {operator} ({pos})")?;
            print_expr(w, i + 1, operand)?;
        }
        ExprKind::TernaryOp {
            condition,
            true_branch,
            false_branch,
        } => {
            writeln!(w, "ternary ({pos})")?;
            print_expr(w, i + 1, condition)?;
            print_expr(w, i + 1, true_branch)?;
            print_expr(w, i + 1, false_branch)?;
        }
        ExprKind::MemberAccess { object, member } => {
            writeln!(w, "member .{member} ({pos})")?;
            print_expr(w, i + 1, object)?;
        }
        ExprKind::IndexAccess { object, index } => {
            writeln!(w, "index ({pos})")?;
            print_expr(w, i + 1, object)?;
            print_expr(w, i + 1, index)?;
        }
        ExprKind::FunctionCall { callee, arguments } => {
            writeln!(w, "call ({pos})")?;
            print_expr(w, i + 1, callee)?;
            print_exprs(w, i + 1, arguments)?;
        }
        ExprKind::Tuple { elements } => {
            writeln!(w, "tuple ({pos})")?;
            print_exprs(w, i + 1, elements)?;
        }
        ExprKind::ArrayLiteral { elements } => {
            writeln!(w, "array ({pos})")?;
            print_exprs(w, i + 1, elements)?;
        }
        ExprKind::ObjectLiteral { properties } => {
            writeln!(w, "object ({pos})")?;
            for Property { key, value } in properties {
                sp(w, i + 1)?;
                writeln!(w, "property {key}")?;
                print_expr(w, i + 2, value)?;
            }
        }
    }
    Ok(())
}

fn print_exprs(w: &mut impl Write, i: usize, exprs: &[Expr]) -> Result {
    for expr in exprs {
        print_expr(w, i, expr)?;
    }
    Ok(())
}

fn sp(w: &mut impl Write, i: usize) -> Result {
    write!(w, "{:1$}", "", i * INDENT_WIDTH)
}
