use crate::{checker, parser, util::tree, Error, Limits};

/// Formats an error as `line:column: message`, or just the message for
/// errors without a position.
pub fn format_error(error: &Error) -> String {
    match error {
        Error::Lex(e) => format!("{}: {}", e.pos, e.inner),
        Error::Parse(e) => format!("{}: {}", e.pos, e.inner),
        Error::Semantic(e) => format!("{}: {}", e.pos, e.inner),
        Error::Resource(e) => e.to_string(),
    }
}

/// Each variant contains the input.
pub enum Test {
    ParserProgram(&'static str),
    ParserExpr(&'static str),
    CheckerProgram(&'static str),
}

pub enum Assertion {
    TreeOk(&'static str),
    ExpectedErrors(&'static [&'static str]),
}

/// Runs the input through the stages under test. Since every stage stops at
/// its first error, the error list has at most one entry, and the tree is
/// empty if parsing failed.
#[track_caller]
pub fn run_pipeline(test: Test) -> (String, Vec<String>) {
    let tokens_buf = &mut Vec::with_capacity(1024);
    let limits = &Limits::default();

    match test {
        Test::ParserProgram(input) => match parser::parse_program(input, tokens_buf, limits) {
            Ok(program) => (tree::print_program_string(&program), vec![]),
            Err(error) => (String::new(), vec![format_error(&error)]),
        },
        Test::ParserExpr(input) => match parser::parse_expr(input, tokens_buf, limits) {
            Ok(expr) => (tree::print_expr_string(&expr), vec![]),
            Err(error) => (String::new(), vec![format_error(&error)]),
        },
        Test::CheckerProgram(input) => {
            let program = match parser::parse_program(input, tokens_buf, limits) {
                Ok(program) => program,
                Err(error) => return (String::new(), vec![format_error(&error)]),
            };
            let errors = match checker::check(&program) {
                Ok(()) => vec![],
                Err(error) => vec![format_error(&error.into())],
            };
            (tree::print_program_string(&program), errors)
        }
    }
}

#[track_caller]
pub fn run_assertion(
    assertion: Assertion,
    formatted_actual_tree: &str,
    formatted_actual_errors: &[String],
) {
    match assertion {
        Assertion::TreeOk(expected_tree) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim());
        }
        Assertion::ExpectedErrors(expected_errors) => {
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
        }
    }
}

macro_rules! tree_tests {
    (
        use $test_kind:ident;

        $(
            fn $test_name:ident() {
                let $source_kind:ident = $source:expr;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test: crate::util::test_utils::Test =
                    tree_tests!(@@get_test($test_kind, $source_kind), $source);
                let (formatted_actual_tree, formatted_actual_errors) =
                    crate::util::test_utils::run_pipeline(test);
                let ctx = (&formatted_actual_tree, &formatted_actual_errors);
                tree_tests!(@@expand_assertions, ctx, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $ctx:expr, []) => {};
    (@@expand_assertions, $ctx:expr, [
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            tree_tests!(@@assertion, $assertion, $assertion_expected),
            $ctx.0,
            $ctx.1,
        );
        tree_tests!(@@expand_assertions, $ctx, [$($rest_assertions_tt)*]);
    };

    (@@assertion, tree_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_errors, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedErrors($expected)
    };

    (@@get_test(parser, program), $source:expr) => {
        crate::util::test_utils::Test::ParserProgram($source)
    };
    (@@get_test(parser, expr), $source:expr) => {
        crate::util::test_utils::Test::ParserExpr($source)
    };
    (@@get_test(checker, program), $source:expr) => {
        crate::util::test_utils::Test::CheckerProgram($source)
    };
}
pub(crate) use tree_tests;
