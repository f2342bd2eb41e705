use cypescript::lexer::tokenize;
use cypescript::{execute, execute_with, Parser, RunOptions};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum PrintedLiteral {
    Integer(u32),
    Text(String),
    Boolean(bool),
}

impl PrintedLiteral {
    fn source(&self) -> String {
        match self {
            PrintedLiteral::Integer(n) => n.to_string(),
            PrintedLiteral::Text(s) => format!("\"{}\"", s),
            PrintedLiteral::Boolean(b) => b.to_string(),
        }
    }

    fn expected(&self) -> String {
        match self {
            PrintedLiteral::Integer(n) => n.to_string(),
            PrintedLiteral::Text(s) => s.clone(),
            PrintedLiteral::Boolean(b) => b.to_string(),
        }
    }
}

fn printed_literal() -> impl Strategy<Value = PrintedLiteral> {
    prop_oneof![
        any::<u32>().prop_map(PrintedLiteral::Integer),
        "[a-zA-Z0-9 ,.!?]{0,20}".prop_map(PrintedLiteral::Text),
        any::<bool>().prop_map(PrintedLiteral::Boolean),
    ]
}

proptest! {
    /// A program of println(<literal>) statements prints the literals in order.
    #[test]
    fn println_literals_round_trip(literals in prop::collection::vec(printed_literal(), 1..20)) {
        let source: String = literals
            .iter()
            .map(|literal| format!("println({});\n", literal.source()))
            .collect();
        let expected: Vec<String> = literals.iter().map(PrintedLiteral::expected).collect();

        prop_assert_eq!(execute(&source).unwrap(), expected.join("\n"));
    }

    /// Integer division floors toward negative infinity.
    #[test]
    fn division_is_floor_division(a in -10_000i64..10_000, b in -100i64..100) {
        prop_assume!(b != 0);
        let source = format!("println({} / {});", a, b);
        let expected = (a as f64 / b as f64).floor() as i64;

        prop_assert_eq!(execute(&source).unwrap(), expected.to_string());
    }

    /// A counting for-loop prints 0..N, one per line, and terminates.
    #[test]
    fn bounded_for_loop_prints_each_index(n in 0u32..200) {
        let source = format!("for (let i = 0; i < {}; i = i + 1) {{ println(i); }}", n);
        let expected: Vec<String> = (0..n).map(|i| i.to_string()).collect();

        prop_assert_eq!(execute(&source).unwrap(), expected.join("\n"));
    }

    /// The last of two declarations wins.
    #[test]
    fn redeclaration_keeps_second_value(first in any::<u16>(), second in any::<u16>()) {
        let source = format!("let v = {}; let v = {}; println(v);", first, second);

        prop_assert_eq!(execute(&source).unwrap(), second.to_string());
    }

    /// Undeclared names are reported by name.
    #[test]
    fn undeclared_names_are_reported(name in "[a-z][a-z0-9_]{0,10}") {
        prop_assume!(!matches!(
            name.as_str(),
            "let" | "const" | "var" | "if" | "else" | "while" | "for" | "do"
                | "i32" | "f64" | "string" | "boolean" | "true" | "false"
        ));
        let source = format!("println({});", name);
        let message = execute(&source).unwrap_err().to_string();

        prop_assert_eq!(message, format!("Runtime Error: Undefined variable: {}", name));
    }

    /// No input makes the pipeline panic; with a step limit every run ends.
    #[test]
    fn pipeline_does_not_panic(s in "\\PC*") {
        let tokens = tokenize(&s);
        let _ = Parser::new(tokens).parse();

        let options = RunOptions {
            step_limit: Some(10_000),
            ..RunOptions::default()
        };
        let _ = execute_with(&s, &options);
    }
}
