mod common;

#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;

    use rox::ast_printer::AstPrinter;
    use rox::error::LoxError;
    use rox::expr::{BinaryOp, Expr, LiteralValue};
    use rox::parser::Parser;
    use rox::scanner::Scanner;
    use rox::stmt::Stmt;
    use rox::token::Token;

    use crate::common;

    fn tokens(source: &str) -> Vec<Token<'_>> {
        Scanner::new(source)
            .collect::<Result<Vec<_>, _>>()
            .expect("source should scan cleanly")
    }

    fn print_expression(source: &str) -> String {
        let tokens = tokens(source);
        let expr: Expr = Parser::new(&tokens)
            .parse_expression()
            .expect("expression should parse");

        AstPrinter.print(&expr)
    }

    fn parse_errors(source: &str) -> Vec<LoxError> {
        let tokens = tokens(source);

        match Parser::new(&tokens).parse() {
            Ok(statements) => panic!("expected errors, parsed {:?}", statements),
            Err(errors) => errors,
        }
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(print_expression("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(print_expression("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
        assert_eq!(print_expression("-1.5 < 2 == !false"), "(== (< (- 1.5) 2.0) (! false))");
        assert_eq!(print_expression("a or b and c"), "(or a (and b c))");
    }

    #[test]
    fn test_ternary_is_right_associative() {
        assert_eq!(print_expression("a ? 1 : b ? 2 : 3"), "(?: a 1.0 (?: b 2.0 3.0))");
    }

    #[test]
    fn test_calls_properties_and_assignment() {
        assert_eq!(print_expression("f(1, g())"), "(call f 1.0 (call g))");
        assert_eq!(print_expression("a.b.c = 1"), "(= (. (. a b) c) 1.0)");
        assert_eq!(print_expression("x = y = nil"), "(= x (= y nil))");
        assert_eq!(print_expression("fun (a, b) { return a; }"), "(fun (a b) ...)");
    }

    #[test]
    fn test_invalid_assignment_target() {
        let tokens = tokens("1 + 2 = 3");
        let error: LoxError = Parser::new(&tokens)
            .parse_expression()
            .expect_err("assignment to a sum must fail");

        assert!(error.to_string().contains("Invalid assignment target"));
    }

    #[test]
    fn test_for_loop_is_desugared_to_while() {
        let statements: Vec<Stmt> = common::parse("for (var i = 0; i < 3; i = i + 1) print i;");

        assert_eq!(statements.len(), 1);

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected a block, got {:?}", statements[0]);
        };

        assert!(matches!(outer[0], Stmt::Var { .. }));

        let Stmt::While { condition, body } = &outer[1] else {
            panic!("expected a while loop, got {:?}", outer[1]);
        };

        assert!(matches!(
            condition,
            Expr::Binary {
                operator: BinaryOp::Less,
                ..
            }
        ));

        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected the body and increment in a block");
        };

        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_for_loop_without_clauses() {
        let statements: Vec<Stmt> = common::parse("for (;;) print 1;");

        let Stmt::While { condition, body } = &statements[0] else {
            panic!("expected a bare while loop, got {:?}", statements[0]);
        };

        assert!(matches!(
            condition,
            Expr::Literal {
                value: LiteralValue::True,
                ..
            }
        ));
        assert!(matches!(body.as_ref(), Stmt::Print(_)));
    }

    #[test]
    fn test_class_declaration() {
        let statements: Vec<Stmt> = common::parse(
            "class B < A { init(x) { this.x = x; } get() { return this.x; } class make() { return B(1); } }",
        );

        let Stmt::Class(decl) = &statements[0] else {
            panic!("expected a class, got {:?}", statements[0]);
        };

        assert_eq!(decl.name.name, "B");
        assert!(matches!(&decl.superclass, Some(Expr::Variable { name, .. }) if name.name == "A"));

        let methods: Vec<&str> = decl.methods.iter().map(|m| m.name()).collect();
        assert_eq!(methods, vec!["init", "get"]);
        assert_eq!(decl.methods[0].arity(), 1);

        let class_methods: Vec<&str> = decl.class_methods.iter().map(|m| m.name()).collect();
        assert_eq!(class_methods, vec!["make"]);
    }

    #[test]
    fn test_fun_statement_versus_lambda_expression() {
        let statements: Vec<Stmt> = common::parse("fun named() {} fun () {};");

        assert!(matches!(&statements[0], Stmt::Function(decl) if decl.name() == "named"));
        assert!(matches!(&statements[1], Stmt::Expression(Expr::Lambda(decl)) if decl.name.is_none()));
    }

    #[test]
    fn test_every_statement_error_is_collected() {
        let errors: Vec<LoxError> = parse_errors("var = 1;\nprint 2;\nprint (3;\nvar ok = 4;");

        assert_eq!(errors.len(), 2, "errors: {:?}", errors);
        assert_eq!(errors[0].line(), Some(1));
        assert_eq!(errors[1].line(), Some(3));
        assert!(errors.iter().all(LoxError::is_static));
    }

    #[test]
    fn test_error_inside_block_is_reported_once() {
        let errors: Vec<LoxError> = parse_errors("{ var = 1 print 2; } print 3;");

        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Expected variable name, found '='"
        );
    }

    #[test]
    fn test_block_keeps_parsing_after_an_error() {
        let errors: Vec<LoxError> =
            parse_errors("fun f() {\n  var = 1;\n  print 2;\n  print (;\n}\nprint f;");

        let lines: Vec<Option<usize>> = errors.iter().map(LoxError::line).collect();
        assert_eq!(lines, vec![Some(2), Some(4)]);
    }

    #[test]
    fn test_too_many_arguments() {
        let arguments: Vec<String> = (0..256).map(|n| n.to_string()).collect();
        let source: String = format!("f({});", arguments.join(", "));

        let errors: Vec<LoxError> = parse_errors(&source);

        assert!(errors[0].to_string().contains("more than 255 arguments"));
    }

    #[test]
    fn test_missing_expression_names_the_token() {
        let errors: Vec<LoxError> = parse_errors("print ;");

        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Expected expression, found ';'"
        );
    }
}
