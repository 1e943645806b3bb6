mod common;

#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;

    use rox::error::LoxError;
    use rox::expr::Expr;
    use rox::resolver::Resolver;
    use rox::stmt::Stmt;

    use crate::common;

    /// Depth recorded for each `print <name>` / `print this` / `print <name> = ...`,
    /// in source order.
    fn print_depths(statements: &[Stmt]) -> Vec<Option<usize>> {
        let mut depths: Vec<Option<usize>> = Vec::new();
        collect(statements, &mut depths);
        depths
    }

    fn collect(statements: &[Stmt], depths: &mut Vec<Option<usize>>) {
        for stmt in statements {
            match stmt {
                Stmt::Print(expr) => match expr {
                    Expr::Variable { depth, .. }
                    | Expr::Assign { depth, .. }
                    | Expr::This { depth, .. } => depths.push(depth.get()),
                    _ => {}
                },
                Stmt::Block(body) => collect(body, depths),
                Stmt::Function(decl) => collect(&decl.body, depths),
                Stmt::Class(decl) => {
                    for method in decl.methods.iter().chain(&decl.class_methods) {
                        collect(&method.body, depths);
                    }
                }
                Stmt::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    collect(std::slice::from_ref(then_branch.as_ref()), depths);
                    if let Some(else_branch) = else_branch {
                        collect(std::slice::from_ref(else_branch.as_ref()), depths);
                    }
                }
                Stmt::While { body, .. } => collect(std::slice::from_ref(body.as_ref()), depths),
                _ => {}
            }
        }
    }

    fn resolve(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
        let statements: Vec<Stmt> = common::parse(source);
        let errors: Vec<LoxError> = Resolver::new().resolve(&statements);
        (statements, errors)
    }

    fn resolve_ok(source: &str) -> Vec<Option<usize>> {
        let (statements, errors) = resolve(source);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        print_depths(&statements)
    }

    fn messages(source: &str) -> Vec<String> {
        resolve(source).1.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_globals_stay_unresolved() {
        assert_eq!(resolve_ok("var a = 1; print a; print undefined;"), vec![None, None]);
    }

    #[test]
    fn test_block_depths() {
        let depths = resolve_ok(
            "{ var a = 1; print a; { var b = 2; print a; print b; { print a; } } }",
        );

        assert_eq!(depths, vec![Some(0), Some(1), Some(0), Some(2)]);
    }

    #[test]
    fn test_shadowing_resolves_innermost() {
        let depths = resolve_ok("{ var a = 1; { var a = 2; print a; } print a; }");

        assert_eq!(depths, vec![Some(0), Some(0)]);
    }

    #[test]
    fn test_function_parameters_and_body_are_separate_scopes() {
        let depths = resolve_ok("fun f(x) { var y = x; print y; print x; print f; }");

        // `f` itself was declared at top level, so it stays global.
        assert_eq!(depths, vec![Some(0), Some(1), None]);
    }

    #[test]
    fn test_closure_captures_enclosing_body() {
        let depths = resolve_ok(
            "fun outer(p) { var c = 0; fun inner() { print c; print p; print inner; } }",
        );

        assert_eq!(depths, vec![Some(2), Some(3), Some(2)]);
    }

    #[test]
    fn test_this_sits_outside_parameters() {
        let depths = resolve_ok("class A { m(x) { print this; { print this; } } }");

        assert_eq!(depths, vec![Some(2), Some(3)]);
    }

    #[test]
    fn test_assignment_depth() {
        let depths = resolve_ok("{ var a; fun f() { print a = 3; } }");

        assert_eq!(depths, vec![Some(2)]);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let source: &str = "{ var a = 1; fun f(b) { { print a; print b; } } class C { m() { print this; } } }";

        let first: Vec<Option<usize>> = resolve_ok(source);
        let second: Vec<Option<usize>> = resolve_ok(source);
        assert_eq!(first, second);

        // Re-resolving the same tree leaves every depth unchanged.
        let (statements, errors) = resolve(source);
        assert!(errors.is_empty());
        let before: Vec<Option<usize>> = print_depths(&statements);
        assert!(Resolver::new().resolve(&statements).is_empty());
        assert_eq!(print_depths(&statements), before);
    }

    #[test]
    fn test_class_context_restored_after_nested_class() {
        let depths = resolve_ok(
            "class A {} class B < A { m() { class C { n() { print this; } } print this; } }",
        );

        assert_eq!(depths, vec![Some(2), Some(2)]);

        // Leaving both classes restores the top-level context.
        assert_eq!(
            messages("class A {} class B < A { m() { class C {} } } print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn test_top_level_return() {
        assert_eq!(
            messages("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_initializer_cannot_return_a_value() {
        let errors = messages("class A {\n init() { return 1; }\n}");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("[line 2] Error at 'return': Can't return a value from an initializer"));

        // A bare `return` is fine.
        assert!(messages("class A { init() { return; } }").is_empty());
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            messages("print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(messages("fun f() { return this; }").len(), 1);
    }

    #[test]
    fn test_this_in_unbound_method() {
        assert_eq!(
            messages("class A { class make() { return this; } }"),
            vec!["[line 1] Error at 'this': Can't use 'this' in an unbound method."]
        );
    }

    #[test]
    fn test_class_inheriting_from_itself() {
        assert_eq!(
            messages("class A < A {}"),
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_eq!(
            messages("{ var a = a; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );

        // Globals may refer to an outer definition of the same name.
        assert!(messages("var a = 1; var a = a;").is_empty());
    }

    #[test]
    fn test_duplicate_local() {
        assert_eq!(
            messages("{ var a; var a; }"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
        assert_eq!(messages("fun f(a, a) {}").len(), 1);
    }

    #[test]
    fn test_errors_do_not_stop_the_walk() {
        let errors = messages("return;\n{ var x = x; }\nprint this;");

        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("[line 1]"));
        assert!(errors[1].starts_with("[line 2]"));
        assert!(errors[2].starts_with("[line 3]"));
    }

    #[test]
    fn test_lone_expression_has_only_globals() {
        let statements: Vec<Stmt> = common::parse("a + b;");
        let Stmt::Expression(expr) = &statements[0] else {
            panic!("expected an expression statement");
        };

        assert!(Resolver::new().resolve_expression(expr).is_empty());

        let Expr::Binary { left, .. } = expr else {
            panic!("expected a binary expression");
        };
        assert!(matches!(left.as_ref(), Expr::Variable { depth, .. } if depth.get().is_none()));
    }
}
