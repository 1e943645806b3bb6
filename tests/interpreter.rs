mod common;

#[cfg(test)]
mod interpreter_tests {
    use pretty_assertions::assert_eq;

    use rox::error::{LoxError, RuntimeError, Status};
    use rox::interpreter::MAX_CALL_DEPTH;
    use rox::parser::Parser;
    use rox::resolver::Resolver;
    use rox::scanner::Scanner;
    use rox::value::Value;

    use crate::common::{self, Run};

    fn assert_prints(source: &str, expected: &[&str]) {
        let run: Run = common::run(source);

        assert_eq!(run.error_messages(), Vec::<String>::new());
        assert_eq!(run.status, Status::Ok);
        assert_eq!(run.lines(), expected);
    }

    fn runtime_error(source: &str) -> RuntimeError {
        let run: Run = common::run(source);

        assert_eq!(run.status, Status::RuntimeError);
        assert_eq!(run.errors.len(), 1);

        match run.errors.into_iter().next() {
            Some(LoxError::Runtime(e)) => e,
            other => panic!("expected a runtime error, got {:?}", other),
        }
    }

    #[test]
    fn test_arithmetic_and_printing() {
        assert_prints(
            "print 1 + 2 * 3; print 7 / 2; print -(4 - 6); print \"foo\" + \"bar\"; print nil; print !nil;",
            &["7", "3.5", "2", "foobar", "nil", "true"],
        );
    }

    #[test]
    fn test_number_display() {
        assert_prints(
            "print 3.0; print 0.1 + 0.2 > 0.3; print -0; print 1 / 0;",
            &["3", "true", "-0", "inf"],
        );
    }

    #[test]
    fn test_equality_never_crosses_kinds() {
        assert_prints(
            "fun f() {} var g = f; print 1 == \"1\"; print nil == false; print nil == nil; print \"a\" == \"a\"; print f == g; print f != fun () {};",
            &["false", "false", "true", "true", "true", "true"],
        );
    }

    #[test]
    fn test_block_shadowing() {
        assert_prints(
            "var a = 1; { var a = 2; print a; } print a;",
            &["2", "1"],
        );
    }

    #[test]
    fn test_assignment_walks_to_declaring_frame() {
        assert_prints(
            "var a = 1; { var b = 2; { a = 10; b = 20; } print a; print b; } print a;",
            &["10", "20", "10"],
        );
    }

    #[test]
    fn test_closure_sees_binding_fixed_at_resolution() {
        assert_prints(
            "var a = \"global\";\n{\n  fun show() { print a; }\n  show();\n  var a = \"block\";\n  show();\n}",
            &["global", "global"],
        );
    }

    #[test]
    fn test_counter_closure() {
        assert_prints(
            "fun makeCounter() {
               var i = 0;
               fun count() { i = i + 1; return i; }
               return count;
             }
             var a = makeCounter();
             var b = makeCounter();
             print a(); print a(); print b(); print a;",
            &["1", "2", "1", "<fn count>"],
        );
    }

    #[test]
    fn test_return_unwinds_loops_and_blocks() {
        assert_prints(
            "fun first() {
               var i = 0;
               while (true) { { i = i + 1; if (i == 3) return i; } }
             }
             fun none() { if (true) return; print \"unreachable\"; }
             fun empty() {}
             print first(); print none(); print empty();",
            &["3", "nil", "nil"],
        );
    }

    #[test]
    fn test_for_loop() {
        assert_prints(
            "for (var i = 0; i < 3; i = i + 1) print i; var i = \"after\"; print i;",
            &["0", "1", "2", "after"],
        );
    }

    #[test]
    fn test_recursion() {
        assert_prints(
            "fun fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); } print fib(15);",
            &["610"],
        );
    }

    #[test]
    fn test_short_circuit() {
        assert_prints(
            "fun boom() { print \"boom\"; return true; }
             print false and boom();
             print true or boom();
             print nil or \"fallback\";
             print 1 and 2;",
            &["false", "true", "fallback", "2"],
        );
    }

    #[test]
    fn test_ternary_evaluates_one_branch() {
        assert_prints(
            "fun side(v) { print v; return v; }
             print true ? side(\"then\") : side(\"else\");
             print nil ? 1 : 0;",
            &["then", "then", "0"],
        );
    }

    #[test]
    fn test_lambdas() {
        assert_prints(
            "var add = fun (a, b) { return a + b; };
             print add(1, 2);
             fun apply(f, x) { return f(x); }
             var k = 10;
             print apply(fun (n) { return n * k; }, 4);
             print add;",
            &["3", "40", "<lambda>"],
        );
    }

    #[test]
    fn test_native_clock() {
        assert_prints(
            "var t = clock(); print t > 0; print clock() >= t; print clock;",
            &["true", "true", "<native fn clock>"],
        );
    }

    #[test]
    fn test_deepest_allowed_recursion() {
        let source: String = format!(
            "fun down(n) {{ if (n > 0) return down(n - 1); return \"bottom\"; }} print down({});",
            MAX_CALL_DEPTH - 1
        );

        assert_prints(&source, &["bottom"]);
    }

    #[test]
    fn test_recursion_ceiling() {
        let (mut interpreter, buffer) = common::interpreter();

        let run: Run = common::run_with(
            &mut interpreter,
            &buffer,
            "var depth = 0;\nfun recurse() { depth = depth + 1; recurse(); }\nrecurse();",
        );

        assert_eq!(run.status, Status::RuntimeError);
        assert!(matches!(
            run.errors[0],
            LoxError::Runtime(RuntimeError::StackOverflow { limit: 1000, line: 2 })
        ));
        assert_eq!(interpreter.call_depth(), 0);

        let run: Run = common::run_with(&mut interpreter, &buffer, "print depth;");
        assert_eq!(run.lines(), vec!["1000"]);
    }

    #[test]
    fn test_arity_mismatch() {
        for (call, got) in [("f(1);", 1), ("f(1, 2, 3);", 3)] {
            let source: String = format!("fun f(a, b) {{ print \"ran\"; }}\n{}", call);
            let run: Run = common::run(&source);

            assert_eq!(run.status, Status::RuntimeError);
            assert_eq!(run.output, "", "the body must not run for {}", call);
            assert!(matches!(
                &run.errors[..],
                [LoxError::Runtime(RuntimeError::ArityMismatch { expected: 2, got: g, line: 2 })] if *g == got
            ));
            assert_eq!(
                run.error_messages(),
                vec![format!("Expected 2 arguments but got {}.\n[line 2]", got)]
            );
        }
    }

    #[test]
    fn test_output_is_flushed_before_runtime_error() {
        let buffer: common::SharedBuffer = common::SharedBuffer::default();
        let writer = std::io::BufWriter::new(buffer.clone());
        let mut interpreter = rox::interpreter::Interpreter::with_output(Box::new(writer));

        let mut errors: Vec<LoxError> = Vec::new();
        let status: Status =
            rox::run_source(&mut interpreter, "print 1;\nprint 2;\nprint nope;", &mut errors);

        assert_eq!(status, Status::RuntimeError);
        assert_eq!(buffer.contents(), "1\n2\n");
    }

    #[test]
    fn test_not_callable() {
        assert_eq!(
            runtime_error("\"text\"();"),
            RuntimeError::NotCallable { line: 1 }
        );
    }

    #[test]
    fn test_operand_type_errors() {
        assert_eq!(
            runtime_error("print 1 + \"a\";").to_string(),
            "Operands must be two numbers or two strings, got number and string.\n[line 1]"
        );
        assert_eq!(
            runtime_error("print \"a\" < 1;").to_string(),
            "Operands must be numbers, got string and number.\n[line 1]"
        );
        assert_eq!(
            runtime_error("print -true;").to_string(),
            "Operand must be a number, got boolean.\n[line 1]"
        );
    }

    #[test]
    fn test_undefined_variables() {
        assert_eq!(
            runtime_error("print missing;"),
            RuntimeError::UndefinedVariable {
                name: "missing".to_string(),
                line: 1,
            }
        );
        assert_eq!(
            runtime_error("\nmissing = 1;"),
            RuntimeError::UndefinedVariable {
                name: "missing".to_string(),
                line: 2,
            }
        );
    }

    #[test]
    fn test_runtime_error_stops_remaining_statements() {
        let run: Run = common::run("print 1;\nprint nope;\nprint 2;");

        assert_eq!(run.status, Status::RuntimeError);
        assert_eq!(run.lines(), vec!["1"]);
        assert_eq!(run.error_messages(), vec!["Undefined variable 'nope'.\n[line 2]"]);
    }

    #[test]
    fn test_static_errors_prevent_execution() {
        let run: Run = common::run("print 1;\nreturn;");

        assert_eq!(run.status, Status::CompileError);
        assert_eq!(run.output, "");
        assert!(run.errors.iter().all(LoxError::is_static));

        let run: Run = common::run("print 1;\nprint (;");
        assert_eq!(run.status, Status::CompileError);
        assert_eq!(run.output, "");
    }

    #[test]
    fn test_state_survives_between_runs() {
        let (mut interpreter, buffer) = common::interpreter();

        common::run_with(&mut interpreter, &buffer, "var a = 1;");
        common::run_with(&mut interpreter, &buffer, "{ var inner = 1; print undefined; }");
        let run: Run = common::run_with(&mut interpreter, &buffer, "a = a + 1; print a;");

        assert_eq!(run.lines(), vec!["2"]);

        // The block's frame was dropped when the error unwound through it.
        let run: Run = common::run_with(&mut interpreter, &buffer, "print inner;");
        assert_eq!(run.status, Status::RuntimeError);
    }

    #[test]
    fn test_last_value_tracks_expression_statements() {
        let (mut interpreter, buffer) = common::interpreter();

        common::run_with(&mut interpreter, &buffer, "var x = 4; x * 10;");
        assert_eq!(interpreter.last_value(), &Value::Number(40.0));

        common::run_with(&mut interpreter, &buffer, "\"done\";");
        assert_eq!(interpreter.last_value(), &Value::from("done"));
    }

    #[test]
    fn test_evaluate_single_expression() {
        let tokens: Vec<_> = Scanner::new("(1 + 2) * 3 == 9 ? \"ok\" : \"bad\"")
            .collect::<Result<_, _>>()
            .expect("scans");
        let expr = Parser::new(&tokens).parse_expression().expect("parses");
        assert!(Resolver::new().resolve_expression(&expr).is_empty());

        let (mut interpreter, _buffer) = common::interpreter();

        assert_eq!(interpreter.evaluate(&expr), Ok(Value::from("ok")));
    }
}
