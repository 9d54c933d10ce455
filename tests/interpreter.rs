#[cfg(test)]
mod interpreter_tests {
    use std::cell::Cell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use rox::callable::Arity;
    use rox::config::LexerConfig;
    use rox::lox::SharedBuffer;
    use rox::value::Value;
    use rox::{run_capturing, Lox, RunReport};

    /// Run a program that must succeed and return its output.
    fn output_of(source: &str) -> String {
        let (output, report) = run_capturing(source);

        assert!(report.is_ok(), "unexpected errors: {:?}", report.errors);

        output
    }

    /// Run a program that must fail and return its rendered errors.
    fn errors_of(source: &str) -> (String, Vec<String>) {
        let (output, report) = run_capturing(source);

        assert!(!report.is_ok(), "expected an error from {:?}", source);

        let errors = report.errors.iter().map(|e| e.to_string()).collect();

        (output, errors)
    }

    fn session() -> (Lox, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let lox = Lox::with_output(LexerConfig::default(), Box::new(buffer.clone()));

        (lox, buffer)
    }

    // ─────────────────────────── expressions ───────────────────────────

    #[test]
    fn arithmetic() {
        assert_eq!(
            output_of(
                "print (1 + 2) * 3;
                 print 1 + 2 * 3;
                 print 1 < 2 == 2 < 3;
                 print 7 / 2;
                 print 7 % 3;
                 print -7 % 3;
                 print -(2 - 5);"
            ),
            "9\n7\ntrue\n3.5\n1\n-1\n3\n"
        );
    }

    #[test]
    fn strings_concatenate() {
        assert_eq!(output_of("print \"foo\" + \"bar\";"), "foobar\n");
    }

    #[test]
    fn mixed_addition_is_a_runtime_error() {
        let (_, errors) = errors_of("print \"1\" + 1;");

        assert_eq!(
            errors,
            vec!["Operands must be two numbers or two strings.\n[line 1]"]
        );
    }

    #[test]
    fn numeric_operators_reject_other_types() {
        let (_, errors) = errors_of("print -\"a\";");
        assert_eq!(errors, vec!["Operand must be a number.\n[line 1]"]);

        let (_, errors) = errors_of("print true < 1;");
        assert_eq!(errors, vec!["Operand must be a number.\n[line 1]"]);
    }

    #[test]
    fn divide_by_zero() {
        let (_, errors) = errors_of("print 1 / 0;");
        assert_eq!(errors, vec!["Cannot divide by zero.\n[line 1]"]);

        // Checked before the operand types are.
        let (_, errors) = errors_of("print \"a\" / 0;");
        assert_eq!(errors, vec!["Cannot divide by zero.\n[line 1]"]);
    }

    #[test]
    fn equality_and_truthiness() {
        assert_eq!(
            output_of(
                "print \"1\" == 1;
                 print nil == false;
                 print 1 == 1;
                 print \"a\" != \"a\";
                 if (0) print \"zero\";
                 if (\"\") print \"empty\";
                 if (nil) print \"nil\"; else print \"not nil\";"
            ),
            "false\nfalse\ntrue\nfalse\nzero\nempty\nnot nil\n"
        );
    }

    #[test]
    fn logical_operators_short_circuit() {
        assert_eq!(
            output_of(
                "print nil or \"yes\";
                 print false and undefinedThing;
                 print 1 and 2;"
            ),
            "yes\nfalse\n2\n"
        );
    }

    #[test]
    fn ternary_evaluates_one_branch() {
        assert_eq!(
            output_of(
                "fun boom() { print \"boom\"; return 0; }
                 print true ? 1 : boom();
                 print false ? boom() : 2;
                 print nil ? : 3;
                 print 1 ? : 3;"
            ),
            "1\n2\n3\nnil\n"
        );
    }

    #[test]
    fn comma_yields_the_right_operand() {
        assert_eq!(
            output_of("var a = 0; print (a = 1, a + 1); print 1, 2;"),
            "2\n2\n"
        );
    }

    // ──────────────────────────── variables ────────────────────────────

    #[test]
    fn uninitialized_and_undefined_are_different() {
        let (_, errors) = errors_of("var a; print a;");
        assert_eq!(
            errors,
            vec!["Declared variable not initialized: 'a'.\n[line 1]"]
        );

        let (_, errors) = errors_of("{ var a; print a; }");
        assert_eq!(
            errors,
            vec!["Declared variable not initialized: 'a'.\n[line 1]"]
        );

        let (_, errors) = errors_of("print b;");
        assert_eq!(errors, vec!["Undefined variable 'b'.\n[line 1]"]);

        let (_, errors) = errors_of("b = 1;");
        assert_eq!(errors, vec!["Undefined variable 'b'.\n[line 1]"]);
    }

    #[test]
    fn assignment_initializes_a_declared_variable() {
        assert_eq!(output_of("var a; a = 3; print a;"), "3\n");
    }

    #[test]
    fn shadowing_restores_the_outer_binding() {
        assert_eq!(
            output_of("var a = 1; { var a = 2; print a; } print a;"),
            "2\n1\n"
        );
    }

    #[test]
    fn closures_bind_statically() {
        assert_eq!(
            output_of(
                "var a = \"global\";
                 {
                   fun show() { print a; }
                   show();
                   var a = \"block\";
                   show();
                 }"
            ),
            "global\nglobal\n"
        );
    }

    #[test]
    fn reading_a_local_in_its_own_initializer_is_static() {
        let (output, errors) = errors_of("print \"never\"; { var a = 1; { var a = a + 1; } }");

        assert_eq!(output, "");
        assert_eq!(
            errors,
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    // ─────────────────────────── control flow ──────────────────────────

    #[test]
    fn loops() {
        assert_eq!(
            output_of(
                "var i = 0; while (i < 3) { print i; i = i + 1; }
                 for (var j = 0; j < 2; j = j + 1) print j;"
            ),
            "0\n1\n2\n0\n1\n"
        );
    }

    #[test]
    fn break_leaves_only_the_innermost_loop() {
        assert_eq!(
            output_of(
                "for (var i = 0; i < 3; i = i + 1) {
                   for (var j = 0; j < 3; j = j + 1) {
                     if (j == 1) break;
                     print i * 10 + j;
                   }
                 }
                 while (true) break;
                 print \"done\";"
            ),
            "0\n10\n20\ndone\n"
        );
    }

    #[test]
    fn return_unwinds_through_loops() {
        assert_eq!(
            output_of(
                "fun first() {
                   for (var i = 0; ; i = i + 1) {
                     while (true) { return i + 5; }
                   }
                 }
                 print first();"
            ),
            "5\n"
        );
    }

    #[test]
    fn return_at_top_level_is_static() {
        let (output, errors) = errors_of("print \"never\"; return 1;");

        assert_eq!(output, "");
        assert_eq!(
            errors,
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    // ──────────────────────────── functions ────────────────────────────

    #[test]
    fn recursion() {
        assert_eq!(
            output_of(
                "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
                 print fib(10);"
            ),
            "55\n"
        );
    }

    #[test]
    fn closures_keep_their_own_state() {
        assert_eq!(
            output_of(
                "fun makeCounter() {
                   var i = 0;
                   fun count() { i = i + 1; return i; }
                   return count;
                 }
                 var c = makeCounter();
                 print c();
                 print c();
                 var d = makeCounter();
                 print d();"
            ),
            "1\n2\n1\n"
        );
    }

    #[test]
    fn each_iteration_body_is_a_fresh_scope() {
        assert_eq!(
            output_of(
                "var first; var second;
                 for (var i = 0; i < 2; i = i + 1) {
                   var j = i;
                   fun f() { return j; }
                   if (i == 0) first = f; else second = f;
                 }
                 print first();
                 print second();"
            ),
            "0\n1\n"
        );
    }

    #[test]
    fn inline_functions() {
        assert_eq!(
            output_of(
                "var twice = fun (f, x) { return f(f(x)); };
                 print twice(fun (n) { return n * 3; }, 2);"
            ),
            "18\n"
        );
    }

    #[test]
    fn named_function_as_unbraced_branch() {
        assert_eq!(
            output_of(
                "if (true) fun f() { print 1; } print 2;
                 if (false) fun g() {} else fun h() { return 3; }
                 print h();"
            ),
            "2\n3\n"
        );
    }

    #[test]
    fn function_without_return_yields_nil() {
        assert_eq!(output_of("fun f() {} print f();"), "nil\n");
    }

    #[test]
    fn callables_print_their_names() {
        assert_eq!(
            output_of("fun f() {} print f; print fun () {}; print clock;"),
            "<fn f>\n<fn (anonymous)>\n<native fn clock>\n"
        );
    }

    #[test]
    fn call_errors() {
        let (_, errors) = errors_of("var x = 1; x();");
        assert_eq!(errors, vec!["Can only call functions and classes.\n[line 1]"]);

        let (_, errors) = errors_of("fun f(a) {} f(1, 2);");
        assert_eq!(errors, vec!["Expected 1 arguments but got 2.\n[line 1]"]);
    }

    #[test]
    fn clock_is_available() {
        assert_eq!(output_of("print clock() > 0;"), "true\n");
    }

    // ───────────────────────────── classes ─────────────────────────────

    #[test]
    fn instances_keep_separate_fields() {
        assert_eq!(
            output_of(
                "class Counter { inc() { this.n = this.n + 1; return this; } }
                 var a = Counter(); a.n = 0;
                 var b = Counter(); b.n = 10;
                 a.inc(); a.inc().inc(); b.inc();
                 print a.n;
                 print b.n;
                 print Counter;
                 print a;"
            ),
            "3\n11\n<class Counter>\n<instance of Counter>\n"
        );
    }

    #[test]
    fn bound_methods_remember_this() {
        assert_eq!(
            output_of(
                "class Box { get() { return this.v; } }
                 var b = Box(); b.v = \"inside\";
                 var m = b.get;
                 b.v = \"changed\";
                 print m();"
            ),
            "changed\n"
        );
    }

    #[test]
    fn fields_shadow_methods() {
        assert_eq!(
            output_of("class A { m() { return 1; } } var a = A(); a.m = 2; print a.m;"),
            "2\n"
        );
    }

    #[test]
    fn property_errors() {
        let (_, errors) = errors_of("class A {} print A().missing;");
        assert_eq!(errors, vec!["Undefined property 'missing'.\n[line 1]"]);

        let (_, errors) = errors_of("var x = 1; print x.y;");
        assert_eq!(errors, vec!["Only instances have properties.\n[line 1]"]);

        let (_, errors) = errors_of("var x = 1; x.y = 2;");
        assert_eq!(errors, vec!["Only instances have fields.\n[line 1]"]);
    }

    #[test]
    fn this_outside_a_class_is_static() {
        let (_, errors) = errors_of("print this;");
        assert_eq!(
            errors,
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );

        let (_, errors) = errors_of("fun f() { return this; }");
        assert_eq!(
            errors,
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
    }

    // ───────────────────────────── errors ──────────────────────────────

    #[test]
    fn runtime_error_stops_the_run() {
        let (output, report) = run_capturing("print 1;\nprint nil + 1;\nprint 2;");

        assert_eq!(output, "1\n");
        assert!(report.had_runtime_error());
        assert!(!report.had_static_error());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            report.errors[0].to_string(),
            "Operands must be two numbers or two strings.\n[line 2]"
        );
    }

    #[test]
    fn static_errors_are_all_reported_and_nothing_runs() {
        let (output, report) = run_capturing("print \"never\";\nvar = 1;\nprint (;\n");

        assert_eq!(output, "");
        assert!(report.had_static_error());
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn scan_errors_block_execution() {
        let (output, errors) = errors_of("print 1; @");

        assert_eq!(output, "");
        assert_eq!(errors, vec!["[line 1] Error: Unexpected character: @"]);
    }

    #[test]
    fn exit_codes() {
        assert_eq!(run_capturing("print 1;").1.exit_code(), 0);
        assert_eq!(run_capturing("print (;").1.exit_code(), 65);
        assert_eq!(run_capturing("print nil + 1;").1.exit_code(), 70);
    }

    /// Output sink whose every write fails.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_print_is_a_runtime_failure() {
        let mut lox = Lox::with_output(LexerConfig::default(), Box::new(BrokenPipe));

        let report = lox.run("print 1;");

        assert_eq!(report.errors.len(), 1);
        assert!(!report.had_static_error());
        assert_eq!(report.exit_code(), 70);
    }

    // ───────────────────────────── sessions ────────────────────────────

    #[test]
    fn globals_persist_across_runs() {
        let (mut lox, buffer) = session();

        assert!(lox.run("var a = 1; fun get() { var v = a; return v; }").is_ok());
        assert!(lox.run("{ var w = 2; print w; print get() + a; }").is_ok());

        assert_eq!(buffer.contents(), "2\n2\n");
    }

    #[test]
    fn run_reports_the_last_expression_value() {
        let (mut lox, _) = session();

        let report: RunReport = lox.run("1 + 2;");
        assert_eq!(report.value, Some(Value::Number(3.0)));

        assert_eq!(lox.run("var x = 1;").value, None);
        assert_eq!(lox.run("x;").value, Some(Value::Number(1.0)));
    }

    #[test]
    fn host_natives_with_fixed_arity() {
        let (mut lox, buffer) = session();

        lox.register_native("add", Arity::Fixed(2), |_, args| {
            match (&args[0], &args[1]) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                _ => Err("add expects numbers.".to_string()),
            }
        });

        assert!(lox.run("print add(1, 2); print add;").is_ok());
        assert_eq!(buffer.contents(), "3\n<native fn add>\n");

        let report = lox.run("add(1, \"x\");");
        assert_eq!(report.errors[0].to_string(), "add expects numbers.\n[line 1]");

        let report = lox.run("add(1);");
        assert_eq!(
            report.errors[0].to_string(),
            "Expected 2 arguments but got 1.\n[line 1]"
        );
    }

    #[test]
    fn host_natives_with_dynamic_arity() {
        let (mut lox, buffer) = session();

        let wanted = Rc::new(Cell::new(1));
        let arity = {
            let wanted = Rc::clone(&wanted);
            Arity::Dynamic(Rc::new(move || wanted.get()))
        };

        lox.register_native("argc", arity, |_, args| Ok(Value::Number(args.len() as f64)));

        assert!(lox.run("print argc(9);").is_ok());

        wanted.set(2);
        assert!(lox.run("print argc(9, 9);").is_ok());
        assert!(!lox.run("argc(9);").is_ok());

        assert_eq!(buffer.contents(), "1\n2\n");
    }
}
