#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;

    use rox::ast::{Expr, Stmt};
    use rox::ast_printer::AstPrinter;
    use rox::config::LexerConfig;
    use rox::error::{Diagnostics, LoxError};
    use rox::parser::Parser;
    use rox::rpn::RpnConverter;
    use rox::scanner::Scanner;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
        let config = LexerConfig::default();
        let mut diagnostics = Diagnostics::new();

        let tokens = Scanner::new(source, &config).scan_tokens(&mut diagnostics);
        let statements = Parser::new(&tokens, &mut diagnostics).parse();

        (statements, diagnostics.into_errors())
    }

    /// Parse, insist on no errors, and render each statement.
    fn printed(source: &str) -> Vec<String> {
        let (statements, errors) = parse(source);

        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);

        statements.iter().map(AstPrinter::print_stmt).collect()
    }

    fn error_messages(source: &str) -> Vec<String> {
        parse(source).1.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(
            printed(
                "1 + 2 * 3;
                 (1 + 2) * 3;
                 1 < 2 == 2 < 3;
                 !!true;
                 a or b and c;
                 10 - 4 - 3;
                 7 % 3 / 2;"
            ),
            vec![
                "(+ 1 (* 2 3))",
                "(* (group (+ 1 2)) 3)",
                "(== (< 1 2) (< 2 3))",
                "(! (! true))",
                "(or (var a) (and (var b) (var c)))",
                "(- (- 10 4) 3)",
                "(/ (% 7 3) 2)",
            ]
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(
            printed("a = b = c; obj.x = 1;"),
            vec!["(assign a (assign b (var c)))", "(set (var obj) x 1)"]
        );
    }

    #[test]
    fn calls_and_properties_bind_tighter_than_unary() {
        assert_eq!(
            printed("-a.b(c)(d, 2);"),
            vec!["(- (call (call (get (var a) b) (var c)) (var d) 2))"]
        );
    }

    #[test]
    fn ternary_and_comma() {
        assert_eq!(
            printed(
                "x ? 1 : y ? 2 : 3;
                 c ? : 2;
                 a, b, c;
                 f((1, 2), 3);"
            ),
            vec![
                "(?: (var x) 1 (?: (var y) 2 3))",
                "(?: (var c) nil 2)",
                "(, (, (var a) (var b)) (var c))",
                "(call (var f) (group (, 1 2)) 3)",
            ]
        );
    }

    #[test]
    fn declarations() {
        assert_eq!(
            printed(
                "var a; var b = 1;
                 fun add(x, y) { return x + y; }
                 var f = fun (a) { return a; };
                 class A { m() { print this; } }"
            ),
            vec![
                "(decl a)",
                "(decl b 1)",
                "(fun add (x, y) (block (return (+ (var x) (var y)))))",
                "(decl f (fun (anonymous) (a) (block (return (var a)))))",
                "(class A (fun m () (block (print this))))",
            ]
        );
    }

    #[test]
    fn for_desugars_into_while() {
        assert_eq!(
            printed(
                "for (var i = 0; i < 3; i = i + 1) print i;
                 for (;;) break;"
            ),
            vec![
                "(block (decl i 0) (while (< (var i) 3) (block (print (var i)) (assign i (+ (var i) 1)))))",
                "(block (while true (block (break))))",
            ]
        );
    }

    #[test]
    fn control_flow_statements() {
        assert_eq!(
            printed("if (a) print 1; else { print 2; } while (x) break;"),
            vec!["(if (var a) (print 1) (block (print 2)))", "(while (var x) (break))"]
        );
    }

    #[test]
    fn named_function_in_statement_position() {
        assert_eq!(
            printed("if (c) fun f() {} while (x) fun g(a) { print a; }"),
            vec![
                "(if (var c) (fun f () (block)))",
                "(while (var x) (fun g (a) (block (print (var a)))))",
            ]
        );
    }

    #[test]
    fn missing_right_operand_reports_one_error() {
        assert_eq!(
            error_messages("1 +;"),
            vec!["[line 1] Error at ';': Expect expression."]
        );
    }

    #[test]
    fn binary_operator_without_left_operand() {
        assert_eq!(
            error_messages("== 1;\n> 2;\n+ 3;\n* 4;"),
            vec![
                "[line 1] Error at '==': Expect value before '=='.",
                "[line 2] Error at '>': Expect value before '>'.",
                "[line 3] Error at '+': Expect value before '+'.",
                "[line 4] Error at '*': Expect value before '*'.",
            ]
        );
    }

    #[test]
    fn comma_and_ternary_without_left_operand() {
        assert_eq!(
            error_messages(", 1;\n? 1 : 2;"),
            vec![
                "[line 1] Error at ',': Expect expression before ',' operator.",
                "[line 2] Error at '?': Expect expression before ternary operator.",
            ]
        );
    }

    #[test]
    fn invalid_assignment_target_keeps_the_statement() {
        let (statements, errors) = parse("1 = 2; print 3;");

        assert_eq!(statements.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error at '=': Invalid assignment target."
        );
    }

    #[test]
    fn break_outside_a_loop() {
        assert_eq!(
            error_messages("break;"),
            vec!["[line 1] Error at 'break': Invalid 'break' not in loop."]
        );

        // A function body is not part of the loop around it.
        assert_eq!(
            error_messages("while (true) { fun f() { break; } }"),
            vec!["[line 1] Error at 'break': Invalid 'break' not in loop."]
        );

        assert!(error_messages("while (true) { if (x) { break; } }").is_empty());
    }

    #[test]
    fn break_is_not_an_expression() {
        assert_eq!(
            error_messages("while (true) print break;"),
            vec!["[line 1] Error at 'break': Can't use 'break' as an expression."]
        );
    }

    #[test]
    fn error_at_end_of_input() {
        assert_eq!(
            error_messages("print 1"),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
    }

    #[test]
    fn synchronize_recovers_at_statement_boundaries() {
        let (statements, errors) = parse("var = 1; print 2; var x = ;");

        assert_eq!(
            errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 1] Error at ';': Expect expression.",
            ]
        );
        assert_eq!(statements.len(), 1);
        assert_eq!(AstPrinter::print_stmt(&statements[0]), "(print 2)");
    }

    #[test]
    fn argument_limit_is_not_fatal() {
        let args = vec!["0"; 256].join(", ");
        let (statements, errors) = parse(&format!("f({});", args));

        assert_eq!(statements.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .ends_with("Can't have more than 255 arguments."));

        let args = vec!["0"; 255].join(", ");
        assert!(parse(&format!("f({});", args)).1.is_empty());
    }

    #[test]
    fn parameter_limit_is_not_fatal() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let (statements, errors) = parse(&format!("fun f({}) {{}}", params.join(", ")));

        assert_eq!(statements.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .ends_with("Can't have more than 255 parameters."));
    }

    #[test]
    fn every_reference_gets_its_own_id() {
        let (statements, _) = parse("a; a;");

        let ids: Vec<_> = statements
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable { id, .. }) => Some(*id),
                _ => None,
            })
            .collect();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn reverse_polish_notation() {
        let (statements, _) = parse("(1 + 2) * 3; -a + b % 4;");

        let rpn: Vec<String> = statements
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Expression(expr) => Some(RpnConverter::convert(expr)),
                _ => None,
            })
            .collect();

        assert_eq!(rpn, vec!["1 2 + 3 *", "a - b 4 % +"]);
    }
}
