use glint::repl::highlighter;

#[test]
fn repl_highlighter_detects_multiline_input() {
    assert!(highlighter::needs_more_input("{ int x = 1;"));
    assert!(highlighter::needs_more_input("{ float f = (1.0 +"));
    assert!(highlighter::needs_more_input("{ /* still open"));
    assert!(!highlighter::needs_more_input("{ int x = 1; }"));
}

#[test]
fn repl_completion_suggests_types_builtins_and_symbols() {
    let symbols = vec!["veryBright".to_string(), "shade".to_string()];
    let completions = highlighter::complete("ve", &symbols);
    assert_eq!(
        completions,
        vec!["vec2", "vec3", "vec4", "veryBright"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
    assert!(highlighter::complete("gl_Frag", &[]).contains(&"gl_FragCoord".to_string()));
    assert_eq!(highlighter::complete("rs", &[]), vec!["rsq".to_string()]);
}

#[test]
fn repl_colorize_marks_types_and_leaves_names_plain() {
    let colored = highlighter::colorize("vec4 color = lit(c); // done");
    assert!(colored.contains("\x1b[96mvec4\x1b[0m"));
    assert!(colored.contains("\x1b[95mlit\x1b[0m"));
    assert!(colored.contains(" color "));
    assert!(colored.contains("\x1b[90m// done\x1b[0m"));
}

#[test]
fn repl_check_entry_lists_declarations() {
    let report = glint::repl::check_entry("{ int x = 1; vec3 n; }");
    assert!(report.passed);
    assert_eq!(report.text, "ok\n  x: int\n  n: vec3");
    assert_eq!(report.declared, vec!["x".to_string(), "n".to_string()]);
}

#[test]
fn repl_check_entry_renders_diagnostics() {
    let report = glint::repl::check_entry("{ int x = 1.0; }");
    assert!(!report.passed);
    assert_eq!(
        report.text,
        "Semantic Error (line 1, column 11): cannot initialize 'x' of type int with a value of type float\n\
         --> <repl>:1:11\n\
         { int x = 1.0; }\n          ^\n\n\
         check failed with 1 diagnostic(s)"
    );
}

#[test]
fn repl_check_entry_reports_parse_errors() {
    let report = glint::repl::check_entry("{ int x = ; }");
    assert!(!report.passed);
    assert!(report
        .text
        .starts_with("parse error at line 1, column 11: expected expression"));
    assert!(report.declared.is_empty());
}
