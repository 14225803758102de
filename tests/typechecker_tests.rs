use glint::ast::NodeKind;
use glint::typechecker::types::Type;
use glint::{Program, TypeChecker, Verdict};

fn check(source: &str) -> (Program, Verdict) {
    glint::check_source(source).expect("parse should succeed")
}

fn messages(verdict: &Verdict) -> Vec<&str> {
    verdict
        .diagnostics
        .iter()
        .map(|diagnostic| diagnostic.message.as_str())
        .collect()
}

fn types_of(program: &Program, pick: impl Fn(&NodeKind) -> bool) -> Vec<Type> {
    program
        .tree
        .ids()
        .filter(|id| pick(program.tree.kind(*id)))
        .map(|id| program.tree.ty(id))
        .collect()
}

#[test]
fn accepts_well_typed_shader() {
    let (_, verdict) = check(
        "{
            const vec4 base = vec4(0.0, 0.0, 0.0, 1.0);
            vec4 color = gl_Color;
            float d = dp3(color, gl_Light_Half);
            if (d > 0.0 && !(d >= 1.0)) {
                color = color + base;
            }
            gl_FragColor = color;
        }",
    );
    assert!(verdict.passed(), "{:?}", verdict.diagnostics);
    assert!(verdict.diagnostics.is_empty());
}

#[test]
fn addition_types_its_node() {
    let (program, verdict) = check("{ int x = 3 + 4; }");
    assert!(verdict.passed());
    let sums = types_of(&program, |kind| matches!(kind, NodeKind::Binary { .. }));
    assert_eq!(sums, vec![Type::Int]);
}

#[test]
fn dp3_of_float_vectors_is_float() {
    let (program, verdict) = check("{ vec3 a; vec3 b; float d = dp3(a, b); }");
    assert!(verdict.passed());
    let calls = types_of(&program, |kind| matches!(kind, NodeKind::FunctionCall { .. }));
    assert_eq!(calls, vec![Type::Float]);
}

#[test]
fn constructor_with_extra_argument_reports_count_once() {
    let (_, verdict) = check("{ vec2 v = vec2(1.0, 2.0, 3.0); }");
    assert!(!verdict.passed());
    assert_eq!(
        messages(&verdict),
        vec!["constructor 'vec2' expects 2 arguments, found 3"]
    );
}

#[test]
fn initializer_of_wrong_dimension_reports_once() {
    let (_, verdict) = check("{ vec2 v = vec3(1.0, 2.0, 3.0); }");
    assert_eq!(
        messages(&verdict),
        vec!["cannot initialize 'v' of type vec2 with a value of type vec3"]
    );
}

#[test]
fn rsq_of_vector_reports_argument_and_keeps_float() {
    let (program, verdict) = check("{ vec4 myVec4; float f = rsq(myVec4) + 1.0; }");
    assert_eq!(
        messages(&verdict),
        vec!["argument 1 of 'rsq' must be int or float, found vec4"]
    );
    let calls = types_of(&program, |kind| matches!(kind, NodeKind::FunctionCall { .. }));
    assert_eq!(calls, vec![Type::Float]);
    let sums = types_of(&program, |kind| matches!(kind, NodeKind::Binary { .. }));
    assert_eq!(sums, vec![Type::Float]);
}

#[test]
fn vector_product_is_typed_as_its_base() {
    let (program, _) = check("{ vec3 a; vec3 b; float s = a * b; }");
    let products = types_of(&program, |kind| matches!(kind, NodeKind::Binary { .. }));
    assert_eq!(products, vec![Type::Float]);
}

#[test]
fn comparison_is_bool() {
    let (program, verdict) = check("{ bool c = (1 < 2); }");
    assert!(verdict.passed());
    let comparisons = types_of(&program, |kind| matches!(kind, NodeKind::Binary { .. }));
    assert_eq!(comparisons, vec![Type::Bool]);
}

#[test]
fn reports_mismatched_operands() {
    let (_, verdict) = check("{ float f = 1.0 + 2; }");
    assert_eq!(
        messages(&verdict),
        vec!["operands of '+' have mismatched base types float and int"]
    );
}

#[test]
fn unknown_operands_do_not_cascade() {
    let (_, verdict) = check("{ float f = (1.0 + 2) * 3.0 - 4.0; }");
    assert_eq!(verdict.diagnostics.len(), 1);
}

#[test]
fn reports_non_bool_condition() {
    let (_, verdict) = check("{ int x = 1; if (x) { x = 2; } }");
    assert_eq!(messages(&verdict), vec!["if condition must be bool, found int"]);
}

#[test]
fn unknown_condition_fails_without_a_diagnostic() {
    let (_, verdict) = check("{ if (1 + 1.0 > 2.0) { } }");
    assert_eq!(verdict.diagnostics.len(), 1);
    assert!(!verdict.passed());

    let (_, verdict) = check("{ if (nothing) { } }");
    assert!(verdict.diagnostics.is_empty());
    assert!(!verdict.passed());
}

#[test]
fn reports_redeclaration_in_same_scope_only() {
    let (_, verdict) = check("{ int x; float x; { int x; } }");
    assert_eq!(
        messages(&verdict),
        vec!["'x' is already declared in this scope"]
    );
}

#[test]
fn enforces_pipeline_access() {
    let (_, verdict) = check(
        "{ vec4 c = gl_FragColor; gl_FragCoord = c; bool b = true; \
         if (b) { gl_FragColor = c; } }",
    );
    assert_eq!(
        messages(&verdict),
        vec![
            "cannot read from write-only variable 'gl_FragColor'",
            "cannot assign to read-only variable 'gl_FragCoord'",
            "cannot assign to write-only variable 'gl_FragColor' inside an if statement",
        ]
    );
}

#[test]
fn constants_need_constant_initializers_and_stay_fixed() {
    let (_, verdict) = check("{ float a = 1.0; const float b = a; const int c; const float d = 2.0; d = 3.0; }");
    assert_eq!(
        messages(&verdict),
        vec![
            "const 'b' must be initialized with a constant expression",
            "const 'c' requires an initializer",
            "cannot assign to constant 'd'",
        ]
    );
}

#[test]
fn reserved_and_pipeline_names_cannot_be_declared() {
    let (_, verdict) = check("{ vec4 gl_Color; int gl_mine; int a__b; }");
    assert_eq!(
        messages(&verdict),
        vec![
            "cannot redeclare pipeline variable 'gl_Color'",
            "identifier 'gl_mine' is reserved",
            "identifier 'a__b' is reserved",
        ]
    );
}

#[test]
fn index_must_fit_the_vector() {
    let (_, verdict) = check("{ vec2 v; float f = v[2]; int i; int j = i[0]; }");
    assert_eq!(
        messages(&verdict),
        vec![
            "index 2 is out of range for 'v' of type vec2",
            "cannot index 'i' of non-vector type int",
        ]
    );
}

#[test]
fn quiet_checker_fails_without_collecting() {
    let mut program = glint::parser::parse("{ int x = 1.0; }").expect("parse");
    let verdict = TypeChecker::quiet().check_program(&mut program);
    assert!(!verdict.passed());
    assert!(verdict.diagnostics.is_empty());
}

#[test]
fn checking_twice_gives_the_same_verdict() {
    let mut program = glint::parser::parse("{ vec3 a; int b = a; }").expect("parse");
    let first = TypeChecker::new().check_program(&mut program);
    let second = TypeChecker::new().check_program(&mut program);
    assert_eq!(first, second);
}

#[test]
fn diagnostics_point_at_the_offending_node() {
    let (_, verdict) = check("{\n  int x;\n  x = 1.0;\n}");
    let diagnostic = &verdict.diagnostics[0];
    assert_eq!((diagnostic.line, diagnostic.column), (3, 7));
    assert_eq!(
        diagnostic.to_string(),
        "Semantic Error (line 3, column 7): cannot assign a value of type float to 'x' of type int"
    );
}

#[test]
fn read_before_an_inner_declaration_sees_the_outer_variable() {
    let (_, verdict) = check("{ float x = 1.0; { int y = x; int x = 2; } }");
    assert_eq!(
        messages(&verdict),
        vec!["cannot initialize 'y' of type int with a value of type float"]
    );

    let (program, verdict) = check("{ float x = 1.0; { float y = x; int x = 2; } }");
    assert!(verdict.passed(), "{:?}", verdict.diagnostics);
    let reads = types_of(&program, |kind| matches!(kind, NodeKind::Variable { .. }));
    assert_eq!(reads, vec![Type::Float]);
}

#[test]
fn use_before_declaration_stays_unresolved() {
    let (program, verdict) = check("{ int a = b; int b = 1; }");
    assert!(verdict.passed());
    let reads = types_of(&program, |kind| matches!(kind, NodeKind::Variable { .. }));
    assert_eq!(reads, vec![Type::Unknown]);
}

#[test]
fn initializer_does_not_see_its_own_declaration() {
    let (_, verdict) = check("{ float v = 1.0; { int v = v; } }");
    assert_eq!(
        messages(&verdict),
        vec!["cannot initialize 'v' of type int with a value of type float"]
    );
}

#[test]
fn operators_reject_operands_outside_their_family() {
    let cases = [
        ("{ int a; int b; bool r = a && b; }", "operator '&&' requires bool operands, found int"),
        ("{ bool p; bool q = p == p; }", "operator '==' does not accept bool operands"),
        (
            "{ vec2 v; vec2 w = v / v; }",
            "operator '/' does not accept vector operands, found vec2",
        ),
        (
            "{ vec3 v; bool r = v < v; }",
            "operator '<' does not accept vector operands, found vec3",
        ),
        ("{ int i; bool r = !i; }", "operator '!' requires a bool operand, found int"),
    ];
    for (source, message) in cases {
        let (_, verdict) = check(source);
        assert_eq!(messages(&verdict), vec![message], "{}", source);
    }
}
