//! Integration tests for the arbor compiler

use arbor::ir::{self, Literal};
use arbor::{CompileError, Compiler};

fn compile(source: &str) -> ir::Program {
    Compiler::new()
        .compile_source(source)
        .unwrap_or_else(|err| panic!("failed to compile {:?}: {}", source, err))
}

fn body(program: &ir::Program) -> Vec<String> {
    program.instructions().map(ToString::to_string).collect()
}

#[test]
fn test_addition_goes_through_constants_into_the_variable() {
    let program = compile("{ int x = 3 + 4; }");
    let expected = "\
!!ARBfp1.0
PARAM FALSE = {0, 0, 0, 0};
PARAM TRUE = {-1, -1, -1, -1};
PARAM ONE = {1, 1, 1, 1};
TEMP __scratch;
TEMP x;
TEMP __t0;
PARAM __c0 = {3, 3, 3, 3};
PARAM __c1 = {4, 4, 4, 4};
ADD __t0, __c0, __c1;
MOV x, __t0;
END
";
    assert_eq!(program.to_string(), expected);
}

#[test]
fn test_dp3_writes_a_single_instruction() {
    let program = compile("{ vec3 a; vec3 b; float d = dp3(a, b); }");
    assert_eq!(body(&program), vec!["DP3 __t0, a, b;", "MOV d, __t0;"]);
    assert_eq!(
        program.temps().collect::<Vec<_>>(),
        vec!["__scratch", "a", "b", "d", "__t0"]
    );
}

#[test]
fn test_if_else_selects_with_one_predicate() {
    let program = compile(
        "{ int x; bool c = (1 < 2); if (c) { x = 1; } else { x = 2; } }",
    );
    assert_eq!(
        body(&program),
        vec![
            "SLT __t0, __c0, __c1;",
            "MOV __t0, -__t0;",
            "MOV c, __t0;",
            "MOV __t1, c;",
            "CMP x, __t1, __c2, x;",
            "CMP x, __t1, x, __c3;",
        ]
    );
}

#[test]
fn test_nested_if_chains_parent_predicate_first() {
    let program = compile(
        "{ bool a = true; bool b = false; int y; if (a) { if (b) { y = 1; } } }",
    );
    assert_eq!(
        body(&program),
        vec![
            "MOV a, __c0;",
            "MOV b, __c1;",
            "MOV __t0, a;",
            "MAX __t1, __t0, b;",
            "CMP y, __t1, __c2, y;",
        ]
    );
    assert_eq!(program.param("__c0"), Some(&Literal::Int(-1).splat()));
    assert_eq!(program.param("__c1"), Some(&Literal::Int(0).splat()));
}

#[test]
fn test_if_in_else_arm_inverts_parent_predicate() {
    let program = compile(
        "{ bool a = true; bool b = false; int y; \
         if (a) { y = 1; } else { if (b) { y = 2; } } }",
    );
    assert_eq!(
        body(&program),
        vec![
            "MOV a, __c0;",
            "MOV b, __c1;",
            "MOV __t0, a;",
            "CMP y, __t0, __c2, y;",
            "CMP __scratch, __t0, FALSE, TRUE;",
            "MAX __t1, __scratch, b;",
            "CMP y, __t1, __c3, y;",
        ]
    );
}

#[test]
fn test_nested_if_with_else_gets_its_own_else_predicate() {
    let program = compile(
        "{ bool a = true; bool b = false; int y; \
         if (a) { if (b) { y = 1; } else { y = 2; } } }",
    );
    assert_eq!(
        body(&program),
        vec![
            "MOV a, __c0;",
            "MOV b, __c1;",
            "MOV __t0, a;",
            "MAX __t1, __t0, b;",
            "CMP __t2, b, FALSE, TRUE;",
            "MAX __t2, __t0, __t2;",
            "CMP y, __t1, __c2, y;",
            "CMP y, __t2, __c3, y;",
        ]
    );
}

#[test]
fn test_literal_constructor_is_written_inline() {
    let program = compile("{ vec4 v = vec4(1.0, 2.0, 3.0, 4.0); float f = v[1]; }");
    assert_eq!(
        body(&program),
        vec![
            "MOV __t0, {1.0, 2.0, 3.0, 4.0};",
            "MOV v, __t0;",
            "MOV f, v.y;",
        ]
    );
    assert!(program.param("__c0").is_none());
}

#[test]
fn test_mixed_constructor_fills_one_lane_at_a_time() {
    let program = compile("{ float a = 1.0; vec2 v = vec2(a, 2.0); }");
    assert_eq!(
        body(&program),
        vec![
            "MOV a, __c0;",
            "MOV __t0.x, a;",
            "MOV __t0.y, {2.0, 2.0, 2.0, 2.0};",
            "MOV v, __t0;",
        ]
    );
}

#[test]
fn test_vector_equality_reduces_across_lanes() {
    let program = compile(
        "{ vec2 a = vec2(1.0, 2.0); vec2 b = vec2(1.0, 2.0); bool e = a == b; }",
    );
    assert_eq!(
        body(&program),
        vec![
            "MOV __t0, {1.0, 2.0, 0.0, 0.0};",
            "MOV a, __t0;",
            "MOV __t1, {1.0, 2.0, 0.0, 0.0};",
            "MOV b, __t1;",
            "SGE __t2, a, b;",
            "SGE __scratch, b, a;",
            "MUL __t2, __t2, -__scratch;",
            "MAX __t2, __t2.x, __t2.y;",
            "MOV e, __t2;",
        ]
    );
}

#[test]
fn test_division_uses_the_reciprocal() {
    let program = compile("{ float x = 1.0 / 2.0; }");
    assert_eq!(
        body(&program),
        vec![
            "RCP __scratch, __c1.x;",
            "MUL __t0, __c0, __scratch;",
            "MOV x, __t0;",
        ]
    );
}

#[test]
fn test_shadowed_variable_gets_a_scope_suffix() {
    let program = compile("{ int x = 1; { int x = 2; x = 3; } x = 4; }");
    assert_eq!(
        body(&program),
        vec!["MOV x, __c0;", "MOV x__2, __c1;", "MOV x__2, __c2;", "MOV x, __c3;"]
    );
}

#[test]
fn test_pipeline_variables_map_to_builtin_registers() {
    let program = compile("{ vec4 c = gl_Color; gl_FragColor = c; }");
    assert_eq!(
        body(&program),
        vec!["MOV c, fragment.color;", "MOV result.color, c;"]
    );
}

#[test]
fn test_indexed_assignment_under_predicate_touches_one_lane() {
    let program = compile("{ vec4 v; bool p = true; if (p) { v[2] = 1.0; } }");
    assert_eq!(
        body(&program),
        vec!["MOV p, __c0;", "MOV __t0, p;", "CMP v.z, __t0, __c1, v.z;"]
    );
}

#[test]
fn test_rejected_program_generates_nothing() {
    let err = Compiler::new()
        .compile_source("{ float f = rsq(vec4(1.0, 2.0, 3.0, 4.0)); }")
        .unwrap_err();
    match err {
        CompileError::Rejected(verdict) => {
            assert_eq!(verdict.diagnostics.len(), 1);
            assert!(verdict.diagnostics[0].message.contains("argument 1 of 'rsq'"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[test]
fn test_undeclared_variable_is_reported_at_codegen() {
    let err = Compiler::new()
        .compile_source("{ int x = y; }")
        .unwrap_err();
    assert!(
        matches!(&err, CompileError::UnresolvedVariable { name, line: 1, .. } if name == "y"),
        "unexpected error: {:?}",
        err
    );
}

#[test]
fn test_parse_errors_pass_through() {
    let err = Compiler::new().compile_source("{ int x = ; }").unwrap_err();
    assert!(matches!(err, CompileError::Frontend(_)));
}

#[test]
fn test_annotations_mark_each_source_line_once() {
    let source = "{ int x = 1;\n  int y = 2; x = y;\n}";
    let program = Compiler::new()
        .with_annotations(true)
        .compile_source(source)
        .expect("compiles");
    let text = program.to_string();
    assert_eq!(text.matches("# line 1").count(), 1);
    assert_eq!(text.matches("# line 2").count(), 1);
    assert!(text.find("# line 2").unwrap() < text.find("MOV y, __c1;").unwrap());
}

#[test]
fn test_compilation_is_repeatable() {
    let source = "{ vec3 n; vec4 l = lit(vec4(1.0, 0.5, 0.0, 2.0)); if (true) { n = vec3(1.0, 0.0, 0.0); } }";
    assert_eq!(compile(source).to_string(), compile(source).to_string());
}

#[test]
fn test_read_before_inner_declaration_uses_outer_register() {
    let program = compile("{ float x = 1.0; { float y = x; float x = 2.0; } }");
    assert_eq!(
        body(&program),
        vec!["MOV x, __c0;", "MOV y, x;", "MOV x__2, __c1;"]
    );
}

#[test]
fn test_use_before_declaration_is_unresolved() {
    let err = Compiler::new()
        .compile_source("{ int a = b; int b = 1; }")
        .unwrap_err();
    assert!(
        matches!(&err, CompileError::UnresolvedVariable { name, .. } if name == "b"),
        "unexpected error: {:?}",
        err
    );
}

#[test]
fn test_saturating_mnemonic_names_are_suffixed() {
    let program = compile("{ float MOV_SAT = 1.0; }");
    assert_eq!(body(&program), vec!["MOV MOV_SAT__1, __c0;"]);
}

#[test]
fn test_relational_operators_negate_the_set_result() {
    let cases = [
        ("<=", vec!["SGE __t0, b, a;", "MOV __t0, -__t0;"]),
        (">", vec!["SLT __t0, b, a;", "MOV __t0, -__t0;"]),
        (">=", vec!["SGE __t0, a, b;", "MOV __t0, -__t0;"]),
    ];
    for (op, mut expected) in cases {
        let program = compile(&format!("{{ float a; float b; bool r = a {} b; }}", op));
        expected.push("MOV r, __t0;");
        assert_eq!(body(&program), expected, "a {} b", op);
    }
}

#[test]
fn test_inequality_combines_both_orders() {
    let program = compile("{ int a; int b; bool r = a != b; }");
    assert_eq!(
        body(&program),
        vec![
            "SLT __t0, a, b;",
            "SLT __scratch, b, a;",
            "ADD __t0, -__t0, -__scratch;",
            "MOV r, __t0;",
        ]
    );
}

#[test]
fn test_vector_inequality_reduces_with_min() {
    let program = compile("{ vec3 a; vec3 b; bool r = a != b; }");
    assert_eq!(
        body(&program),
        vec![
            "SLT __t0, a, b;",
            "SLT __scratch, b, a;",
            "ADD __t0, -__t0, -__scratch;",
            "MIN __t0, __t0.x, __t0.y;",
            "MIN __t0, __t0, __t0.z;",
            "MOV r, __t0;",
        ]
    );
}

#[test]
fn test_power_takes_scalar_lanes() {
    let program = compile("{ float a; float b; float r = a ^ b; }");
    assert_eq!(body(&program), vec!["POW __t0, a.x, b.x;", "MOV r, __t0;"]);
}

#[test]
fn test_logical_operators_use_max_and_min() {
    let program = compile("{ bool p; bool q; bool r = p && q; bool s = p || q; }");
    assert_eq!(
        body(&program),
        vec!["MAX __t0, p, q;", "MOV r, __t0;", "MIN __t1, p, q;", "MOV s, __t1;"]
    );
}

#[test]
fn test_unary_operators() {
    let program = compile("{ bool p; bool r = !p; vec2 v; vec2 w = -v; }");
    assert_eq!(
        body(&program),
        vec![
            "CMP __t0, p, FALSE, TRUE;",
            "MOV r, __t0;",
            "MOV __t1, -v;",
            "MOV w, __t1;",
        ]
    );
}

#[test]
fn test_rsq_and_lit_calls() {
    let program = compile("{ float x; float r = rsq(x); vec4 v; vec4 l = lit(v); }");
    assert_eq!(
        body(&program),
        vec!["RSQ __t0, x.x;", "MOV r, __t0;", "LIT __t1, v;", "MOV l, __t1;"]
    );
}
