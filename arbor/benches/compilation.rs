use arbor::Compiler;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const SHADER: &str = "{
    vec4 color = gl_Color;
    vec4 light = gl_Light_Half;
    float shine = gl_Material_Shininess[0];
    float d = dp3(color, light);
    vec4 coeff = lit(vec4(d, d, 0.0, shine));
    bool bright = d > 0.5;
    if (bright) {
        if (d > 0.9) {
            color = color - coeff;
        } else {
            color = color + coeff;
        }
    } else {
        color = gl_Light_Ambient;
    }
    gl_FragColor = color;
}";

fn compile_benchmark(c: &mut Criterion) {
    let compiler = Compiler::new();
    c.bench_function("compile_lighting_shader", |b| {
        b.iter(|| compiler.compile_source(black_box(SHADER)))
    });
}

criterion_group!(benches, compile_benchmark);
criterion_main!(benches);
