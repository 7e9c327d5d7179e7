use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hexpr::config::FormatConfig;
use hexpr::expr::{Evaluator, Lexer, Symbol, SymbolTable, Value};

fn template() -> SymbolTable {
    let mut t = SymbolTable::new().with_data((0u8..=255).collect());
    t.insert("header_size", Symbol::new(64, 4, 0));
    t.insert_struct(
        "record",
        64,
        vec![("kind", Symbol::new(3, 2, 64)), ("length", Symbol::new(1200, 4, 66))],
    );
    t.insert_array(
        "offsets",
        80,
        (0..16).map(|i| Symbol::new(i * 100, 4, 80 + i * 4)).collect(),
    );
    t
}

fn bench_lex(c: &mut Criterion) {
    let src = "record.length * 2 + offsets[7] - (header_size << 3) > 0x1000 ? \"big\" : \"small\"";
    c.bench_function("lex_expression", |b| {
        b.iter(|| Lexer::new(black_box(src)).tokenize())
    });
}

fn bench_eval(c: &mut Criterion) {
    let mut g = c.benchmark_group("evaluate");

    let mut ev = Evaluator::default();
    g.bench_function("arithmetic", |b| {
        b.iter(|| ev.evaluate(black_box("(1 + 2) * 3 - 4 / 2 % 3 << 1 | 0xF0")))
    });

    let mut ev = Evaluator::new(template());
    g.bench_function("symbols", |b| {
        b.iter(|| ev.evaluate(black_box("record.length + offsets[15] + addressof(record.kind)")))
    });
    g.bench_function("functions", |b| {
        b.iter(|| ev.evaluate(black_box("mid(\"hexadecimal\", 3, 4) + left(\"abc\", 2)")))
    });
    g.bench_function("assignment", |b| {
        b.iter(|| ev.evaluate(black_box("n = 0, n += get(4, 4), n <<= 1")))
    });
    g.bench_function("short_circuit", |b| {
        b.iter(|| ev.evaluate(black_box("FALSE && (sqrt(16) == 4 || n++ > 3) ? 1 : 2")))
    });

    g.finish();
}

fn bench_render(c: &mut Criterion) {
    let cfg = FormatConfig::default();
    c.bench_function("render_grouped_int", |b| {
        b.iter(|| Value::Int(black_box(-1_234_567_890)).render("", 8, false, &cfg))
    });
    c.bench_function("render_real", |b| {
        b.iter(|| Value::Real(black_box(1.0 / 3.0)).render("", 8, false, &cfg))
    });
}

criterion_group!(benches, bench_lex, bench_eval, bench_render);
criterion_main!(benches);
