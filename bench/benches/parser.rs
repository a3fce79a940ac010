use criterion::{criterion_group, criterion_main, Criterion};
use nalthon::{checker, parser, Limits};
use std::hint::black_box;

static INPUT: &str = include_str!("../../demos/showcase.nl");

fn parse(input: &str, limits: &Limits) {
    let program = parser::parse_program(input, &mut Vec::with_capacity(1024), limits)
        .expect("showcase must parse");
    black_box(program.contracts.len());
}

fn parse_and_check(input: &str, limits: &Limits) {
    let program = parser::parse_program(input, &mut Vec::with_capacity(1024), limits)
        .expect("showcase must parse");
    checker::check(&program).expect("showcase must check");
}

fn compile(input: &str) {
    let contracts = nalthon::compile(input).expect("showcase must compile");
    black_box(contracts);
}

fn criterion_benchmark(c: &mut Criterion) {
    let limits = Limits::default();
    c.bench_function("parse", |b| b.iter(|| parse(black_box(INPUT), &limits)));
    c.bench_function("parse and check", |b| {
        b.iter(|| parse_and_check(black_box(INPUT), &limits));
    });
    c.bench_function("compile", |b| b.iter(|| compile(black_box(INPUT))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
