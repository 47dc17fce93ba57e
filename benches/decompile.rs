//! Benchmarks for the control-flow recovery pipeline.
//!
//! Measures the three stages separately and combined over a synthetic script
//! of repeated while/continue blocks — the densest shape the classification
//! passes handle, with one loop, one nested condition and one continue per
//! block.

extern crate stackflow;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use stackflow::{ControlFlowGraph, FunctionTable, Instruction, ScriptBuilder};

/// Emits `blocks` copies of `while (flag) { if (skip) continue; body }`.
fn looping_script(blocks: u32) -> Vec<Instruction> {
    let mut builder = ScriptBuilder::new();
    for _ in 0..blocks {
        let base = builder.next_address();
        builder = builder
            .op("push_flag", 1)
            .cond_jump(base + 7)
            .op("push_skip", 1)
            .cond_jump(base + 5)
            .uncond_jump(base)
            .op("body", 0)
            .uncond_jump(base);
    }
    builder.ret().build()
}

fn bench_pipeline(c: &mut Criterion) {
    let insts = looping_script(100);
    let count = insts.len();

    let mut group = c.benchmark_group("decompile");
    group.throughput(Throughput::Elements(count as u64));

    group.bench_function("construct", |b| {
        b.iter(|| {
            ControlFlowGraph::new(black_box(insts.clone()), FunctionTable::new()).unwrap()
        });
    });

    group.bench_function("construct_and_group", |b| {
        b.iter(|| {
            let mut cfg =
                ControlFlowGraph::new(black_box(insts.clone()), FunctionTable::new()).unwrap();
            cfg.create_groups();
            black_box(cfg.groups().count())
        });
    });

    group.bench_function("full_pipeline", |b| {
        b.iter(|| {
            let mut cfg =
                ControlFlowGraph::new(black_box(insts.clone()), FunctionTable::new()).unwrap();
            cfg.create_groups();
            cfg.analyze();
            black_box(cfg.groups().count())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
