// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property reads and writes through an element tree.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use understory_binding::DataContext;
use understory_layout::{Border, ElementId, ElementTree, TextBlock};

/// A chain of borders, root first, ending in a text block.
fn chain(depth: usize) -> (ElementTree, Vec<ElementId>) {
    let mut tree = ElementTree::new();
    let mut ids = Vec::with_capacity(depth + 1);
    for _ in 0..depth {
        let id = tree.insert(Border::new());
        if let Some(&parent) = ids.last() {
            tree.set_parent(id, Some(parent)).unwrap();
        }
        ids.push(id);
    }
    let leaf = tree.insert(TextBlock::new());
    if let Some(&parent) = ids.last() {
        tree.set_parent(leaf, Some(parent)).unwrap();
    }
    ids.push(leaf);
    (tree, ids)
}

fn bench_property(c: &mut Criterion) {
    let mut group = c.benchmark_group("property/get");

    group.bench_function("local", |b| {
        let (mut tree, ids) = chain(0);
        let width = tree.properties().layout.width;
        tree.set_value(ids[0], width, 100.0).unwrap();
        b.iter(|| black_box(*tree.get(ids[0], width).unwrap()));
    });

    group.bench_function("default", |b| {
        let (tree, ids) = chain(0);
        let text = tree.properties().text_block.text;
        b.iter(|| black_box(tree.get(ids[0], text).unwrap().len()));
    });

    for depth in [1_usize, 16, 64] {
        group.bench_with_input(
            BenchmarkId::new("inherited_data_context", depth),
            &depth,
            |b, &depth| {
                let (mut tree, ids) = chain(depth);
                tree.set_data_context(ids[0], Some(DataContext::from_value(7_u32)))
                    .unwrap();
                let leaf = ids[depth];
                b.iter(|| black_box(tree.data_context(leaf).is_some()));
            },
        );
    }

    group.finish();

    let mut group = c.benchmark_group("property/set_value");

    for depth in [1_usize, 16] {
        group.bench_with_input(
            BenchmarkId::new("changed_invalidates_ancestors", depth),
            &depth,
            |b, &depth| {
                b.iter_batched(
                    || chain(depth),
                    |(mut tree, ids)| {
                        let width = tree.properties().layout.width;
                        let change = tree.set_value(ids[depth], width, 123.0).unwrap();
                        black_box(change.is_some());
                        black_box(tree);
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.bench_function("unchanged", |b| {
        let (mut tree, ids) = chain(0);
        let width = tree.properties().layout.width;
        tree.set_value(ids[0], width, 123.0).unwrap();
        b.iter(|| black_box(tree.set_value(ids[0], width, 123.0).unwrap().is_none()));
    });

    group.bench_function("string", |b| {
        b.iter_batched(
            || chain(0),
            |(mut tree, ids)| {
                let text = tree.properties().text_block.text;
                let change = tree
                    .set_value(ids[0], text, String::from("hello world"))
                    .unwrap();
                black_box(change.is_some());
                black_box(tree);
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_property);
criterion_main!(benches);
