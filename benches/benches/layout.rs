// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Whole-frame updates through a root element.

use std::rc::Rc;

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kurbo::Rect;
use understory_binding::ObservableVec;
use understory_layout::{
    ColumnDefinition, ElementId, Grid, GridLength, ItemsControl, RootElement, RootOptions,
    TextBlock, VirtualizingStackPanel, template,
};

const VIEWPORT: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

fn list(rows: u32, virtualizing: bool) -> (RootElement, Rc<ObservableVec<Rc<u32>>>) {
    let mut root = RootElement::new(RootOptions::new(VIEWPORT));
    let source = Rc::new(ObservableVec::from_vec((0..rows).map(Rc::new).collect()));
    let tree = root.tree_mut();
    let list = tree.insert(ItemsControl::<u32>::new().with_template(template(|tree, item| {
        let label = tree.insert(TextBlock::new());
        let text = tree.properties().text_block.text;
        let value = item.downcast::<u32>().map_or(0, |value| *value);
        tree.set_value(label, text, value.to_string())?;
        Ok(label)
    })));
    let panel: Option<ElementId> = virtualizing.then(|| tree.insert(VirtualizingStackPanel::new()));
    tree.with_element::<ItemsControl<u32>, _>(list, |list, cx| {
        list.set_items_source(cx, Some(source.clone()));
        list.set_items_panel(cx, panel)
    })
    .and_then(|result| result)
    .unwrap();
    root.set_content(Some(list)).unwrap();
    (root, source)
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/first_update");
    for rows in [100_u32, 1_000] {
        for (name, virtualizing) in [("stack", false), ("virtualizing", true)] {
            group.bench_function(BenchmarkId::new(name, rows), |b| {
                b.iter_batched(
                    || list(rows, virtualizing),
                    |(mut root, source)| {
                        root.update().unwrap();
                        black_box((root, source));
                    },
                    BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();

    let mut group = c.benchmark_group("layout/append_and_update");
    group.bench_function("virtualizing/1000", |b| {
        let (mut root, source) = list(1_000, true);
        root.update().unwrap();
        let mut next = 1_000;
        b.iter(|| {
            source.push(Rc::new(next));
            next += 1;
            root.update().unwrap();
        });
    });
    group.finish();

    let mut group = c.benchmark_group("layout/grid_resize");
    group.bench_function("columns/32", |b| {
        let mut root = RootElement::new(RootOptions::new(VIEWPORT));
        let columns = (0..32).map(|i| {
            ColumnDefinition::new(if i % 2 == 0 {
                GridLength::Auto
            } else {
                GridLength::Star(1.0)
            })
        });
        let tree = root.tree_mut();
        let grid = tree.insert(Grid::new().with_columns(columns));
        let column = tree.properties().grid.column;
        for i in 0..32_usize {
            let cell = tree.insert(TextBlock::new());
            tree.set_value(cell, column, i).unwrap();
            tree.add_child::<Grid>(grid, cell).unwrap();
        }
        root.set_content(Some(grid)).unwrap();
        let mut wide = false;
        b.iter(|| {
            wide = !wide;
            let width = if wide { 1_000.0 } else { 800.0 };
            root.set_viewport(Rect::new(0.0, 0.0, width, 600.0));
            root.update().unwrap();
        });
    });
    group.finish();
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
