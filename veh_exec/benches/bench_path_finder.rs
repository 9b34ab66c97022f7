//! # Path Finder Benchmark

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use veh_lib::odv::{GridMap, PathFinder};

/// Side length of the generated grid, in tiles.
const GRID_SIZE: usize = 100;

/// Build a square serpentine grid: every other row is a wall with a single gap, alternating
/// between the east and west ends, so the only route from home to load visits every track row.
fn serpentine_grid(size: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::with_capacity(size);

    for y in 0..size {
        let mut row: Vec<char> = if y % 2 == 0 {
            vec!['#'; size]
        } else {
            let mut r = vec!['X'; size];
            let gap = if (y / 2) % 2 == 0 { size - 1 } else { 0 };
            r[gap] = '#';
            r
        };

        if y == 0 {
            row[0] = 'H';
            row[1] = 'U';
        }
        if y == size - 1 {
            row[size - 1] = 'L';
        }

        lines.push(row.into_iter().collect());
    }

    lines
}

fn path_finder_benchmark(c: &mut Criterion) {
    // ---- Build the grid ----

    let grid = Arc::new(GridMap::load(&serpentine_grid(GRID_SIZE)).unwrap());
    let finder = PathFinder::new(grid.clone());

    // Make sure the goal is reachable before timing anything
    let path = finder.shortest_path(grid.home(), grid.load_tile()).unwrap();
    assert!(path.len() > GRID_SIZE * GRID_SIZE / 4);

    c.bench_function("PathFinder::shortest_path::serpentine", |b| {
        b.iter(|| finder.shortest_path(grid.home(), grid.load_tile()).unwrap())
    });

    c.bench_function("PathFinder::shortest_path::adjacent", |b| {
        b.iter(|| finder.shortest_path(grid.home(), grid.unload()).unwrap())
    });

    c.bench_function("PathFinder::shortest_path_with_report", |b| {
        b.iter(|| finder.shortest_path_with_report(grid.home(), grid.load_tile()))
    });
}

criterion_group!(benches, path_finder_benchmark);
criterion_main!(benches);
