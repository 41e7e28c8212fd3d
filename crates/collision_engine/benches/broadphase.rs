//! Quadtree against a linear scan, and a full collision sweep

use std::cell::RefCell;
use std::rc::Rc;

use collision_engine::prelude::*;
use collision_engine::spatial::FlatList;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const WORLD: f32 = 1000.0;

fn scattered_rects(count: usize, seed: u64) -> Vec<BoundingBox> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let x = rng.gen_range(0.0..WORLD - 4.0);
            let y = rng.gen_range(0.0..WORLD - 4.0);
            BoundingBox::from_2d(Vec2::new(x, y), Vec2::new(x + 4.0, y + 4.0))
        })
        .collect()
}

fn bench_query(c: &mut Criterion) {
    let world = BoundingBox::from_2d(Vec2::new(0.0, 0.0), Vec2::new(WORLD, WORLD));
    let queries = scattered_rects(64, 99);
    let mut group = c.benchmark_group("query");

    for count in [1_000usize, 10_000] {
        let rects = scattered_rects(count, 1);
        let mut tree = Quadtree::new(world, QuadtreeConfig::default()).expect("valid world");
        let mut flat = FlatList::new();
        for (id, bounds) in rects.iter().enumerate() {
            tree.insert(id, *bounds).expect("insert");
            flat.insert(id, *bounds).expect("insert");
        }

        group.bench_with_input(BenchmarkId::new("quadtree", count), &tree, |b, tree| {
            let mut out = Vec::new();
            b.iter(|| {
                for region in &queries {
                    out.clear();
                    black_box(tree.collect_intersecting(region, &mut out));
                }
            });
        });
        group.bench_with_input(BenchmarkId::new("linear", count), &flat, |b, flat| {
            let mut out = Vec::new();
            b.iter(|| {
                for region in &queries {
                    out.clear();
                    black_box(flat.collect_intersecting(region, &mut out));
                }
            });
        });
    }
    group.finish();
}

struct Body {
    bounds: BoundingBox,
    is_static: bool,
    hits: u32,
}

impl Collidable for Body {
    fn bounding_box(&self) -> BoundingBox {
        self.bounds
    }

    fn is_static(&self) -> bool {
        self.is_static
    }

    fn collides(&self, other: &dyn Collidable) -> bool {
        self.bounds.intersects(&other.bounding_box())
    }

    fn collision_response(&mut self, _other: &dyn Collidable) {
        self.hits += 1;
    }
}

fn bench_sweep(c: &mut Criterion) {
    let world = BoundingBox::from_2d(Vec2::new(0.0, 0.0), Vec2::new(WORLD, WORLD));
    let mut engine = CollisionEngine::new(world).expect("valid world");
    let mut owned: Vec<SharedCollidable> = Vec::new();

    for (index, bounds) in scattered_rects(10_000, 3).into_iter().enumerate() {
        let body: SharedCollidable = Rc::new(RefCell::new(Body {
            bounds,
            is_static: index >= 200,
            hits: 0,
        }));
        engine.add(&body).expect("register");
        owned.push(body);
    }

    c.bench_function("sweep 200 dynamic / 9800 static", |b| {
        b.iter(|| black_box(engine.sweep().expect("sweep")));
    });
    drop(owned);
}

criterion_group!(benches, bench_query, bench_sweep);
criterion_main!(benches);
