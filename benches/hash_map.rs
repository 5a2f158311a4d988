use criterion::{criterion_group, criterion_main, Criterion};
use segmap::HashMap;
use std::time::{Duration, Instant};

fn insert_cold(c: &mut Criterion) {
    c.bench_function("HashMap: insert, cold", |b| {
        b.iter_custom(|iters| {
            let mut hashmap: HashMap<u64, u64> = HashMap::default();
            let start = Instant::now();
            for i in 0..iters {
                assert!(hashmap.insert(i, i).is_ok());
            }
            start.elapsed()
        })
    });
}

fn insert_warmed_up(c: &mut Criterion) {
    c.bench_function("HashMap: insert, warmed up", |b| {
        b.iter_custom(|iters| {
            let mut hashmap: HashMap<u64, u64> = HashMap::with_capacity(iters as usize * 2);
            let start = Instant::now();
            for i in 0..iters {
                assert!(hashmap.insert(i, i).is_ok());
            }
            start.elapsed()
        })
    });
}

fn read(c: &mut Criterion) {
    c.bench_function("HashMap: read", |b| {
        b.iter_custom(|iters| {
            let mut hashmap: HashMap<u64, u64> = HashMap::with_capacity(iters as usize * 2);
            for i in 0..iters {
                assert!(hashmap.insert(i, i).is_ok());
            }
            let start = Instant::now();
            for i in 0..iters {
                assert_eq!(hashmap.get(&i), Ok(&i));
            }
            start.elapsed()
        })
    });
}

fn remove_reinsert(c: &mut Criterion) {
    c.bench_function("HashMap: remove and reinsert", |b| {
        b.iter_custom(|iters| {
            let mut hashmap: HashMap<u64, u64> = (0..1024).map(|i| (i, i)).collect();
            let start = Instant::now();
            for i in 0..iters {
                let key = i % 1024;
                assert!(hashmap.remove(&key));
                assert!(hashmap.insert(key, i).is_ok());
            }
            start.elapsed()
        })
    });
}

fn insert_tail_latency(c: &mut Criterion) {
    c.bench_function("HashMap: insert_tail_latency", move |b| {
        b.iter_custom(|iters| {
            let mut duration = Duration::default();
            for _ in 0..iters {
                let mut hashmap: HashMap<u64, u64> = HashMap::default();
                let mut key = 0;
                let mut max_duration = Duration::default();
                (0..1048576).for_each(|_| {
                    key += 1;
                    let start = Instant::now();
                    assert!(hashmap.insert(key, key).is_ok());
                    let elapsed = start.elapsed();
                    if elapsed > max_duration {
                        max_duration = elapsed;
                    }
                });
                duration += max_duration;
            }
            duration
        })
    });
}

criterion_group!(
    hash_map,
    insert_cold,
    insert_tail_latency,
    insert_warmed_up,
    read,
    remove_reinsert
);
criterion_main!(hash_map);
