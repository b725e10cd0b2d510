//! Throughput Benchmark for csvdb
//!
//! This benchmark measures the store's local read and write paths
//! under various workloads.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use csvdb::{Entry, Options, Store};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// A small fixed-width row.
struct Sample {
    id: u64,
    value: String,
}

impl Sample {
    fn new(id: u64) -> Self {
        Self {
            id,
            value: format!("value:{}", id),
        }
    }
}

impl Entry for Sample {
    fn keys(&self) -> Vec<String> {
        vec!["id".into(), "value".into()]
    }

    fn values(&self) -> Vec<String> {
        vec![self.id.to_string(), self.value.clone()]
    }
}

fn new_store(dir: &TempDir) -> Arc<Store<Sample>> {
    let options = Options::new("bench", dir.path()).with_file_ttl(Duration::from_secs(3600));
    Arc::new(Store::new(options, None).unwrap())
}

/// Benchmark appends
fn bench_append(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let store = new_store(&dir);

    let mut group = c.benchmark_group("append");
    group.throughput(Throughput::Elements(1));

    group.bench_function("append_single_row", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key-{}", i % 100);
            store.append(&key, &[Sample::new(i)]).unwrap();
            i += 1;
        });
    });

    group.bench_function("append_batch_100", |b| {
        let batch: Vec<_> = (0..100).map(Sample::new).collect();
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("batch-{}", i % 100);
            store.append(&key, &batch).unwrap();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark reads of local files
fn bench_get(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let store = new_store(&dir);

    // Pre-populate with data
    let rows: Vec<_> = (0..1_000).map(Sample::new).collect();
    for i in 0..100 {
        store.append(&format!("key-{}", i), &rows).unwrap();
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        let mut out = Vec::with_capacity(64 * 1024);
        b.iter(|| {
            out.clear();
            let key = format!("key-{}", i % 100);
            black_box(store.get(&mut out, &key).unwrap());
            i += 1;
        });
    });

    group.bench_function("get_merged_10", |b| {
        let keys: Vec<_> = (0..10).map(|i| format!("key-{}", i)).collect();
        let mut out = Vec::with_capacity(640 * 1024);
        b.iter(|| {
            out.clear();
            store.get_merged(&mut out, &keys).unwrap();
            black_box(out.len());
        });
    });

    group.finish();
}

/// Benchmark read-modify-append
fn bench_append_with(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let store = new_store(&dir);
    store
        .append("counter", &(0..1_000).map(Sample::new).collect::<Vec<_>>())
        .unwrap();

    let mut group = c.benchmark_group("append_with");
    group.throughput(Throughput::Elements(1));

    group.bench_function("scan_then_append", |b| {
        b.iter(|| {
            store
                .append_with("counter", |rows| {
                    let mut count = 0u64;
                    rows.for_each(|_| {
                        count += 1;
                        Ok(())
                    })?;
                    Ok(vec![Sample::new(count)])
                })
                .unwrap();
        });
    });

    group.finish();
}

/// Benchmark concurrent access
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let dir = TempDir::new().unwrap();
            let store = new_store(&dir);
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let store = Arc::clone(&store);
                    thread::spawn(move || {
                        let mut out = Vec::new();
                        for i in 0..100 {
                            let key = format!("key-{}-{}", t, i % 10);
                            store.append(&key, &[Sample::new(i)]).unwrap();
                            out.clear();
                            store.get(&mut out, &key).unwrap();
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(store.stats());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_append,
    bench_get,
    bench_append_with,
    bench_concurrent,
);

criterion_main!(benches);
