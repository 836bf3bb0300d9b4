//! Benchmark tests for critical operations
//!
//! Run with: cargo test --release bench -- --ignored --nocapture

use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;

use linkcut::cache::TtlCache;
use linkcut::shortener::ResolutionEngine;
use linkcut::store::{MappingStore, MemoryStore, RedbStore};

/// Benchmark helper to measure execution time
fn benchmark<F>(name: &str, iterations: usize, mut f: F)
where
    F: FnMut(),
{
    let start = Instant::now();

    for _ in 0..iterations {
        f();
    }

    let duration = start.elapsed();
    let avg_ms = duration.as_millis() as f64 / iterations as f64;
    let ops_per_sec = (iterations as f64 / duration.as_secs_f64()) as u64;

    println!("  {} ({} iterations)", name, iterations);
    println!("    Total time: {:?}", duration);
    println!("    Avg time: {:.3}ms", avg_ms);
    println!("    Throughput: {} ops/sec\n", ops_per_sec);
}

fn engine_over(store: Arc<dyn MappingStore>) -> Arc<ResolutionEngine> {
    Arc::new(ResolutionEngine::new(
        store,
        Arc::new(TtlCache::new()),
        "http://localhost:8080".to_string(),
    ))
}

#[tokio::test]
#[ignore] // Run explicitly with: cargo test bench --release -- --ignored --nocapture
async fn bench_create_links() {
    println!("\n=== Benchmark: Create Links ===\n");

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("bench.redb");
    let store: Arc<dyn MappingStore> =
        Arc::new(RedbStore::open(db_path.to_str().unwrap()).unwrap());
    let engine = engine_over(store);

    let iterations = 1000;
    benchmark("Create (redb)", iterations, || {
        engine
            .create("https://example.com/bench", 0, 1)
            .expect("create");
    });

    let engine = engine_over(Arc::new(MemoryStore::new()));
    benchmark("Create (memory)", iterations, || {
        engine
            .create("https://example.com/bench", 0, 1)
            .expect("create");
    });
}

#[tokio::test]
#[ignore]
async fn bench_resolve_cache_vs_store() {
    println!("\n=== Benchmark: Resolve (cache hit vs store fallback) ===\n");

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("bench.redb");
    let store: Arc<dyn MappingStore> =
        Arc::new(RedbStore::open(db_path.to_str().unwrap()).unwrap());
    let cache = Arc::new(TtlCache::new());
    let engine = Arc::new(ResolutionEngine::new(
        store.clone(),
        cache.clone(),
        "http://localhost:8080".to_string(),
    ));

    let created = engine.create("https://example.com/hot", 0, 1).unwrap();
    let code = created.code;

    let iterations = 10_000;
    benchmark("Resolve, cache hot", iterations, || {
        engine.resolve(&code).expect("resolve");
    });

    // Cold path: a cache that never hits forces the store read each time.
    struct NoCache;
    impl linkcut::cache::UrlCache for NoCache {
        fn get(&self, _: &str) -> Result<Option<String>, linkcut::error::CacheError> {
            Ok(None)
        }
        fn set(
            &self,
            _: &str,
            _: &str,
            _: std::time::Duration,
        ) -> Result<(), linkcut::error::CacheError> {
            Ok(())
        }
    }
    let cold = Arc::new(ResolutionEngine::new(
        store,
        Arc::new(NoCache),
        "http://localhost:8080".to_string(),
    ));
    benchmark("Resolve, store every time", iterations, || {
        cold.resolve(&code).expect("resolve");
    });
}

#[tokio::test]
#[ignore]
async fn bench_concurrent_creates() {
    println!("\n=== Benchmark: Concurrent Creates ===\n");

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("bench.redb");
    let store: Arc<dyn MappingStore> =
        Arc::new(RedbStore::open(db_path.to_str().unwrap()).unwrap());
    let engine = engine_over(store);

    let num_tasks = 100;
    let ops_per_task = 10;

    println!(
        "  Running {} concurrent tasks with {} ops each...",
        num_tasks, ops_per_task
    );

    let start = Instant::now();

    let mut handles = vec![];
    for task_id in 0..num_tasks {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            for op_id in 0..ops_per_task {
                engine
                    .create(
                        &format!("https://example.com/concurrent-{}-{}", task_id, op_id),
                        0,
                        task_id,
                    )
                    .expect("create");
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let duration = start.elapsed();
    let total_ops = num_tasks * ops_per_task;
    let ops_per_sec = total_ops as f64 / duration.as_secs_f64();

    println!("  Total operations: {}", total_ops);
    println!("  Total time: {:?}", duration);
    println!("  Throughput: {:.0} ops/sec\n", ops_per_sec);
}
