//! Concurrent Cache Usage Examples
//!
//! This example demonstrates multi-threaded usage patterns for the lrucache
//! `Cache` type.
//!
//! Run with: cargo run --example concurrent_usage

use lrucache::config::LruCacheConfig;
use lrucache::metrics::CacheMetrics;
use lrucache::{Cache, CacheError};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

fn lru_config(capacity: usize) -> LruCacheConfig {
    LruCacheConfig {
        capacity: NonZeroUsize::new(capacity).unwrap(),
    }
}

fn main() {
    println!("Concurrent Cache Usage Examples");
    println!("================================\n");

    basic_concurrent_usage();
    println!();

    zero_copy_get_with();
    println!();

    add_as_claim();
    println!();

    resize_under_load();
    println!();

    throughput_by_thread_count();
}

/// Basic multi-threaded cache usage
fn basic_concurrent_usage() {
    println!("1. Basic Concurrent Usage");
    println!("   -----------------------");

    let cache = Arc::new(Cache::init(lru_config(1000), None));

    let num_threads = 4;
    let ops_per_thread = 1000;

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let key = format!("thread{}-key{}", thread_id, i);
                    let value = thread_id * 10000 + i;

                    cache.set(key.clone(), value);

                    // Another thread may have evicted it already
                    if let Ok(v) = cache.get(&key) {
                        assert_eq!(v, value);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    println!(
        "   Completed {} operations across {} threads",
        num_threads * ops_per_thread * 2, // set + get per iteration
        num_threads
    );
    println!(
        "   Final cache size: {} of {} items",
        cache.len(),
        cache.size()
    );

    let metrics = cache.metrics();
    println!(
        "   Hit rate: {:.2}, evictions: {}",
        metrics["hit_rate"], metrics["evictions"]
    );
}

/// Zero-copy access pattern using get_with()
fn zero_copy_get_with() {
    println!("2. Zero-Copy Access with get_with()");
    println!("   ----------------------------------");

    let cache: Cache<String, Vec<u8>> = Cache::new(100);

    cache.set("large_key".to_string(), vec![1u8; 1024]);

    let sum = cache.get_with("large_key", |data| {
        data.iter().map(|&x| x as u64).sum::<u64>()
    });
    println!("   Computed sum without cloning: {}", sum.unwrap_or_default());

    match cache.get_with("missing", |data| data.len()) {
        Ok(len) => println!("   Unexpected hit: {} bytes", len),
        Err(CacheError::NotFound) => println!("   Missing key reports: {}", CacheError::NotFound),
        Err(e) => println!("   Unexpected error: {}", e),
    }
}

/// Using add() so that only one of several racing threads stores a value
fn add_as_claim() {
    println!("3. add() as a First-Writer-Wins Claim");
    println!("   ------------------------------------");

    let cache: Arc<Cache<&'static str, usize>> = Arc::new(Cache::new(16));

    let handles: Vec<_> = (0..8)
        .map(|thread_id| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.add("job-42", thread_id).is_ok())
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .filter(|&won| won)
        .count();

    println!("   Threads that stored the key: {}", winners);
    println!("   Owner: thread {}", cache.get(&"job-42").unwrap_or_default());
}

/// Shrinking the cache while writers keep running
fn resize_under_load() {
    println!("4. Resizing Under Load");
    println!("   --------------------");

    let cache: Arc<Cache<usize, usize>> = Arc::new(Cache::new(10_000));

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..10_000 {
                    cache.set(t * 10_000 + i, i);
                }
            })
        })
        .collect();

    for size in [5_000, 1_000, 100] {
        cache.set_size(size);
        println!("   Resized to {}: {} items held", size, cache.len());
    }

    for handle in writers {
        handle.join().expect("Thread panicked");
    }

    println!("   After writers finished: {} items", cache.len());
    println!("   Most recent keys: {:?}", &cache.keys()[..5]);
}

/// Throughput as the number of threads sharing one lock grows
fn throughput_by_thread_count() {
    println!("5. Throughput by Thread Count");
    println!("   ---------------------------");

    let ops_per_thread = 100_000;

    for num_threads in [1, 2, 4, 8] {
        let cache: Arc<Cache<usize, usize>> = Arc::new(Cache::new(10_000));
        let start = Instant::now();

        let handles: Vec<_> = (0..num_threads)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..ops_per_thread {
                        let key = (t * ops_per_thread + i) % 20_000;
                        if i % 4 == 0 {
                            cache.set(key, i);
                        } else {
                            let _ = cache.get(&key);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        let elapsed = start.elapsed();
        let total_ops = num_threads * ops_per_thread;
        println!(
            "   {:>2} threads: {:>10.0} ops/sec",
            num_threads,
            total_ops as f64 / elapsed.as_secs_f64()
        );
    }
}
