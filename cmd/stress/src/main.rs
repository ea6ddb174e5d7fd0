//! Stress test - thread lifecycle churn
//!
//! Creates and reclaims large numbers of threads in waves, alternating
//! between join and detach reclamation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use xpthread::{HostScheduler, PthreadLayer, ThreadConfig};

fn main() {
    println!("=== xpthread Stress Test ===\n");

    let num_threads: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(5_000);

    let batch: usize = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(250);

    println!("Creating {} threads in batches of {}...", num_threads, batch);

    let config = ThreadConfig::new()
        .task_name("stress")
        .max_threads((batch + 16) as u32);
    let pt = PthreadLayer::with_config(Arc::new(HostScheduler::new()), config)
        .expect("failed to build thread layer");

    let completed = Arc::new(AtomicU64::new(0));
    let start = Instant::now();

    let mut created = 0usize;
    let mut wave = 0usize;
    while created < num_threads {
        let count = batch.min(num_threads - created);

        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let completed = Arc::clone(&completed);
            let pt2 = pt.clone();
            ids.push(
                pt.create(move || {
                    // Do a little work
                    for _ in 0..10 {
                        pt2.yield_now();
                    }
                    completed.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap(),
            );
        }

        // Alternate the reclamation path so both join and detached
        // self-reclaim get exercised
        if wave % 2 == 0 {
            for id in ids {
                pt.join(id).unwrap();
            }
        } else {
            for id in ids {
                pt.detach(id).unwrap();
            }
            let drain = Instant::now();
            while pt.thread_count() != 0 {
                if drain.elapsed().as_secs() > 30 {
                    println!("\nTimeout! {} record(s) still live", pt.thread_count());
                    break;
                }
                std::thread::yield_now();
            }
        }

        created += count;
        wave += 1;
        print!("\rCompleted: {}/{}", created, num_threads);
    }

    let total_time = start.elapsed();

    println!("\n\n=== Results ===");
    println!("Total threads: {}", num_threads);
    println!("Completed:     {}", completed.load(Ordering::Relaxed));
    println!("Live records:  {}", pt.thread_count());
    println!("Total time:    {:?}", total_time);
    println!(
        "Throughput:    {:.0} threads/sec",
        num_threads as f64 / total_time.as_secs_f64()
    );

    println!("\n=== Stress Test Complete ===");
}
