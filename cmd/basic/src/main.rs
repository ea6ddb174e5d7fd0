//! Basic thread layer example
//!
//! Walks the whole surface: create/join, detach, one-time init, mutexes.
//!
//! # Environment Variables
//!
//! - `XPT_FLUSH_LOG=1` - Flush debug output immediately (useful for crash debugging)
//! - `XPT_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)
//! - `XPT_STACK_SIZE=65536` - Default stack size for created threads
//! - `XPT_TASK_NAME=pthread` - Base name for backing tasks
//! - `XPT_MAX_THREADS=1024` - Thread registry capacity

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use xpthread::{init_logging, HostScheduler, MutexKind, OnceGate, PthreadLayer, ThreadConfig};
use xpthread::{xdebug, xinfo};

// XPT_LOG_LEVEL=debug XPT_FLUSH_LOG=1 cargo run -p xpthread-basic
fn main() {
    println!("=== xpthread Basic Example ===\n");

    // Initialize logging (reads XPT_FLUSH_LOG and XPT_LOG_LEVEL env vars)
    init_logging();

    let config = ThreadConfig::new()
        .task_name("demo")
        .stack_size(64 * 1024)
        .max_threads(64);
    config.print();

    let pt = PthreadLayer::with_config(Arc::new(HostScheduler::new()), config)
        .expect("failed to build thread layer");

    // --- create / join ---
    let completed = Arc::new(AtomicUsize::new(0));
    let mut ids = Vec::new();
    for i in 1..=3 {
        let c = Arc::clone(&completed);
        let pt2 = pt.clone();
        let id = pt
            .create(move || {
                xdebug!("[thread {}] started", i);
                for j in 0..3 {
                    xdebug!("[thread {}] iteration {}", i, j);
                    pt2.yield_now();
                }
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        println!("Created thread {} (id={})", i, id);
        ids.push(id);
    }

    for id in ids {
        pt.join(id).unwrap();
    }
    println!("Joined {} thread(s)\n", completed.load(Ordering::SeqCst));

    // --- detach ---
    let pt2 = pt.clone();
    let detached = pt
        .create(move || {
            pt2.usleep(1_000);
            xdebug!("[detached] done");
        })
        .unwrap();
    pt.detach(detached).unwrap();
    println!("Detached thread {}", detached);

    // --- one-time init ---
    let gate = Arc::new(OnceGate::new());
    let runs = Arc::new(AtomicUsize::new(0));
    let mut ids = Vec::new();
    for _ in 0..4 {
        let pt2 = pt.clone();
        let gate = Arc::clone(&gate);
        let runs = Arc::clone(&runs);
        ids.push(
            pt.create(move || {
                pt2.once(&gate, || {
                    runs.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            })
            .unwrap(),
        );
    }
    for id in ids {
        pt.join(id).unwrap();
    }
    println!(
        "Once routine ran {} time(s) across 4 threads",
        runs.load(Ordering::SeqCst)
    );

    // --- mutex ---
    let mux = Arc::new(pt.mutex(MutexKind::Normal).unwrap());
    let shared = Arc::new(AtomicUsize::new(0));
    let mut ids = Vec::new();
    for _ in 0..2 {
        let mux = Arc::clone(&mux);
        let shared = Arc::clone(&shared);
        ids.push(
            pt.create(move || {
                for _ in 0..1_000 {
                    mux.lock();
                    // Non-atomic increment made safe by the mutex
                    let v = shared.load(Ordering::Relaxed);
                    shared.store(v + 1, Ordering::Relaxed);
                    mux.unlock();
                }
            })
            .unwrap(),
        );
    }
    for id in ids {
        pt.join(id).unwrap();
    }
    println!("Mutex-guarded counter: {}", shared.load(Ordering::Relaxed));

    // Let the detached thread drain before reporting
    let start = std::time::Instant::now();
    while pt.thread_count() != 0 {
        if start.elapsed() > std::time::Duration::from_secs(5) {
            println!("WARNING: Timeout waiting for detached thread!");
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }

    xinfo!("{} thread record(s) still live", pt.thread_count());
    println!("\n=== Example Complete ===");
}
