//! Walkthrough of a 1 KiB heap.
//!
//! Demonstrates: init → three allocations → free the middle one → reuse it
//! with a smaller request → free everything → rejected frees.
//!
//! Every allocation record (requested, granted and fragmentation bytes) is
//! logged at `debug`, which is the default filter here. Set
//! `RUST_LOG=trace` to also see splits and merges, or `RUST_LOG=info` to
//! silence the records.

use blockheap::prelude::*;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "debug";

fn report(label: &str, allocation: &Allocation) {
    println!(
        "  {label}: {} ({} bytes requested, {} granted, {} bytes internal fragmentation)",
        allocation.addr(),
        allocation.requested(),
        allocation.len(),
        allocation.fragmentation(),
    );
}

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Blockheap Walkthrough ===\n");

    let mut heap = match Heap::new(HeapConfig::default()) {
        Ok(heap) => heap,
        Err(e) => {
            eprintln!("heap initialisation failed: {e}");
            std::process::exit(1);
        }
    };
    println!("Fresh heap:\n  {}\n", heap.dump());

    let p1 = heap.allocate(200).unwrap().unwrap();
    let p2 = heap.allocate(150).unwrap().unwrap();
    let p3 = heap.allocate(100).unwrap().unwrap();
    println!("After three allocations:");
    report("p1", &p1);
    report("p2", &p2);
    report("p3", &p3);
    println!("  {}\n", heap.dump());

    heap.free(p2.addr()).unwrap();
    println!("After freeing p2:\n  {}\n", heap.dump());

    let p4 = heap.allocate(140).unwrap().unwrap();
    println!("After allocating p4 (reuses p2's block):");
    report("p4", &p4);
    println!("  {}\n", heap.dump());

    heap.free(p1.addr()).unwrap();
    heap.free(p3.addr()).unwrap();
    println!("After freeing p1 and p3:\n  {}\n", heap.dump());

    heap.free(p4.addr()).unwrap();
    println!("After freeing every block:\n  {}\n", heap.dump());

    println!("Rejected frees:");
    for addr in [p4.addr(), Addr(4096), Addr(p1.addr().0 + 10)] {
        match heap.free(addr) {
            Ok(()) => println!("  {addr}: freed"),
            Err(e) => println!("  {addr}: {e}"),
        }
    }

    let summary = heap.summary();
    let stats = heap.stats();
    println!(
        "\nSummary: {} block(s), {} free bytes, {} descriptor bytes",
        summary.block_count, summary.free_bytes, summary.overhead_bytes,
    );
    println!(
        "Stats: {} allocations, {} frees, {} rejected frees, {} splits, {} merges",
        stats.allocations,
        stats.frees,
        stats.rejected_frees(),
        stats.splits,
        stats.merges,
    );
}
