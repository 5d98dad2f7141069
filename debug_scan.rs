// Run with: cargo run -p achilles-core --example debug_scan -- [lib_root] [bin_root]
// Prints progress once per second while the scan runs, then the top 20 libraries.

use achilles_core::{LddResolver, ScanConfig, ScanMessage, Scanner, format_count};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config = ScanConfig::default();
    if let Some(lib_root) = args.next() {
        config.library_roots = vec![PathBuf::from(lib_root)];
    }
    if let Some(bin_root) = args.next() {
        config.binary_roots = vec![PathBuf::from(bin_root)];
    }

    println!(
        "Scanning: libs={:?} bins={:?}",
        config.library_roots, config.binary_roots
    );

    let resolver = match LddResolver::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let scanner = Scanner::new(config, Arc::new(resolver));
    let aggregate = scanner.aggregate();
    let (rx, handle) = scanner.scan();

    let start = Instant::now();
    loop {
        match rx.recv_timeout(Duration::from_secs(1)) {
            Ok(ScanMessage::Phase(phase)) => {
                println!("[{:>6.1}s] PHASE {phase}", start.elapsed().as_secs_f64());
            }
            Ok(ScanMessage::Completed) => {
                println!("[{:>6.1}s] COMPLETED", start.elapsed().as_secs_f64());
                break;
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                let p = aggregate.progress();
                println!(
                    "[{:>6.1}s] libs={}/{} bins={}/{} observed={} in_flight={}",
                    start.elapsed().as_secs_f64(),
                    p.libraries_resolved,
                    p.libraries_discovered,
                    p.binaries_resolved,
                    p.binaries_discovered,
                    p.libraries_observed,
                    p.in_flight,
                );
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    let aggregate = handle.join().unwrap();
    for row in aggregate.ranked().iter().take(20) {
        println!(
            "{:>4}  {:>8}  {:>6.1}%  {}",
            row.rank,
            format_count(row.uses),
            row.percent,
            row.library.display()
        );
    }
    for message in aggregate.recent_messages(10) {
        println!("! {message}");
    }
}
