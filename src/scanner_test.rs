use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use ipnetwork::Ipv4Network;

use crate::{
    private_range_masks, public_blacklist_masks, CancelToken, InclusionFilter, IpScanError,
    PrivateScan, Scanner, WorkerBounds,
};

type Found = Arc<Mutex<Vec<String>>>;

fn collect<F: InclusionFilter>(scanner: &mut Scanner<F>) -> Found {
    let found: Found = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&found);
    scanner.on_address_generated(move |_, args| {
        sink.lock().unwrap().push(args.address().to_owned());
    });
    found
}

fn take(found: &Found) -> Vec<String> {
    std::mem::take(&mut *found.lock().unwrap())
}

fn distinct(addresses: &[String]) -> HashSet<String> {
    addresses.iter().cloned().collect()
}

fn counter<F: InclusionFilter>(scanner: &mut Scanner<F>) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    scanner.on_address_generated(move |_, _| {
        seen.fetch_add(1, Ordering::Relaxed);
    });
    count
}

fn private_networks() -> Vec<Ipv4Network> {
    ["192.168.0.0/16", "10.0.0.0/8", "172.16.0.0/12"]
        .iter()
        .map(|net| net.parse().unwrap())
        .collect()
}

#[test]
fn test_single_wildcard() {
    let _ = env_logger::try_init();

    let mut scanner = Scanner::new();
    let found = collect(&mut scanner);
    scanner.scan("192.168.1.X").unwrap();

    let addresses = take(&found);
    assert_eq!(addresses.len(), 256);
    let expected: HashSet<String> = (0..=255).map(|i| format!("192.168.1.{i}")).collect();
    assert_eq!(distinct(&addresses), expected);
}

#[test]
fn test_wildcard_is_case_insensitive() {
    let _ = env_logger::try_init();

    let mut scanner = Scanner::new();
    let found = collect(&mut scanner);
    scanner.scan("10.0.0.x").unwrap();
    let lower = distinct(&take(&found));

    scanner.scan("10.0.0.X").unwrap();
    let upper = distinct(&take(&found));

    assert_eq!(lower.len(), 256);
    assert_eq!(lower, upper);
}

#[test]
fn test_two_wildcards() {
    let _ = env_logger::try_init();

    let mut scanner = Scanner::new();
    let found = collect(&mut scanner);
    scanner.scan("10.0.X.X").unwrap();

    let addresses = take(&found);
    assert_eq!(addresses.len(), 256 * 256);
    let unique = distinct(&addresses);
    assert_eq!(unique.len(), 256 * 256);
    for address in &unique {
        let ip: Ipv4Addr = address.parse().unwrap();
        assert_eq!(ip.octets()[..2], [10, 0], "unexpected address {}", address);
    }
}

#[test]
fn test_non_contiguous_wildcards() {
    let _ = env_logger::try_init();

    let mut scanner = Scanner::new();
    let found = collect(&mut scanner);
    scanner.scan("192.X.168.X").unwrap();

    let unique = distinct(&take(&found));
    assert_eq!(unique.len(), 256 * 256);
    for address in &unique {
        let octets = address.parse::<Ipv4Addr>().unwrap().octets();
        assert_eq!(octets[0], 192);
        assert_eq!(octets[2], 168);
    }
}

#[test]
#[ignore = "emits 16M addresses"]
fn test_three_wildcards() {
    let mut scanner = Scanner::new();
    let count = counter(&mut scanner);
    scanner.scan("10.X.X.X").unwrap();
    assert_eq!(count.load(Ordering::Relaxed), 256 * 256 * 256);
}

#[test]
fn test_mask_without_wildcard() {
    let _ = env_logger::try_init();

    let mut scanner = Scanner::new();
    let found = collect(&mut scanner);
    scanner.scan("1.2.3.4").unwrap();
    assert_eq!(take(&found), vec!["1.2.3.4".to_owned()]);

    let mut scanner = Scanner::blacklist(["1.2.3.4"]);
    let found = collect(&mut scanner);
    scanner.scan("1.2.3.4").unwrap();
    assert!(take(&found).is_empty());
}

#[test]
fn test_trailing_literal_fields() {
    let _ = env_logger::try_init();

    let mut scanner = Scanner::new();
    let found = collect(&mut scanner);
    scanner.scan("10.X.0.1").unwrap();

    let expected: HashSet<String> = (0..=255).map(|i| format!("10.{i}.0.1")).collect();
    let addresses = take(&found);
    assert_eq!(addresses.len(), 256);
    assert_eq!(distinct(&addresses), expected);
}

#[test]
fn test_malformed_mask_is_not_rejected() {
    let _ = env_logger::try_init();

    let mut scanner = Scanner::new();
    let found = collect(&mut scanner);
    scanner.scan("300.1.1.X").unwrap();

    let addresses = take(&found);
    assert_eq!(addresses.len(), 256);
    assert!(addresses.iter().all(|a| a.parse::<Ipv4Addr>().is_err()));
}

#[test]
fn test_blacklist_scan() {
    let _ = env_logger::try_init();

    let mut scanner = Scanner::blacklist(["192.168.0.X"]);
    let found = collect(&mut scanner);
    scanner.scan("192.168.X.X").unwrap();

    let addresses = take(&found);
    assert_eq!(addresses.len(), 256 * 256 - 256);
    assert_eq!(distinct(&addresses).len(), addresses.len());

    let excluded: Ipv4Network = "192.168.0.0/24".parse().unwrap();
    let range: Ipv4Network = "192.168.0.0/16".parse().unwrap();
    for address in &addresses {
        let ip: Ipv4Addr = address.parse().unwrap();
        assert!(range.contains(ip), "{} outside {}", ip, range);
        assert!(!excluded.contains(ip), "{} should be blacklisted", ip);
    }
}

#[test]
fn test_blacklist_matches_at_exact_depth_only() {
    let _ = env_logger::try_init();

    // The candidate jumps from no fixed octet straight to a full address, so
    // the key `192.168.0` is never seen and nothing is pruned.
    let mut scanner = Scanner::blacklist(["192.168.0.X"]);
    let found = collect(&mut scanner);
    scanner.scan("192.168.0.X").unwrap();
    assert_eq!(take(&found).len(), 256);
}

#[test]
fn test_filter_is_consulted_at_every_depth() {
    let _ = env_logger::try_init();

    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let mut scanner = Scanner::with_filter(move |candidate: &str| {
        counted.fetch_add(1, Ordering::Relaxed);
        candidate == "10" || candidate.starts_with("10.0")
    });
    let found = collect(&mut scanner);
    scanner.scan("X.X.X.1").unwrap();

    let expected: HashSet<String> = (0..=255).map(|i| format!("10.0.{i}.1")).collect();
    assert_eq!(distinct(&take(&found)), expected);
    // First octet, second octet, third octet, then each full address.
    assert_eq!(calls.load(Ordering::Relaxed), 4 * 256);
}

#[test]
fn test_multi_mask_scan() {
    let _ = env_logger::try_init();

    let mut scanner = Scanner::new();
    let found = collect(&mut scanner);
    scanner.scan_all(["192.168.1.X", "192.168.0.X"]).unwrap();

    let addresses = take(&found);
    assert_eq!(addresses.len(), 512);

    let expected: HashSet<String> = (0..=255)
        .flat_map(|i| [format!("192.168.1.{i}"), format!("192.168.0.{i}")])
        .collect();
    assert_eq!(distinct(&addresses), expected);
}

#[test]
fn test_multi_mask_scan_keeps_duplicates() {
    let _ = env_logger::try_init();

    let mut scanner = Scanner::new();
    let found = collect(&mut scanner);
    scanner
        .scan_all(vec!["10.0.0.X".to_owned(), "10.0.0.X".to_owned()])
        .unwrap();

    let addresses = take(&found);
    assert_eq!(addresses.len(), 512);
    assert_eq!(distinct(&addresses).len(), 256);
}

#[test]
fn test_scan_without_handler_fails() {
    let _ = env_logger::try_init();

    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let scanner = Scanner::with_filter(move |_: &str| {
        counted.fetch_add(1, Ordering::Relaxed);
        true
    });

    assert!(matches!(
        scanner.scan("192.168.1.X"),
        Err(IpScanError::NoHandler)
    ));
    assert!(matches!(
        scanner.scan_all(["192.168.1.X", "192.168.0.X"]),
        Err(IpScanError::NoHandler)
    ));
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn test_invalid_bounds_prevent_emission() {
    let _ = env_logger::try_init();

    let mut scanner = Scanner::new();
    let count = counter(&mut scanner);
    scanner.set_worker_bounds(WorkerBounds::default().minimum(8).maximum(2));

    match scanner.scan("192.168.1.X") {
        Err(IpScanError::InvalidWorkerBounds { minimum, maximum }) => {
            assert_eq!((minimum, maximum), (8, 2));
        }
        other => panic!("Expected InvalidWorkerBounds, got: {:?}", other),
    }
    assert_eq!(count.load(Ordering::Relaxed), 0);

    // The failed pool is not cached; fixing the bounds makes the scan work.
    scanner.set_minimum_worker_count(1);
    scanner.scan("192.168.1.X").unwrap();
    assert_eq!(count.load(Ordering::Relaxed), 256);
}

#[test]
fn test_maximum_worker_count_bounds_pool() {
    let _ = env_logger::try_init();

    let names = Arc::new(Mutex::new(HashSet::new()));
    let sink = Arc::clone(&names);

    let mut scanner = Scanner::new();
    scanner.set_maximum_worker_count(2);
    scanner.on_address_generated(move |_, _| {
        let name = thread::current().name().unwrap_or_default().to_owned();
        sink.lock().unwrap().insert(name);
    });
    scanner.scan("10.0.X.X").unwrap();

    // Bounds are applied once; the pool keeps its size.
    scanner.set_maximum_worker_count(8);
    scanner.scan_all(["10.1.X.X", "10.2.X.X"]).unwrap();

    let names = names.lock().unwrap();
    assert!(!names.is_empty());
    assert!(names.len() <= 2, "too many workers: {:?}", names);
    for name in names.iter() {
        assert!(
            name == "ipscan-worker-0" || name == "ipscan-worker-1",
            "unexpected worker {:?}",
            name
        );
    }
}

#[test]
fn test_all_handlers_receive_every_address() {
    let _ = env_logger::try_init();

    let mut scanner = Scanner::new();
    let first = counter(&mut scanner);
    let second = counter(&mut scanner);

    let id = scanner.id();
    let mismatched = Arc::new(AtomicUsize::new(0));
    let wrong = Arc::clone(&mismatched);
    scanner.on_address_generated(move |sender, _| {
        if sender != id {
            wrong.fetch_add(1, Ordering::Relaxed);
        }
    });

    scanner.scan("172.16.0.X").unwrap();
    assert_eq!(first.load(Ordering::Relaxed), 256);
    assert_eq!(second.load(Ordering::Relaxed), 256);
    assert_eq!(mismatched.load(Ordering::Relaxed), 0);
}

#[test]
fn test_repeated_scans_yield_same_set() {
    let _ = env_logger::try_init();

    let mut scanner = Scanner::blacklist(["10.0.5.X"]);
    let found = collect(&mut scanner);

    scanner.scan("10.0.X.X").unwrap();
    let first = distinct(&take(&found));
    scanner.scan("10.0.X.X").unwrap();
    let second = distinct(&take(&found));

    assert_eq!(first.len(), 256 * 255);
    assert_eq!(first, second);
}

#[test]
fn test_public_blacklist_excludes_private_ranges() {
    let _ = env_logger::try_init();

    let mut scanner = Scanner::blacklist(public_blacklist_masks());
    let found = collect(&mut scanner);
    scanner.scan("X.X.0.1").unwrap();

    let addresses = take(&found);
    // 254 first octets (no 10, no 127), minus 192.168 and 172.16 - 172.31.
    assert_eq!(addresses.len(), 254 * 256 - 17);
    assert_eq!(distinct(&addresses).len(), addresses.len());

    let mut excluded = private_networks();
    excluded.push("127.0.0.0/8".parse().unwrap());
    for address in &addresses {
        let ip: Ipv4Addr = address.parse().unwrap();
        if let Some(net) = excluded.iter().find(|net| net.contains(ip)) {
            panic!("{} is inside {}", ip, net);
        }
    }
}

#[test]
#[ignore = "emits the whole private range"]
fn test_private_scan() {
    let _ = env_logger::try_init();

    let networks = private_networks();
    let outside = Arc::new(AtomicUsize::new(0));
    let count = Arc::new(AtomicUsize::new(0));
    let (seen, stray) = (Arc::clone(&count), Arc::clone(&outside));

    PrivateScan::new(move |_, args| {
        seen.fetch_add(1, Ordering::Relaxed);
        let ip = args.ip().unwrap();
        if !networks.iter().any(|net| net.contains(ip)) {
            stray.fetch_add(1, Ordering::Relaxed);
        }
    })
    .scan()
    .unwrap();

    assert_eq!(private_range_masks().len(), 18);
    assert_eq!(
        count.load(Ordering::Relaxed),
        256 * 256 + 256 * 256 * 256 + 16 * 256 * 256
    );
    assert_eq!(outside.load(Ordering::Relaxed), 0);
}

#[test]
fn test_cancel_stops_scan() {
    let _ = env_logger::try_init();

    let token = CancelToken::new();
    let mut scanner = Scanner::new();
    scanner.set_maximum_worker_count(2);
    scanner.set_cancel_token(token.clone());

    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    scanner.on_address_generated(move |_, _| {
        if seen.fetch_add(1, Ordering::Relaxed) + 1 >= 10 {
            token.cancel();
        }
    });

    assert!(matches!(
        scanner.scan("10.0.X.X"),
        Err(IpScanError::Cancelled)
    ));
    let emitted = count.load(Ordering::Relaxed);
    assert!(emitted >= 10);
    assert!(emitted < 256 * 256, "scan was not cut short: {}", emitted);

    // The token stays cancelled, so later scans emit nothing.
    assert!(matches!(
        scanner.scan_all(["10.1.X.X", "10.2.X.X"]),
        Err(IpScanError::Cancelled)
    ));
    assert_eq!(count.load(Ordering::Relaxed), emitted);
    assert!(scanner.cancel_token().is_some_and(CancelToken::is_cancelled));
}
