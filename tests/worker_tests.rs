//! Tests for MuxWorker / MuxClient
//!
//! These tests verify:
//! - Requests round-trip through the worker queue
//! - Concurrent clients are serialized onto one mux
//! - Errors come back to the caller that triggered them
//! - Shutdown flushes and returns the mux

mod common;

use std::thread;

use bytes::Bytes;
use common::RecordingProvider;
use stashmux::{Config, MemoryProvider, MuxError, MuxWorker, ReadableSpace, Span, StoreMux};

// =============================================================================
// Helper Functions
// =============================================================================

fn spawn_worker(lengths: &[usize]) -> (MemoryProvider, MuxWorker<MemoryProvider>) {
    common::init_tracing();
    let (provider, names) = MemoryProvider::with_lengths(lengths);
    let config = Config::builder().worker_queue_size(4).build();
    let mux = StoreMux::with_config(provider.clone(), names, config).unwrap();
    let worker = MuxWorker::spawn(mux).unwrap();
    (provider, worker)
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_worker_byte_round_trip() {
    let (_provider, worker) = spawn_worker(&[4, 4]);
    let client = worker.client();

    client.set_byte(4, 0x5A).unwrap();

    assert_eq!(client.get_byte(4).unwrap(), 0x5A);
    assert_eq!(client.len(), 8);
    worker.shutdown().unwrap();
}

#[test]
fn test_worker_range_round_trip() {
    let (_provider, worker) = spawn_worker(&[4, 4]);
    let client = worker.client();

    client.write(vec![0xAAu8, 0xBB, 0xCC, 0xDD, 0xEE], 2).unwrap();
    let data = client.read(Span::new(2, 5)).unwrap();

    assert_eq!(data, Bytes::from_static(&[0xAA, 0xBB, 0xCC, 0xDD, 0xEE]));
    worker.shutdown().unwrap();
}

#[test]
fn test_worker_reports_errors() {
    let (_provider, worker) = spawn_worker(&[4, 4]);
    let client = worker.client();

    assert!(matches!(
        client.read(Span::new(6, 5)),
        Err(MuxError::OutOfBounds { .. })
    ));
    assert!(matches!(
        client.write_span(vec![1u8], Span::new(0, 3)),
        Err(MuxError::LengthExceedsData { .. })
    ));

    // The worker keeps serving after an error
    assert_eq!(client.get_byte(0).unwrap(), 0);
    worker.shutdown().unwrap();
}

#[test]
fn test_worker_explicit_flush() {
    let (provider, worker) = spawn_worker(&[4]);
    let client = worker.client();

    client.set_byte(0, 1).unwrap();
    assert_eq!(provider.contents("store_0").unwrap()[0], 0);

    client.flush().unwrap();
    assert_eq!(provider.contents("store_0").unwrap()[0], 1);
    worker.shutdown().unwrap();
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_clients_serialized() {
    let (provider, worker) = spawn_worker(&[16, 16, 16, 16]);

    let handles: Vec<_> = (0..4u8)
        .map(|t| {
            let client = worker.client();
            thread::spawn(move || {
                // Each thread owns one 16-byte store, all interleaving switches
                for i in 0..16u64 {
                    client.set_byte(t as u64 * 16 + i, t * 16 + i as u8).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let mut mux = worker.shutdown().unwrap();
    let expected: Vec<u8> = (0..64).collect();
    assert_eq!(&mux.read_all().unwrap()[..], &expected[..]);

    mux.close().unwrap();
    assert_eq!(&provider.contents("store_3").unwrap()[..], &expected[48..]);
}

#[test]
fn test_client_as_readable_space() {
    let (_provider, worker) = spawn_worker(&[2, 2]);
    let mut client = worker.client();
    client.write(vec![1u8, 2, 3, 4], 0).unwrap();

    assert_eq!(&ReadableSpace::read_all(&mut client).unwrap()[..], &[1, 2, 3, 4]);
    worker.shutdown().unwrap();
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_shutdown_flushes_pending_writes() {
    let (provider, worker) = spawn_worker(&[4, 4]);
    let client = worker.client();
    client.write(vec![9u8, 9, 9], 3).unwrap();

    let mux = worker.shutdown().unwrap();

    assert!(!mux.is_dirty());
    assert_eq!(&provider.contents("store_1").unwrap()[..], &[9, 9, 0, 0]);
}

#[test]
fn test_client_after_shutdown() {
    let (_provider, worker) = spawn_worker(&[4]);
    let client = worker.client();

    let _mux = worker.shutdown().unwrap();

    assert!(matches!(client.get_byte(0), Err(MuxError::WorkerStopped)));
}

#[test]
fn test_shutdown_reports_flush_failure() {
    common::init_tracing();
    let (provider, names) = RecordingProvider::with_lengths(&[4]);
    let mux = StoreMux::open(provider.clone(), names).unwrap();
    let worker = MuxWorker::spawn(mux).unwrap();

    worker.client().set_byte(0, 1).unwrap();
    provider.fail_save("store_0", true);

    assert!(matches!(worker.shutdown(), Err(MuxError::StoreSave { .. })));
}

#[test]
fn test_drop_without_shutdown_honors_flush_on_drop() {
    common::init_tracing();
    let (provider, names) = MemoryProvider::with_lengths(&[4]);
    let config = Config::builder().flush_on_drop(true).build();
    let mux = StoreMux::with_config(provider.clone(), names, config).unwrap();
    let worker = MuxWorker::spawn(mux).unwrap();
    let client = worker.client();

    client.set_byte(0, 9).unwrap();
    drop(worker);

    // The worker thread has been joined and the mux saved on drop
    assert_eq!(provider.contents("store_0").unwrap()[0], 9);
    assert!(matches!(client.get_byte(0), Err(MuxError::WorkerStopped)));
}

#[test]
fn test_drop_without_shutdown_discards_unsaved_writes() {
    let (provider, worker) = spawn_worker(&[4]);
    let client = worker.client();

    client.set_byte(0, 9).unwrap();
    drop(worker);

    assert_eq!(provider.contents("store_0").unwrap()[0], 0);
    assert!(matches!(client.get_byte(0), Err(MuxError::WorkerStopped)));
}
