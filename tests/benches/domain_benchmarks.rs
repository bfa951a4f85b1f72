//! # Domain Layer Benchmarks
//!
//! | Area | Operation | Target |
//! |------|-----------|--------|
//! | xs-01 Ring Transport | 1 KiB round trip through both rings | < 10us |
//! | xs-02 Write Rate Limit | credit update + debit | < 1us |
//! | xs-03 Domain Registry | sweep over N healthy domains | linear in N |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_types::{DomainId, EvtchnPort, FrameId};
use std::sync::Arc;
use std::time::Duration;
use xs_01_ring_transport::test_utils::{GuestEnd, MockEventChannel};
use xs_01_ring_transport::{RingInterface, RingTransport};
use xs_02_write_rate_limit::{WriteRateLimiter, WrlAccount, WrlTimestamp};
use xs_03_domain_registry::test_utils::{dom0, TestHarness};
use xs_03_domain_registry::DomainAdminApi;

// ============================================================================
// XS-01: Ring Transport
// ============================================================================

fn bench_ring_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("xs-01-ring-transport");
    group.measurement_time(Duration::from_secs(5));

    let transport = RingTransport::new(Arc::new(MockEventChannel::new()));
    let iface = Arc::new(RingInterface::new());
    let guest = GuestEnd::new(Arc::clone(&iface));
    let port = EvtchnPort(1);

    for size in [64usize, 512, 1000] {
        let payload = vec![0x5au8; size];
        let mut buf = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64 * 2));
        group.bench_with_input(BenchmarkId::new("round_trip", size), &size, |b, _| {
            b.iter(|| {
                guest.send_request(&payload);
                let mut got = 0;
                while got < size {
                    got += transport.read(&iface, port, &mut buf[got..]).unwrap_or(0);
                }
                let written = transport
                    .write_all_available(&iface, port, black_box(&buf))
                    .unwrap_or(0);
                black_box(guest.recv_response(written))
            })
        });
    }

    group.finish();
}

// ============================================================================
// XS-02: Write Rate Limit
// ============================================================================

fn bench_wrl_debit(c: &mut Criterion) {
    let mut group = c.benchmark_group("xs-02-write-rate-limit");

    let mut limiter = WriteRateLimiter::new();
    let mut account = WrlAccount::default();
    limiter.domain_created(&mut account, WrlTimestamp::from_millis(0));
    let mut now = 0u64;

    group.bench_function("update_and_debit", |b| {
        b.iter(|| {
            now += 5;
            black_box(limiter.apply_debit(DomainId(1), &mut account, WrlTimestamp::from_millis(now)))
        })
    });

    group.finish();
}

// ============================================================================
// XS-03: Domain Registry
// ============================================================================

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("xs-03-domain-registry");

    for domains in [10u32, 100, 500] {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        for domid in 1..=domains {
            harness.domain_info.set_running(DomainId(domid));
            registry
                .introduce(&dom0(), DomainId(domid), FrameId(u64::from(domid)), EvtchnPort(1))
                .unwrap();
        }

        group.throughput(Throughput::Elements(u64::from(domains)));
        group.bench_with_input(BenchmarkId::new("sweep_healthy", domains), &domains, |b, _| {
            b.iter(|| black_box(registry.sweep()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ring_round_trip, bench_wrl_debit, bench_sweep);
criterion_main!(benches);
