//! # Guest <-> Store Byte Flow
//!
//! Bytes move through the registry's rings exactly as a guest would see
//! them, including partial transfers and a guest that lies about its indexes.

#[cfg(test)]
mod tests {
    use shared_types::{DomainId, Errno, EvtchnPort, FrameId};
    use xs_01_ring_transport::{PRODUCER_LIMIT, RING_CAPACITY};
    use xs_03_domain_registry::test_utils::{dom0, HookCall, TestHarness};
    use xs_03_domain_registry::{DomainAdminApi, DomainError, DomainRegistry};

    fn introduce(harness: &TestHarness, registry: &mut DomainRegistry, domid: u32) {
        harness.domain_info.set_running(DomainId(domid));
        registry
            .introduce(&dom0(), DomainId(domid), FrameId(0x10 * u64::from(domid)), EvtchnPort(7))
            .unwrap();
    }

    /// Write until the ring refuses more; returns the total accepted.
    fn write_available(registry: &mut DomainRegistry, domid: DomainId, data: &[u8]) -> usize {
        let mut total = 0;
        while total < data.len() {
            match registry.write(domid, &data[total..]).unwrap() {
                0 => break,
                n => total += n,
            }
        }
        total
    }

    #[test]
    fn test_oversized_response_is_accepted_as_room_appears() {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        introduce(&harness, &mut registry, 2);
        let guest = harness.mapper.guest(DomainId(2)).unwrap();
        let payload: Vec<u8> = (0..1200u32).map(|i| (i % 251) as u8).collect();

        let first = registry.write(DomainId(2), &payload).unwrap();
        assert_eq!(first, RING_CAPACITY - 1);
        assert_eq!(first, PRODUCER_LIMIT);
        assert!(!registry.can_write(DomainId(2)));
        assert_eq!(registry.write(DomainId(2), &payload[first..]).unwrap(), 0);

        let mut received = guest.recv_response(500);
        assert!(registry.can_write(DomainId(2)));
        let rest = write_available(&mut registry, DomainId(2), &payload[first..]);
        assert_eq!(rest, 1200 - first);

        received.extend(guest.recv_response(2000));
        assert_eq!(received, payload);
    }

    #[test]
    fn test_request_bytes_arrive_in_order_across_wrap() {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        introduce(&harness, &mut registry, 2);
        let guest = harness.mapper.guest(DomainId(2)).unwrap();

        let mut seen = Vec::new();
        let mut buf = [0u8; 300];
        for round in 0..10u8 {
            let chunk = vec![round; 250];
            assert_eq!(guest.send_request(&chunk), 250);
            while registry.can_read(DomainId(2)) {
                let n = registry.read(DomainId(2), &mut buf).unwrap();
                seen.extend_from_slice(&buf[..n]);
            }
        }

        assert_eq!(seen.len(), 2500);
        for (i, byte) in seen.iter().enumerate() {
            assert_eq!(usize::from(*byte), i / 250);
        }
    }

    #[test]
    fn test_corrupt_guest_is_isolated() {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        introduce(&harness, &mut registry, 2);
        introduce(&harness, &mut registry, 3);
        let bad = harness.mapper.guest(DomainId(2)).unwrap();
        let conn = registry.lookup(DomainId(2)).unwrap().connection().unwrap();
        harness.hooks.clear();

        bad.set_response_consumer(0xdead_beef);
        let err = registry.write(DomainId(2), b"reply").unwrap_err();

        assert!(matches!(err, DomainError::ProtocolCorruption { .. }));
        assert_eq!(err.errno(), Errno::Eio);
        assert_eq!(harness.hooks.calls(), vec![HookCall::Reset(conn)]);
        assert!(registry.lookup(DomainId(2)).unwrap().is_ignored());

        // The neighbour is unaffected.
        let good = harness.mapper.guest(DomainId(3)).unwrap();
        assert_eq!(registry.write(DomainId(3), b"reply").unwrap(), 5);
        assert_eq!(good.recv_response(16), b"reply".to_vec());

        // Still registered until released or re-introduced.
        assert!(registry.is_introduced(DomainId(2)));
        registry.release(DomainId(2)).unwrap();
    }
}
