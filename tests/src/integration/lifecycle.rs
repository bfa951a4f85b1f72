//! # Domain Lifecycle Flows
//!
//! Introduce, re-introduce, release, sweep and shutdown driven end to end
//! through the registry with mock hypervisor collaborators.

#[cfg(test)]
mod tests {
    use shared_bus::DomainEvent;
    use shared_types::{
        DomainId, EvtchnPort, FrameId, NodePermission, NodePerms, PermFlags,
    };
    use xs_01_ring_transport::test_utils::InMemoryPage;
    use xs_03_domain_registry::test_utils::{dom0, HookCall, TestHarness};
    use xs_03_domain_registry::{
        DomainAdminApi, DomainError, DomainInfo, DomainRegistry, EventOutcome,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn running(harness: &TestHarness, registry: &mut DomainRegistry, domid: u32, frame: u64) {
        harness.domain_info.set_running(DomainId(domid));
        registry
            .introduce(&dom0(), DomainId(domid), FrameId(frame), EvtchnPort(40 + domid))
            .unwrap();
    }

    // =============================================================================
    // INTRODUCE / SWEEP
    // =============================================================================

    #[test]
    fn test_introduced_domain_is_retired_when_it_disappears() {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        for _ in 0..3 {
            registry.bump_generation();
        }

        harness.domain_info.set_running(DomainId(7));
        registry
            .introduce(&dom0(), DomainId(7), FrameId(0x1234), EvtchnPort(42))
            .unwrap();

        assert!(registry.is_introduced(DomainId(7)));
        assert_eq!(
            registry.lookup(DomainId(7)).unwrap().generation(),
            registry.current_generation()
        );
        assert_eq!(harness.fired(), vec![DomainEvent::Introduced(DomainId(7))]);

        harness.domain_info.remove(DomainId(7));
        let report = registry.sweep();

        assert_eq!(report.retired, vec![DomainId(7)]);
        assert_eq!(harness.fired(), vec![DomainEvent::Released(Some(DomainId(7)))]);
        assert!(!registry.is_introduced(DomainId(7)));
        assert_eq!(harness.mapper.unmapped(), 1);
        assert_eq!(harness.events.bound_count(), 0);
    }

    #[test]
    fn test_reintroduce_same_frame_resets_rings_and_connection_state() {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        running(&harness, &mut registry, 4, 0x400);
        let conn = registry.lookup(DomainId(4)).unwrap().connection().unwrap();

        let guest = harness.mapper.guest(DomainId(4)).unwrap();
        guest.send_request(b"partial-req");
        registry.write(DomainId(4), b"unread response").unwrap();
        assert_ne!(guest.interface().raw_indexes(), (0, 0, 0, 0));
        harness.hooks.clear();

        registry
            .introduce(&dom0(), DomainId(4), FrameId(0x400), EvtchnPort(99))
            .unwrap();

        assert_eq!(guest.interface().raw_indexes(), (0, 0, 0, 0));
        assert_eq!(harness.hooks.calls(), vec![HookCall::Reset(conn)]);
        assert_eq!(registry.lookup(DomainId(4)).unwrap().connection(), Some(conn));
    }

    #[test]
    fn test_reintroduce_with_other_frame_changes_nothing() {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        running(&harness, &mut registry, 4, 0x400);
        let before = registry.lookup(DomainId(4)).unwrap().local_port();

        let err = registry
            .introduce(&dom0(), DomainId(4), FrameId(0x999), EvtchnPort(99))
            .unwrap_err();

        assert!(matches!(err, DomainError::InvalidRequest(_)));
        let record = registry.lookup(DomainId(4)).unwrap();
        assert_eq!(record.local_port(), before);
        assert_eq!(record.frame(), Some(FrameId(0x400)));
        assert!(harness.events.unbound().is_empty());
    }

    #[test]
    fn test_reused_domain_id_does_not_inherit_old_nodes() {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        running(&harness, &mut registry, 3, 0x300);

        // Node written by domain 3 in its first life.
        let node_generation = registry.bump_generation();
        let mut perms = NodePerms::new(vec![
            NodePermission::new(DomainId(3), PermFlags::NONE),
            NodePermission::new(DomainId(3), PermFlags::READ),
        ]);

        registry.release(DomainId(3)).unwrap();
        registry.bump_generation();
        running(&harness, &mut registry, 3, 0x301);

        assert!(!registry.check_domain_generation(DomainId(3), node_generation));
        registry.adjust_node_perms(&mut perms, node_generation).unwrap();
        assert_eq!(perms.owner(), Some(DomainId::CONTROL));
        assert!(perms.entries[1].perms.contains(PermFlags::IGNORE));
    }

    // =============================================================================
    // EVENT LOOP
    // =============================================================================

    #[test]
    fn test_exception_interrupt_drives_crash_then_destroy() {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        let virq = registry.bind_exception_virq().unwrap();
        running(&harness, &mut registry, 5, 0x500);
        running(&harness, &mut registry, 6, 0x600);
        harness.fired();

        harness.domain_info.set(
            DomainId(5),
            DomainInfo {
                crashed: true,
                ..DomainInfo::default()
            },
        );
        harness.events.raise(virq);
        let EventOutcome::Swept(report) = registry.handle_event().unwrap() else {
            panic!("expected a sweep");
        };
        assert_eq!(report.newly_shutdown, vec![DomainId(5)]);
        assert_eq!(harness.fired(), vec![DomainEvent::Released(None)]);
        assert!(registry.lookup(DomainId(5)).unwrap().is_shutdown());

        harness.domain_info.set_dying(DomainId(5));
        harness.events.raise(virq);
        let EventOutcome::Swept(report) = registry.handle_event().unwrap() else {
            panic!("expected a sweep");
        };
        assert_eq!(report.retired, vec![DomainId(5)]);
        assert_eq!(harness.fired(), vec![DomainEvent::Released(Some(DomainId(5)))]);
        assert!(registry.is_introduced(DomainId(6)));
        assert_eq!(registry.sweeps_completed(), 2);
    }

    #[test]
    fn test_release_while_guest_kicks_is_harmless() {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        running(&harness, &mut registry, 8, 0x800);
        let port = registry.lookup(DomainId(8)).unwrap().local_port();
        harness.mapper.guest(DomainId(8)).unwrap().send_request(b"in flight");

        harness.events.raise(port);
        registry.release(DomainId(8)).unwrap();

        assert_eq!(registry.handle_event().unwrap(), EventOutcome::Unknown(port));
        let mut buf = [0u8; 16];
        assert_eq!(
            registry.read(DomainId(8), &mut buf),
            Err(DomainError::NotFound(DomainId(8)))
        );
    }

    #[test]
    fn test_shutdown_tears_down_control_domain_and_guests() {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        registry.bind_exception_virq().unwrap();
        registry
            .bootstrap_control_domain(EvtchnPort(1), Box::new(InMemoryPage::new()))
            .unwrap();
        running(&harness, &mut registry, 2, 0x200);
        running(&harness, &mut registry, 3, 0x300);
        assert_eq!(registry.introduced_count(), 3);
        harness.fired();

        registry.shutdown();

        assert_eq!(registry.introduced_count(), 0);
        assert_eq!(harness.events.bound_count(), 0);
        // The bootstrap page is not a foreign mapping.
        assert_eq!(harness.mapper.unmapped(), 2);
        assert_eq!(harness.fired().len(), 3);
        assert_eq!(registry.rate_limiter().live_domains(), 0);
    }
}
