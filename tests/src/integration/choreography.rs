//! # Special-Node Choreography
//!
//! Watchers of `@introduceDomain` and `@releaseDomain` sit on the shared
//! bus; the registry only publishes. Also covers building a registry from a
//! configuration file and the request path end to end.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;
    use tokio::time::timeout;

    use shared_bus::{DomainEvent, EventFilter, EventPublisher, EventTopic};
    use shared_types::{Caller, DomainId, EvtchnPort, FrameId, NodePermission, NodePerms, PermFlags};
    use xs_03_domain_registry::test_utils::{dom0, TestHarness};
    use xs_03_domain_registry::{
        ConfigProvider, DomainAdminApi, DomainReply, DomainRequestHandler, RequestKind,
        TomlConfigProvider,
    };

    // =============================================================================
    // BUS
    // =============================================================================

    #[tokio::test]
    async fn test_release_watcher_sees_only_releases() {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        let mut watcher = harness
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::ReleaseDomain]));
        // The harness keeps its own catch-all watcher.
        assert_eq!(harness.bus.watchers(EventTopic::ReleaseDomain), 2);
        assert_eq!(harness.bus.watchers(EventTopic::IntroduceDomain), 1);

        harness.domain_info.set_running(DomainId(7));
        registry
            .introduce(&dom0(), DomainId(7), FrameId(0x1234), EvtchnPort(42))
            .unwrap();
        registry.release(DomainId(7)).unwrap();

        let event = timeout(Duration::from_secs(1), watcher.recv())
            .await
            .expect("release event not delivered");
        assert_eq!(event, Some(DomainEvent::Released(Some(DomainId(7)))));
        assert!(watcher.drain().is_empty());
        assert_eq!(harness.bus.fired(), 2);
    }

    #[tokio::test]
    async fn test_watcher_task_observes_full_lifecycle() {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        let mut watcher = harness.bus.subscribe(EventFilter::all());

        let collector = tokio::spawn(async move {
            let mut seen = Vec::new();
            while seen.len() < 3 {
                match watcher.recv().await {
                    Some(event) => seen.push(event),
                    None => break,
                }
            }
            seen
        });

        harness.domain_info.set_running(DomainId(3));
        registry
            .introduce(&dom0(), DomainId(3), FrameId(0x30), EvtchnPort(5))
            .unwrap();
        harness.domain_info.set_shutdown(DomainId(3));
        registry.sweep();
        harness.domain_info.set_dying(DomainId(3));
        registry.sweep();

        let seen = timeout(Duration::from_secs(1), collector)
            .await
            .expect("collector timed out")
            .expect("collector panicked");
        assert_eq!(
            seen,
            vec![
                DomainEvent::Introduced(DomainId(3)),
                DomainEvent::Released(None),
                DomainEvent::Released(Some(DomainId(3))),
            ]
        );
        assert_eq!(
            seen.iter().map(|e| e.topic().node_path()).collect::<Vec<_>>(),
            vec!["@introduceDomain", "@releaseDomain", "@releaseDomain"]
        );
    }

    #[tokio::test]
    async fn test_guest_watches_release_only_once_granted() {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        harness.domain_info.set_running(DomainId(4));
        let conn = registry
            .introduce(&dom0(), DomainId(4), FrameId(0x40), EvtchnPort(6))
            .unwrap();
        let guest = Caller::domain(conn, DomainId(4));
        let node = EventTopic::ReleaseDomain.node_path();

        assert!(!registry.check_perms_special(node, &guest));

        let grant = NodePerms::new(vec![
            NodePermission::new(DomainId(0), PermFlags::NONE),
            NodePermission::new(DomainId(4), PermFlags::READ),
        ]);
        registry.set_perms_special(&dom0(), node, grant).unwrap();
        assert!(registry.check_perms_special(node, &guest));
        let mut watcher = harness
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::ReleaseDomain]));

        harness.domain_info.set_shutdown(DomainId(4));
        registry.sweep();

        let event = timeout(Duration::from_secs(1), watcher.recv())
            .await
            .expect("release event not delivered");
        assert_eq!(event, Some(DomainEvent::Released(None)));
    }

    // =============================================================================
    // CONFIGURATION
    // =============================================================================

    #[test]
    fn test_registry_from_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [wrl]
            domain_burst = 4000

            [registry]
            priv_domid = 1
            domain_path_prefix = "/vm/domain"
            "#
        )
        .unwrap();

        let provider = TomlConfigProvider::load(file.path()).unwrap();
        let harness = TestHarness::new();
        let mut registry = harness.registry_with(provider.domain_layer_config());

        assert_eq!(registry.get_domain_path(DomainId(9)), "/vm/domain/9");
        assert_eq!(registry.rate_limiter().config().domain_burst, 4000);

        harness.domain_info.set_running(DomainId(1));
        registry
            .introduce(&dom0(), DomainId(1), FrameId(0x10), EvtchnPort(2))
            .unwrap();
        // The privileged domain is exempt from quota reporting.
        assert_eq!(registry.entry_fix(DomainId(1), 5, true), 0);
        assert_eq!(registry.lookup(DomainId(1)).unwrap().entry_count(), 5);
    }

    // =============================================================================
    // METRICS
    // =============================================================================

    #[test]
    fn test_registry_activity_is_exported() {
        // Another test in this binary may have registered first.
        let _ = xs_telemetry::register_metrics();
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        let released = xs_telemetry::DOMAINS_RELEASED.get();
        let sweeps = xs_telemetry::SWEEP_PASSES.get();

        harness.domain_info.set_running(DomainId(12));
        registry
            .introduce(&dom0(), DomainId(12), FrameId(0x120), EvtchnPort(3))
            .unwrap();
        harness.domain_info.remove(DomainId(12));
        registry.sweep();

        assert!(xs_telemetry::DOMAINS_RELEASED.get() >= released + 1.0);
        assert!(xs_telemetry::SWEEP_PASSES.get() >= sweeps + 1.0);
        let text = xs_telemetry::encode_metrics().unwrap();
        assert!(text.contains("xs_domain_released_total"));
        assert!(text.contains("xs_domain_sweep_passes_total"));
    }

    // =============================================================================
    // REQUESTS
    // =============================================================================

    #[test]
    fn test_request_round_trip_through_handler() {
        let harness = TestHarness::new();
        let mut registry = harness.registry();
        let handler = DomainRequestHandler::new();
        harness.domain_info.set_running(DomainId(6));

        let steps: [(RequestKind, &[u8], &[u8]); 6] = [
            (RequestKind::Introduce, b"6\0256\011\0", b"OK\0"),
            (RequestKind::IsDomainIntroduced, b"6\0", b"T\0"),
            (RequestKind::Introduce, b"6\0512\011\0", b"EINVAL\0"),
            (RequestKind::Release, b"6\0", b"OK\0"),
            (RequestKind::IsDomainIntroduced, b"6\0", b"F\0"),
            (RequestKind::Release, b"6\0", b"ENOENT\0"),
        ];
        for (kind, payload, expected) in steps {
            let reply = handler.handle(&mut registry, &dom0(), kind, payload);
            assert_eq!(reply.to_payload(), expected, "{kind:?}");
        }

        assert_eq!(
            handler.handle(&mut registry, &dom0(), RequestKind::GetDomainPath, b"6\0"),
            DomainReply::Path("/local/domain/6".into())
        );
    }
}
