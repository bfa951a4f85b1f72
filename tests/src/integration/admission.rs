//! # Write Rate Limiting Across Domains
//!
//! The limiter is driven through the registry, which owns each domain's
//! account, with a clock the tests move by hand.

#[cfg(test)]
mod tests {
    use shared_types::{Caller, DomainId, EvtchnPort, FrameId};
    use xs_02_write_rate_limit::{DebitOutcome, WrlConfig};
    use xs_03_domain_registry::test_utils::{dom0, TestHarness};
    use xs_03_domain_registry::{DomainAdminApi, DomainLayerConfig, DomainRegistry};

    /// One write costs 1, ten accrue per second, two may be saved.
    fn slow_config() -> DomainLayerConfig {
        DomainLayerConfig {
            wrl: WrlConfig {
                write_cost: 1,
                rate: 10,
                domain_burst: 2,
                global_burst: 100,
                new_domains_burst: 10,
                ..WrlConfig::default()
            },
            ..DomainLayerConfig::default()
        }
    }

    fn introduce(harness: &TestHarness, registry: &mut DomainRegistry, domid: u32) -> Caller {
        harness.domain_info.set_running(DomainId(domid));
        let conn = registry
            .introduce(&dom0(), DomainId(domid), FrameId(u64::from(domid)), EvtchnPort(9))
            .unwrap();
        Caller::domain(conn, DomainId(domid))
    }

    #[test]
    fn test_burst_then_throttle_then_recover() {
        let harness = TestHarness::new();
        let mut registry = harness.registry_with(slow_config());
        let guest = introduce(&harness, &mut registry, 1);
        harness.mapper.guest(DomainId(1)).unwrap().send_request(b"pending");

        // A second transaction elsewhere puts the limiter in force.
        registry.transaction_started();
        registry.transaction_started();

        let outcomes: Vec<_> = (0..5).map(|_| registry.debit_transaction_commit(&guest)).collect();
        assert_eq!(
            outcomes,
            vec![
                DebitOutcome::Charged,
                DebitOutcome::Charged,
                DebitOutcome::Throttled,
                DebitOutcome::Throttled,
                DebitOutcome::Throttled,
            ]
        );
        assert_eq!(registry.lookup(DomainId(1)).unwrap().wrl().credit, -3);
        assert!(!registry.can_read(DomainId(1)));

        let mut timeout = None;
        registry.check_timeouts(&mut timeout);
        assert_eq!(timeout, Some(300));

        // An earlier deadline set by someone else is kept.
        let mut timeout = Some(50);
        registry.check_timeouts(&mut timeout);
        assert_eq!(timeout, Some(50));

        harness.clock.advance(300);
        let mut timeout = None;
        registry.check_timeouts(&mut timeout);
        assert_eq!(timeout, None);
        assert!(registry.can_read(DomainId(1)));
    }

    #[test]
    fn test_unthrottled_domain_leaves_timeout_alone() {
        let harness = TestHarness::new();
        let mut registry = harness.registry_with(slow_config());
        introduce(&harness, &mut registry, 1);

        let mut timeout = Some(1234);
        registry.check_timeouts(&mut timeout);
        assert_eq!(timeout, Some(1234));

        let mut timeout = None;
        registry.check_timeout(DomainId(1), &mut timeout);
        assert_eq!(timeout, None);
    }

    #[test]
    fn test_destroyed_domain_returns_credit_to_reserve_only() {
        let harness = TestHarness::new();
        let mut registry = harness.registry_with(slow_config());
        introduce(&harness, &mut registry, 1);
        introduce(&harness, &mut registry, 2);

        // Both seeded from an empty reserve.
        assert_eq!(registry.rate_limiter().reserve(), -4);
        let survivor_credit = registry.lookup(DomainId(2)).unwrap().wrl().credit;

        registry.release(DomainId(1)).unwrap();

        assert_eq!(registry.rate_limiter().reserve(), -2);
        assert_eq!(registry.rate_limiter().live_domains(), 1);
        assert_eq!(
            registry.lookup(DomainId(2)).unwrap().wrl().credit,
            survivor_credit
        );
    }

    #[test]
    fn test_credit_is_conserved_without_time_passing() {
        let harness = TestHarness::new();
        let mut registry = harness.registry_with(slow_config());
        let callers: Vec<Caller> = (1..=3).map(|d| introduce(&harness, &mut registry, d)).collect();
        registry.transaction_started();

        let total = |registry: &DomainRegistry| -> i64 {
            registry.rate_limiter().reserve()
                + (1..=3)
                    .map(|d| registry.lookup(DomainId(d)).unwrap().wrl().credit)
                    .sum::<i64>()
        };
        let before = total(&registry);

        let mut debits = 0;
        for caller in callers.iter().cycle().take(12) {
            if registry.debit_direct(caller) != DebitOutcome::Exempt {
                debits += 1;
            }
        }

        assert_eq!(debits, 12);
        assert_eq!(total(&registry), before - 12);
    }

    #[test]
    fn test_local_connections_are_never_charged() {
        let harness = TestHarness::new();
        let mut registry = harness.registry_with(slow_config());
        introduce(&harness, &mut registry, 1);
        registry.transaction_started();
        registry.transaction_started();

        for _ in 0..50 {
            assert_eq!(registry.debit_direct(&dom0()), DebitOutcome::Exempt);
            assert_eq!(registry.debit_transaction_commit(&dom0()), DebitOutcome::Exempt);
        }
        assert_eq!(registry.rate_limiter().last_warning(), None);
    }
}
