//! Membership Module Tests
//!
//! Exercises the membership manager against the in-process mock provisioner.
//!
//! ## Test Scopes
//! - **Validation**: malformed add/remove requests never touch the cluster.
//! - **Execution**: provisioning failures are reported, sizes track actual changes.
//! - **Recovery primitives**: evict and replace.
//! - **Consistency**: the ring always matches the member list, also under concurrency.

#[cfg(test)]
mod tests {
    use crate::membership::service::MembershipManager;
    use crate::membership::types::{Member, MembershipError};
    use crate::ring::{HashKind, ProbePolicy, RingConfig, RingError};
    use crate::test_support::{MockProvisioner, fast_readiness, mock_cluster};
    use std::sync::Arc;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    async fn assert_consistent(manager: &MembershipManager) {
        let view = manager.view().await;
        assert_eq!(view.ring.nodes(), view.addresses().as_slice());
        assert_eq!(view.ring.occupied(), view.len() * view.ring.vnodes());
    }

    // ============================================================
    // MEMBER TESTS
    // ============================================================

    #[test]
    fn test_member_matches_name_or_address() {
        let member = Member::new("server1", "server1:5000");

        assert!(member.matches("server1"));
        assert!(member.matches("server1:5000"));
        assert!(!member.matches("server2"));
    }

    #[test]
    fn test_member_serialization() {
        let member = Member::new("alpha", "127.0.0.1:7000");

        let json = serde_json::to_string(&member).expect("Serialization failed");
        let restored: Member = serde_json::from_str(&json).expect("Deserialization failed");

        assert_eq!(restored, member);
    }

    #[tokio::test]
    async fn test_new_manager_builds_initial_ring() {
        let (_provisioner, manager) = mock_cluster(3, RingConfig::default()).await;

        let view = manager.view().await;
        assert_eq!(view.len(), 3);
        assert_eq!(view.ring.occupied(), 27);
        assert_consistent(&manager).await;
    }

    #[tokio::test]
    async fn test_new_manager_rejects_invalid_ring() {
        let provisioner = MockProvisioner::new();
        let config = RingConfig {
            slots: 0,
            ..RingConfig::default()
        };

        let result = MembershipManager::new(config, fast_readiness(), provisioner, vec![]);
        assert!(matches!(
            result,
            Err(MembershipError::Ring(RingError::InvalidConfig(_)))
        ));
    }

    // ============================================================
    // ADD VALIDATION TESTS
    // ============================================================

    #[tokio::test]
    async fn test_add_rejects_invalid_requests() {
        let (provisioner, manager) = mock_cluster(3, RingConfig::default()).await;
        let before = provisioner.provisioned();

        let invalid: Vec<(i64, Vec<String>)> = vec![
            (0, vec![]),
            (-2, vec![]),
            (1, names(&["a", "b"])),
            (1, names(&[""])),
            (1, names(&["bad-name"])),
            (1, names(&["with space"])),
            (2, names(&["twin", "twin"])),
            (1, names(&["mock1"])),
        ];

        for (n, hostnames) in invalid {
            let result = manager.add_nodes(n, &hostnames).await;
            assert!(
                matches!(result, Err(MembershipError::Validation(_))),
                "n={} hostnames={:?} should be rejected",
                n,
                hostnames
            );
        }

        assert_eq!(provisioner.provisioned(), before, "nothing may be provisioned");
        assert_eq!(manager.view().await.len(), 3);
    }

    #[tokio::test]
    async fn test_add_rejects_existing_address() {
        let (_provisioner, manager) = mock_cluster(1, RingConfig::default()).await;
        let existing = manager.members().await[0].addr.clone();

        // Addresses are not valid hostnames, so they never get past the pattern.
        let result = manager.add_nodes(1, &[existing]).await;
        assert!(matches!(result, Err(MembershipError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_rejects_requests_beyond_capacity() {
        let config = RingConfig {
            slots: 16,
            vnodes: 3,
            hash: HashKind::Polynomial,
            probe: ProbePolicy::Linear,
        };
        let (provisioner, manager) = mock_cluster(3, config).await;
        let before = provisioner.provisioned();

        let result = manager.add_nodes(3, &[]).await;

        assert!(matches!(result, Err(MembershipError::Validation(_))));
        assert_eq!(provisioner.provisioned(), before);
    }

    // ============================================================
    // ADD EXECUTION TESTS
    // ============================================================

    #[tokio::test]
    async fn test_add_named_and_generated_nodes() {
        let (_provisioner, manager) = mock_cluster(3, RingConfig::default()).await;

        let outcome = manager
            .add_nodes(2, &names(&["alpha"]))
            .await
            .expect("add should succeed");

        assert_eq!(outcome.added.len(), 2);
        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.added[0].name, "alpha");
        assert_eq!(outcome.members.len(), 5);

        let view = manager.view().await;
        for member in &outcome.added {
            assert!(view.contains(&member.addr));
            assert!(view.ring.slots_of(&member.addr).is_some());
        }
        assert_consistent(&manager).await;
    }

    #[tokio::test]
    async fn test_add_reports_nodes_that_never_become_ready() {
        let (provisioner, manager) = mock_cluster(2, RingConfig::default()).await;
        provisioner.unready_next(1);

        let outcome = manager.add_nodes(2, &[]).await.unwrap();

        assert_eq!(outcome.added.len(), 1);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.members.len(), 3, "size grows by what was actually added");

        let failed_addr = outcome.failed[0].addr.clone().expect("node was created");
        assert!(!manager.view().await.contains(&failed_addr));
        assert!(provisioner.torn_down().contains(&failed_addr));
        assert_consistent(&manager).await;
    }

    #[tokio::test]
    async fn test_add_reports_provisioning_errors() {
        let (provisioner, manager) = mock_cluster(2, RingConfig::default()).await;
        provisioner.fail_next(2);

        let outcome = manager.add_nodes(2, &names(&["beta"])).await.unwrap();

        assert!(outcome.added.is_empty());
        assert_eq!(outcome.failed.len(), 2);
        assert_eq!(outcome.failed[0].name.as_deref(), Some("beta"));
        assert!(outcome.failed[0].addr.is_none());
        assert_eq!(manager.view().await.len(), 2);
    }

    #[tokio::test]
    async fn test_add_keeps_previous_state_when_ring_is_full() {
        // Five polynomial nodes do not fit in 16 slots under quadratic probing,
        // even though 15 virtual nodes would.
        let config = RingConfig {
            slots: 16,
            vnodes: 3,
            hash: HashKind::Polynomial,
            probe: ProbePolicy::Quadratic,
        };
        let (provisioner, manager) = mock_cluster(4, config).await;
        let before = manager.members().await;

        let result = manager.add_nodes(1, &[]).await;

        assert!(matches!(
            result,
            Err(MembershipError::Ring(RingError::CapacityExhausted { .. }))
        ));
        assert_eq!(manager.members().await, before);
        assert_eq!(provisioner.torn_down().len(), 1, "new node must be torn down");
        assert_consistent(&manager).await;
    }

    // ============================================================
    // REMOVE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_remove_rejects_invalid_requests() {
        let (provisioner, manager) = mock_cluster(3, RingConfig::default()).await;

        for (n, hostnames) in [
            (0, vec![]),
            (-1, vec![]),
            (4, vec![]),
            (1, names(&["mock1", "mock2"])),
        ] {
            let result = manager.remove_nodes(n, &hostnames).await;
            assert!(matches!(result, Err(MembershipError::Validation(_))));
        }

        assert_eq!(manager.view().await.len(), 3);
        assert!(provisioner.torn_down().is_empty());
    }

    #[tokio::test]
    async fn test_remove_named_node_first() {
        let (provisioner, manager) = mock_cluster(3, RingConfig::default()).await;
        let target = manager.members().await[1].clone();

        let outcome = manager
            .remove_nodes(1, &[target.name.clone()])
            .await
            .unwrap();

        assert_eq!(outcome.removed, vec![target.clone()]);
        assert_eq!(outcome.members.len(), 2);
        assert!(!outcome.members.contains(&target));
        assert_eq!(provisioner.torn_down(), vec![target.addr.clone()]);
        assert!(!provisioner.is_running(&target.addr));
        assert_consistent(&manager).await;
    }

    #[tokio::test]
    async fn test_remove_by_address() {
        let (_provisioner, manager) = mock_cluster(3, RingConfig::default()).await;
        let target = manager.members().await[2].clone();

        let outcome = manager
            .remove_nodes(1, &[target.addr.clone()])
            .await
            .unwrap();

        assert_eq!(outcome.removed, vec![target]);
    }

    #[tokio::test]
    async fn test_remove_fills_up_with_random_nodes() {
        let (provisioner, manager) = mock_cluster(5, RingConfig::default()).await;
        let named = manager.members().await[0].clone();

        let outcome = manager
            .remove_nodes(3, &[named.name.clone(), "unknown".to_string()])
            .await
            .unwrap();

        assert_eq!(outcome.removed.len(), 3);
        assert_eq!(outcome.removed[0], named);
        assert_eq!(outcome.members.len(), 2);
        assert_eq!(provisioner.torn_down().len(), 3);

        for removed in &outcome.removed {
            assert!(!outcome.members.contains(removed));
        }
        assert_consistent(&manager).await;
    }

    #[tokio::test]
    async fn test_remove_everything() {
        let (_provisioner, manager) = mock_cluster(2, RingConfig::default()).await;

        let outcome = manager.remove_nodes(2, &[]).await.unwrap();

        assert!(outcome.members.is_empty());
        assert!(manager.view().await.ring.is_empty());
    }

    // ============================================================
    // EVICT / REPLACE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_evict_is_idempotent() {
        let (provisioner, manager) = mock_cluster(3, RingConfig::default()).await;
        let target = manager.members().await[0].clone();

        let first = manager.evict(&target.addr).await.unwrap();
        let second = manager.evict(&target.addr).await.unwrap();

        assert_eq!(first, Some(target.clone()));
        assert_eq!(second, None);
        assert_eq!(manager.view().await.len(), 2);
        assert_eq!(provisioner.torn_down(), vec![target.addr]);
    }

    #[tokio::test]
    async fn test_replace_adds_a_ready_node() {
        let (_provisioner, manager) = mock_cluster(2, RingConfig::default()).await;

        let replacement = manager.replace().await.unwrap().expect("replacement");

        let view = manager.view().await;
        assert_eq!(view.len(), 3);
        assert!(view.contains(&replacement.addr));
        assert_consistent(&manager).await;
    }

    #[tokio::test]
    async fn test_replace_that_never_gets_ready_leaves_cluster_smaller() {
        let (provisioner, manager) = mock_cluster(2, RingConfig::default()).await;
        provisioner.unready_next(1);

        let replacement = manager.replace().await.unwrap();

        assert!(replacement.is_none());
        assert_eq!(manager.view().await.len(), 2);
        assert_eq!(provisioner.torn_down().len(), 1);
    }

    // ============================================================
    // CONCURRENCY TESTS
    // ============================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mutations_keep_ring_and_members_in_step() {
        let (_provisioner, manager) = mock_cluster(6, RingConfig::default()).await;
        let initial = manager.members().await;

        let mut tasks = Vec::new();
        for member in initial.iter().take(3) {
            let manager = Arc::clone(&manager);
            let addr = member.addr.clone();
            tasks.push(tokio::spawn(async move {
                manager.evict(&addr).await.unwrap();
            }));
        }
        for _ in 0..3 {
            let manager = Arc::clone(&manager);
            tasks.push(tokio::spawn(async move {
                manager.add_nodes(1, &[]).await.unwrap();
            }));
        }
        for _ in 0..20 {
            let manager = Arc::clone(&manager);
            tasks.push(tokio::spawn(async move {
                let view = manager.view().await;
                assert_eq!(view.ring.nodes(), view.addresses().as_slice());
            }));
        }

        for task in tasks {
            task.await.expect("task panicked");
        }

        assert_eq!(manager.view().await.len(), 6);
        assert_consistent(&manager).await;
    }
}
