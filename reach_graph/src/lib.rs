// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! The catchment DAG: reach identity, static attributes, the per-reach state machine, and the
//! [`Catchment`] that owns the graph and serializes every state transition behind one lock.

mod attributes;
mod catchment;
mod error;
mod id;
mod node;
mod state;

pub use attributes::ReachAttributes;
pub use catchment::Catchment;
pub use error::TopologyError;
pub use id::ReachId;
pub use node::ReachSnapshot;
pub use state::ReachState;

#[cfg(test)]
mod tests {
    use super::*;

    fn reach(id: &str, downstream: &[&str], direct_loading: bool) -> (ReachId, ReachAttributes, Vec<ReachId>, bool) {
        (
            ReachId::new(id),
            ReachAttributes::default(),
            downstream.iter().map(|d| ReachId::new(*d)).collect(),
            direct_loading,
        )
    }

    /// A -> B -> D
    ///      \-> C -/
    /// Diamond-shaped catchment: D has two upstream parents and must wait for both.
    fn build_diamond() -> Catchment {
        let _logger = env_logger::try_init();
        let c = Catchment::new();
        for (id, attrs, downstream, loading) in [
            reach("A", &["B", "C"], true),
            reach("B", &["D"], false),
            reach("C", &["D"], false),
            reach("D", &[], false),
        ] {
            c.add_reach(id, attrs, downstream, loading).unwrap();
        }
        c.finalize().unwrap();
        c
    }

    #[test]
    fn diamond_starts_only_at_root() {
        let c = build_diamond();
        assert_eq!(c.eligible_to_start(), vec![ReachId::new("A")]);
        assert_eq!(c.state_of(&ReachId::new("B")), Some(ReachState::Waiting));
    }

    #[test]
    fn diamond_propagates_skip_and_upstream_loading() {
        let c = build_diamond();
        // A has direct loading; B, C and D only ever receive it transitively.
        assert_eq!(c.snapshot_of(&ReachId::new("A")).unwrap().skip, false);
        assert_eq!(c.snapshot_of(&ReachId::new("B")).unwrap().skip, false);
        assert_eq!(c.snapshot_of(&ReachId::new("D")).unwrap().skip, false);
    }

    #[test]
    fn diamond_d_waits_for_both_parents() {
        let c = build_diamond();
        let a = c.dispatch_startable();
        assert_eq!(a.len(), 1);
        c.apply_run_report(&ReachId::new("A"), true).unwrap();

        // Both B and C are now startable.
        let mut startable: Vec<String> = c.eligible_to_start().into_iter().map(|i| i.to_string()).collect();
        startable.sort();
        assert_eq!(startable, vec!["B".to_string(), "C".to_string()]);

        let bc = c.dispatch_startable();
        assert_eq!(bc.len(), 2);
        c.apply_run_report(&ReachId::new("B"), true).unwrap();
        // D is not yet eligible: C has not finished.
        assert!(c.eligible_to_start().is_empty());
        assert_ne!(c.state_of(&ReachId::new("B")), Some(ReachState::CanBeCleaned));

        c.apply_run_report(&ReachId::new("C"), true).unwrap();
        assert_eq!(c.eligible_to_start(), vec![ReachId::new("D")]);
        // B and C can now both be cleaned: D has taken everything it needs from neither (no
        // direct output dependency modeled here beyond state), its only remaining upstream
        // dependants are satisfied.
        let mut cleanable: Vec<String> = c.eligible_to_clean().into_iter().map(|i| i.to_string()).collect();
        cleanable.sort();
        assert_eq!(cleanable, vec!["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn mid_chain_failure_cascades_downstream() {
        let c = Catchment::new();
        for (id, attrs, downstream, loading) in [
            reach("A", &["B"], true),
            reach("B", &["C"], false),
            reach("C", &["D"], false),
            reach("D", &[], false),
        ] {
            c.add_reach(id, attrs, downstream, loading).unwrap();
        }
        c.finalize().unwrap();

        c.dispatch_startable();
        c.apply_run_report(&ReachId::new("A"), true).unwrap();
        c.dispatch_startable();
        c.apply_run_report(&ReachId::new("B"), false).unwrap();

        assert_eq!(c.state_of(&ReachId::new("B")), Some(ReachState::Error));
        assert_eq!(c.state_of(&ReachId::new("C")), Some(ReachState::UpstreamError));
        assert_eq!(c.state_of(&ReachId::new("D")), Some(ReachState::UpstreamError));
        let mut failed: Vec<String> = c.failed_ids().into_iter().map(|i| i.to_string()).collect();
        failed.sort();
        assert_eq!(failed, vec!["B".to_string(), "C".to_string(), "D".to_string()]);

        // A succeeded outright, but its only dependant failed for good: A must still become
        // cleanable rather than being pinned on disk forever.
        assert_eq!(c.eligible_to_clean(), vec![ReachId::new("A")]);
        let cleanable = c.dispatch_cleanable();
        assert_eq!(cleanable.len(), 1);
        c.apply_cleanup_report(&ReachId::new("A")).unwrap();

        assert!(c.is_done());
    }

    #[test]
    fn dangling_downstream_reference_is_pruned() {
        let c = Catchment::new();
        c.add_reach(ReachId::new("A"), ReachAttributes::default(), vec![ReachId::new("ghost")], true)
            .unwrap();
        c.finalize().unwrap();
        // finalize() must not error despite the dangling edge, and must not leave a phantom node.
        assert_eq!(c.len(), 1);
        assert_eq!(c.eligible_to_start(), vec![ReachId::new("A")]);
    }

    #[test]
    fn finalize_is_idempotent() {
        let c = build_diamond();
        c.finalize().unwrap();
        c.finalize().unwrap();
        assert_eq!(c.eligible_to_start(), vec![ReachId::new("A")]);
    }

    #[test]
    fn cycle_is_rejected() {
        let c = Catchment::new();
        c.add_reach(ReachId::new("A"), ReachAttributes::default(), vec![ReachId::new("B")], true)
            .unwrap();
        c.add_reach(ReachId::new("B"), ReachAttributes::default(), vec![ReachId::new("A")], false)
            .unwrap();
        assert_eq!(c.finalize(), Err(TopologyError::Cycle));
    }

    #[test]
    fn duplicate_reach_is_rejected() {
        let c = Catchment::new();
        c.add_reach(ReachId::new("A"), ReachAttributes::default(), vec![], true).unwrap();
        assert_eq!(
            c.add_reach(ReachId::new("A"), ReachAttributes::default(), vec![], true),
            Err(TopologyError::DuplicateReach(ReachId::new("A")))
        );
    }

    /// A failure at the root of a multi-thousand-reach chain must not overflow the coordinator
    /// thread's stack: `set_error` propagates with an explicit worklist, not recursion, the same
    /// depth `priority_oracle`'s own deep-chain test exercises.
    #[test]
    fn deep_chain_failure_does_not_overflow_the_stack() {
        let n = 5_000;
        let c = Catchment::new();
        for i in 0..n {
            let downstream = if i + 1 < n { vec![ReachId::new(format!("r{}", i + 1))] } else { vec![] };
            c.add_reach(ReachId::new(format!("r{i}")), ReachAttributes::default(), downstream, i == 0).unwrap();
        }
        c.finalize().unwrap();

        c.apply_run_report(&ReachId::new("r0"), false).unwrap();

        assert_eq!(c.state_of(&ReachId::new("r0")), Some(ReachState::Error));
        assert_eq!(c.state_of(&ReachId::new(format!("r{}", n - 1).as_str())), Some(ReachState::UpstreamError));
        assert_eq!(c.failed_count(), n);
        assert!(c.is_done());
    }
}
