//! Property-based tests for kinetic networks.
//!
//! Generates random member sets and mutation sequences, then checks the
//! accounting invariants: idempotent membership, sources staying a subset of
//! members, recompute matching a from-scratch sum, and no broadcast when a
//! recompute leaves the totals untouched.

use kinetic_core::id::{NetworkId, NodeId};
use kinetic_core::test_utils::*;
use kinetic_core::units::stress_multiplier;
use kinetic_network::KineticNetwork;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

/// Small integral values keep every sum exact in f32.
fn arb_member() -> impl Strategy<Value = TestMember> {
    (any::<bool>(), 0..64i32, 0..64i32, -256..256i32).prop_map(|(source, cap, stress, speed)| {
        if source {
            TestMember::producer(cap as f32, stress as f32, speed as f32)
        } else {
            TestMember::consumer(stress as f32, speed as f32)
        }
    })
}

#[derive(Debug, Clone)]
enum NetOp {
    Add(usize),
    Remove(usize),
    SetSpeed(usize, i32),
    UpdateStress(usize, i32),
    UpdateCapacity(usize, i32),
    Recompute,
}

fn arb_ops(max_ops: usize) -> impl Strategy<Value = Vec<NetOp>> {
    proptest::collection::vec(
        prop_oneof![
            (0..16usize).prop_map(NetOp::Add),
            (0..16usize).prop_map(NetOp::Remove),
            (0..16usize, -256..256i32).prop_map(|(i, s)| NetOp::SetSpeed(i, s)),
            (0..16usize, 0..64i32).prop_map(|(i, s)| NetOp::UpdateStress(i, s)),
            (0..16usize, 0..64i32).prop_map(|(i, c)| NetOp::UpdateCapacity(i, c)),
            Just(NetOp::Recompute),
        ],
        1..=max_ops,
    )
}

fn populate(members: &[TestMember]) -> (TestWorld, Vec<NodeId>) {
    let mut world = make_world();
    let nodes = members
        .iter()
        .cloned()
        .map(|m| spawn(&mut world, m))
        .collect();
    (world, nodes)
}

/// Apply ops, skipping any removal that would empty the network.
fn apply(network: &mut KineticNetwork, world: &mut TestWorld, nodes: &[NodeId], ops: &[NetOp]) {
    for op in ops {
        match *op {
            NetOp::Add(i) => network.add(nodes[i % nodes.len()], world),
            NetOp::Remove(i) => {
                let node = nodes[i % nodes.len()];
                if network.len() > 1 || !network.contains(node) {
                    network.remove(node, world);
                }
            }
            NetOp::SetSpeed(i, s) => world[nodes[i % nodes.len()]].set_speed(s as f32),
            NetOp::UpdateStress(i, s) => {
                network.update_stress_for(nodes[i % nodes.len()], s as f32, world);
            }
            NetOp::UpdateCapacity(i, c) => {
                network.update_capacity_for(nodes[i % nodes.len()], c as f32, world);
            }
            NetOp::Recompute => {
                network.recompute_both(world);
            }
        }
    }
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Adding a member twice leaves the maps as adding it once.
    #[test]
    fn add_is_idempotent(members in proptest::collection::vec(arb_member(), 1..16)) {
        let (mut world, nodes) = populate(&members);
        let mut once = KineticNetwork::new(NetworkId(0));
        let mut twice = KineticNetwork::new(NetworkId(1));
        once.initialize(0.0, 0.0, &mut world);
        twice.initialize(0.0, 0.0, &mut world);

        for &n in &nodes {
            once.add(n, &mut world);
            twice.add(n, &mut world);
            twice.add(n, &mut world);
        }

        prop_assert_eq!(once.members().collect::<Vec<_>>(), twice.members().collect::<Vec<_>>());
        prop_assert_eq!(once.sources().collect::<Vec<_>>(), twice.sources().collect::<Vec<_>>());
    }

    /// Every source is a member after any sequence of operations.
    #[test]
    fn sources_subset_of_members(
        members in proptest::collection::vec(arb_member(), 1..16),
        ops in arb_ops(64),
    ) {
        let (mut world, nodes) = populate(&members);
        let mut network = KineticNetwork::new(NetworkId(0));
        network.initialize(0.0, 0.0, &mut world);
        apply(&mut network, &mut world, &nodes, &ops);

        for (node, _) in network.sources() {
            prop_assert!(network.contains(node), "source {:?} is not a member", node);
        }
    }

    /// After recompute_both, the cached aggregates equal a from-scratch sum
    /// and every member holds them.
    #[test]
    fn recompute_matches_fresh_sum(
        members in proptest::collection::vec(arb_member(), 1..16),
        ops in arb_ops(64),
        base_cap in 0..128i32,
        base_stress in 0..128i32,
    ) {
        let (mut world, nodes) = populate(&members);
        let mut network = KineticNetwork::new(NetworkId(0));
        network.initialize(base_cap as f32, base_stress as f32, &mut world);
        apply(&mut network, &mut world, &nodes, &ops);
        network.recompute_both(&mut world);

        let capacity: f32 = network
            .sources()
            .map(|(n, c)| c * stress_multiplier(world[n].generated_speed))
            .sum::<f32>()
            + base_cap as f32;
        let stress: f32 = network
            .members()
            .map(|(n, s)| s * stress_multiplier(world[n].theoretical_speed))
            .sum::<f32>()
            + base_stress as f32;

        prop_assert_eq!(network.capacity(), capacity);
        prop_assert_eq!(network.stress(), stress);
        for (n, _) in network.members() {
            if let Some(last) = world[n].last_state() {
                prop_assert_eq!(last, (capacity, stress));
            }
        }
    }

    /// A second recompute with nothing changed never broadcasts.
    #[test]
    fn repeated_recompute_is_silent(
        members in proptest::collection::vec(arb_member(), 1..16),
        ops in arb_ops(32),
    ) {
        let (mut world, nodes) = populate(&members);
        let mut network = KineticNetwork::new(NetworkId(0));
        network.initialize(0.0, 0.0, &mut world);
        apply(&mut network, &mut world, &nodes, &ops);
        network.recompute_both(&mut world);
        reset_logs(&mut world);

        prop_assert!(!network.recompute_both(&mut world));
        prop_assert!(!network.recompute_capacity(&mut world));
        prop_assert!(!network.recompute_stress(&mut world));
        prop_assert_eq!(total_receives(&world), 0);
    }

    /// Flipping every member's direction never broadcasts.
    #[test]
    fn direction_flip_is_silent(members in proptest::collection::vec(arb_member(), 1..16)) {
        let (mut world, nodes) = populate(&members);
        let mut network = KineticNetwork::new(NetworkId(0));
        network.initialize(0.0, 0.0, &mut world);
        for &n in &nodes {
            network.add(n, &mut world);
        }
        network.recompute_both(&mut world);
        reset_logs(&mut world);

        for &n in &nodes {
            let speed = world[n].theoretical_speed;
            world[n].set_speed(-speed);
        }

        prop_assert!(!network.recompute_both(&mut world));
        prop_assert_eq!(total_receives(&world), 0);
    }

    /// Silently folding members out of a matching baseline leaves totals
    /// unchanged.
    #[test]
    fn silent_fold_preserves_totals(members in proptest::collection::vec(arb_member(), 1..16)) {
        let (mut world, nodes) = populate(&members);

        let mut live = KineticNetwork::new(NetworkId(0));
        live.initialize(0.0, 0.0, &mut world);
        for &n in &nodes {
            live.add(n, &mut world);
        }
        live.recompute_both(&mut world);
        let baseline = live.baseline();

        let mut rebuilt = KineticNetwork::new(NetworkId(0));
        rebuilt.initialize(baseline.capacity, baseline.stress, &mut world);
        for &n in &nodes {
            rebuilt.add_silently(n, &world);
        }
        reset_logs(&mut world);

        prop_assert!(!rebuilt.recompute_both(&mut world));
        prop_assert_eq!(rebuilt.baseline(), baseline);
        prop_assert_eq!(total_receives(&world), 0);
    }

    /// The last pushed state of any removed member is (0, 0).
    #[test]
    fn removed_members_hold_zero(
        members in proptest::collection::vec(arb_member(), 2..16),
        ops in arb_ops(64),
    ) {
        let (mut world, nodes) = populate(&members);
        let mut network = KineticNetwork::new(NetworkId(0));
        network.initialize(1.0, 1.0, &mut world);
        for &n in &nodes {
            network.add(n, &mut world);
        }
        apply(&mut network, &mut world, &nodes, &ops);

        for &n in &nodes {
            if !network.contains(n) {
                prop_assert_eq!(world[n].last_state(), Some((0.0, 0.0)));
            }
        }
    }
}
