//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests and, via the `test-utils` feature, to other
//! crates in the workspace.

use slotmap::SlotMap;

use crate::id::NodeId;
use crate::member::KineticMember;
use crate::units::{Speed, StressUnits};

// ===========================================================================
// Recording member
// ===========================================================================

/// A kinetic component that records everything its network pushes to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestMember {
    pub source: bool,
    /// Raw capacity at multiplier 1.
    pub capacity: StressUnits,
    /// Raw stress at multiplier 1.
    pub stress: StressUnits,
    pub generated_speed: Speed,
    pub theoretical_speed: Speed,
    /// Every `(capacity, stress)` pair received, oldest first.
    pub received: Vec<(StressUnits, StressUnits)>,
    /// How many times the network flagged this member dirty.
    pub dirty_marks: u32,
}

impl TestMember {
    /// A source spinning at `speed` that also draws `stress` itself.
    pub fn producer(capacity: StressUnits, stress: StressUnits, speed: Speed) -> Self {
        Self {
            source: true,
            capacity,
            stress,
            generated_speed: speed,
            theoretical_speed: speed,
            ..Self::default()
        }
    }

    /// A consumer running at `speed`.
    pub fn consumer(stress: StressUnits, speed: Speed) -> Self {
        Self {
            stress,
            theoretical_speed: speed,
            ..Self::default()
        }
    }

    /// Change both generated and theoretical speed.
    pub fn set_speed(&mut self, speed: Speed) {
        self.generated_speed = speed;
        self.theoretical_speed = speed;
    }

    /// The most recent pair pushed by the network.
    pub fn last_state(&self) -> Option<(StressUnits, StressUnits)> {
        self.received.last().copied()
    }

    /// Number of pairs received so far.
    pub fn receive_count(&self) -> usize {
        self.received.len()
    }

    /// Forget received pairs and dirty marks.
    pub fn reset_log(&mut self) {
        self.received.clear();
        self.dirty_marks = 0;
    }
}

impl KineticMember for TestMember {
    fn is_source(&self) -> bool {
        self.source
    }

    fn generated_speed(&self) -> Speed {
        self.generated_speed
    }

    fn theoretical_speed(&self) -> Speed {
        self.theoretical_speed
    }

    fn added_stress_capacity(&self) -> StressUnits {
        self.capacity
    }

    fn stress_applied(&self) -> StressUnits {
        self.stress
    }

    fn receive_network_state(&mut self, capacity: StressUnits, stress: StressUnits) {
        self.received.push((capacity, stress));
    }

    fn mark_network_dirty(&mut self) {
        self.dirty_marks += 1;
    }
}

// ===========================================================================
// World helpers
// ===========================================================================

/// Member store used throughout the tests.
pub type TestWorld = SlotMap<NodeId, TestMember>;

pub fn make_world() -> TestWorld {
    SlotMap::with_key()
}

pub fn spawn(world: &mut TestWorld, member: TestMember) -> NodeId {
    world.insert(member)
}

/// Total pairs received across every member in the world.
pub fn total_receives(world: &TestWorld) -> usize {
    world.values().map(TestMember::receive_count).sum()
}

/// Clear the receive log of every member.
pub fn reset_logs(world: &mut TestWorld) {
    for member in world.values_mut() {
        member.reset_log();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_and_consumer_shapes() {
        let p = TestMember::producer(5.0, 1.0, 2.0);
        assert!(p.is_source());
        assert_eq!(p.generated_speed(), 2.0);
        assert_eq!(p.theoretical_speed(), 2.0);

        let c = TestMember::consumer(3.0, -1.0);
        assert!(!c.is_source());
        assert_eq!(c.stress_applied(), 3.0);
        assert_eq!(c.added_stress_capacity(), 0.0);
    }

    #[test]
    fn received_pairs_are_logged() {
        let mut world = make_world();
        let node = spawn(&mut world, TestMember::consumer(1.0, 1.0));

        world[node].receive_network_state(4.0, 2.0);
        world[node].receive_network_state(6.0, 2.0);
        world[node].mark_network_dirty();

        assert_eq!(world[node].last_state(), Some((6.0, 2.0)));
        assert_eq!(total_receives(&world), 2);
        assert_eq!(world[node].dirty_marks, 1);

        reset_logs(&mut world);
        assert_eq!(total_receives(&world), 0);
        assert_eq!(world[node].dirty_marks, 0);
    }
}
