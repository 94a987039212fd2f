//! Identifiers for kinetic components and the networks they form.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a kinetic component (shaft, gearbox, motor, press) in the
    /// simulation's member store.
    pub struct NodeId;
}

/// Identifies a kinetic network. Stable for the network's lifetime and
/// persisted next to member data so a network can be re-attached on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NetworkId(pub u64);

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn network_id_equality() {
        let a = NetworkId(7);
        let b = NetworkId(7);
        let c = NetworkId(8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn network_ids_order_by_value() {
        let mut ids = vec![NetworkId(3), NetworkId(1), NetworkId(2)];
        ids.sort();
        assert_eq!(ids, vec![NetworkId(1), NetworkId(2), NetworkId(3)]);
    }

    #[test]
    fn node_ids_are_distinct_and_ordered() {
        let mut sm = SlotMap::<NodeId, ()>::with_key();
        let a = sm.insert(());
        let b = sm.insert(());
        assert_ne!(a, b);
        assert!(a < b, "slotmap keys issued in insertion order");
    }

    #[test]
    fn node_id_survives_removal_of_others() {
        let mut sm = SlotMap::<NodeId, u32>::with_key();
        let a = sm.insert(1);
        let b = sm.insert(2);
        sm.remove(a);
        assert_eq!(sm.get(b), Some(&2));
        assert!(sm.get(a).is_none());
    }
}
