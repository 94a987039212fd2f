//! Deferred-reprocessing bookkeeping for kinetic networks.

use crate::id::{NetworkId, NodeId};
use std::collections::BTreeMap;

/// Tracks which networks were flagged for deferred reprocessing.
///
/// Removing a member does not recompute its network on the spot; instead one
/// remaining member is flagged and the network waits here until the next
/// scheduled pass. Marking the same network twice keeps the first flagged
/// member, so a network is reprocessed at most once per pass no matter how
/// many removals hit it. Call [`take`](DirtyTracker::take) at the start of a
/// tick to claim everything pending.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    pending: BTreeMap<NetworkId, NodeId>,
}

impl DirtyTracker {
    /// Create a new tracker with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag `network` for reprocessing, recording `member` as the node that
    /// carries the flag. Returns `true` if the network was not already pending.
    pub fn mark_network(&mut self, network: NetworkId, member: NodeId) -> bool {
        match self.pending.entry(network) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(member);
                true
            }
        }
    }

    /// Returns `true` if the given network is pending.
    pub fn is_network_dirty(&self, network: NetworkId) -> bool {
        self.pending.contains_key(&network)
    }

    /// The member that carries the flag for `network`, if pending.
    pub fn flagged_member(&self, network: NetworkId) -> Option<NodeId> {
        self.pending.get(&network).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop a network from the pending set (e.g. it was deregistered).
    pub fn forget(&mut self, network: NetworkId) {
        self.pending.remove(&network);
    }

    /// Claim every pending `(network, flagged member)` pair in network order,
    /// leaving the tracker clean.
    pub fn take(&mut self) -> Vec<(NetworkId, NodeId)> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }
}
