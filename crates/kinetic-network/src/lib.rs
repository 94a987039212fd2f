//! Kinetic stress networks.
//!
//! A [`KineticNetwork`] keeps the books for one connected group of rotating
//! components: how much capacity its sources supply and how much stress its
//! members draw. Both aggregates are cached and only broadcast to members
//! when a recompute actually moves them.
//!
//! # Design
//!
//! - Members are referenced by [`NodeId`]. The simulation owns them and
//!   passes a [`MemberAccess`] store into every call that reads or pushes
//!   member state.
//! - Contributions are stored raw and scaled by [`stress_multiplier`] of the
//!   member's current speed on each recompute, so a speed change only needs a
//!   recompute, not a membership update.
//! - Components whose region is not resident are represented by a lump
//!   "unloaded" baseline supplied once through [`KineticNetwork::initialize`].
//! - A removal does not recompute eagerly. It flags one remaining member and
//!   reports it, and the [`directory::NetworkDirectory`] reprocesses the
//!   network once on its next tick.
//! - The network never deregisters itself. Removing the last member returns
//!   [`Removal::Emptied`] and the directory drops it.

pub mod directory;

use std::collections::BTreeMap;

use kinetic_core::config::KineticConfig;
use kinetic_core::id::{NetworkId, NodeId};
use kinetic_core::member::{KineticMember, MemberAccess};
use kinetic_core::units::{StressUnits, scaled};
use serde::{Deserialize, Serialize};

pub use kinetic_core::units::stress_multiplier;

// ---------------------------------------------------------------------------
// Baseline
// ---------------------------------------------------------------------------

/// Aggregates persisted with a network's members and fed back through
/// [`KineticNetwork::initialize`] when the network is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkBaseline {
    pub capacity: StressUnits,
    pub stress: StressUnits,
}

// ---------------------------------------------------------------------------
// Removal outcome
// ---------------------------------------------------------------------------

/// What happened when a node was removed from a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The node was not a member. Nothing changed.
    NotMember,
    /// The node left. `reprocess` was flagged dirty and the network should be
    /// recomputed on the next scheduled pass.
    Detached { reprocess: NodeId },
    /// The node was the last member. The directory must drop `network`; the
    /// instance must not be used again.
    Emptied { network: NetworkId },
}

// ---------------------------------------------------------------------------
// Kinetic network
// ---------------------------------------------------------------------------

/// One connected group of kinetic components sharing a single capacity and
/// stress budget.
#[derive(Debug, Clone)]
pub struct KineticNetwork {
    /// Network identifier.
    pub id: NetworkId,
    initialized: bool,
    emptied: bool,
    /// Raw capacity of every source. Keys are always also keys of `members`.
    sources: BTreeMap<NodeId, StressUnits>,
    /// Raw stress of every member, sources included.
    members: BTreeMap<NodeId, StressUnits>,
    /// Last aggregates broadcast to members.
    current_capacity: StressUnits,
    current_stress: StressUnits,
    /// Lump contributions of components that are not tracked individually.
    unloaded_capacity: StressUnits,
    unloaded_stress: StressUnits,
    change_tolerance: f32,
}

impl KineticNetwork {
    /// Create an empty, uninitialized network with exact change detection.
    pub fn new(id: NetworkId) -> Self {
        Self::with_config(id, &KineticConfig::default())
    }

    /// Create an empty, uninitialized network using `config`.
    pub fn with_config(id: NetworkId, config: &KineticConfig) -> Self {
        Self {
            id,
            initialized: false,
            emptied: false,
            sources: BTreeMap::new(),
            members: BTreeMap::new(),
            current_capacity: 0.0,
            current_stress: 0.0,
            unloaded_capacity: 0.0,
            unloaded_stress: 0.0,
            change_tolerance: config.change_tolerance,
        }
    }

    // --- Lifecycle ---

    /// Supply the unloaded baseline, then recompute stress and capacity,
    /// broadcasting after each one that changed.
    pub fn initialize<W: MemberAccess>(
        &mut self,
        capacity: StressUnits,
        stress: StressUnits,
        world: &mut W,
    ) {
        if self.initialized {
            tracing::warn!(network = ?self.id, "kinetic network initialized twice, overwriting baseline");
        }
        self.unloaded_capacity = capacity;
        self.unloaded_stress = stress;
        self.initialized = true;
        tracing::debug!(network = ?self.id, capacity, stress, "kinetic network initialized");

        self.recompute_stress(world);
        self.recompute_capacity(world);
    }

    fn assert_live(&self) {
        debug_assert!(
            self.initialized,
            "kinetic network {:?} mutated before initialize",
            self.id
        );
        debug_assert!(
            !self.emptied,
            "kinetic network {:?} used after it emptied",
            self.id
        );
    }

    // --- Membership ---

    /// Fold `node` into the network while it is being rebuilt from a persisted
    /// baseline. The node's scaled contributions move out of the unloaded
    /// baseline and into the per-member maps, leaving the totals unchanged.
    ///
    /// Does not recompute or broadcast.
    pub fn add_silently<W: MemberAccess>(&mut self, node: NodeId, world: &W) {
        self.assert_live();
        if self.members.contains_key(&node) {
            return;
        }
        let Some(member) = world.member(node) else {
            tracing::warn!(network = ?self.id, ?node, "add_silently: node missing from member store");
            return;
        };

        if member.is_source() {
            let capacity = member.added_stress_capacity();
            self.unloaded_capacity -= scaled(capacity, member.generated_speed());
            self.sources.insert(node, capacity);
        }
        let stress = member.stress_applied();
        self.unloaded_stress -= scaled(stress, member.theoretical_speed());
        self.members.insert(node, stress);

        if self.unloaded_capacity < 0.0 || self.unloaded_stress < 0.0 {
            tracing::warn!(
                network = ?self.id,
                unloaded_capacity = self.unloaded_capacity,
                unloaded_stress = self.unloaded_stress,
                "unloaded baseline went negative"
            );
        }
    }

    /// Add `node` at runtime. The node receives the current cached aggregates
    /// (not a fresh recompute) and is flagged dirty so its dependents learn
    /// about the new network.
    pub fn add<W: MemberAccess>(&mut self, node: NodeId, world: &mut W) {
        self.assert_live();
        if self.members.contains_key(&node) {
            return;
        }
        let Some(member) = world.member_mut(node) else {
            tracing::warn!(network = ?self.id, ?node, "add: node missing from member store");
            return;
        };

        if member.is_source() {
            self.sources.insert(node, member.added_stress_capacity());
        }
        self.members.insert(node, member.stress_applied());
        member.receive_network_state(self.current_capacity, self.current_stress);
        member.mark_network_dirty();
    }

    /// Overwrite the raw capacity of member `node` and recompute capacity.
    /// Returns `true` if the aggregate moved and was broadcast.
    pub fn update_capacity_for<W: MemberAccess>(
        &mut self,
        node: NodeId,
        capacity: StressUnits,
        world: &mut W,
    ) -> bool {
        self.assert_live();
        if !self.members.contains_key(&node) {
            tracing::warn!(network = ?self.id, ?node, "capacity update for a non-member ignored");
            return false;
        }
        self.sources.insert(node, capacity);
        self.recompute_capacity(world)
    }

    /// Overwrite the raw stress of member `node` and recompute stress.
    /// Returns `true` if the aggregate moved and was broadcast.
    pub fn update_stress_for<W: MemberAccess>(
        &mut self,
        node: NodeId,
        stress: StressUnits,
        world: &mut W,
    ) -> bool {
        self.assert_live();
        let Some(entry) = self.members.get_mut(&node) else {
            tracing::warn!(network = ?self.id, ?node, "stress update for a non-member ignored");
            return false;
        };
        *entry = stress;
        self.recompute_stress(world)
    }

    /// Remove `node`. The removed node is pushed `(0, 0)` so it keeps no stale
    /// aggregates. The remaining totals are not recomputed here; see
    /// [`Removal`].
    pub fn remove<W: MemberAccess>(&mut self, node: NodeId, world: &mut W) -> Removal {
        self.assert_live();
        if self.members.remove(&node).is_none() {
            return Removal::NotMember;
        }
        self.sources.remove(&node);
        if let Some(member) = world.member_mut(node) {
            member.receive_network_state(0.0, 0.0);
        }

        match self.members.keys().next().copied() {
            None => {
                self.emptied = true;
                tracing::debug!(network = ?self.id, "kinetic network emptied");
                Removal::Emptied { network: self.id }
            }
            Some(reprocess) => {
                if let Some(member) = world.member_mut(reprocess) {
                    member.mark_network_dirty();
                }
                Removal::Detached { reprocess }
            }
        }
    }

    // --- Recompute ---

    /// Sum of every source's scaled capacity plus the unloaded baseline.
    pub fn calculate_capacity<W: MemberAccess>(&self, world: &W) -> StressUnits {
        let present: StressUnits = self
            .sources
            .iter()
            .filter_map(|(&node, &capacity)| match world.member(node) {
                Some(m) => Some(scaled(capacity, m.generated_speed())),
                None => {
                    tracing::warn!(network = ?self.id, ?node, "recompute: source missing from store");
                    None
                }
            })
            .sum();
        present + self.unloaded_capacity
    }

    /// Sum of every member's scaled stress plus the unloaded baseline.
    pub fn calculate_stress<W: MemberAccess>(&self, world: &W) -> StressUnits {
        let present: StressUnits = self
            .members
            .iter()
            .filter_map(|(&node, &stress)| match world.member(node) {
                Some(m) => Some(scaled(stress, m.theoretical_speed())),
                None => {
                    tracing::warn!(network = ?self.id, ?node, "recompute: member missing from store");
                    None
                }
            })
            .sum();
        present + self.unloaded_stress
    }

    /// Recompute capacity; broadcast if it changed. Returns whether it did.
    pub fn recompute_capacity<W: MemberAccess>(&mut self, world: &mut W) -> bool {
        let capacity = self.calculate_capacity(&*world);
        if !self.changed(self.current_capacity, capacity) {
            return false;
        }
        self.current_capacity = capacity;
        self.warn_if_non_finite();
        self.sync(world);
        true
    }

    /// Recompute stress; broadcast if it changed. Returns whether it did.
    pub fn recompute_stress<W: MemberAccess>(&mut self, world: &mut W) -> bool {
        let stress = self.calculate_stress(&*world);
        if !self.changed(self.current_stress, stress) {
            return false;
        }
        self.current_stress = stress;
        self.warn_if_non_finite();
        self.sync(world);
        true
    }

    /// Recompute both aggregates; if either changed, update both and
    /// broadcast once. Used after speed changes and deferred reprocessing.
    pub fn recompute_both<W: MemberAccess>(&mut self, world: &mut W) -> bool {
        let stress = self.calculate_stress(&*world);
        let capacity = self.calculate_capacity(&*world);
        if !self.changed(self.current_stress, stress)
            && !self.changed(self.current_capacity, capacity)
        {
            return false;
        }
        self.current_stress = stress;
        self.current_capacity = capacity;
        self.warn_if_non_finite();
        self.sync(world);
        true
    }

    fn changed(&self, old: StressUnits, new: StressUnits) -> bool {
        aggregate_changed(old, new, self.change_tolerance)
    }

    fn warn_if_non_finite(&self) {
        if !self.current_capacity.is_finite() || !self.current_stress.is_finite() {
            tracing::warn!(
                network = ?self.id,
                capacity = self.current_capacity,
                stress = self.current_stress,
                "kinetic network aggregate is not finite"
            );
        }
    }

    // --- Sync ---

    /// Push the cached `(capacity, stress)` to every member.
    pub fn sync<W: MemberAccess>(&self, world: &mut W) {
        tracing::trace!(
            network = ?self.id,
            capacity = self.current_capacity,
            stress = self.current_stress,
            members = self.members.len(),
            "kinetic network sync"
        );
        for &node in self.members.keys() {
            match world.member_mut(node) {
                Some(member) => {
                    member.receive_network_state(self.current_capacity, self.current_stress)
                }
                None => {
                    tracing::warn!(network = ?self.id, ?node, "sync: member missing from store")
                }
            }
        }
    }

    // --- Queries ---

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Last broadcast capacity.
    pub fn capacity(&self) -> StressUnits {
        self.current_capacity
    }

    /// Last broadcast stress.
    pub fn stress(&self) -> StressUnits {
        self.current_stress
    }

    pub fn unloaded_capacity(&self) -> StressUnits {
        self.unloaded_capacity
    }

    pub fn unloaded_stress(&self) -> StressUnits {
        self.unloaded_stress
    }

    /// Whether members draw more than sources supply.
    pub fn is_overstressed(&self) -> bool {
        self.current_stress > self.current_capacity
    }

    /// What members persist about this network.
    pub fn baseline(&self) -> NetworkBaseline {
        NetworkBaseline {
            capacity: self.current_capacity,
            stress: self.current_stress,
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains_key(&node)
    }

    pub fn is_source(&self, node: NodeId) -> bool {
        self.sources.contains_key(&node)
    }

    /// Stored raw stress of `node`.
    pub fn stress_of(&self, node: NodeId) -> Option<StressUnits> {
        self.members.get(&node).copied()
    }

    /// Stored raw capacity of `node`, if it is a source.
    pub fn capacity_of(&self, node: NodeId) -> Option<StressUnits> {
        self.sources.get(&node).copied()
    }

    /// Members and their raw stress, in node order.
    pub fn members(&self) -> impl Iterator<Item = (NodeId, StressUnits)> + '_ {
        self.members.iter().map(|(&n, &s)| (n, s))
    }

    /// Sources and their raw capacity, in node order.
    pub fn sources(&self) -> impl Iterator<Item = (NodeId, StressUnits)> + '_ {
        self.sources.iter().map(|(&n, &c)| (n, c))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Change detection for aggregates. Exact equality when `tolerance` is zero;
/// NaN always counts as changed.
fn aggregate_changed(old: StressUnits, new: StressUnits, tolerance: f32) -> bool {
    if tolerance == 0.0 {
        old != new
    } else {
        !((new - old).abs() <= tolerance)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
