//! Registry of live kinetic networks.
//!
//! The directory owns every [`KineticNetwork`] by id. It forwards structural
//! events to the right network, drops a network the moment it empties, and
//! runs the deferred reprocessing that removals schedule. Deciding which
//! components belong together (merging and splitting on placement) is the
//! caller's job; the directory only keeps the books once membership is known.
//!
//! Call [`NetworkDirectory::tick`] at the start of every simulation step,
//! before anything reads network aggregates.

use std::collections::BTreeMap;

use kinetic_core::config::KineticConfig;
use kinetic_core::dirty::DirtyTracker;
use kinetic_core::id::{NetworkId, NodeId};
use kinetic_core::member::MemberAccess;
use kinetic_core::units::{StressUnits, Ticks};

use crate::{KineticNetwork, NetworkBaseline, Removal};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by directory operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// No live network has this id.
    #[error("unknown kinetic network: {0:?}")]
    UnknownNetwork(NetworkId),
    /// The network exists but has not received its baseline yet.
    #[error("kinetic network {0:?} has not been initialized")]
    Uninitialized(NetworkId),
    /// A network with this id is already live.
    #[error("kinetic network {0:?} already exists")]
    DuplicateNetwork(NetworkId),
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events recorded by the directory, drained with
/// [`NetworkDirectory::drain_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KineticEvent {
    /// A network was created or restored.
    NetworkCreated { network: NetworkId },
    /// A network lost its last member and was dropped.
    NetworkEmptied { network: NetworkId },
    /// A deferred recompute ran. `synced` is true if aggregates moved.
    NetworkReprocessed {
        network: NetworkId,
        synced: bool,
        tick: Ticks,
    },
}

// ---------------------------------------------------------------------------
// Network directory
// ---------------------------------------------------------------------------

/// Owns all kinetic networks and their deferred reprocessing.
#[derive(Debug, Clone, Default)]
pub struct NetworkDirectory {
    networks: BTreeMap<NetworkId, KineticNetwork>,
    /// Networks flagged by removals, reprocessed on the next tick.
    pending: DirtyTracker,
    events: Vec<KineticEvent>,
    config: KineticConfig,
    next_network_id: u64,
}

impl NetworkDirectory {
    /// Create an empty directory with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty directory whose networks use `config`.
    pub fn with_config(config: KineticConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &KineticConfig {
        &self.config
    }

    // --- Network management ---

    /// Create a new, uninitialized network and return its id.
    ///
    /// Ids are handed out in increasing order. Once the counter passes
    /// `u64::MAX` it wraps, skipping any id that is still live.
    pub fn create_network(&mut self) -> NetworkId {
        let mut candidate = self.next_network_id;
        while self.networks.contains_key(&NetworkId(candidate)) {
            candidate = candidate.wrapping_add(1);
        }
        let id = NetworkId(candidate);
        self.next_network_id = candidate.wrapping_add(1);
        self.networks
            .insert(id, KineticNetwork::with_config(id, &self.config));
        self.events.push(KineticEvent::NetworkCreated { network: id });
        tracing::debug!(network = ?id, "kinetic network created");
        id
    }

    /// Re-create a network under a persisted id and initialize it from the
    /// persisted baseline. Members are then folded in with
    /// [`add_member_silently`](Self::add_member_silently).
    pub fn restore_network<W: MemberAccess>(
        &mut self,
        id: NetworkId,
        baseline: NetworkBaseline,
        world: &mut W,
    ) -> Result<(), DirectoryError> {
        if self.networks.contains_key(&id) {
            return Err(DirectoryError::DuplicateNetwork(id));
        }
        let mut network = KineticNetwork::with_config(id, &self.config);
        network.initialize(baseline.capacity, baseline.stress, world);
        self.networks.insert(id, network);
        if let Some(next) = id.0.checked_add(1) {
            self.next_network_id = self.next_network_id.max(next);
        }
        self.events.push(KineticEvent::NetworkCreated { network: id });
        tracing::debug!(network = ?id, "kinetic network restored");
        Ok(())
    }

    pub fn network(&self, id: NetworkId) -> Option<&KineticNetwork> {
        self.networks.get(&id)
    }

    /// Mutable access for callers that drive a network directly. Removals
    /// should still go through [`remove_member`](Self::remove_member) so an
    /// emptied network is dropped.
    pub fn network_mut(&mut self, id: NetworkId) -> Option<&mut KineticNetwork> {
        self.networks.get_mut(&id)
    }

    pub fn contains(&self, id: NetworkId) -> bool {
        self.networks.contains_key(&id)
    }

    /// Ids of all live networks, in order.
    pub fn ids(&self) -> impl Iterator<Item = NetworkId> + '_ {
        self.networks.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Whether `id` is waiting for deferred reprocessing.
    pub fn is_pending(&self, id: NetworkId) -> bool {
        self.pending.is_network_dirty(id)
    }

    fn live_mut(&mut self, id: NetworkId) -> Result<&mut KineticNetwork, DirectoryError> {
        let network = self
            .networks
            .get_mut(&id)
            .ok_or(DirectoryError::UnknownNetwork(id))?;
        if !network.is_initialized() {
            return Err(DirectoryError::Uninitialized(id));
        }
        Ok(network)
    }

    // --- Forwarded operations ---

    /// Supply a network's unloaded baseline.
    pub fn initialize<W: MemberAccess>(
        &mut self,
        id: NetworkId,
        capacity: StressUnits,
        stress: StressUnits,
        world: &mut W,
    ) -> Result<(), DirectoryError> {
        let network = self
            .networks
            .get_mut(&id)
            .ok_or(DirectoryError::UnknownNetwork(id))?;
        network.initialize(capacity, stress, world);
        Ok(())
    }

    /// Add a node at runtime. See [`KineticNetwork::add`].
    pub fn add_member<W: MemberAccess>(
        &mut self,
        id: NetworkId,
        node: NodeId,
        world: &mut W,
    ) -> Result<(), DirectoryError> {
        self.live_mut(id)?.add(node, world);
        Ok(())
    }

    /// Fold a node into a network being rebuilt. See
    /// [`KineticNetwork::add_silently`].
    pub fn add_member_silently<W: MemberAccess>(
        &mut self,
        id: NetworkId,
        node: NodeId,
        world: &W,
    ) -> Result<(), DirectoryError> {
        self.live_mut(id)?.add_silently(node, world);
        Ok(())
    }

    pub fn update_capacity_for<W: MemberAccess>(
        &mut self,
        id: NetworkId,
        node: NodeId,
        capacity: StressUnits,
        world: &mut W,
    ) -> Result<bool, DirectoryError> {
        Ok(self.live_mut(id)?.update_capacity_for(node, capacity, world))
    }

    pub fn update_stress_for<W: MemberAccess>(
        &mut self,
        id: NetworkId,
        node: NodeId,
        stress: StressUnits,
        world: &mut W,
    ) -> Result<bool, DirectoryError> {
        Ok(self.live_mut(id)?.update_stress_for(node, stress, world))
    }

    /// Recompute both aggregates right away, e.g. after a source changed
    /// speed. Returns `true` if members were synced.
    pub fn recompute<W: MemberAccess>(
        &mut self,
        id: NetworkId,
        world: &mut W,
    ) -> Result<bool, DirectoryError> {
        Ok(self.live_mut(id)?.recompute_both(world))
    }

    /// Remove a node. An emptied network is dropped and reported with
    /// [`KineticEvent::NetworkEmptied`]; otherwise the network is queued for
    /// reprocessing on the next [`tick`](Self::tick).
    pub fn remove_member<W: MemberAccess>(
        &mut self,
        id: NetworkId,
        node: NodeId,
        world: &mut W,
    ) -> Result<Removal, DirectoryError> {
        let removal = self.live_mut(id)?.remove(node, world);
        match removal {
            Removal::NotMember => {}
            Removal::Detached { reprocess } => {
                if !self.pending.mark_network(id, reprocess) {
                    tracing::trace!(
                        network = ?id,
                        flagged = ?self.pending.flagged_member(id),
                        "kinetic network already pending"
                    );
                }
            }
            Removal::Emptied { network } => {
                self.networks.remove(&network);
                self.pending.forget(network);
                self.events.push(KineticEvent::NetworkEmptied { network });
                tracing::debug!(network = ?network, "kinetic network deregistered");
            }
        }
        Ok(removal)
    }

    // --- Tick ---

    /// Run deferred reprocessing: every pending network is recomputed exactly
    /// once. Returns the number of networks reprocessed.
    pub fn tick<W: MemberAccess>(&mut self, current_tick: Ticks, world: &mut W) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let mut processed = 0;
        for (id, flagged) in self.pending.take() {
            let Some(network) = self.networks.get_mut(&id) else {
                continue;
            };
            let synced = network.recompute_both(world);
            processed += 1;
            tracing::debug!(network = ?id, ?flagged, synced, "kinetic network reprocessed");
            self.events.push(KineticEvent::NetworkReprocessed {
                network: id,
                synced,
                tick: current_tick,
            });
        }
        processed
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<KineticEvent> {
        std::mem::take(&mut self.events)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
