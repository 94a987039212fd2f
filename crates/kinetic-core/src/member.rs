//! Capability interface of kinetic components.
//!
//! A network never owns its members. It names them by [`NodeId`] and reaches
//! them through a [`MemberAccess`] store handed in by the simulation for each
//! call that needs to read contributions or push state. Concrete machines
//! implement [`KineticMember`]; heterogeneous stores can hold
//! `Box<dyn KineticMember>` or a tagged enum of machine kinds.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use slotmap::{SecondaryMap, SlotMap};

use crate::id::NodeId;
use crate::units::{Speed, StressUnits};

// ---------------------------------------------------------------------------
// KineticMember trait
// ---------------------------------------------------------------------------

/// A component that takes part in a kinetic network.
pub trait KineticMember {
    /// Whether this component adds capacity to its network (motor, wheel).
    fn is_source(&self) -> bool;

    /// Speed this component generates. Only meaningful for sources.
    fn generated_speed(&self) -> Speed;

    /// Speed this component would run at given its network's source.
    fn theoretical_speed(&self) -> Speed;

    /// Raw capacity added at a speed multiplier of 1.
    fn added_stress_capacity(&self) -> StressUnits;

    /// Raw stress drawn at a speed multiplier of 1.
    fn stress_applied(&self) -> StressUnits;

    /// Receive the network's aggregate `(capacity, stress)`. Called on every
    /// broadcast, so it should be cheap and idempotent.
    fn receive_network_state(&mut self, capacity: StressUnits, stress: StressUnits);

    /// Flag that this component's network needs reprocessing on its next
    /// scheduled pass.
    fn mark_network_dirty(&mut self);
}

impl<T: KineticMember + ?Sized> KineticMember for Box<T> {
    fn is_source(&self) -> bool {
        (**self).is_source()
    }

    fn generated_speed(&self) -> Speed {
        (**self).generated_speed()
    }

    fn theoretical_speed(&self) -> Speed {
        (**self).theoretical_speed()
    }

    fn added_stress_capacity(&self) -> StressUnits {
        (**self).added_stress_capacity()
    }

    fn stress_applied(&self) -> StressUnits {
        (**self).stress_applied()
    }

    fn receive_network_state(&mut self, capacity: StressUnits, stress: StressUnits) {
        (**self).receive_network_state(capacity, stress)
    }

    fn mark_network_dirty(&mut self) {
        (**self).mark_network_dirty()
    }
}

// ---------------------------------------------------------------------------
// MemberAccess trait
// ---------------------------------------------------------------------------

/// Lookup of kinetic components by [`NodeId`].
///
/// Returning `None` means the component no longer exists in the simulation;
/// networks skip such nodes instead of failing.
pub trait MemberAccess {
    type Member: KineticMember;

    fn member(&self, node: NodeId) -> Option<&Self::Member>;

    fn member_mut(&mut self, node: NodeId) -> Option<&mut Self::Member>;
}

impl<M: KineticMember> MemberAccess for SlotMap<NodeId, M> {
    type Member = M;

    fn member(&self, node: NodeId) -> Option<&M> {
        self.get(node)
    }

    fn member_mut(&mut self, node: NodeId) -> Option<&mut M> {
        self.get_mut(node)
    }
}

impl<M: KineticMember> MemberAccess for SecondaryMap<NodeId, M> {
    type Member = M;

    fn member(&self, node: NodeId) -> Option<&M> {
        self.get(node)
    }

    fn member_mut(&mut self, node: NodeId) -> Option<&mut M> {
        self.get_mut(node)
    }
}

impl<M: KineticMember, S: BuildHasher> MemberAccess for HashMap<NodeId, M, S> {
    type Member = M;

    fn member(&self, node: NodeId) -> Option<&M> {
        self.get(&node)
    }

    fn member_mut(&mut self, node: NodeId) -> Option<&mut M> {
        self.get_mut(&node)
    }
}

impl<M: KineticMember> MemberAccess for BTreeMap<NodeId, M> {
    type Member = M;

    fn member(&self, node: NodeId) -> Option<&M> {
        self.get(&node)
    }

    fn member_mut(&mut self, node: NodeId) -> Option<&mut M> {
        self.get_mut(&node)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
