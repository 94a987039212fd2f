//! Kinetic Core -- shared vocabulary for kinetic stress networks.
//!
//! Every crate that tracks rotational power depends on these types: the
//! identifiers that name components and networks, the units and the speed
//! multiplier that scale raw contributions, the capability traits a
//! component implements to take part in a network, the dirty tracker that
//! batches deferred reprocessing, and the engine configuration.
//!
//! # Key Types
//!
//! - [`id::NodeId`] -- Slotmap key naming one kinetic component.
//! - [`id::NetworkId`] -- Stable, persisted identity of one network.
//! - [`units::stress_multiplier`] -- Pure `|speed|` scale factor.
//! - [`member::KineticMember`] -- Capability interface of a component.
//! - [`member::MemberAccess`] -- Lookup of components by [`id::NodeId`].
//! - [`dirty::DirtyTracker`] -- Networks awaiting deferred recompute.
//! - [`config::KineticConfig`] -- Change-detection settings.

pub mod config;
pub mod dirty;
pub mod id;
pub mod member;
pub mod units;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
