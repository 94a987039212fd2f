//! Rotational units shared by every kinetic crate.

/// Rotational speed in RPM. Signed: the sign encodes direction of rotation.
pub type Speed = f32;

/// Stress units (SU). Both capacity and stress are measured in these.
pub type StressUnits = f32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Scale factor applied to a raw capacity or stress contribution at `speed`.
///
/// Only the magnitude of rotation matters: a motor spinning backwards at
/// 32 RPM supplies exactly what it supplies forwards. Stateless so callers
/// can scale contributions before they ever reach a network.
#[inline]
pub fn stress_multiplier(speed: Speed) -> f32 {
    speed.abs()
}

/// Scale a raw contribution by the multiplier for `speed`.
#[inline]
pub fn scaled(raw: StressUnits, speed: Speed) -> StressUnits {
    raw * stress_multiplier(speed)
}
