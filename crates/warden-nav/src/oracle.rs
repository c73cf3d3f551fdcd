use warden_core::{DeterministicRng, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavPath {
    pub points: Vec<Vec3>,
}

impl NavPath {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavRaycastHit {
    pub point: Vec3,
}

/// Walkable-surface queries.
///
/// Every query may fail; callers must carry a fallback (a larger radius, or the unmodified
/// point). Queries are synchronous: an answer is available the tick it is asked for.
pub trait NavigationOracle {
    /// Nearest walkable point inside the axis-aligned box `point ± extent`.
    fn project_to_navigable(&self, point: Vec3, extent: Vec3) -> Option<Vec3>;

    /// Random walkable point within `radius` of `center` that is reachable from `center`.
    fn random_reachable_point(
        &self,
        center: Vec3,
        radius: f32,
        rng: &mut dyn DeterministicRng,
    ) -> Option<Vec3>;

    /// Path between two walkable points.
    ///
    /// Backends that don't plan paths may return `None`.
    fn find_path(&self, _start: Vec3, _goal: Vec3) -> Option<NavPath> {
        None
    }

    /// First point where the segment from `start` to `end` leaves walkable space, or `None`
    /// when the segment is clear (or the backend does not support raycasts).
    fn raycast(&self, _start: Vec3, _end: Vec3) -> Option<NavRaycastHit> {
        None
    }
}

/// Ordered fallbacks for turning a desired position into a walkable one: project inside a box
/// first, then try random reachable points at growing radii.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapCascade<'a> {
    pub extent: Vec3,
    pub radii: &'a [f32],
}

impl<'a> SnapCascade<'a> {
    pub const fn new(extent: Vec3, radii: &'a [f32]) -> Self {
        Self { extent, radii }
    }

    pub fn snap(
        &self,
        oracle: &dyn NavigationOracle,
        desired: Vec3,
        rng: &mut dyn DeterministicRng,
    ) -> Option<Vec3> {
        if let Some(p) = oracle.project_to_navigable(desired, self.extent) {
            return Some(p);
        }
        self.radii
            .iter()
            .find_map(|&radius| oracle.random_reachable_point(desired, radius, rng))
    }
}
