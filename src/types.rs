//! Common types and collaborator contracts for the targeting system.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::TargetSubPoint;

/// Shooter pose supplied every tick.
///
/// # Fields
/// * `position` - World-space position of the weapon or player
/// * `forward` - Direction the weapon is facing (need not be normalized)
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_hitscan_targeting::types::Pose;
///
/// let pose = Pose::new(Vec3::new(0.0, 1.5, 0.0), Vec3::NEG_Z);
/// assert_eq!(pose.forward, Vec3::NEG_Z);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Default, Reflect)]
pub struct Pose {
    /// World-space position
    pub position: Vec3,
    /// Facing direction
    pub forward: Vec3,
}

impl Pose {
    /// Creates a new pose from a position and a facing direction.
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }

    /// Reads the pose of a weapon from its global transform (Bevy forward is `-Z`).
    pub fn from_global_transform(transform: &GlobalTransform) -> Self {
        Self {
            position: transform.translation(),
            forward: *transform.forward(),
        }
    }
}

/// Bitmask of collision layers used by the spatial queries.
///
/// Kept independent from any physics backend; the avian3d backend converts it
/// into its own `LayerMask`.
///
/// # Example
/// ```
/// use bevy_hitscan_targeting::types::CollisionMask;
///
/// let shootable = CollisionMask::layer(3);
/// let obstacles = CollisionMask::layer(4);
/// let occlusion = shootable | obstacles;
/// assert!(occlusion.intersects(shootable));
/// ```
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize,
)]
pub struct CollisionMask(pub u32);

impl CollisionMask {
    /// Matches every layer
    pub const ALL: Self = Self(u32::MAX);
    /// Matches no layer
    pub const NONE: Self = Self(0);

    /// Mask containing only the given layer index.
    ///
    /// Indices of 32 and above name no layer and give [`CollisionMask::NONE`].
    pub const fn layer(index: u32) -> Self {
        match 1u32.checked_shl(index) {
            Some(bits) => Self(bits),
            None => Self::NONE,
        }
    }

    /// True if both masks share at least one layer.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for CollisionMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// First surface hit by a line-of-sight ray cast.
///
/// # Fields
/// * `entity` - The entity that owns the surface that was hit
/// * `distance` - Distance from the ray origin to the hit point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Hit entity
    pub entity: Entity,
    /// Distance from ray origin
    pub distance: f32,
}

/// World-space axis-aligned bounds of a targetable entity.
///
/// # Fields
/// * `center` - Center of the bounds
/// * `extents` - Half-size along each axis
#[derive(Clone, Copy, Debug, PartialEq, Default, Reflect)]
pub struct EntityBounds {
    pub center: Vec3,
    pub extents: Vec3,
}

impl EntityBounds {
    /// Creates bounds from a center and half-extents.
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }

    /// Creates bounds from min/max corners.
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        }
    }

    /// The two diagonals of the bounds projected onto the ground (XZ) plane.
    pub fn ground_diagonals(&self) -> [(Vec2, Vec2); 2] {
        let c = Vec2::new(self.center.x, self.center.z);
        let e = Vec2::new(self.extents.x, self.extents.z);
        [
            (c + e, c - e),
            (c + Vec2::new(e.x, -e.y), c + Vec2::new(-e.x, e.y)),
        ]
    }
}

/// Per-fire-event parameters.
///
/// # Fields
/// * `salvo_count` - Number of impacts to resolve; must be at least 1
/// * `critical_chance` - Probability in `[0, 1]` of aiming at a critical zone
/// * `accuracy` - First-shot tightness in `[0, 1]` (1 = pinpoint)
/// * `precision` - Follow-up tightness in `[0, 1]`; `1 - precision` is also the
///   chance a follow-up drifts to the nearest neighbouring sub-point
///
/// # Example
/// ```
/// use bevy_hitscan_targeting::types::TargetingParameters;
///
/// let burst = TargetingParameters::new(3)
///     .with_critical_chance(0.2)
///     .with_accuracy(0.9)
///     .with_precision(0.75);
/// assert_eq!(burst.salvo_count, 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Reflect, Serialize, Deserialize)]
pub struct TargetingParameters {
    pub salvo_count: u32,
    pub critical_chance: f32,
    pub accuracy: f32,
    pub precision: f32,
}

impl Default for TargetingParameters {
    /// One pinpoint, non-critical shot.
    fn default() -> Self {
        Self {
            salvo_count: 1,
            critical_chance: 0.0,
            accuracy: 1.0,
            precision: 1.0,
        }
    }
}

impl TargetingParameters {
    /// Creates pinpoint parameters for a salvo of `salvo_count` shots.
    pub fn new(salvo_count: u32) -> Self {
        Self {
            salvo_count,
            ..Default::default()
        }
    }

    /// Builder pattern: set critical chance
    pub fn with_critical_chance(mut self, chance: f32) -> Self {
        self.critical_chance = chance;
        self
    }

    /// Builder pattern: set first-shot accuracy
    pub fn with_accuracy(mut self, accuracy: f32) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Builder pattern: set follow-up precision
    pub fn with_precision(mut self, precision: f32) -> Self {
        self.precision = precision;
        self
    }
}

/// One resolved impact.
///
/// `offset` is the world-space displacement of the impact from the hit
/// sub-point's position at resolve time; `position` is the impact itself.
///
/// # Fields
/// * `target` - The targetable entity that was shot
/// * `sub_point` - The sub-point the impact belongs to
/// * `critical` - Whether the sub-point is a critical zone
/// * `offset` - Impact displacement from the sub-point's position
/// * `position` - World-space impact position at resolve time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedHit {
    pub target: Entity,
    pub sub_point: Entity,
    pub critical: bool,
    pub offset: Vec3,
    pub position: Vec3,
}

impl ResolvedHit {
    /// Impact position re-anchored to the sub-point's current position.
    ///
    /// Returns `None` once the sub-point no longer exists.
    pub fn current_position(&self, scene: &(impl SceneView + ?Sized)) -> Option<Vec3> {
        scene.position_of(self.sub_point).map(|p| p + self.offset)
    }
}

/// Spatial query abstraction over the physics backend.
///
/// Results must be deterministic for a fixed world state. The ordering of the
/// overlap result carries no meaning; discovery re-sorts it.
pub trait SpatialQueryService {
    /// All entities on `mask` whose colliders overlap the sphere.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CollisionMask) -> Vec<Entity>;

    /// First entity on `mask` hit by the ray within `max_distance`.
    ///
    /// # Arguments
    /// * `origin` - Starting point of the ray in world space
    /// * `direction` - Direction of the ray (need not be normalized)
    /// * `max_distance` - Maximum distance to cast the ray
    /// * `mask` - Layers the ray can hit
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: CollisionMask,
    ) -> Option<RayHit>;
}

/// Read-only view of the scene used to look up entities by handle.
///
/// Handles are non-owning: every lookup may answer "gone" and callers treat
/// that as a normal outcome.
pub trait SceneView {
    /// World transform of the entity, or `None` if it no longer exists.
    fn world_transform(&self, entity: Entity) -> Option<Transform>;

    /// World-space bounds of the entity's collider.
    fn bounds_of(&self, entity: Entity) -> Option<EntityBounds>;

    /// Sub-points structurally attached to the entity, in hierarchy order.
    fn sub_points_of(&self, entity: Entity) -> Vec<(Entity, TargetSubPoint)>;

    /// Liveness check for a non-owning handle.
    fn is_alive(&self, entity: Entity) -> bool {
        self.world_transform(entity).is_some()
    }

    /// World position of the entity.
    fn position_of(&self, entity: Entity) -> Option<Vec3> {
        self.world_transform(entity).map(|t| t.translation)
    }
}

/// Everything the targeting core needs from the engine.
pub trait TargetingWorld: SpatialQueryService + SceneView {}

impl<T: SpatialQueryService + SceneView + ?Sized> TargetingWorld for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_bits() {
        assert_eq!(CollisionMask::layer(0), CollisionMask(1));
        assert_eq!(CollisionMask::layer(31), CollisionMask(1 << 31));
        assert!(!CollisionMask::layer(3).intersects(CollisionMask::layer(4)));
    }

    #[test]
    fn test_layer_out_of_range_is_empty() {
        assert_eq!(CollisionMask::layer(32), CollisionMask::NONE);
        assert_eq!(CollisionMask::layer(u32::MAX), CollisionMask::NONE);
    }
}
