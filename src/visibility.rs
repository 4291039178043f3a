//! Visibility filter - view cones, silhouette test and line of sight.

use bevy::prelude::*;

use crate::geometry::{
    angle_deg_2d, flatten, ground, horizontal_forward, rotate_yaw, segments_intersect,
};
use crate::resources::TargetingConfig;
use crate::types::{EntityBounds, Pose, TargetingWorld};

/// Ground-plane edges of the far view cone.
///
/// Both edges start at the shooter and end `max_distance` away, rotated
/// `±far_view_angle` from the horizontal forward.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FarBoundaries {
    /// Shooter position on the ground plane
    pub origin: Vec2,
    /// End of the left edge
    pub left: Vec2,
    /// End of the right edge
    pub right: Vec2,
}

impl FarBoundaries {
    /// Computes the cone edges for the current pose.
    pub fn compute(pose: &Pose, max_distance: f32, far_view_angle: f32) -> Self {
        let reach = horizontal_forward(pose.forward) * max_distance;
        let origin = flatten(pose.position);
        Self {
            origin: ground(origin),
            left: ground(origin + rotate_yaw(reach, far_view_angle)),
            right: ground(origin + rotate_yaw(reach, -far_view_angle)),
        }
    }

    /// True if either ground diagonal of `bounds` crosses either cone edge.
    pub fn crossed_by(&self, bounds: &EntityBounds) -> bool {
        bounds.ground_diagonals().iter().any(|&(a, b)| {
            segments_intersect(a, b, self.origin, self.right)
                || segments_intersect(a, b, self.origin, self.left)
        })
    }
}

/// Why a candidate passed the cheap geometric checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConeHit {
    /// Inside the near cone and within immediate proximity
    Near,
    /// Inside the far cone
    Far,
    /// Outside both cones, but its silhouette crosses a far cone edge
    Silhouette,
}

/// Dual-angle view cone derived from a [`TargetingConfig`].
#[derive(Clone, Debug, PartialEq)]
pub struct ViewCone {
    /// Half-angle of the far cone, degrees
    pub far_view_angle: f32,
    /// Half-angle of the near cone, degrees
    pub near_view_angle: f32,
    /// Range of the near cone
    pub immediate_proximity: f32,
    /// Range of the far cone and of the line-of-sight ray
    pub max_distance: f32,
    /// Layers that can block line of sight
    pub occlusion_mask: crate::types::CollisionMask,
}

impl ViewCone {
    /// Cone for a config, with the near range resolved to a distance.
    pub fn from_config(config: &TargetingConfig) -> Self {
        Self {
            far_view_angle: config.far_view_angle,
            near_view_angle: config.near_view_angle,
            immediate_proximity: config.immediate_proximity(),
            max_distance: config.max_distance,
            occlusion_mask: config.occlusion_mask,
        }
    }

    /// Geometric pre-check, ignoring occlusion.
    ///
    /// Only the horizontal plane is considered; vertical offsets are ignored.
    /// `bounds` may be `None`, in which case the silhouette test is skipped.
    pub fn classify(
        &self,
        entity_position: Vec3,
        bounds: Option<&EntityBounds>,
        pose: &Pose,
        boundaries: &FarBoundaries,
    ) -> Option<ConeHit> {
        let to_entity = ground(entity_position - pose.position);
        let angle = angle_deg_2d(to_entity, ground(pose.forward));

        let proximity = self.immediate_proximity;
        if angle <= self.near_view_angle && to_entity.length_squared() <= proximity * proximity {
            return Some(ConeHit::Near);
        }
        if angle <= self.far_view_angle {
            return Some(ConeHit::Far);
        }
        match bounds {
            Some(bounds) if boundaries.crossed_by(bounds) => Some(ConeHit::Silhouette),
            _ => None,
        }
    }

    /// Full visibility test: geometric pre-check, then one line-of-sight ray.
    ///
    /// The ray is only cast when the pre-check passes. The entity is visible
    /// iff it is the first thing the ray hits within `max_distance`.
    pub fn is_visible(
        &self,
        entity: Entity,
        pose: &Pose,
        boundaries: &FarBoundaries,
        world: &(impl TargetingWorld + ?Sized),
    ) -> bool {
        let Some(position) = world.position_of(entity) else {
            return false;
        };
        let bounds = world.bounds_of(entity);
        if self.classify(position, bounds.as_ref(), pose, boundaries).is_none() {
            return false;
        }

        let direction = position - pose.position;
        world
            .raycast(pose.position, direction, self.max_distance, self.occlusion_mask)
            .is_some_and(|hit| hit.entity == entity)
    }
}
