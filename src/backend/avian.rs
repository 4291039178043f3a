//! avian3d-backed scene for the targeting systems.

use avian3d::prelude::*;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::components::{Targetable, TargetSubPoint};
use crate::types::{CollisionMask, EntityBounds, RayHit, SceneView, SpatialQueryService};

impl From<CollisionMask> for LayerMask {
    fn from(mask: CollisionMask) -> Self {
        LayerMask(mask.0)
    }
}

/// System parameter exposing the physics world to the targeting core.
///
/// Only collider entities carrying [`Targetable`] are reported by the sphere
/// query; the line-of-sight ray hits any collider on the occlusion layers.
#[derive(SystemParam)]
pub struct TargetingScene<'w, 's> {
    spatial_query: SpatialQuery<'w, 's>,
    transforms: Query<'w, 's, &'static GlobalTransform>,
    aabbs: Query<'w, 's, &'static ColliderAabb>,
    children: Query<'w, 's, &'static Children>,
    sub_points: Query<'w, 's, &'static TargetSubPoint>,
    targetables: Query<'w, 's, (), With<Targetable>>,
}

impl<'w, 's> TargetingScene<'w, 's> {
    /// View of the scene in which `shooter`'s own collider is transparent.
    pub fn excluding(&self, shooter: Entity) -> ShooterScene<'_, 'w, 's> {
        ShooterScene {
            scene: self,
            shooter,
        }
    }

    fn overlap(&self, center: Vec3, radius: f32, filter: &SpatialQueryFilter) -> Vec<Entity> {
        let mut hits: Vec<Entity> = self
            .spatial_query
            .shape_intersections(&Collider::sphere(radius), center, Quat::IDENTITY, filter)
            .into_iter()
            .filter(|entity| self.targetables.contains(*entity))
            .collect();
        hits.sort();
        hits.dedup();
        hits
    }

    fn ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &SpatialQueryFilter,
    ) -> Option<RayHit> {
        let direction = Dir3::new(direction).ok()?;
        self.spatial_query
            .cast_ray(origin, direction, max_distance, true, filter)
            .map(|hit| RayHit {
                entity: hit.entity,
                distance: hit.distance,
            })
    }
}

impl SpatialQueryService for TargetingScene<'_, '_> {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CollisionMask) -> Vec<Entity> {
        self.overlap(center, radius, &SpatialQueryFilter::from_mask(mask))
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: CollisionMask,
    ) -> Option<RayHit> {
        self.ray(origin, direction, max_distance, &SpatialQueryFilter::from_mask(mask))
    }
}

impl SceneView for TargetingScene<'_, '_> {
    fn world_transform(&self, entity: Entity) -> Option<Transform> {
        self.transforms
            .get(entity)
            .ok()
            .map(GlobalTransform::compute_transform)
    }

    fn bounds_of(&self, entity: Entity) -> Option<EntityBounds> {
        self.aabbs
            .get(entity)
            .ok()
            .map(|aabb| EntityBounds::from_min_max(aabb.min, aabb.max))
    }

    fn sub_points_of(&self, entity: Entity) -> Vec<(Entity, TargetSubPoint)> {
        self.children
            .iter_descendants_depth_first(entity)
            .filter_map(|child| self.sub_points.get(child).ok().map(|sp| (child, *sp)))
            .collect()
    }
}

/// [`TargetingScene`] as seen by one shooter.
pub struct ShooterScene<'a, 'w, 's> {
    scene: &'a TargetingScene<'w, 's>,
    shooter: Entity,
}

impl ShooterScene<'_, '_, '_> {
    fn filter(&self, mask: CollisionMask) -> SpatialQueryFilter {
        SpatialQueryFilter::from_mask(mask).with_excluded_entities([self.shooter])
    }
}

impl SpatialQueryService for ShooterScene<'_, '_, '_> {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CollisionMask) -> Vec<Entity> {
        self.scene.overlap(center, radius, &self.filter(mask))
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: CollisionMask,
    ) -> Option<RayHit> {
        self.scene.ray(origin, direction, max_distance, &self.filter(mask))
    }
}

impl SceneView for ShooterScene<'_, '_, '_> {
    fn world_transform(&self, entity: Entity) -> Option<Transform> {
        self.scene.world_transform(entity)
    }

    fn bounds_of(&self, entity: Entity) -> Option<EntityBounds> {
        self.scene.bounds_of(entity)
    }

    fn sub_points_of(&self, entity: Entity) -> Vec<(Entity, TargetSubPoint)> {
        self.scene.sub_points_of(entity)
    }
}
