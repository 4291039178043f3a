//! Per-target catalog of hittable sub-points.

use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use thiserror::Error;

use crate::components::TargetSubPoint;
use crate::geometry::angle_deg;
use crate::types::{SceneView, TargetingWorld};

/// Failure to build a [`TargetPointCatalog`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CatalogError {
    /// The entity has no sub-points among its descendants
    #[error("targetable entity {entity} has no target sub-points")]
    MissingTargetPoints { entity: Entity },
}

/// One sub-point in a catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogPoint {
    /// Sub-point entity
    pub entity: Entity,
    pub sub_point: TargetSubPoint,
    /// Fallback neighbours as catalog indices, nearest first
    pub neighbors: Vec<usize>,
}

impl CatalogPoint {
    /// True if a shot from `shooter` can land on this point.
    ///
    /// The angle is taken between the point-to-shooter vector and the
    /// point's facing (its forward axis). A sub-point that no longer exists
    /// is never in angle.
    pub fn is_in_shooting_angle(&self, shooter: Vec3, scene: &(impl SceneView + ?Sized)) -> bool {
        if self.sub_point.always_shootable() {
            return scene.is_alive(self.entity);
        }
        let Some(transform) = scene.world_transform(self.entity) else {
            return false;
        };
        let to_shooter = shooter - transform.translation;
        angle_deg(to_shooter, *transform.forward()) <= self.sub_point.shootable_angle
    }
}

fn round_to_thousandths(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

/// Sub-points of one targetable entity, critical points first.
///
/// Immutable once built; the partition is stable so points keep their
/// hierarchy order within each class.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_hitscan_targeting::backend::memory::MemoryScene;
/// use bevy_hitscan_targeting::catalog::TargetPointCatalog;
/// use bevy_hitscan_targeting::components::TargetSubPoint;
/// use bevy_hitscan_targeting::types::CollisionMask;
///
/// let mut scene = MemoryScene::new();
/// let body = scene.spawn_collider(Vec3::ZERO, Vec3::ONE, CollisionMask::layer(1));
/// scene.attach_sub_point(body, Transform::default(), TargetSubPoint::default());
/// scene.attach_sub_point(body, Transform::default(), TargetSubPoint::default().critical());
///
/// let catalog = TargetPointCatalog::build(body, &scene).unwrap();
/// assert_eq!(catalog.critical().len(), 1);
/// assert_eq!(catalog.non_critical().len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct TargetPointCatalog {
    owner: Entity,
    points: Vec<CatalogPoint>,
    critical_count: usize,
}

impl TargetPointCatalog {
    /// Collects, partitions and links the sub-points of `owner`.
    pub fn build(owner: Entity, scene: &(impl SceneView + ?Sized)) -> Result<Self, CatalogError> {
        let found = scene.sub_points_of(owner);
        if found.is_empty() {
            return Err(CatalogError::MissingTargetPoints { entity: owner });
        }

        let (critical, non_critical): (Vec<_>, Vec<_>) =
            found.into_iter().partition(|(_, sub_point)| sub_point.critical);
        let critical_count = critical.len();

        let ordered: Vec<(Entity, TargetSubPoint, Transform)> = critical
            .into_iter()
            .chain(non_critical)
            .map(|(entity, sub_point)| {
                let transform = scene.world_transform(entity).unwrap_or_default();
                (entity, sub_point, transform)
            })
            .collect();

        let points = ordered
            .iter()
            .enumerate()
            .map(|(index, (entity, sub_point, _))| CatalogPoint {
                entity: *entity,
                sub_point: *sub_point,
                neighbors: Self::neighbors_of(index, &ordered),
            })
            .collect();

        Ok(Self {
            owner,
            points,
            critical_count,
        })
    }

    fn neighbors_of(index: usize, ordered: &[(Entity, TargetSubPoint, Transform)]) -> Vec<usize> {
        let (_, own, own_transform) = &ordered[index];
        let own_facing = *own_transform.forward();

        let mut candidates: Vec<(usize, f32)> = ordered
            .iter()
            .enumerate()
            .filter(|(other_index, _)| *other_index != index)
            .filter(|(_, (_, other, other_transform))| {
                let angle = round_to_thousandths(angle_deg(own_facing, *other_transform.forward()));
                other.always_shootable()
                    || angle <= other.shootable_angle
                    || angle <= own.shootable_angle
            })
            .map(|(other_index, (_, _, other_transform))| {
                (
                    other_index,
                    own_transform.translation.distance_squared(other_transform.translation),
                )
            })
            .collect();
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
        candidates.into_iter().map(|(i, _)| i).collect()
    }

    /// The targetable entity this catalog belongs to.
    pub fn owner(&self) -> Entity {
        self.owner
    }

    /// All points, critical first.
    pub fn all(&self) -> &[CatalogPoint] {
        &self.points
    }

    pub fn critical(&self) -> &[CatalogPoint] {
        &self.points[..self.critical_count]
    }

    pub fn non_critical(&self) -> &[CatalogPoint] {
        &self.points[self.critical_count..]
    }

    /// Catalog indices of the critical or non-critical subset.
    pub fn category_indices(&self, critical: bool) -> std::ops::Range<usize> {
        if critical {
            0..self.critical_count
        } else {
            self.critical_count..self.points.len()
        }
    }

    pub fn point(&self, index: usize) -> Option<&CatalogPoint> {
        self.points.get(index)
    }

    /// Nearest fallback neighbour of the point at `index`.
    pub fn nearest_neighbor(&self, index: usize) -> Option<(usize, &CatalogPoint)> {
        let neighbor = *self.points.get(index)?.neighbors.first()?;
        self.points.get(neighbor).map(|point| (neighbor, point))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Catalog slot of one entity.
#[derive(Clone, Debug)]
pub enum CatalogSlot {
    Built(TargetPointCatalog),
    /// Construction failed once; never retried.
    Untargetable,
}

/// Lazily built catalogs, keyed by targetable entity.
#[derive(Resource, Default)]
pub struct CatalogRegistry {
    slots: HashMap<Entity, CatalogSlot>,
}

impl CatalogRegistry {
    /// Returns the catalog of `entity`, building it on first use.
    ///
    /// A failed build is logged once and the entity is remembered as
    /// untargetable; later calls return `None` without logging.
    pub fn get_or_build(
        &mut self,
        entity: Entity,
        world: &(impl TargetingWorld + ?Sized),
    ) -> Option<&TargetPointCatalog> {
        let slot = self
            .slots
            .entry(entity)
            .or_insert_with(|| match TargetPointCatalog::build(entity, world) {
                Ok(catalog) => {
                    debug!(
                        "Built target catalog for {entity}: {} critical, {} non-critical",
                        catalog.critical().len(),
                        catalog.non_critical().len()
                    );
                    CatalogSlot::Built(catalog)
                }
                Err(err) => {
                    warn!("{err}; treating it as untargetable");
                    CatalogSlot::Untargetable
                }
            });
        match &*slot {
            CatalogSlot::Built(catalog) => Some(catalog),
            CatalogSlot::Untargetable => None,
        }
    }

    pub fn get(&self, entity: Entity) -> Option<&TargetPointCatalog> {
        match self.slots.get(&entity) {
            Some(CatalogSlot::Built(catalog)) => Some(catalog),
            _ => None,
        }
    }

    pub fn is_untargetable(&self, entity: Entity) -> bool {
        matches!(self.slots.get(&entity), Some(CatalogSlot::Untargetable))
    }

    /// Drops the slot of a despawned entity.
    pub fn forget(&mut self, entity: Entity) {
        self.slots.remove(&entity);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryScene;
    use crate::resources::SHOOTABLE_LAYER;

    fn facing(position: Vec3, yaw_deg: f32) -> Transform {
        Transform::from_translation(position)
            .with_rotation(Quat::from_rotation_y(yaw_deg.to_radians()))
    }

    #[test]
    fn test_partition_is_stable_and_complete() {
        let mut scene = MemoryScene::new();
        let body = scene.spawn_collider(Vec3::ZERO, Vec3::ONE, SHOOTABLE_LAYER);
        let a = scene.attach_sub_point(body, Transform::default(), TargetSubPoint::default());
        let head = TargetSubPoint::default().critical();
        let b = scene.attach_sub_point(body, Transform::default(), head);
        let c = scene.attach_sub_point(body, Transform::default(), TargetSubPoint::default());
        let d = scene.attach_sub_point(body, Transform::default(), head);

        let catalog = TargetPointCatalog::build(body, &scene).unwrap();
        let order: Vec<Entity> = catalog.all().iter().map(|p| p.entity).collect();
        assert_eq!(order, vec![b, d, a, c]);

        assert_eq!(catalog.critical().len() + catalog.non_critical().len(), catalog.len());
        assert!(catalog.critical().iter().all(|p| p.sub_point.critical));
        assert!(catalog.non_critical().iter().all(|p| !p.sub_point.critical));
        assert_eq!(catalog.category_indices(true), 0..2);
        assert_eq!(catalog.category_indices(false), 2..4);
        assert_eq!(catalog.owner(), body);
    }

    #[test]
    fn test_missing_points_is_an_error() {
        let mut scene = MemoryScene::new();
        let body = scene.spawn_collider(Vec3::ZERO, Vec3::ONE, SHOOTABLE_LAYER);
        assert_eq!(
            TargetPointCatalog::build(body, &scene).unwrap_err(),
            CatalogError::MissingTargetPoints { entity: body }
        );
    }

    #[test]
    fn test_neighbors_sorted_by_distance() {
        let mut scene = MemoryScene::new();
        let body = scene.spawn_collider(Vec3::ZERO, Vec3::ONE, SHOOTABLE_LAYER);
        let sp = TargetSubPoint::default().with_shootable_angle(30.0);
        scene.attach_sub_point(body, facing(Vec3::ZERO, 0.0), sp);
        scene.attach_sub_point(body, facing(Vec3::new(0.0, 2.0, 0.0), 0.0), sp);
        scene.attach_sub_point(body, facing(Vec3::new(0.0, 0.5, 0.0), 0.0), sp);
        // back plate faces the other way
        scene.attach_sub_point(body, facing(Vec3::new(0.0, 0.1, 0.0), 180.0), sp);

        let catalog = TargetPointCatalog::build(body, &scene).unwrap();
        assert_eq!(catalog.point(0).unwrap().neighbors, vec![2, 1]);
        assert_eq!(catalog.nearest_neighbor(0).map(|(i, _)| i), Some(2));
        assert!(catalog.point(3).unwrap().neighbors.is_empty());
        assert!(catalog.nearest_neighbor(3).is_none());
    }

    #[test]
    fn test_always_shootable_point_is_everyones_neighbor() {
        let mut scene = MemoryScene::new();
        let body = scene.spawn_collider(Vec3::ZERO, Vec3::ONE, SHOOTABLE_LAYER);
        let narrow = TargetSubPoint::default().with_shootable_angle(10.0);
        scene.attach_sub_point(body, facing(Vec3::ZERO, 0.0), narrow);
        scene.attach_sub_point(
            body,
            facing(Vec3::X, 180.0),
            TargetSubPoint::default().with_shootable_angle(180.0),
        );

        let catalog = TargetPointCatalog::build(body, &scene).unwrap();
        assert_eq!(catalog.point(0).unwrap().neighbors, vec![1]);
        // and the wide point accepts the narrow one by its own angle
        assert_eq!(catalog.point(1).unwrap().neighbors, vec![0]);
    }

    #[test]
    fn test_shooting_angle() {
        let mut scene = MemoryScene::new();
        let body = scene.spawn_collider(Vec3::ZERO, Vec3::ONE, SHOOTABLE_LAYER);
        // forward is -Z: the point faces a shooter standing at negative z
        let face = scene.attach_sub_point(
            body,
            Transform::default(),
            TargetSubPoint::default().with_shootable_angle(45.0),
        );
        let catalog = TargetPointCatalog::build(body, &scene).unwrap();
        let point = catalog.point(0).unwrap();

        assert!(point.is_in_shooting_angle(Vec3::new(0.0, 0.0, -10.0), &scene));
        assert!(point.is_in_shooting_angle(Vec3::new(5.0, 0.0, -10.0), &scene));
        assert!(!point.is_in_shooting_angle(Vec3::new(10.0, 0.0, -1.0), &scene));
        assert!(!point.is_in_shooting_angle(Vec3::new(0.0, 0.0, 10.0), &scene));

        scene.despawn(face);
        assert!(!point.is_in_shooting_angle(Vec3::new(0.0, 0.0, -10.0), &scene));
    }

    #[test]
    fn test_registry_remembers_untargetable() {
        let mut scene = MemoryScene::new();
        let empty = scene.spawn_collider(Vec3::ZERO, Vec3::ONE, SHOOTABLE_LAYER);
        let mut registry = CatalogRegistry::default();

        assert!(registry.get_or_build(empty, &scene).is_none());
        assert!(registry.is_untargetable(empty));

        // points added later are not picked up
        scene.attach_sub_point(empty, Transform::default(), TargetSubPoint::default());
        assert!(registry.get_or_build(empty, &scene).is_none());

        registry.forget(empty);
        assert!(registry.is_empty());
        assert!(registry.get_or_build(empty, &scene).is_some());
        assert!(registry.get(empty).is_some());
    }
}
