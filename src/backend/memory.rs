//! In-memory scene for headless simulation, tooling and tests.
//!
//! Colliders are world-space AABBs; the ray cast is a slab test returning the
//! nearest box on the requested layers.

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use crate::components::TargetSubPoint;
use crate::types::{CollisionMask, EntityBounds, RayHit, SceneView, SpatialQueryService};

struct SceneEntry {
    transform: Transform,
    collider: Option<(EntityBounds, CollisionMask)>,
    sub_point: Option<TargetSubPoint>,
    children: Vec<Entity>,
}

/// Scene snapshot implementing both collaborator contracts without a physics engine.
///
/// Entity handles are allocated from an internal `World` so they are real
/// Bevy entities that can be despawned to simulate stale references.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_hitscan_targeting::backend::memory::MemoryScene;
/// use bevy_hitscan_targeting::types::{CollisionMask, SceneView};
///
/// let mut scene = MemoryScene::new();
/// let walls = CollisionMask::layer(2);
/// let crate_box = scene.spawn_collider(Vec3::new(0.0, 0.5, -5.0), Vec3::splat(0.5), walls);
/// assert!(scene.is_alive(crate_box));
/// scene.despawn(crate_box);
/// assert!(!scene.is_alive(crate_box));
/// ```
pub struct MemoryScene {
    world: World,
    entries: HashMap<Entity, SceneEntry>,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            entries: HashMap::default(),
        }
    }

    fn allocate(&mut self, entry: SceneEntry) -> Entity {
        let entity = self.world.spawn_empty().id();
        self.entries.insert(entity, entry);
        entity
    }

    /// Spawns an entity with a box collider of half-size `extents` centered on `position`.
    pub fn spawn_collider(
        &mut self,
        position: Vec3,
        extents: Vec3,
        layers: CollisionMask,
    ) -> Entity {
        self.allocate(SceneEntry {
            transform: Transform::from_translation(position),
            collider: Some((EntityBounds::new(position, extents), layers)),
            sub_point: None,
            children: Vec::new(),
        })
    }

    /// Attaches a sub-point with the given world transform to `parent`.
    ///
    /// Sub-points carry no collider; they are geometric markers only.
    pub fn attach_sub_point(
        &mut self,
        parent: Entity,
        transform: Transform,
        sub_point: TargetSubPoint,
    ) -> Entity {
        let child = self.allocate(SceneEntry {
            transform,
            collider: None,
            sub_point: Some(sub_point),
            children: Vec::new(),
        });
        if let Some(entry) = self.entries.get_mut(&parent) {
            entry.children.push(child);
        }
        child
    }

    /// Moves an entity (and its collider) to a new world transform.
    ///
    /// Children are not moved; sub-points are placed explicitly.
    pub fn set_transform(&mut self, entity: Entity, transform: Transform) {
        if let Some(entry) = self.entries.get_mut(&entity) {
            entry.transform = transform;
            if let Some((bounds, _)) = entry.collider.as_mut() {
                bounds.center = transform.translation;
            }
        }
    }

    /// Removes an entity and its descendants.
    pub fn despawn(&mut self, entity: Entity) {
        if let Some(entry) = self.entries.remove(&entity) {
            for child in entry.children {
                self.despawn(child);
            }
            self.world.despawn(entity);
        }
    }

    fn colliders(&self, mask: CollisionMask) -> impl Iterator<Item = (Entity, &EntityBounds)> {
        self.entries.iter().filter_map(move |(entity, entry)| match &entry.collider {
            Some((bounds, layers)) if layers.intersects(mask) => Some((*entity, bounds)),
            _ => None,
        })
    }
}

/// Distance along a normalized ray to an AABB, if the ray enters it within `max_distance`.
fn ray_box_distance(
    origin: Vec3,
    dir: Vec3,
    bounds: &EntityBounds,
    max_distance: f32,
) -> Option<f32> {
    let min = bounds.center - bounds.extents;
    let max = bounds.center + bounds.extents;
    let mut t_min = 0.0_f32;
    let mut t_max = max_distance;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < f32::EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }
    Some(t_min)
}

impl SpatialQueryService for MemoryScene {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CollisionMask) -> Vec<Entity> {
        let mut hits: Vec<Entity> = self
            .colliders(mask)
            .filter(|(_, bounds)| {
                let min = bounds.center - bounds.extents;
                let max = bounds.center + bounds.extents;
                let closest = center.clamp(min, max);
                closest.distance_squared(center) <= radius * radius
            })
            .map(|(entity, _)| entity)
            .collect();
        // hash order is not stable across runs
        hits.sort();
        hits
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: CollisionMask,
    ) -> Option<RayHit> {
        let dir = direction.try_normalize()?;
        self.colliders(mask)
            .filter_map(|(entity, bounds)| {
                ray_box_distance(origin, dir, bounds, max_distance)
                    .map(|distance| RayHit { entity, distance })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance).then(a.entity.cmp(&b.entity)))
    }
}

impl SceneView for MemoryScene {
    fn world_transform(&self, entity: Entity) -> Option<Transform> {
        self.entries.get(&entity).map(|entry| entry.transform)
    }

    fn bounds_of(&self, entity: Entity) -> Option<EntityBounds> {
        self.entries
            .get(&entity)
            .and_then(|entry| entry.collider.map(|(bounds, _)| bounds))
    }

    fn sub_points_of(&self, entity: Entity) -> Vec<(Entity, TargetSubPoint)> {
        let mut found = Vec::new();
        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            let Some(entry) = self.entries.get(&current) else {
                continue;
            };
            if let Some(sub_point) = entry.sub_point {
                found.push((current, sub_point));
            }
            // depth-first, preserving child order
            stack.extend(entry.children.iter().rev().copied());
        }
        found
    }
}
