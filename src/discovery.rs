//! Target discovery - sphere query, visibility filtering and distance ranking.

use bevy::prelude::*;

use crate::geometry::horizontal_forward;
use crate::resources::TargetingConfig;
use crate::types::{Pose, TargetingWorld};
use crate::visibility::{FarBoundaries, ViewCone};

/// Candidate query volume.
///
/// For narrow cones (either view angle below 90°) the sphere sits
/// `max_distance / 2` ahead of the shooter with radius `max_distance / 2`, so
/// it just reaches `max_distance`. Otherwise it is centered on the shooter
/// with radius `max_distance`.
///
/// # Example
/// ```
/// use bevy_hitscan_targeting::discovery::QuerySphere;
///
/// let narrow = QuerySphere::for_cone(40.0, 4.0, 0.0);
/// assert_eq!((narrow.offset, narrow.radius), (20.0, 20.0));
///
/// let wide = QuerySphere::for_cone(40.0, 180.0, 120.0);
/// assert_eq!((wide.offset, wide.radius), (0.0, 40.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct QuerySphere {
    /// Distance of the center ahead of the shooter
    pub offset: f32,
    /// Sphere radius
    pub radius: f32,
}

impl QuerySphere {
    /// Sphere covering a cone of the given range and view angles (degrees).
    pub fn for_cone(max_distance: f32, far_view_angle: f32, near_view_angle: f32) -> Self {
        if near_view_angle < 90.0 || far_view_angle < 90.0 {
            Self {
                offset: max_distance / 2.0,
                radius: max_distance / 2.0,
            }
        } else {
            Self {
                offset: 0.0,
                radius: max_distance,
            }
        }
    }

    /// World-space center for the given pose.
    pub fn center(&self, pose: &Pose) -> Vec3 {
        pose.position + horizontal_forward(pose.forward) * self.offset
    }
}

/// Discovery state; there are no intermediate states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DiscoveryState {
    /// Never refreshed
    #[default]
    Idle,
    /// Holds the result of the latest refresh
    Refreshed,
}

/// Read-only snapshot of the latest refresh, for debug rendering.
#[derive(Clone, Debug, Default)]
pub struct ConeSnapshot {
    pub pose: Pose,
    pub sphere_center: Vec3,
    pub sphere_radius: f32,
    pub max_distance: f32,
    pub far_view_angle: f32,
    pub near_view_angle: f32,
    pub immediate_proximity: f32,
    /// Visible entities, nearest first
    pub visible: Vec<Entity>,
}

/// Finds visible targets and ranks them by distance.
///
/// The visible set is recomputed from scratch on every refresh and replaced
/// in one step.
#[derive(Clone, Debug)]
pub struct TargetDiscovery {
    config: TargetingConfig,
    cone: ViewCone,
    sphere: QuerySphere,
    pose: Pose,
    visible: Vec<Entity>,
    state: DiscoveryState,
}

impl TargetDiscovery {
    /// Creates an idle discovery with an empty visible set.
    ///
    /// The near cone range is fixed here from the config's immediate proximity.
    pub fn new(config: TargetingConfig) -> Self {
        let cone = ViewCone::from_config(&config);
        let sphere = QuerySphere::for_cone(
            config.max_distance,
            config.far_view_angle,
            config.near_view_angle,
        );
        Self {
            config,
            cone,
            sphere,
            pose: Pose::default(),
            visible: Vec::new(),
            state: DiscoveryState::Idle,
        }
    }

    /// Current configuration, including range changes.
    pub fn config(&self) -> &TargetingConfig {
        &self.config
    }

    /// Candidate volume used by the next refresh.
    pub fn query_sphere(&self) -> QuerySphere {
        self.sphere
    }

    /// Whether a refresh has run yet.
    pub fn state(&self) -> DiscoveryState {
        self.state
    }

    /// Changes the range and recomputes the query sphere.
    ///
    /// The near cone range stays at the value fixed at construction.
    pub fn set_max_distance(&mut self, max_distance: f32) {
        self.config.max_distance = max_distance;
        self.cone.max_distance = max_distance;
        self.sphere = QuerySphere::for_cone(
            max_distance,
            self.config.far_view_angle,
            self.config.near_view_angle,
        );
    }

    /// Re-evaluates the visible set against the current pose.
    ///
    /// An empty result is a normal "no target" outcome.
    pub fn refresh(&mut self, pose: Pose, world: &(impl TargetingWorld + ?Sized)) -> &[Entity] {
        let candidates = world.overlap_sphere(
            self.sphere.center(&pose),
            self.sphere.radius,
            self.config.targetable_mask,
        );
        let boundaries =
            FarBoundaries::compute(&pose, self.cone.max_distance, self.cone.far_view_angle);

        let mut ranked: Vec<(Entity, f32)> = candidates
            .into_iter()
            .filter(|&entity| self.cone.is_visible(entity, &pose, &boundaries, world))
            .filter_map(|entity| {
                world
                    .position_of(entity)
                    .map(|p| (entity, p.distance_squared(pose.position)))
            })
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        self.pose = pose;
        self.visible = ranked.into_iter().map(|(entity, _)| entity).collect();
        self.state = DiscoveryState::Refreshed;
        &self.visible
    }

    /// Nearest visible entity of the latest refresh.
    pub fn current_target(&self) -> Option<Entity> {
        self.visible.first().copied()
    }

    /// Visible entity at rank `index` (0 = nearest).
    pub fn target_at(&self, index: usize) -> Option<Entity> {
        self.visible.get(index).copied()
    }

    /// Visible entities, nearest first.
    pub fn visible(&self) -> &[Entity] {
        &self.visible
    }

    /// Cone geometry and visible set of the latest refresh.
    pub fn snapshot(&self) -> ConeSnapshot {
        ConeSnapshot {
            pose: self.pose,
            sphere_center: self.sphere.center(&self.pose),
            sphere_radius: self.sphere.radius,
            max_distance: self.cone.max_distance,
            far_view_angle: self.cone.far_view_angle,
            near_view_angle: self.cone.near_view_angle,
            immediate_proximity: self.cone.immediate_proximity,
            visible: self.visible.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryScene;
    use crate::resources::{OBSTACLE_LAYER, SHOOTABLE_LAYER};
    use crate::types::SceneView;

    fn enemy(scene: &mut MemoryScene, x: f32, z: f32) -> Entity {
        scene.spawn_collider(Vec3::new(x, 0.0, z), Vec3::splat(0.5), SHOOTABLE_LAYER)
    }

    #[test]
    fn test_query_sphere_narrow_and_wide() {
        for (far, near) in [(4.0, 0.0), (120.0, 10.0), (10.0, 170.0), (89.9, 180.0)] {
            let s = QuerySphere::for_cone(30.0, far, near);
            assert_eq!(s.radius, 15.0);
            assert_eq!(s.offset, 15.0);
        }
        for (far, near) in [(90.0, 90.0), (180.0, 120.0)] {
            let s = QuerySphere::for_cone(30.0, far, near);
            assert_eq!(s.radius, 30.0);
            assert_eq!(s.offset, 0.0);
        }
    }

    #[test]
    fn test_sphere_center_ignores_pitch() {
        let s = QuerySphere::for_cone(20.0, 4.0, 0.0);
        let pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, -1.0, -1.0));
        let center = s.center(&pose);
        assert!((center - Vec3::new(1.0, 2.0, -7.0)).length() < 1e-5);
    }

    #[test]
    fn test_refresh_sorts_by_distance() {
        let mut scene = MemoryScene::new();
        let far = enemy(&mut scene, 0.0, -25.0);
        let near = enemy(&mut scene, 0.6, -10.0);
        let mid = enemy(&mut scene, -0.9, -16.0);
        // behind the shooter
        enemy(&mut scene, 0.0, 8.0);

        let config = TargetingConfig::default()
            .with_max_distance(30.0)
            .with_view_angles(4.0, 0.0);
        let mut discovery = TargetDiscovery::new(config);
        assert_eq!(discovery.state(), DiscoveryState::Idle);

        let pose = Pose::new(Vec3::ZERO, Vec3::NEG_Z);
        // each line of sight passes beside the other bodies
        let visible = discovery.refresh(pose, &scene).to_vec();

        assert_eq!(visible, vec![near, mid, far]);
        assert_eq!(discovery.current_target(), Some(near));
        assert_eq!(discovery.target_at(2), Some(far));
        assert_eq!(discovery.target_at(3), None);
        assert_eq!(discovery.state(), DiscoveryState::Refreshed);

        let dists: Vec<f32> = visible
            .iter()
            .map(|e| scene.position_of(*e).unwrap().length_squared())
            .collect();
        assert!(dists.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_refresh_replaces_previous_result() {
        let mut scene = MemoryScene::new();
        let target = enemy(&mut scene, 0.0, -10.0);
        let mut discovery = TargetDiscovery::new(TargetingConfig::default());
        let pose = Pose::new(Vec3::ZERO, Vec3::NEG_Z);

        discovery.refresh(pose, &scene);
        assert_eq!(discovery.current_target(), Some(target));

        scene.spawn_collider(Vec3::new(0.0, 0.0, -5.0), Vec3::new(2.0, 2.0, 0.1), OBSTACLE_LAYER);
        discovery.refresh(pose, &scene);
        assert!(discovery.visible().is_empty());
        assert_eq!(discovery.current_target(), None);

        // turn around: nothing there either
        discovery.refresh(Pose::new(Vec3::ZERO, Vec3::Z), &scene);
        assert!(discovery.visible().is_empty());
    }

    #[test]
    fn test_despawned_candidate_is_dropped() {
        let mut scene = MemoryScene::new();
        let target = enemy(&mut scene, 0.0, -10.0);
        let mut discovery = TargetDiscovery::new(TargetingConfig::default());
        let pose = Pose::new(Vec3::ZERO, Vec3::NEG_Z);

        discovery.refresh(pose, &scene);
        scene.despawn(target);
        discovery.refresh(pose, &scene);
        assert_eq!(discovery.current_target(), None);
    }

    #[test]
    fn test_set_max_distance_updates_sphere() {
        let mut discovery =
            TargetDiscovery::new(TargetingConfig::default().with_max_distance(10.0));
        assert_eq!(discovery.query_sphere().radius, 5.0);
        discovery.set_max_distance(40.0);
        assert_eq!(discovery.query_sphere().radius, 20.0);
        assert_eq!(discovery.snapshot().immediate_proximity, 10.0 / 3.0);
    }
}
