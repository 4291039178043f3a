//! Targeting facade owned by each weapon.

use bevy::prelude::*;
use rand::Rng;

use crate::catalog::CatalogRegistry;
use crate::discovery::{ConeSnapshot, TargetDiscovery};
use crate::resolver::{self, ResolveError};
use crate::resources::TargetingConfig;
use crate::types::{Pose, ResolvedHit, TargetingParameters, TargetingWorld};

/// Selected target changed between two updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetChange {
    pub previous: Option<Entity>,
    pub current: Option<Entity>,
}

/// Per-weapon targeting controller.
///
/// Call [`update`](Self::update) once per tick with the weapon pose, then
/// [`fire`](Self::fire) for each fire event. Fire always shoots at the target
/// selected by the latest update. Entities the registry has marked
/// untargetable are passed over in favour of the next nearest one.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_hitscan_targeting::backend::memory::MemoryScene;
/// use bevy_hitscan_targeting::components::TargetSubPoint;
/// use bevy_hitscan_targeting::controller::HitScanTargeting;
/// use bevy_hitscan_targeting::catalog::CatalogRegistry;
/// use bevy_hitscan_targeting::resources::{TargetingConfig, SHOOTABLE_LAYER};
/// use bevy_hitscan_targeting::types::{Pose, TargetingParameters};
/// use rand::SeedableRng;
///
/// let mut scene = MemoryScene::new();
/// let enemy = scene.spawn_collider(Vec3::new(0.0, 0.0, -10.0), Vec3::splat(0.5), SHOOTABLE_LAYER);
/// // sub-points face along their forward axis; this one faces the shooter
/// let facing_shooter = Transform::from_xyz(0.0, 0.0, -9.5).looking_to(Vec3::Z, Vec3::Y);
/// scene.attach_sub_point(enemy, facing_shooter, TargetSubPoint::default());
///
/// let mut targeting = HitScanTargeting::new(TargetingConfig::default());
/// let mut registry = CatalogRegistry::default();
/// let pose = Pose::new(Vec3::ZERO, Vec3::NEG_Z);
/// let change = targeting.update(pose, &registry, &scene).unwrap();
/// assert_eq!(change.current, Some(enemy));
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let hits = targeting.fire(pose, &TargetingParameters::new(3), &mut registry, &scene, &mut rng);
/// assert_eq!(hits.len(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct HitScanTargeting {
    discovery: TargetDiscovery,
    selected: Option<Entity>,
}

impl HitScanTargeting {
    /// Creates a controller with no target selected.
    pub fn new(config: TargetingConfig) -> Self {
        Self {
            discovery: TargetDiscovery::new(config),
            selected: None,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &TargetingConfig {
        self.discovery.config()
    }

    /// Refreshes the visible set and selects the nearest targetable entity.
    ///
    /// Returns a change only when the selected target differs from the one
    /// selected by the previous update, including changes to or from none.
    pub fn update(
        &mut self,
        pose: Pose,
        registry: &CatalogRegistry,
        world: &(impl TargetingWorld + ?Sized),
    ) -> Option<TargetChange> {
        let current = self
            .discovery
            .refresh(pose, world)
            .iter()
            .copied()
            .find(|&entity| !registry.is_untargetable(entity));
        if current == self.selected {
            return None;
        }
        let previous = std::mem::replace(&mut self.selected, current);
        Some(TargetChange { previous, current })
    }

    /// Target selected by the latest update.
    pub fn current_target(&self) -> Option<Entity> {
        self.selected
    }

    /// Visible entity at rank `index` (0 = nearest), targetable or not.
    pub fn target_at(&self, index: usize) -> Option<Entity> {
        self.discovery.target_at(index)
    }

    /// Visible entities of the latest update, nearest first.
    pub fn visible(&self) -> &[Entity] {
        self.discovery.visible()
    }

    pub fn snapshot(&self) -> ConeSnapshot {
        self.discovery.snapshot()
    }

    /// Changes the range used from the next update on.
    pub fn set_max_distance(&mut self, max_distance: f32) {
        self.discovery.set_max_distance(max_distance);
    }

    /// Resolves a salvo on the current target.
    ///
    /// Having no target is not an error and yields an empty salvo. An empty
    /// salvo count is rejected whether or not a target is selected.
    pub fn try_fire<R: Rng + ?Sized>(
        &self,
        pose: Pose,
        params: &TargetingParameters,
        registry: &mut CatalogRegistry,
        world: &(impl TargetingWorld + ?Sized),
        rng: &mut R,
    ) -> Result<Vec<ResolvedHit>, ResolveError> {
        if params.salvo_count == 0 {
            return Err(ResolveError::InvalidSalvoCount);
        }
        match self.current_target() {
            Some(target) => {
                resolver::try_resolve(target, pose.position, params, registry, world, rng)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Like [`try_fire`](Self::try_fire), logging failures.
    pub fn fire<R: Rng + ?Sized>(
        &self,
        pose: Pose,
        params: &TargetingParameters,
        registry: &mut CatalogRegistry,
        world: &(impl TargetingWorld + ?Sized),
        rng: &mut R,
    ) -> Vec<ResolvedHit> {
        if params.salvo_count == 0 {
            warn!("{}", ResolveError::InvalidSalvoCount);
            return Vec::new();
        }
        match self.current_target() {
            Some(target) => resolver::resolve(target, pose.position, params, registry, world, rng),
            None => Vec::new(),
        }
    }
}
