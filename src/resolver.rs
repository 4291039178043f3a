//! Hit-point resolution for one fire event.
//!
//! The first shot picks a reachable sub-point (rolled category first, the
//! other category once as fallback) and samples it with `accuracy`. Follow-up
//! shots cluster around the first impact, or drift to the nearest neighbour
//! with probability `1 - precision`.

use bevy::prelude::*;
use rand::Rng;
use thiserror::Error;

use crate::catalog::{CatalogPoint, CatalogRegistry, TargetPointCatalog};
use crate::sampling::sample_surface_point;
use crate::types::{ResolvedHit, SceneView, TargetingParameters, TargetingWorld};

/// Reasons a salvo resolves to no hits.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// `salvo_count` was zero
    #[error("salvo count must be at least 1")]
    InvalidSalvoCount,
    /// The target was despawned
    #[error("target {0} no longer exists")]
    StaleTarget(Entity),
    /// The target's catalog could not be built
    #[error("target {0} is untargetable")]
    Untargetable(Entity),
    /// Every sub-point of both categories faces away from the shooter
    #[error("no reachable sub-point on target {0}")]
    NoReachableSubPoint(Entity),
}

/// One pick during first-shot selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionAttempt {
    /// Catalog index of the picked point
    pub index: usize,
    /// Category of the pool the pick came from
    pub critical: bool,
    /// Whether the point was within its shooting angle
    pub accepted: bool,
}

/// Trace of first-shot selection, in pick order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FirstShotSelection {
    /// Category chosen by the critical roll
    pub rolled_critical: bool,
    pub attempts: Vec<SelectionAttempt>,
    /// Catalog index of the accepted point
    pub accepted: Option<usize>,
}

impl FirstShotSelection {
    /// True if the other category's pool was tried.
    pub fn switched_category(&self) -> bool {
        self.attempts.iter().any(|a| a.critical != self.rolled_critical)
    }
}

/// Picks the sub-point for the first shot.
///
/// Picks are uniform and without replacement. When the rolled category has
/// no point within its shooting angle the other category is tried once.
pub fn select_first_point<R: Rng + ?Sized>(
    catalog: &TargetPointCatalog,
    shooter: Vec3,
    critical_chance: f32,
    scene: &(impl SceneView + ?Sized),
    rng: &mut R,
) -> FirstShotSelection {
    let roll: f32 = rng.random();
    let rolled_critical = roll <= critical_chance;
    let mut selection = FirstShotSelection {
        rolled_critical,
        ..Default::default()
    };

    for critical in [rolled_critical, !rolled_critical] {
        let mut pool: Vec<usize> = catalog.category_indices(critical).collect();
        while !pool.is_empty() {
            let index = pool.remove(rng.random_range(0..pool.len()));
            let accepted = catalog
                .point(index)
                .is_some_and(|point| point.is_in_shooting_angle(shooter, scene));
            selection.attempts.push(SelectionAttempt {
                index,
                critical,
                accepted,
            });
            if accepted {
                selection.accepted = Some(index);
                return selection;
            }
        }
    }
    selection
}

fn hit_on(
    target: Entity,
    point: &CatalogPoint,
    transform: &Transform,
    position: Vec3,
) -> ResolvedHit {
    ResolvedHit {
        target,
        sub_point: point.entity,
        critical: point.sub_point.critical,
        offset: position - transform.translation,
        position,
    }
}

/// Resolves `params.salvo_count` impacts on `target`, in salvo order.
///
/// Sub-point transforms are read at call time, so moving targets get
/// correctly placed impacts.
pub fn try_resolve<R: Rng + ?Sized>(
    target: Entity,
    shooter: Vec3,
    params: &TargetingParameters,
    registry: &mut CatalogRegistry,
    world: &(impl TargetingWorld + ?Sized),
    rng: &mut R,
) -> Result<Vec<ResolvedHit>, ResolveError> {
    if params.salvo_count == 0 {
        return Err(ResolveError::InvalidSalvoCount);
    }
    if !world.is_alive(target) {
        return Err(ResolveError::StaleTarget(target));
    }
    let catalog = registry
        .get_or_build(target, world)
        .ok_or(ResolveError::Untargetable(target))?;

    let selection = select_first_point(catalog, shooter, params.critical_chance, world, rng);
    let first_index = selection
        .accepted
        .ok_or(ResolveError::NoReachableSubPoint(target))?;
    let first = catalog
        .point(first_index)
        .ok_or(ResolveError::NoReachableSubPoint(target))?;
    let first_transform = world
        .world_transform(first.entity)
        .ok_or(ResolveError::StaleTarget(target))?;

    let first_offset = sample_surface_point(first.sub_point.shape, params.accuracy, rng);
    let first_position = first_transform.transform_point(first_offset);

    let mut hits = Vec::with_capacity(params.salvo_count as usize);
    hits.push(hit_on(target, first, &first_transform, first_position));

    let drift_chance = 1.0 - params.precision;
    for _ in 1..params.salvo_count {
        let drift_roll: f32 = rng.random();
        let neighbor = catalog.nearest_neighbor(first_index).and_then(|(_, neighbor)| {
            world
                .world_transform(neighbor.entity)
                .map(|transform| (neighbor, transform))
        });

        match neighbor {
            Some((neighbor, transform)) if drift_roll < drift_chance => {
                let local = sample_surface_point(neighbor.sub_point.shape, params.precision, rng);
                hits.push(hit_on(target, neighbor, &transform, transform.transform_point(local)));
            }
            _ => {
                let local = sample_surface_point(first.sub_point.shape, params.precision, rng);
                // anchored to the first impact, not to the sub-point
                let shift = first_transform.transform_point(local) - first_transform.translation;
                hits.push(hit_on(target, first, &first_transform, first_position + shift));
            }
        }
    }

    Ok(hits)
}

/// Like [`try_resolve`], but logs failures and returns an empty salvo.
pub fn resolve<R: Rng + ?Sized>(
    target: Entity,
    shooter: Vec3,
    params: &TargetingParameters,
    registry: &mut CatalogRegistry,
    world: &(impl TargetingWorld + ?Sized),
    rng: &mut R,
) -> Vec<ResolvedHit> {
    match try_resolve(target, shooter, params, registry, world, rng) {
        Ok(hits) => hits,
        // already reported when the catalog failed to build
        Err(ResolveError::Untargetable(_)) => Vec::new(),
        Err(err @ ResolveError::StaleTarget(_)) => {
            debug!("{err}");
            Vec::new()
        }
        Err(err) => {
            warn!("{err}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryScene;
    use crate::components::{SubPointShape, TargetSubPoint};
    use crate::resources::SHOOTABLE_LAYER;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SHOOTER: Vec3 = Vec3::new(0.0, 0.0, -10.0);

    /// Transform at `position` facing the shooter (forward is -Z).
    fn toward_shooter(position: Vec3) -> Transform {
        Transform::from_translation(position)
    }

    /// Transform at `position` facing away from the shooter.
    fn away_from_shooter(position: Vec3) -> Transform {
        Transform::from_translation(position)
            .with_rotation(Quat::from_rotation_y(std::f32::consts::PI))
    }

    fn dummy(scene: &mut MemoryScene) -> Entity {
        scene.spawn_collider(Vec3::ZERO, Vec3::new(0.5, 1.0, 0.5), SHOOTABLE_LAYER)
    }

    #[test]
    fn test_non_critical_only_target() {
        let mut scene = MemoryScene::new();
        let body = dummy(&mut scene);
        let chest =
            scene.attach_sub_point(body, toward_shooter(Vec3::ZERO), TargetSubPoint::default());
        let mut registry = CatalogRegistry::default();
        let single = TargetingParameters::new(1);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let hits =
                try_resolve(body, SHOOTER, &single, &mut registry, &scene, &mut rng).unwrap();
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].sub_point, chest);
            assert!(!hits[0].critical);
            assert_eq!(hits[0].target, body);
        }
    }

    #[test]
    fn test_pinpoint_salvo_coincides() {
        let mut scene = MemoryScene::new();
        let body = dummy(&mut scene);
        let center = Vec3::new(0.0, 0.4, -0.5);
        let chest = scene.attach_sub_point(body, toward_shooter(center), TargetSubPoint::default());
        // a neighbour exists but precision 1 never drifts
        scene.attach_sub_point(
            body,
            toward_shooter(Vec3::new(0.0, 0.9, -0.5)),
            TargetSubPoint::new(SubPointShape::Circle),
        );
        let mut registry = CatalogRegistry::default();
        let mut rng = StdRng::seed_from_u64(3);

        let params = TargetingParameters::new(3);
        let hits = try_resolve(body, SHOOTER, &params, &mut registry, &scene, &mut rng).unwrap();

        assert_eq!(hits.len(), 3);
        let first = hits[0];
        for hit in &hits {
            assert_eq!(hit.position, first.position);
            assert_eq!(hit.offset, Vec3::ZERO);
        }
        // first shot sits on whichever point was picked
        assert!(first.position == center || first.sub_point != chest);
    }

    #[test]
    fn test_critical_fallback_after_two_failures() {
        let mut scene = MemoryScene::new();
        let body = dummy(&mut scene);
        let narrow = TargetSubPoint::default().with_shootable_angle(45.0);
        for y in [0.8, 0.6] {
            let transform = away_from_shooter(Vec3::new(0.0, y, 0.0));
            scene.attach_sub_point(body, transform, narrow.critical());
        }
        for y in [0.0, -0.3, -0.6] {
            scene.attach_sub_point(body, toward_shooter(Vec3::new(0.0, y, -0.5)), narrow);
        }
        let mut registry = CatalogRegistry::default();
        let catalog = registry.get_or_build(body, &scene).unwrap().clone();

        let mut rng = StdRng::seed_from_u64(42);
        let selection = select_first_point(&catalog, SHOOTER, 1.0, &scene, &mut rng);

        assert!(selection.rolled_critical);
        assert_eq!(selection.attempts.len(), 3);
        assert!(selection.attempts[..2].iter().all(|a| a.critical && !a.accepted));
        assert_ne!(selection.attempts[0].index, selection.attempts[1].index);
        assert!(!selection.attempts[2].critical && selection.attempts[2].accepted);
        assert!(selection.switched_category());
        assert_eq!(selection.accepted, Some(selection.attempts[2].index));

        let hits = try_resolve(
            body,
            SHOOTER,
            &TargetingParameters::new(2).with_critical_chance(1.0),
            &mut registry,
            &scene,
            &mut rng,
        )
        .unwrap();
        assert!(hits.iter().all(|h| !h.critical));
    }

    #[test]
    fn test_no_reachable_point() {
        let mut scene = MemoryScene::new();
        let body = dummy(&mut scene);
        let narrow = TargetSubPoint::default().with_shootable_angle(45.0);
        scene.attach_sub_point(body, away_from_shooter(Vec3::Y), narrow.critical());
        scene.attach_sub_point(body, away_from_shooter(Vec3::ZERO), narrow);
        let mut registry = CatalogRegistry::default();
        let mut rng = StdRng::seed_from_u64(1);

        let catalog = registry.get_or_build(body, &scene).unwrap().clone();
        let selection = select_first_point(&catalog, SHOOTER, 0.5, &scene, &mut rng);
        assert_eq!(selection.attempts.len(), 2);
        assert_eq!(selection.accepted, None);

        let single = TargetingParameters::new(1);
        let result = try_resolve(body, SHOOTER, &single, &mut registry, &scene, &mut rng);
        assert_eq!(result, Err(ResolveError::NoReachableSubPoint(body)));
        assert!(resolve(body, SHOOTER, &single, &mut registry, &scene, &mut rng).is_empty());
    }

    #[test]
    fn test_invalid_salvo_and_stale_target() {
        let mut scene = MemoryScene::new();
        let body = dummy(&mut scene);
        scene.attach_sub_point(body, toward_shooter(Vec3::ZERO), TargetSubPoint::default());
        let mut registry = CatalogRegistry::default();
        let mut rng = StdRng::seed_from_u64(5);

        let zero = TargetingParameters::new(0);
        assert_eq!(
            try_resolve(body, SHOOTER, &zero, &mut registry, &scene, &mut rng),
            Err(ResolveError::InvalidSalvoCount)
        );
        let single = TargetingParameters::new(1);

        scene.despawn(body);
        assert_eq!(
            try_resolve(body, SHOOTER, &single, &mut registry, &scene, &mut rng),
            Err(ResolveError::StaleTarget(body))
        );
    }

    #[test]
    fn test_untargetable_entity() {
        let mut scene = MemoryScene::new();
        let body = dummy(&mut scene);
        let mut registry = CatalogRegistry::default();
        let mut rng = StdRng::seed_from_u64(5);

        let params = TargetingParameters::new(1);
        assert_eq!(
            try_resolve(body, SHOOTER, &params, &mut registry, &scene, &mut rng),
            Err(ResolveError::Untargetable(body))
        );
        assert!(registry.is_untargetable(body));
    }

    #[test]
    fn test_follow_ups_drift_to_neighbor() {
        let mut scene = MemoryScene::new();
        let body = dummy(&mut scene);
        let chest =
            scene.attach_sub_point(body, toward_shooter(Vec3::ZERO), TargetSubPoint::default());
        let belly = scene.attach_sub_point(
            body,
            toward_shooter(Vec3::new(0.0, -0.4, 0.0)),
            TargetSubPoint::default(),
        );
        let mut registry = CatalogRegistry::default();
        let mut rng = StdRng::seed_from_u64(11);

        // precision 0: every follow-up drifts
        let params = TargetingParameters::new(6).with_precision(0.0);
        let hits = try_resolve(body, SHOOTER, &params, &mut registry, &scene, &mut rng).unwrap();

        let first = hits[0].sub_point;
        let other = if first == chest { belly } else { chest };
        assert_eq!(hits.len(), 6);
        assert!(hits[1..].iter().all(|h| h.sub_point == other));
    }

    #[test]
    fn test_follow_ups_cluster_around_first_impact() {
        let mut scene = MemoryScene::new();
        let body = dummy(&mut scene);
        scene.attach_sub_point(body, toward_shooter(Vec3::ZERO), TargetSubPoint::default());
        let mut registry = CatalogRegistry::default();
        let mut rng = StdRng::seed_from_u64(23);

        let params = TargetingParameters::new(10).with_accuracy(0.0).with_precision(0.8);
        let hits = try_resolve(body, SHOOTER, &params, &mut registry, &scene, &mut rng).unwrap();

        let anchor = hits[0].position;
        for hit in &hits[1..] {
            let d = hit.position - anchor;
            // precision 0.8 scatters at most 0.1 along each axis
            assert!(d.x.abs() <= 0.1 + 1e-5 && d.y.abs() <= 0.1 + 1e-5);
            assert!(d.z.abs() < 1e-5);
        }
    }
}
