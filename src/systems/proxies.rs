//! Scene bookkeeping for sub-points and targets.

use bevy::prelude::*;

use crate::catalog::CatalogRegistry;
use crate::components::{Targetable, TargetSubPoint};

/// Sub-points are geometric markers only: hide their meshes and, with
/// physics enabled, disable their colliders so they never block rays.
pub fn hide_sub_point_proxies(mut commands: Commands, added: Query<Entity, Added<TargetSubPoint>>) {
    for entity in added.iter() {
        commands.entity(entity).insert(Visibility::Hidden);
        #[cfg(feature = "dim3")]
        commands.entity(entity).insert(avian3d::prelude::ColliderDisabled);
    }
}

/// Drops catalogs of targets that were despawned or lost [`Targetable`].
pub fn forget_despawned_targets(
    mut removed: RemovedComponents<Targetable>,
    mut registry: ResMut<CatalogRegistry>,
) {
    for entity in removed.read() {
        registry.forget(entity);
    }
}
