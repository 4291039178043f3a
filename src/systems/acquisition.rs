//! Per-tick target acquisition.

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;

use crate::backend::avian::TargetingScene;
use crate::catalog::CatalogRegistry;
use crate::components::HitScanWeapon;
use crate::events::TargetChanged;
use crate::types::Pose;

/// Refreshes every weapon's visible set from its current pose.
///
/// Writes a [`TargetChanged`] for each weapon whose selected target differs
/// from the previous tick. A weapon never targets its own collider, nor an
/// entity whose catalog failed to build.
pub fn update_target_acquisition(
    scene: TargetingScene,
    registry: Res<CatalogRegistry>,
    mut weapons: Query<(Entity, &GlobalTransform, &mut HitScanWeapon)>,
    mut changes: MessageWriter<TargetChanged>,
) {
    for (shooter, transform, mut weapon) in weapons.iter_mut() {
        let pose = Pose::from_global_transform(transform);
        let view = scene.excluding(shooter);
        if let Some(change) = weapon.targeting_mut().update(pose, &registry, &view) {
            debug!(
                "Weapon {shooter} target changed: {:?} -> {:?}",
                change.previous, change.current
            );
            changes.write(TargetChanged {
                shooter,
                previous: change.previous,
                current: change.current,
            });
        }
    }
}
