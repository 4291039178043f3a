//! Fire command processing.

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::backend::avian::TargetingScene;
use crate::catalog::CatalogRegistry;
use crate::components::HitScanWeapon;
use crate::events::{FireCommand, HitsResolved};
use crate::types::Pose;

/// Resolves each [`FireCommand`] against the shooter's current target.
///
/// Runs after acquisition so a command always uses this tick's selection.
/// Each command gets its own `StdRng` seeded from the command.
pub fn process_fire_commands(
    scene: TargetingScene,
    mut fire_commands: MessageReader<FireCommand>,
    weapons: Query<(&GlobalTransform, &HitScanWeapon)>,
    mut registry: ResMut<CatalogRegistry>,
    mut resolved: MessageWriter<HitsResolved>,
) {
    for command in fire_commands.read() {
        let Ok((transform, weapon)) = weapons.get(command.shooter) else {
            warn!("Fire command for {} which has no HitScanWeapon", command.shooter);
            continue;
        };
        let pose = Pose::from_global_transform(transform);
        let mut rng = StdRng::seed_from_u64(command.seed);
        let hits = weapon.targeting().fire(
            pose,
            &command.parameters,
            &mut registry,
            &scene.excluding(command.shooter),
            &mut rng,
        );

        if let Some(target) = hits.first().map(|hit| hit.target) {
            resolved.write(HitsResolved {
                shooter: command.shooter,
                target,
                hits,
            });
        }
    }
}
