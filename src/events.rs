//! Messages for the targeting system.
//!
//! Note: In Bevy 0.18, buffered events use the `Message` trait instead of `Event`.

use bevy::ecs::message::Message;
use bevy::prelude::*;

use crate::types::{ResolvedHit, TargetingParameters};

/// Request to fire a weapon at its current target.
///
/// The seed drives every random decision of the resolve, so the same command
/// against the same scene always yields the same hits.
///
/// # Fields
/// * `shooter` - Entity carrying the `HitScanWeapon`
/// * `parameters` - Salvo size, critical chance, accuracy and precision
/// * `seed` - Random seed for deterministic resolution (replays, networking)
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_hitscan_targeting::events::FireCommand;
/// use bevy_hitscan_targeting::resources::presets;
///
/// let fire = FireCommand::new(Entity::PLACEHOLDER, presets::rifle()).with_seed(1234);
/// assert_eq!(fire.parameters.salvo_count, 3);
/// ```
#[derive(Message, Clone, Debug)]
pub struct FireCommand {
    /// Weapon entity
    pub shooter: Entity,
    /// Per-shot parameters
    pub parameters: TargetingParameters,
    /// Random seed
    pub seed: u64,
}

impl FireCommand {
    /// Creates a command with seed 0.
    pub fn new(shooter: Entity, parameters: TargetingParameters) -> Self {
        Self {
            shooter,
            parameters,
            seed: 0,
        }
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Sent when a weapon's selected target changes, including to or from none.
///
/// Sent at most once per weapon per tick, and never when the selection is
/// unchanged. Crosshair and highlight effects listen for this.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetChanged {
    /// Weapon entity
    pub shooter: Entity,
    /// Target selected by the previous tick
    pub previous: Option<Entity>,
    /// Target selected now
    pub current: Option<Entity>,
}

/// Impacts resolved for one fire command.
///
/// Not sent when the weapon had no target or resolution failed.
///
/// # Fields
/// * `shooter` - Weapon entity that fired
/// * `target` - Targetable entity that was hit
/// * `hits` - One impact per salvo shot, in salvo order
#[derive(Message, Clone, Debug)]
pub struct HitsResolved {
    pub shooter: Entity,
    pub target: Entity,
    pub hits: Vec<ResolvedHit>,
}

impl HitsResolved {
    /// Number of impacts on critical sub-points.
    pub fn critical_count(&self) -> usize {
        self.hits.iter().filter(|hit| hit.critical).count()
    }
}
