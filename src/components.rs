//! Core components for the targeting system.

use bevy::prelude::*;

use crate::controller::HitScanTargeting;
use crate::resources::TargetingConfig;

/// Marker for entities a weapon may acquire as a target.
///
/// The entity should carry a collider on the targetable layer and have at
/// least one [`TargetSubPoint`] among its descendants.
#[derive(Component, Reflect, Default, Clone, Copy)]
#[reflect(Component)]
pub struct Targetable;

/// Surface primitive a sub-point is sampled on.
///
/// # Variants
/// * `Cuboid` - Unit square patch in the sub-point's local XY plane
/// * `Circle` - Unit disk in the sub-point's local XY plane
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Reflect)]
pub enum SubPointShape {
    #[default]
    Cuboid,
    Circle,
}

/// A hittable point on a targetable entity.
///
/// The sub-point faces along its entity's forward axis. A shot from a
/// position more than `shootable_angle` degrees away from that facing cannot
/// land on this point.
///
/// # Fields
/// * `shape` - Surface primitive used to scatter impacts
/// * `critical` - Whether hits on this point count as critical hits
/// * `shootable_angle` - Half-angle in degrees, `(0, 180]`; 180 is always reachable
///
/// # Example
/// ```
/// use bevy_hitscan_targeting::components::{SubPointShape, TargetSubPoint};
///
/// let head = TargetSubPoint::new(SubPointShape::Circle)
///     .critical()
///     .with_shootable_angle(70.0);
/// assert!(head.critical);
/// ```
#[derive(Component, Reflect, Clone, Copy, Debug, PartialEq)]
#[reflect(Component)]
pub struct TargetSubPoint {
    /// Surface primitive
    pub shape: SubPointShape,
    /// Critical hit zone
    pub critical: bool,
    /// Half-angle (degrees) from the facing within which the point can be hit
    pub shootable_angle: f32,
}

impl Default for TargetSubPoint {
    /// Non-critical cuboid reachable from the front hemisphere (90°).
    fn default() -> Self {
        Self {
            shape: SubPointShape::Cuboid,
            critical: false,
            shootable_angle: 90.0,
        }
    }
}

impl TargetSubPoint {
    /// Creates a non-critical sub-point of the given shape.
    pub fn new(shape: SubPointShape) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    /// Builder pattern: mark as critical
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    /// Builder pattern: set shootable angle (degrees)
    pub fn with_shootable_angle(mut self, degrees: f32) -> Self {
        self.shootable_angle = degrees;
        self
    }

    /// True if the point imposes no angular restriction.
    pub fn always_shootable(&self) -> bool {
        self.shootable_angle >= 180.0
    }
}

/// Weapon that acquires targets every tick and resolves hits on fire.
///
/// The pose is read from the entity's `GlobalTransform`; Bevy's forward
/// axis (`-Z`) is the aiming direction.
///
/// # Example
/// ```
/// use bevy_hitscan_targeting::components::HitScanWeapon;
/// use bevy_hitscan_targeting::resources::TargetingConfig;
///
/// let weapon = HitScanWeapon::new(TargetingConfig::default().with_max_distance(80.0));
/// assert!(weapon.targeting().current_target().is_none());
/// ```
#[derive(Component)]
pub struct HitScanWeapon {
    targeting: HitScanTargeting,
}

impl HitScanWeapon {
    /// Creates a weapon with its own targeting controller.
    pub fn new(config: TargetingConfig) -> Self {
        Self {
            targeting: HitScanTargeting::new(config),
        }
    }

    /// Read-only access to the controller.
    pub fn targeting(&self) -> &HitScanTargeting {
        &self.targeting
    }

    /// Mutable access to the controller.
    pub fn targeting_mut(&mut self) -> &mut HitScanTargeting {
        &mut self.targeting
    }
}

impl Default for HitScanWeapon {
    fn default() -> Self {
        Self::new(TargetingConfig::default())
    }
}
