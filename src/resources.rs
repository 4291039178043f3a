//! Configuration and global resources for the targeting system.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::{CollisionMask, TargetingParameters};

/// Default layer of targetable entities.
pub const SHOOTABLE_LAYER: CollisionMask = CollisionMask::layer(1);
/// Default layer of line-of-sight blockers (walls, cover).
pub const OBSTACLE_LAYER: CollisionMask = CollisionMask::layer(2);

/// Construction-time configuration of one targeting controller.
///
/// Immutable once a controller is built from it, except for the maximum
/// distance which can be changed through `HitScanTargeting::set_max_distance`.
///
/// # Fields
/// * `targetable_mask` - Layers the sphere query collects candidates from
/// * `occlusion_mask` - Layers the line-of-sight ray can hit; must include the targetable layers
/// * `max_distance` - Maximum range to a target (meters)
/// * `far_view_angle` - Half-angle of the far view cone (degrees)
/// * `near_view_angle` - Half-angle of the near view cone (degrees)
/// * `immediate_proximity` - Range of the near cone; `None` means a third of `max_distance`
///
/// # Example
/// ```
/// use bevy_hitscan_targeting::resources::TargetingConfig;
///
/// let config = TargetingConfig::default()
///     .with_max_distance(30.0)
///     .with_view_angles(10.0, 60.0);
/// assert_eq!(config.immediate_proximity(), 10.0);
/// ```
#[derive(Clone, Debug, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    /// Layers of targetable entities
    pub targetable_mask: CollisionMask,
    /// Layers the line-of-sight ray can hit
    pub occlusion_mask: CollisionMask,
    /// Maximum target range (meters)
    pub max_distance: f32,
    /// Far cone half-angle (degrees)
    pub far_view_angle: f32,
    /// Near cone half-angle (degrees)
    pub near_view_angle: f32,
    /// Near cone range (meters)
    pub immediate_proximity: Option<f32>,
}

impl Default for TargetingConfig {
    /// Narrow hitscan cone.
    ///
    /// Default values:
    /// - Shootable layer for candidates, shootable + obstacle layers for occlusion
    /// - 50 m maximum distance
    /// - 4° far view angle
    /// - 0° near view angle
    /// - Immediate proximity of a third of the maximum distance
    fn default() -> Self {
        Self {
            targetable_mask: SHOOTABLE_LAYER,
            occlusion_mask: SHOOTABLE_LAYER | OBSTACLE_LAYER,
            max_distance: 50.0,
            far_view_angle: 4.0,
            near_view_angle: 0.0,
            immediate_proximity: None,
        }
    }
}

impl TargetingConfig {
    /// Builder pattern: set maximum distance
    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Builder pattern: set far and near view angles (degrees)
    pub fn with_view_angles(mut self, far: f32, near: f32) -> Self {
        self.far_view_angle = far;
        self.near_view_angle = near;
        self
    }

    /// Builder pattern: set near cone range
    pub fn with_immediate_proximity(mut self, range: f32) -> Self {
        self.immediate_proximity = Some(range);
        self
    }

    /// Builder pattern: set candidate and occlusion layers
    pub fn with_masks(mut self, targetable: CollisionMask, occlusion: CollisionMask) -> Self {
        self.targetable_mask = targetable;
        self.occlusion_mask = occlusion;
        self
    }

    /// Effective near cone range.
    pub fn immediate_proximity(&self) -> f32 {
        self.immediate_proximity
            .unwrap_or(self.max_distance / 3.0)
    }
}

/// Global settings shared by every weapon.
///
/// # Fields
/// * `debug_draw` - Draw view cones, query spheres and visible targets with gizmos
#[derive(Resource, Reflect, Clone, Default)]
#[reflect(Resource)]
pub struct TargetingSettings {
    /// Debug visualization
    pub debug_draw: bool,
}

/// Named fire-parameter presets.
///
/// # Example
/// ```
/// use bevy_hitscan_targeting::resources::ParameterPresets;
///
/// let presets = ParameterPresets::with_defaults();
/// let shotgun = presets.get("Shotgun").unwrap();
/// assert_eq!(shotgun.salvo_count, 8);
/// ```
#[derive(Resource)]
pub struct ParameterPresets {
    pub presets: Vec<(String, TargetingParameters)>,
}

impl Default for ParameterPresets {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ParameterPresets {
    /// Creates the built-in presets (pistol, rifle, SMG, shotgun, sniper).
    pub fn with_defaults() -> Self {
        Self {
            presets: vec![
                ("Pistol".to_string(), presets::pistol()),
                ("Rifle".to_string(), presets::rifle()),
                ("SMG".to_string(), presets::smg()),
                ("Shotgun".to_string(), presets::shotgun()),
                ("Sniper".to_string(), presets::sniper()),
            ],
        }
    }

    /// Looks a preset up by name.
    pub fn get(&self, name: &str) -> Option<&TargetingParameters> {
        self.presets
            .iter()
            .find(|(preset, _)| preset == name)
            .map(|(_, params)| params)
    }
}

/// Fire-parameter presets for common weapon types.
pub mod presets {
    use super::*;

    /// Single shot, moderate scatter.
    pub fn pistol() -> TargetingParameters {
        TargetingParameters {
            salvo_count: 1,
            critical_chance: 0.1,
            accuracy: 0.7,
            precision: 0.7,
        }
    }

    /// Three-round burst with tight grouping.
    pub fn rifle() -> TargetingParameters {
        TargetingParameters {
            salvo_count: 3,
            critical_chance: 0.15,
            accuracy: 0.85,
            precision: 0.8,
        }
    }

    /// Long bursts that drift to neighbouring points.
    pub fn smg() -> TargetingParameters {
        TargetingParameters {
            salvo_count: 5,
            critical_chance: 0.05,
            accuracy: 0.6,
            precision: 0.5,
        }
    }

    /// Many pellets scattered around the first impact.
    pub fn shotgun() -> TargetingParameters {
        TargetingParameters {
            salvo_count: 8,
            critical_chance: 0.05,
            accuracy: 0.5,
            precision: 0.3,
        }
    }

    /// Pinpoint single shot with high critical chance.
    pub fn sniper() -> TargetingParameters {
        TargetingParameters {
            salvo_count: 1,
            critical_chance: 0.5,
            accuracy: 1.0,
            precision: 1.0,
        }
    }
}
