//! # Bevy Hitscan Targeting
//!
//! Hitscan target acquisition and hit-point resolution for Bevy 0.18.
//!
//! ## Features
//! - Dual view cone (narrow far cone, wide near cone) with silhouette test
//! - Line-of-sight check through occluding layers
//! - Nearest visible target selection, with change notifications
//! - Per-target catalogs of critical and non-critical sub-points
//! - Correlated salvo spread around the first impact
//! - Deterministic, seedable resolution
//! - Pure core usable without an `App` through the [`types::TargetingWorld`] contract
//!
//! ## Quick Start
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_hitscan_targeting::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(TargetingPluginGroup)
//!         .run();
//! }
//! ```

pub mod backend;
pub mod catalog;
pub mod components;
pub mod controller;
pub mod discovery;
pub mod events;
pub mod geometry;
pub mod resolver;
pub mod resources;
pub mod sampling;
pub mod systems;
pub mod types;
pub mod visibility;

pub mod prelude {
    pub use crate::catalog::{CatalogError, CatalogRegistry, TargetPointCatalog};
    pub use crate::components::*;
    pub use crate::controller::{HitScanTargeting, TargetChange};
    pub use crate::discovery::ConeSnapshot;
    pub use crate::events::*;
    pub use crate::resolver::ResolveError;
    pub use crate::resources::*;
    pub use crate::types::*;
    pub use crate::TargetingPluginGroup;
    pub use crate::{TargetingCorePlugin, TargetingDebugPlugin};
}

use bevy::prelude::*;

/// Main plugin group that includes all targeting subsystems.
///
/// # Example
/// ```no_run
/// use bevy::prelude::*;
/// use bevy_hitscan_targeting::prelude::*;
///
/// fn main() {
///     App::new()
///         .add_plugins(DefaultPlugins)
///         .add_plugins(TargetingPluginGroup)
///         .run();
/// }
/// ```
#[derive(Default)]
pub struct TargetingPluginGroup;

impl PluginGroup for TargetingPluginGroup {
    fn build(self) -> bevy::app::PluginGroupBuilder {
        bevy::app::PluginGroupBuilder::start::<Self>()
            .add(TargetingCorePlugin)
            .add(TargetingDebugPlugin)
    }
}

/// Target acquisition and fire resolution.
///
/// # Systems
/// - `hide_sub_point_proxies` - Hides newly added sub-point markers
/// - `forget_despawned_targets` - Drops catalogs of removed targets
/// - `update_target_acquisition` - Refreshes each weapon's target (`dim3`)
/// - `process_fire_commands` - Resolves `FireCommand`s into `HitsResolved` (`dim3`)
pub struct TargetingCorePlugin;

impl Plugin for TargetingCorePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<components::Targetable>()
            .register_type::<components::TargetSubPoint>()
            .register_type::<resources::TargetingSettings>()
            .init_resource::<resources::TargetingSettings>()
            .init_resource::<catalog::CatalogRegistry>()
            .init_resource::<resources::ParameterPresets>()
            .add_message::<events::FireCommand>()
            .add_message::<events::TargetChanged>()
            .add_message::<events::HitsResolved>()
            .add_systems(
                Update,
                (
                    systems::proxies::hide_sub_point_proxies,
                    systems::proxies::forget_despawned_targets,
                ),
            );

        #[cfg(feature = "dim3")]
        {
            use avian3d::prelude::SpatialQueryPipeline;
            app.add_systems(
                FixedUpdate,
                (
                    systems::acquisition::update_target_acquisition,
                    systems::fire::process_fire_commands,
                )
                    .chain()
                    .run_if(resource_exists::<SpatialQueryPipeline>),
            );
        }
    }
}

/// Debug plugin for targeting visualization.
pub struct TargetingDebugPlugin;

impl Plugin for TargetingDebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, systems::debug::draw_targeting_debug);
    }
}
