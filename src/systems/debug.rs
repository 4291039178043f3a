use bevy::prelude::*;

use crate::components::HitScanWeapon;
use crate::discovery::ConeSnapshot;
use crate::geometry::{horizontal_forward, rotate_yaw};
use crate::resources::TargetingSettings;

/// Cone edges as world-space line segments at the shooter's height.
///
/// Far edges first (left, right), then near edges (left, right).
pub fn cone_lines(snapshot: &ConeSnapshot) -> [(Vec3, Vec3); 4] {
    let origin = snapshot.pose.position;
    let forward = horizontal_forward(snapshot.pose.forward);
    let far = forward * snapshot.max_distance;
    let near = forward * snapshot.immediate_proximity;
    [
        (origin, origin + rotate_yaw(far, snapshot.far_view_angle)),
        (origin, origin + rotate_yaw(far, -snapshot.far_view_angle)),
        (origin, origin + rotate_yaw(near, snapshot.near_view_angle)),
        (origin, origin + rotate_yaw(near, -snapshot.near_view_angle)),
    ]
}

/// Draw debug gizmos for weapons.
///
/// Draws the query sphere, both view cones, a line to each visible target
/// and the selected target in red.
pub fn draw_targeting_debug(
    mut gizmos: Gizmos,
    weapons: Query<&HitScanWeapon>,
    transforms: Query<&GlobalTransform>,
    settings: Res<TargetingSettings>,
) {
    if !settings.debug_draw {
        return;
    }

    for weapon in weapons.iter() {
        let selected = weapon.targeting().current_target();
        let snapshot = weapon.targeting().snapshot();
        let sphere_color = Color::srgba(0.3, 0.6, 1.0, 0.3);
        gizmos.sphere(snapshot.sphere_center, snapshot.sphere_radius, sphere_color);

        let [far_left, far_right, near_left, near_right] = cone_lines(&snapshot);
        for (start, end) in [far_left, far_right] {
            gizmos.line(start, end, Color::srgb(0.0, 1.0, 0.0));
        }
        for (start, end) in [near_left, near_right] {
            gizmos.line(start, end, Color::srgb(1.0, 1.0, 0.0));
        }

        for target in &snapshot.visible {
            let Ok(transform) = transforms.get(*target) else {
                continue;
            };
            let color = if selected == Some(*target) {
                Color::srgb(1.0, 0.0, 0.0)
            } else {
                Color::srgb(1.0, 0.6, 0.0)
            };
            gizmos.line(snapshot.pose.position, transform.translation(), color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Pose;

    #[test]
    fn test_cone_lines_follow_pose() {
        let snapshot = ConeSnapshot {
            pose: Pose::new(Vec3::new(0.0, 1.5, 0.0), Vec3::NEG_Z),
            max_distance: 30.0,
            far_view_angle: 10.0,
            near_view_angle: 45.0,
            immediate_proximity: 10.0,
            ..Default::default()
        };
        let [far_left, far_right, near_left, _] = cone_lines(&snapshot);

        assert!(((far_left.1 - far_left.0).length() - 30.0).abs() < 1e-3);
        assert!((far_left.1.y - 1.5).abs() < 1e-5);
        assert!((far_left.1.x + far_right.1.x).abs() < 1e-3);
        assert!(((near_left.1 - near_left.0).length() - 10.0).abs() < 1e-3);
    }
}
