// Furniture items: model paths, size rules and placement

use std::f32::consts::PI;

use glam::Vec3;

use crate::camera::PerspectiveCamera;
use crate::scene::{ItemKind, NodeId, Scene};

/// Distance in front of the camera where spawned items appear.
pub const SPAWN_DISTANCE: f32 = 3.0;

/// Height of flat items so they sit just above the floor.
pub const RUG_HEIGHT: f32 = 0.02;

/// How an item's loaded model is brought to its real-world size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeRule {
    /// Uniformly scale until the X extent equals this width.
    Width(f32),
    /// Use this uniform scale factor as-is.
    Scale(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemProfile {
    pub kind: ItemKind,
    pub size: SizeRule,
}

impl ItemProfile {
    /// Model file relative to the asset root.
    pub fn model_path(&self) -> String {
        format!("models/{}.glb", self.kind.slug())
    }
}

/// Size rules for every furniture kind. Walls are built, never spawned.
pub fn item_profile(kind: ItemKind) -> Option<ItemProfile> {
    let size = match kind {
        ItemKind::Sofa => SizeRule::Width(7.0),
        ItemKind::Table => SizeRule::Width(4.0),
        ItemKind::Tv => SizeRule::Width(5.0),
        ItemKind::Rug => SizeRule::Scale(0.040),
        ItemKind::Wall => return None,
    };
    Some(ItemProfile { kind, size })
}

/// Where a piece of the starting furniture goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub kind: ItemKind,
    pub position: Vec3,
    pub yaw: f32,
}

/// The furniture the room opens with.
pub fn initial_placements() -> [Placement; 4] {
    [
        Placement {
            kind: ItemKind::Sofa,
            position: Vec3::new(0.0, 0.0, -8.0),
            yaw: 0.0,
        },
        Placement {
            kind: ItemKind::Table,
            position: Vec3::new(-0.1, 1.4, -5.0),
            yaw: 0.0,
        },
        Placement {
            kind: ItemKind::Rug,
            position: Vec3::new(0.5, RUG_HEIGHT, 1.0),
            yaw: PI / 2.0,
        },
        Placement {
            kind: ItemKind::Tv,
            position: Vec3::new(0.0, 1.5, 8.0),
            yaw: PI,
        },
    ]
}

/// Uniformly scales `id` so its world-space X extent equals `width`.
/// Returns false for models with no horizontal extent.
pub fn scale_to_target_width(scene: &mut Scene, id: NodeId, width: f32) -> bool {
    let current = scene.world_bounds(id).size().x;
    let Some(node) = scene.get_mut(id) else {
        return false;
    };
    if current <= f32::EPSILON {
        log::warn!("{} has no width, leaving it unscaled", node.name);
        return false;
    }
    let factor = width / current * node.transform.scale.x;
    node.transform.set_uniform_scale(factor);
    true
}

/// Moves `id` vertically so its lowest point rests on Y=0.
pub fn snap_to_floor(scene: &mut Scene, id: NodeId) {
    let bounds = scene.world_bounds(id);
    if bounds.is_empty() {
        return;
    }
    if let Some(node) = scene.get_mut(id) {
        node.transform.position.y -= bounds.min.y;
    }
}

/// Sizes a freshly loaded starting item and puts it at its fixed spot.
pub fn place_initial(scene: &mut Scene, id: NodeId, placement: &Placement) {
    if let Some(profile) = item_profile(placement.kind) {
        apply_size(scene, id, profile.size);
    }
    if let Some(node) = scene.get_mut(id) {
        node.transform.position = placement.position;
        node.transform.rotation = glam::Quat::from_rotation_y(placement.yaw);
    }
}

/// Puts a spawned item in front of the camera, sized by its rule.
pub fn place_spawned(scene: &mut Scene, id: NodeId, profile: &ItemProfile, camera: &PerspectiveCamera) {
    if let Some(node) = scene.get_mut(id) {
        node.transform.position = camera.position + camera.world_direction() * SPAWN_DISTANCE;
    }
    match profile.size {
        SizeRule::Width(_) => {
            apply_size(scene, id, profile.size);
            snap_to_floor(scene, id);
        }
        SizeRule::Scale(_) => {
            apply_size(scene, id, profile.size);
            if let Some(node) = scene.get_mut(id) {
                node.transform.rotation = glam::Quat::from_rotation_y(PI / 2.0);
                node.transform.position.y = RUG_HEIGHT;
            }
        }
    }
}

fn apply_size(scene: &mut Scene, id: NodeId, size: SizeRule) {
    match size {
        SizeRule::Width(width) => {
            scale_to_target_width(scene, id, width);
        }
        SizeRule::Scale(scale) => {
            if let Some(node) = scene.get_mut(id) {
                node.transform.set_uniform_scale(scale);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, Mesh, Primitive, SceneNode};
    use approx::assert_relative_eq;

    fn model(scene: &mut Scene, size: Vec3) -> NodeId {
        let root = scene.add_to_root(SceneNode::new("model"));
        scene.add(
            root,
            SceneNode::new("body").with_mesh(Mesh::single(Primitive::cuboid(size, Material::default()))),
        );
        root
    }

    fn camera_at(position: Vec3, target: Vec3) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        camera.position = position;
        camera.target = target;
        camera
    }

    #[test]
    fn width_rule_scales_and_snaps() {
        let mut scene = Scene::new();
        let sofa = model(&mut scene, Vec3::new(2.0, 1.0, 1.0));
        let profile = item_profile(ItemKind::Sofa).unwrap();
        let camera = camera_at(Vec3::new(5.0, 5.0, 7.0), Vec3::ZERO);

        place_spawned(&mut scene, sofa, &profile, &camera);

        let bounds = scene.world_bounds(sofa);
        assert_relative_eq!(bounds.size().x, 7.0, epsilon = 1e-4);
        assert_relative_eq!(bounds.min.y, 0.0, epsilon = 1e-4);
        let expected = camera.position + camera.world_direction() * SPAWN_DISTANCE;
        let position = scene.get(sofa).unwrap().transform.position;
        assert_relative_eq!(position.x, expected.x, epsilon = 1e-5);
        assert_relative_eq!(position.z, expected.z, epsilon = 1e-5);
    }

    #[test]
    fn rug_ignores_camera_orientation() {
        for target in [Vec3::ZERO, Vec3::new(0.0, 20.0, 0.0), Vec3::new(-3.0, -4.0, 12.0)] {
            let mut scene = Scene::new();
            let rug = model(&mut scene, Vec3::new(50.0, 1.0, 30.0));
            let profile = item_profile(ItemKind::Rug).unwrap();
            place_spawned(&mut scene, rug, &profile, &camera_at(Vec3::new(5.0, 5.0, 7.0), target));

            let transform = scene.get(rug).unwrap().transform;
            assert_eq!(transform.scale, Vec3::splat(0.040));
            assert_eq!(transform.position.y, 0.02);
            assert_relative_eq!(transform.yaw(), PI / 2.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn initial_placement_uses_fixed_transform() {
        let mut scene = Scene::new();
        let tv = model(&mut scene, Vec3::new(10.0, 4.0, 1.0));
        let placement = initial_placements()[3];
        place_initial(&mut scene, tv, &placement);

        let transform = scene.get(tv).unwrap().transform;
        assert_eq!(transform.position, Vec3::new(0.0, 1.5, 8.0));
        assert_relative_eq!(transform.scale.x, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn flat_model_is_left_unscaled() {
        let mut scene = Scene::new();
        let empty = scene.add_to_root(SceneNode::new("empty"));
        assert!(!scale_to_target_width(&mut scene, empty, 4.0));
        assert_eq!(scene.get(empty).unwrap().transform.scale, Vec3::ONE);
    }

    #[test]
    fn walls_are_not_inventory_items() {
        assert!(item_profile(ItemKind::Wall).is_none());
        assert_eq!(item_profile(ItemKind::Table).unwrap().model_path(), "models/meja.glb");
    }
}
