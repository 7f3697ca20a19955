// Pointer picking and manipulation of the selected object

use std::f32::consts::PI;

use glam::Vec3;

use crate::math::{color_from_hex, Ray};
use crate::registry::SelectableRegistry;
use crate::scene::{ItemKind, NodeId, Scene};

/// Snap increment for keyboard rotation (15 degrees).
pub const ROTATE_SNAP: f32 = PI / 12.0;

/// World units of height per pixel of vertical pointer travel.
pub const VERTICAL_DRAG_FACTOR: f32 = 0.01;

/// Emissive tint added to every mesh of a grabbed object.
pub const HIGHLIGHT_HEX: u32 = 0x333333;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// An object is selected but the pointer is not held.
    Selected(NodeId),
    /// The pointer is held on the selected object.
    Dragging(NodeId),
}

/// What a pointer press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerDown {
    /// A furniture item is now selected and being dragged.
    Grabbed(NodeId),
    /// A wall was clicked. Walls never drag.
    Wall(NodeId),
    Missed,
}

/// Selection and drag state, owned by whoever routes pointer events.
#[derive(Debug, Default, Clone)]
pub struct Interaction {
    state: InteractionState,
    last_pointer_y: f32,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn selection(&self) -> Option<NodeId> {
        match self.state {
            InteractionState::Idle => None,
            InteractionState::Selected(id) | InteractionState::Dragging(id) => Some(id),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, InteractionState::Dragging(_))
    }

    /// Casts `ray` against every registered subtree and grabs the registered
    /// ancestor of the nearest mesh hit.
    pub fn pointer_down(
        &mut self,
        scene: &mut Scene,
        registry: &SelectableRegistry,
        ray: &Ray,
        pointer_y: f32,
    ) -> PointerDown {
        let Some(root) = pick(scene, registry, ray) else {
            return PointerDown::Missed;
        };

        if scene.get(root).and_then(|n| n.kind) == Some(ItemKind::Wall) {
            self.clear(scene);
            return PointerDown::Wall(root);
        }

        if let Some(previous) = self.selection() {
            set_highlight(scene, previous, false);
        }
        self.state = InteractionState::Dragging(root);
        self.last_pointer_y = pointer_y;
        set_highlight(scene, root, true);
        log::debug!("Grabbed {:?}", root);
        PointerDown::Grabbed(root)
    }

    /// Moves the dragged object. With `vertical` held the pointer's screen Y
    /// travel lifts or lowers it; otherwise it slides along the ground.
    /// Returns true if the object moved.
    pub fn pointer_move(
        &mut self,
        scene: &mut Scene,
        ground: NodeId,
        ray: &Ray,
        pointer_y: f32,
        vertical: bool,
    ) -> bool {
        let InteractionState::Dragging(id) = self.state else {
            return false;
        };

        if vertical {
            let delta = self.last_pointer_y - pointer_y;
            self.last_pointer_y = pointer_y;
            if let Some(node) = scene.get_mut(id) {
                node.transform.position.y += delta * VERTICAL_DRAG_FACTOR;
            }
            // One correction per event: push back out of the floor.
            let lowest = scene.world_bounds(id).min.y;
            if lowest < 0.0 {
                if let Some(node) = scene.get_mut(id) {
                    node.transform.position.y -= lowest;
                }
            }
            return true;
        }

        let Some(hit) = scene.intersect(&[ground], ray) else {
            return false;
        };
        match scene.get_mut(id) {
            Some(node) => {
                node.transform.position.x = hit.point.x;
                node.transform.position.z = hit.point.z;
                true
            }
            None => false,
        }
    }

    /// Ends a drag. `pinned` keeps the object selected (its texture menu is
    /// still open).
    pub fn pointer_up(&mut self, scene: &mut Scene, pinned: bool) {
        let Some(id) = self.selection() else {
            return;
        };
        set_highlight(scene, id, false);
        self.state = if pinned {
            InteractionState::Selected(id)
        } else {
            InteractionState::Idle
        };
        log::debug!("Released {:?}, now {:?}", id, self.state);
    }

    /// Drops the selection without touching the object.
    pub fn clear(&mut self, scene: &mut Scene) {
        if let Some(id) = self.selection() {
            set_highlight(scene, id, false);
        }
        self.state = InteractionState::Idle;
    }

    /// Spins the selection around the vertical axis.
    pub fn rotate(&mut self, scene: &mut Scene, angle: f32) -> bool {
        let Some(node) = self.selection().and_then(|id| scene.get_mut(id)) else {
            return false;
        };
        node.transform.rotate_yaw(angle);
        true
    }

    /// Removes the selection from the scene and the registry.
    pub fn delete(&mut self, scene: &mut Scene, registry: &mut SelectableRegistry) -> Option<NodeId> {
        let id = self.selection()?;
        scene.remove(id);
        registry.unregister(id);
        self.state = InteractionState::Idle;
        log::info!("Deleted {:?}", id);
        Some(id)
    }
}

/// Registered node under `ray`, resolved from whichever child mesh was hit.
pub fn pick(scene: &Scene, registry: &SelectableRegistry, ray: &Ray) -> Option<NodeId> {
    let hit = scene.intersect(registry.as_slice(), ray)?;
    registry.resolve_root(scene, hit.node)
}

/// Sets or clears the additive emissive tint on every mesh under `root`.
pub fn set_highlight(scene: &mut Scene, root: NodeId, on: bool) {
    let emissive = if on { color_from_hex(HIGHLIGHT_HEX) } else { Vec3::ZERO };
    for id in scene.mesh_descendants(root) {
        if let Some(mesh) = scene.get_mut(id).and_then(|n| n.mesh.as_mut()) {
            for material in mesh.materials_mut() {
                material.emissive = emissive;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Transform;
    use crate::scene::{Material, Mesh, Primitive, SceneNode};
    use approx::assert_relative_eq;
    use glam::Quat;

    struct Fixture {
        scene: Scene,
        registry: SelectableRegistry,
        floor: NodeId,
        sofa: NodeId,
        cushion: NodeId,
        wall: NodeId,
    }

    fn fixture() -> Fixture {
        let mut scene = Scene::new();
        let floor = scene.add_to_root(
            SceneNode::new("floor")
                .with_mesh(Mesh::single(Primitive::plane(20.0, 20.0, Material::default())))
                .with_transform(Transform::new(
                    Vec3::ZERO,
                    Quat::from_rotation_x(-PI / 2.0),
                    Vec3::ONE,
                )),
        );
        let sofa = scene.add_to_root(
            SceneNode::new("sofa")
                .with_kind(ItemKind::Sofa, true)
                .with_transform(Transform::from_position_yaw(Vec3::new(0.0, 0.5, 0.0), 0.0)),
        );
        let frame = scene.add(sofa, SceneNode::new("frame"));
        let cushion = scene.add(
            frame,
            SceneNode::new("cushion").with_mesh(Mesh::single(Primitive::cuboid(
                Vec3::new(2.0, 1.0, 1.0),
                Material::default(),
            ))),
        );
        let wall = scene.add_to_root(
            SceneNode::new("back wall")
                .with_kind(ItemKind::Wall, true)
                .with_mesh(Mesh::single(Primitive::plane(20.0, 5.0, Material::default())))
                .with_transform(Transform::from_position_yaw(Vec3::new(0.0, 2.0, -10.0), 0.0)),
        );
        let mut registry = SelectableRegistry::new();
        registry.register(sofa);
        registry.register(wall);
        Fixture {
            scene,
            registry,
            floor,
            sofa,
            cushion,
            wall,
        }
    }

    fn down_at(x: f32, z: f32) -> Ray {
        Ray::new(Vec3::new(x, 10.0, z), Vec3::NEG_Y)
    }

    fn grab_sofa(f: &mut Fixture, interaction: &mut Interaction) {
        let outcome = interaction.pointer_down(&mut f.scene, &f.registry, &down_at(0.0, 0.0), 300.0);
        assert_eq!(outcome, PointerDown::Grabbed(f.sofa));
    }

    fn emissive_of(scene: &Scene, id: NodeId) -> Vec3 {
        scene.get(id).unwrap().mesh.as_ref().unwrap().primitives[0].material.emissive
    }

    #[test]
    fn child_hit_selects_registered_ancestor() {
        let mut f = fixture();
        let mut interaction = Interaction::new();
        grab_sofa(&mut f, &mut interaction);

        assert_eq!(interaction.state(), InteractionState::Dragging(f.sofa));
        assert_ne!(interaction.selection(), Some(f.cushion));
        assert_eq!(emissive_of(&f.scene, f.cushion), color_from_hex(HIGHLIGHT_HEX));
    }

    #[test]
    fn miss_leaves_state_untouched() {
        let mut f = fixture();
        let mut interaction = Interaction::new();
        let outcome = interaction.pointer_down(&mut f.scene, &f.registry, &down_at(8.0, 8.0), 0.0);
        assert_eq!(outcome, PointerDown::Missed);
        assert_eq!(interaction.state(), InteractionState::Idle);
    }

    #[test]
    fn walls_are_picked_but_never_dragged() {
        let mut f = fixture();
        let mut interaction = Interaction::new();
        let toward_wall = Ray::new(Vec3::new(3.0, 2.0, 0.0), Vec3::NEG_Z);
        let outcome = interaction.pointer_down(&mut f.scene, &f.registry, &toward_wall, 0.0);
        assert_eq!(outcome, PointerDown::Wall(f.wall));
        assert!(!interaction.is_dragging());
        assert_eq!(interaction.selection(), None);
    }

    #[test]
    fn furniture_is_pickable_from_behind_a_wall() {
        let f = fixture();
        let from_outside = Ray::new(Vec3::new(0.0, 0.5, -15.0), Vec3::Z);
        assert_eq!(pick(&f.scene, &f.registry, &from_outside), Some(f.sofa));
    }

    #[test]
    fn planar_drag_changes_only_x_and_z() {
        let mut f = fixture();
        let mut interaction = Interaction::new();
        grab_sofa(&mut f, &mut interaction);

        let moved = interaction.pointer_move(&mut f.scene, f.floor, &down_at(2.0, 3.0), 310.0, false);
        assert!(moved);
        interaction.pointer_up(&mut f.scene, false);

        let position = f.scene.get(f.sofa).unwrap().transform.position;
        assert_relative_eq!(position.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(position.z, 3.0, epsilon = 1e-5);
        assert_eq!(position.y, 0.5);
        assert_eq!(interaction.state(), InteractionState::Idle);
        assert_eq!(emissive_of(&f.scene, f.cushion), Vec3::ZERO);
    }

    #[test]
    fn planar_drag_off_the_floor_does_nothing() {
        let mut f = fixture();
        let mut interaction = Interaction::new();
        grab_sofa(&mut f, &mut interaction);
        let sky = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::Y);
        assert!(!interaction.pointer_move(&mut f.scene, f.floor, &sky, 0.0, false));
        assert_eq!(f.scene.get(f.sofa).unwrap().transform.position, Vec3::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn vertical_drag_lifts_and_clamps_at_floor() {
        let mut f = fixture();
        let mut interaction = Interaction::new();
        grab_sofa(&mut f, &mut interaction);
        let ray = down_at(0.0, 0.0);

        // 100 px up lifts by one unit.
        interaction.pointer_move(&mut f.scene, f.floor, &ray, 200.0, true);
        assert_relative_eq!(f.scene.get(f.sofa).unwrap().transform.position.y, 1.5, epsilon = 1e-5);

        // 500 px down would sink it; the correction puts the bottom on Y=0.
        interaction.pointer_move(&mut f.scene, f.floor, &ray, 700.0, true);
        assert_relative_eq!(f.scene.world_bounds(f.sofa).min.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(f.scene.get(f.sofa).unwrap().transform.position.y, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn moves_ignored_unless_dragging() {
        let mut f = fixture();
        let mut interaction = Interaction::new();
        assert!(!interaction.pointer_move(&mut f.scene, f.floor, &down_at(1.0, 1.0), 0.0, false));

        grab_sofa(&mut f, &mut interaction);
        interaction.pointer_up(&mut f.scene, true);
        assert_eq!(interaction.state(), InteractionState::Selected(f.sofa));
        assert!(!interaction.pointer_move(&mut f.scene, f.floor, &down_at(1.0, 1.0), 0.0, false));
    }

    #[test]
    fn rotate_left_then_right_restores_yaw() {
        let mut f = fixture();
        let mut interaction = Interaction::new();
        assert!(!interaction.rotate(&mut f.scene, ROTATE_SNAP));

        grab_sofa(&mut f, &mut interaction);
        let before = f.scene.get(f.sofa).unwrap().transform.yaw();
        assert!(interaction.rotate(&mut f.scene, ROTATE_SNAP));
        assert_relative_eq!(
            f.scene.get(f.sofa).unwrap().transform.yaw(),
            before + ROTATE_SNAP,
            epsilon = 1e-5
        );
        interaction.rotate(&mut f.scene, -ROTATE_SNAP);
        let after = f.scene.get(f.sofa).unwrap().transform.yaw();
        let diff = (after - before).rem_euclid(2.0 * PI);
        assert!(diff < 1e-5 || 2.0 * PI - diff < 1e-5);
    }

    #[test]
    fn delete_removes_from_scene_and_registry() {
        let mut f = fixture();
        let mut interaction = Interaction::new();
        assert_eq!(interaction.delete(&mut f.scene, &mut f.registry), None);

        grab_sofa(&mut f, &mut interaction);
        assert_eq!(interaction.delete(&mut f.scene, &mut f.registry), Some(f.sofa));
        assert!(!f.scene.contains(f.sofa));
        assert!(!f.scene.contains(f.cushion));
        assert!(!f.registry.contains(f.sofa));
        assert_eq!(interaction.state(), InteractionState::Idle);
    }
}
