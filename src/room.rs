// The furnished room: scene setup plus routing of user input

use std::f32::consts::PI;

use glam::{Quat, Vec2, Vec3};

use crate::appearance::{self, AppearanceCatalog};
use crate::camera::{KeyboardState, OrbitControls, PerspectiveCamera};
use crate::config::Config;
use crate::focus::{CameraPose, FocusController};
use crate::inventory::{self, item_profile};
use crate::loader::{LoadCompletion, LoadPurpose, LoadRequest};
use crate::math::Transform;
use crate::picking::{self, Interaction, PointerDown, ROTATE_SNAP};
use crate::registry::SelectableRegistry;
use crate::scene::{ItemKind, Material, Mesh, NodeId, Primitive, Scene, SceneNode, TextureSource};
use crate::ui::Panels;

const FLOOR_SIZE: f32 = 20.0;
const WALL_HEIGHT: f32 = 5.0;

/// Keys the room reacts to, already decoded from the keyboard layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKey {
    ToggleInventory,
    RotateLeft,
    RotateRight,
    Delete,
    Escape,
    /// Digit 1-9, selects a menu entry.
    Digit(usize),
}

pub struct Room {
    scene: Scene,
    registry: SelectableRegistry,
    ground: NodeId,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    keys: KeyboardState,
    interaction: Interaction,
    panels: Panels,
    focus: FocusController,
    catalog: AppearanceCatalog,
    config: Config,
    viewport: Vec2,
    pending_loads: Vec<LoadRequest>,
}

impl Room {
    /// Builds the static room and queues loads for the starting furniture.
    pub fn new(config: Config, viewport: Vec2) -> Self {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0);
        camera.set_aspect(viewport.x, viewport.y);
        camera.position = Vec3::new(5.0, 5.0, 7.0);
        camera.target = Vec3::ZERO;
        let controls = OrbitControls::with_target(camera.target);
        let focus = FocusController::new(CameraPose::capture(&camera, &controls), config.focus_seconds);

        let mut scene = Scene::new();
        let mut registry = SelectableRegistry::new();
        let ground = build_floor(&mut scene);
        for wall in build_walls(&mut scene) {
            registry.register(wall);
        }

        let mut room = Self {
            scene,
            registry,
            ground,
            camera,
            controls,
            keys: KeyboardState::default(),
            interaction: Interaction::new(),
            panels: Panels::default(),
            focus,
            catalog: AppearanceCatalog::default(),
            config,
            viewport,
            pending_loads: Vec::new(),
        };
        for placement in inventory::initial_placements() {
            room.queue_load(placement.kind, LoadPurpose::Furnish(placement));
        }
        room
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[cfg(test)]
    pub fn registry(&self) -> &SelectableRegistry {
        &self.registry
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    #[cfg(test)]
    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn keys_mut(&mut self) -> &mut KeyboardState {
        &mut self.keys
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    #[cfg(test)]
    pub fn panels(&self) -> &Panels {
        &self.panels
    }

    #[cfg(test)]
    pub fn focus(&self) -> &FocusController {
        &self.focus
    }

    #[cfg(test)]
    pub fn ground(&self) -> NodeId {
        self.ground
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
        self.camera.set_aspect(width, height);
    }

    /// Load requests queued since the last call.
    pub fn take_load_requests(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.pending_loads)
    }

    fn queue_load(&mut self, kind: ItemKind, purpose: LoadPurpose) {
        let Some(profile) = item_profile(kind) else {
            return;
        };
        self.pending_loads.push(LoadRequest {
            path: self.config.asset_path(&profile.model_path()),
            kind,
            purpose,
        });
    }

    /// Inventory entry point: queue a model to appear in front of the camera.
    pub fn spawn_item(&mut self, kind: ItemKind) {
        log::info!("Spawning {}", kind.slug());
        self.queue_load(kind, LoadPurpose::Spawn);
    }

    /// Adds a finished load to the scene and the registry. Failed loads are
    /// logged and otherwise ignored.
    pub fn apply_completion(&mut self, completion: LoadCompletion) -> Option<NodeId> {
        let LoadCompletion { request, result } = completion;
        let template = match result {
            Ok(template) => template,
            Err(err) => {
                log::warn!("{err}");
                return None;
            }
        };

        let id = self.scene.instantiate(self.scene.root(), &template);
        if let Some(node) = self.scene.get_mut(id) {
            node.kind = Some(request.kind);
            node.can_retexture = true;
        }
        match request.purpose {
            LoadPurpose::Furnish(placement) => inventory::place_initial(&mut self.scene, id, &placement),
            LoadPurpose::Spawn => {
                if let Some(profile) = item_profile(request.kind) {
                    inventory::place_spawned(&mut self.scene, id, &profile, &self.camera);
                }
            }
        }
        self.registry.register(id);
        log::info!("{} added to the room as {:?}", request.kind.slug(), id);
        Some(id)
    }

    /// Texture menu entry point: retextures whatever the menu is bound to.
    pub fn apply_texture(&mut self, path: &str) -> bool {
        let Some(target) = self.panels.texture_target() else {
            return false;
        };
        appearance::apply_texture(&mut self.scene, target, path) > 0
    }

    fn open_texture_menu_for(&mut self, id: NodeId) {
        let choices = self
            .scene
            .get(id)
            .filter(|node| node.can_retexture)
            .and_then(|node| node.kind)
            .and_then(|kind| self.catalog.choices(kind));
        match choices {
            Some(choices) => {
                let choices = choices.to_vec();
                self.panels.open_texture_menu(id, &choices);
            }
            None => self.panels.close_texture_menu(),
        }
    }

    pub fn pointer_down(&mut self, pointer: Vec2) {
        if self.panels.inventory_open() {
            return;
        }
        let ray = self.camera.ray_from_screen(pointer, self.viewport);
        match self
            .interaction
            .pointer_down(&mut self.scene, &self.registry, &ray, pointer.y)
        {
            PointerDown::Grabbed(id) => {
                self.controls.enabled = false;
                self.open_texture_menu_for(id);
            }
            PointerDown::Wall(id) => self.open_texture_menu_for(id),
            PointerDown::Missed => {
                self.panels.close_texture_menu();
                self.interaction.clear(&mut self.scene);
            }
        }
    }

    /// Returns true if the pointer is dragging an object, in which case the
    /// orbit controls should not see this motion.
    pub fn pointer_move(&mut self, pointer: Vec2, vertical: bool) -> bool {
        if !self.interaction.is_dragging() {
            return false;
        }
        let ray = self.camera.ray_from_screen(pointer, self.viewport);
        self.interaction
            .pointer_move(&mut self.scene, self.ground, &ray, pointer.y, vertical);
        true
    }

    pub fn pointer_up(&mut self) {
        let pinned = self.interaction.selection().is_some()
            && self.panels.texture_target() == self.interaction.selection();
        self.interaction.pointer_up(&mut self.scene, pinned);
        self.controls.enabled = !self.panels.inventory_open();
    }

    /// Frames a retexturable object under the pointer.
    pub fn double_click(&mut self, pointer: Vec2) {
        if self.panels.inventory_open() {
            return;
        }
        let ray = self.camera.ray_from_screen(pointer, self.viewport);
        let Some(id) = picking::pick(&self.scene, &self.registry, &ray) else {
            return;
        };
        if !self.scene.get(id).is_some_and(|node| node.can_retexture) {
            return;
        }
        let bounds = self.scene.world_bounds(id);
        self.focus.focus_on(&bounds, &self.camera, &mut self.controls);
    }

    pub fn key_pressed(&mut self, key: RoomKey) {
        match key {
            RoomKey::ToggleInventory => {
                let open = self.panels.toggle_inventory();
                self.controls.enabled = !open;
            }
            RoomKey::RotateLeft | RoomKey::RotateRight => {
                if self.panels.inventory_open() {
                    return;
                }
                let angle = if key == RoomKey::RotateLeft { ROTATE_SNAP } else { -ROTATE_SNAP };
                if self.interaction.rotate(&mut self.scene, angle) {
                    log::debug!("Rotated selection by {:.1}°", angle.to_degrees());
                }
            }
            RoomKey::Delete => {
                if let Some(id) = self.interaction.delete(&mut self.scene, &mut self.registry) {
                    self.panels.forget(id);
                    self.controls.enabled = !self.panels.inventory_open();
                }
            }
            RoomKey::Escape => self.focus.release(&self.camera, &mut self.controls),
            RoomKey::Digit(slot) => {
                if self.panels.inventory_open() {
                    if let Some(kind) = self.panels.inventory_item(slot) {
                        self.spawn_item(kind);
                    }
                } else if let Some(path) = self.panels.texture_choice(slot).map(str::to_string) {
                    self.apply_texture(&path);
                }
            }
        }
    }

    /// Per-frame update: fly movement, focus tween, orbit damping.
    pub fn tick(&mut self, dt: f32) {
        let step = self.keys.movement(&self.camera, self.config.move_speed * dt);
        if step != Vec3::ZERO {
            self.camera.position += step;
            self.controls.target += step;
            self.camera.target = self.controls.target;
        }
        // The tween owns the camera while it runs; orbit input is discarded.
        if self.focus.update(dt, &mut self.camera, &mut self.controls) {
            self.controls.reset();
        } else {
            self.controls.update(&mut self.camera);
        }
    }
}

fn build_floor(scene: &mut Scene) -> NodeId {
    let mut material = Material::standard("floor", 0xc9a46b);
    material.roughness = 0.7;
    material.metalness = 0.1;
    material.map = Some(TextureSource::File("texture/floor.jpg".into()));
    material.map_repeat = Vec2::splat(3.0);
    material.map_rotation = PI / 2.0;
    material.double_sided = true;

    scene.add_to_root(
        SceneNode::new("floor")
            .with_mesh(Mesh::single(Primitive::plane(FLOOR_SIZE, FLOOR_SIZE, material)))
            .with_transform(Transform::new(
                Vec3::ZERO,
                Quat::from_rotation_x(-PI / 2.0),
                Vec3::ONE,
            )),
    )
}

fn build_walls(scene: &mut Scene) -> Vec<NodeId> {
    let half = FLOOR_SIZE / 2.0;
    let walls = [
        ("back wall", Vec3::new(0.0, 2.0, -half), 0.0),
        ("left wall", Vec3::new(-half, 2.0, 0.0), PI / 2.0),
        ("right wall", Vec3::new(half, 2.0, 0.0), -PI / 2.0),
    ];
    walls
        .into_iter()
        .map(|(name, position, yaw)| {
            let material = Material::standard(name, 0xb0b5c0);
            scene.add_to_root(
                SceneNode::new(name)
                    .with_kind(ItemKind::Wall, true)
                    .with_mesh(Mesh::single(Primitive::plane(FLOOR_SIZE, WALL_HEIGHT, material)))
                    .with_transform(Transform::from_position_yaw(position, yaw)),
            )
        })
        .collect()
}
