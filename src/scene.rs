// Scene graph for the room: an owned arena of nodes with parent links

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};

use crate::math::{color_from_hex, ray_triangle, Aabb, Ray, Transform};

/// Handle to a node stored in a [`Scene`]. Slots are recycled after removal,
/// but the generation makes handles to removed nodes stay dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// The fixed set of things the room knows how to furnish with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Sofa,
    Table,
    Tv,
    Rug,
    Wall,
}

impl ItemKind {
    /// Kinds offered by the inventory, in menu order.
    pub const FURNITURE: [ItemKind; 4] = [ItemKind::Sofa, ItemKind::Table, ItemKind::Tv, ItemKind::Rug];

    /// Asset name used for model and texture file names.
    pub fn slug(self) -> &'static str {
        match self {
            ItemKind::Sofa => "sofa",
            ItemKind::Table => "meja",
            ItemKind::Tv => "tv",
            ItemKind::Rug => "karpet",
            ItemKind::Wall => "dinding",
        }
    }
}

/// Where a material's image comes from.
#[derive(Debug, Clone)]
pub enum TextureSource {
    /// Path relative to the asset root, e.g. `texture/floor.jpg`.
    File(String),
    /// Image decoded out of a model file. `key` identifies it for caching.
    Embedded {
        key: String,
        image: Arc<image::RgbaImage>,
    },
}

impl TextureSource {
    pub fn key(&self) -> &str {
        match self {
            TextureSource::File(path) => path,
            TextureSource::Embedded { key, .. } => key,
        }
    }
}

impl PartialEq for TextureSource {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

/// A standard PBR-ish surface description.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub color: Vec3,
    pub emissive: Vec3,
    pub roughness: f32,
    pub metalness: f32,
    pub map: Option<TextureSource>,
    pub normal_map: Option<TextureSource>,
    pub roughness_map: Option<TextureSource>,
    pub metalness_map: Option<TextureSource>,
    pub ao_map: Option<TextureSource>,
    /// UV tiling of `map`; values above one repeat the image.
    pub map_repeat: Vec2,
    /// Rotation of `map` around the UV centre, in radians.
    pub map_rotation: f32,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Vec3::ONE,
            emissive: Vec3::ZERO,
            roughness: 1.0,
            metalness: 0.0,
            map: None,
            normal_map: None,
            roughness_map: None,
            metalness_map: None,
            ao_map: None,
            map_repeat: Vec2::ONE,
            map_rotation: 0.0,
            double_sided: false,
        }
    }
}

impl Material {
    pub fn standard(name: &str, hex: u32) -> Self {
        Self {
            name: name.to_string(),
            color: color_from_hex(hex),
            ..Self::default()
        }
    }
}

/// One draw-able piece of a mesh: triangle geometry plus its material.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub material: Material,
}

impl Primitive {
    #[cfg(test)]
    /// Axis-aligned box centred on the origin.
    pub fn cuboid(size: Vec3, material: Material) -> Self {
        let h = size * 0.5;
        // (normal, u axis, v axis) per face
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut primitive = Self {
            positions: Vec::with_capacity(24),
            normals: Vec::with_capacity(24),
            uvs: Vec::with_capacity(24),
            indices: Vec::with_capacity(36),
            material,
        };
        for (normal, u, v) in faces {
            let base = primitive.positions.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let corner = normal + u * su + v * sv;
                primitive.positions.push(corner * h);
                primitive.normals.push(normal);
                primitive.uvs.push(Vec2::new((su + 1.0) * 0.5, (1.0 - sv) * 0.5));
            }
            primitive
                .indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        primitive
    }

    /// Flat rectangle in the XY plane facing +Z, centred on the origin.
    pub fn plane(width: f32, height: f32, material: Material) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self {
            positions: vec![
                Vec3::new(-hw, -hh, 0.0),
                Vec3::new(hw, -hh, 0.0),
                Vec3::new(hw, hh, 0.0),
                Vec3::new(-hw, hh, 0.0),
            ],
            normals: vec![Vec3::Z; 4],
            uvs: vec![
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
            ],
            indices: vec![0, 1, 2, 2, 3, 0],
            material,
        }
    }

    /// Triangles in the primitive's local space.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.positions.get(tri[0] as usize)?,
                *self.positions.get(tri[1] as usize)?,
                *self.positions.get(tri[2] as usize)?,
            ])
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub primitives: Vec<Primitive>,
}

impl Mesh {
    pub fn single(primitive: Primitive) -> Self {
        Self {
            primitives: vec![primitive],
        }
    }

    pub fn materials_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.primitives.iter_mut().map(|p| &mut p.material)
    }
}

/// A node living in the scene arena.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub kind: Option<ItemKind>,
    pub can_retexture: bool,
    pub transform: Transform,
    pub mesh: Option<Mesh>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            can_retexture: false,
            transform: Transform::identity(),
            mesh: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_kind(mut self, kind: ItemKind, can_retexture: bool) -> Self {
        self.kind = Some(kind);
        self.can_retexture = can_retexture;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[cfg(test)]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_mesh(&self) -> bool {
        self.mesh.is_some()
    }
}

/// Detached node tree, as produced by the model loader, ready to be
/// instantiated into a scene any number of times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTemplate {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<Mesh>,
    pub children: Vec<NodeTemplate>,
}

impl NodeTemplate {
    pub fn group(name: &str, children: Vec<NodeTemplate>) -> Self {
        Self {
            name: name.to_string(),
            children,
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn mesh(name: &str, transform: Transform, mesh: Mesh) -> Self {
        Self {
            name: name.to_string(),
            transform,
            mesh: Some(mesh),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub sun_color: Vec3,
    pub sun_intensity: f32,
    /// The directional light shines from here towards the origin.
    pub sun_position: Vec3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::ONE,
            ambient_intensity: 0.4,
            sun_color: Vec3::ONE,
            sun_intensity: 1.0,
            sun_position: Vec3::new(5.0, 10.0, 5.0),
        }
    }
}

/// Result of a ray cast against scene geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// The mesh node whose triangle was struck.
    pub node: NodeId,
    pub distance: f32,
    pub point: Vec3,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<SceneNode>,
}

/// Represents the entire 3D scene.
#[derive(Debug)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    pub background: Vec3,
    pub lighting: Lighting,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates a scene holding only its root node.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(SceneNode::new("scene")),
            }],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            background: color_from_hex(0xeeeeee),
            lighting: Lighting::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(SceneNode::parent)
    }

    /// Adds a node under `parent`. A missing parent attaches it to the root.
    pub fn add(&mut self, parent: NodeId, mut node: SceneNode) -> NodeId {
        let parent = if self.contains(parent) { parent } else { self.root };
        node.parent = Some(parent);
        node.children.clear();
        let id = self.insert(node);
        if let Some(parent) = self.get_mut(parent) {
            parent.children.push(id);
        }
        id
    }

    /// Adds a node directly under the scene root.
    pub fn add_to_root(&mut self, node: SceneNode) -> NodeId {
        self.add(self.root, node)
    }

    /// Copies a template tree into the scene and returns the new subtree root.
    pub fn instantiate(&mut self, parent: NodeId, template: &NodeTemplate) -> NodeId {
        let mut node = SceneNode::new(template.name.clone()).with_transform(template.transform);
        node.mesh = template.mesh.clone();
        let id = self.add(parent, node);
        for child in &template.children {
            self.instantiate(id, child);
        }
        id
    }

    /// Removes a node with its whole subtree. Returns false if it was absent
    /// or is the root.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.contains(id) {
            return false;
        }
        if let Some(parent) = self.parent(id).and_then(|p| self.get_mut(p)) {
            parent.children.retain(|child| *child != id);
        }
        for node in self.descendants(id) {
            if let Some(slot) = self.slots.get_mut(node.index as usize) {
                slot.node = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(node.index);
            }
        }
        true
    }

    fn insert(&mut self, node: SceneNode) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// The node itself followed by all of its descendants, depth first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Every mesh node in the subtree rooted at `id`.
    pub fn mesh_descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|node| self.get(*node).is_some_and(SceneNode::is_mesh))
            .collect()
    }

    /// Local-to-world matrix, composed up to the root.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.get(c)) {
            matrix = node.transform.matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    /// World-space box around every vertex in the subtree.
    pub fn world_bounds(&self, id: NodeId) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for node_id in self.mesh_descendants(id) {
            let world = self.world_matrix(node_id);
            let Some(mesh) = self.get(node_id).and_then(|n| n.mesh.as_ref()) else {
                continue;
            };
            for primitive in &mesh.primitives {
                for position in &primitive.positions {
                    bounds.expand_to(world.transform_point3(*position));
                }
            }
        }
        bounds
    }

    /// Nearest hit against the meshes of the given subtrees.
    pub fn intersect(&self, roots: &[NodeId], ray: &Ray) -> Option<Hit> {
        let mut best: Option<Hit> = None;
        for root in roots {
            for node_id in self.mesh_descendants(*root) {
                if let Some(hit) = self.intersect_mesh(node_id, ray) {
                    if best.map_or(true, |b| hit.distance < b.distance) {
                        best = Some(hit);
                    }
                }
            }
        }
        best
    }

    fn intersect_mesh(&self, id: NodeId, ray: &Ray) -> Option<Hit> {
        let mesh = self.get(id)?.mesh.as_ref()?;
        let world = self.world_matrix(id);
        // A mirroring transform flips the winding.
        let mirrored = world.determinant() < 0.0;
        let mut nearest: Option<f32> = None;
        for primitive in &mesh.primitives {
            for [a, b, c] in primitive.triangles() {
                let (b, c) = if mirrored { (c, b) } else { (b, c) };
                let hit = ray_triangle(
                    ray,
                    world.transform_point3(a),
                    world.transform_point3(b),
                    world.transform_point3(c),
                    primitive.material.double_sided,
                );
                if let Some(t) = hit {
                    if nearest.map_or(true, |n| t < n) {
                        nearest = Some(t);
                    }
                }
            }
        }
        nearest.map(|distance| Hit {
            node: id,
            distance,
            point: ray.at(distance),
        })
    }

    /// Live nodes with their world matrices, for drawing.
    pub fn mesh_nodes(&self) -> Vec<(NodeId, Mat4)> {
        self.mesh_descendants(self.root)
            .into_iter()
            .map(|id| (id, self.world_matrix(id)))
            .collect()
    }
}
