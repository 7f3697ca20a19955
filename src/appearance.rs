// Texture catalog and material swapping

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::scene::{ItemKind, NodeId, Scene, TextureSource};

/// Walls tile their texture along their length instead of stretching it.
pub const WALL_TEXTURE_REPEAT: Vec2 = Vec2::new(4.0, 1.0);

/// Kind to ordered list of texture paths, relative to the asset root.
#[derive(Debug, Clone)]
pub struct AppearanceCatalog {
    entries: HashMap<ItemKind, Vec<String>>,
}

impl Default for AppearanceCatalog {
    fn default() -> Self {
        let mut catalog = Self {
            entries: HashMap::new(),
        };
        catalog.insert(ItemKind::Sofa, &["sofa_putih", "sofa_coklat", "sofa_abu"]);
        catalog.insert(ItemKind::Table, &["meja_kayu", "meja_putih", "meja_hitam"]);
        catalog.insert(ItemKind::Tv, &["tv_hitam", "tv_silver", "tv_putih"]);
        catalog.insert(ItemKind::Rug, &["karpet_merah", "karpet_biru", "karpet_hijau"]);
        catalog.insert(ItemKind::Wall, &["dinding_krem", "dinding_bata", "dinding_kayu"]);
        catalog
    }
}

impl AppearanceCatalog {
    fn insert(&mut self, kind: ItemKind, names: &[&str]) {
        let paths = names
            .iter()
            .map(|name| format!("texture/{name}.jpg"))
            .collect();
        self.entries.insert(kind, paths);
    }

    /// Texture choices for a kind, in menu order.
    pub fn choices(&self, kind: ItemKind) -> Option<&[String]> {
        self.entries.get(&kind).map(Vec::as_slice)
    }
}

/// Replaces the image of every material in the subtree of `root` with the
/// texture at `path`. Returns how many materials were touched.
///
/// Tint goes back to white and the detail maps are dropped, since the flat
/// texture carries the whole look. Wall nodes tile the image 4×1.
pub fn apply_texture(scene: &mut Scene, root: NodeId, path: &str) -> usize {
    let Some(node) = scene.get(root) else {
        return 0;
    };
    let repeat = if node.kind == Some(ItemKind::Wall) {
        WALL_TEXTURE_REPEAT
    } else {
        Vec2::ONE
    };

    let mut touched = 0;
    for id in scene.mesh_descendants(root) {
        let Some(mesh) = scene.get_mut(id).and_then(|n| n.mesh.as_mut()) else {
            continue;
        };
        for material in mesh.materials_mut() {
            material.map = Some(TextureSource::File(path.to_string()));
            material.color = Vec3::ONE;
            material.emissive = Vec3::ZERO;
            material.normal_map = None;
            material.roughness_map = None;
            material.metalness_map = None;
            material.ao_map = None;
            material.map_repeat = repeat;
            material.map_rotation = 0.0;
            touched += 1;
        }
    }
    log::info!("Applied texture {path} to {touched} material(s)");
    touched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, Mesh, Primitive, SceneNode};

    fn two_part_node(scene: &mut Scene, kind: ItemKind) -> NodeId {
        let root = scene.add_to_root(SceneNode::new(kind.slug()).with_kind(kind, true));
        let mut tinted = Material::standard("frame", 0x884422);
        tinted.normal_map = Some(TextureSource::File("texture/normal.png".into()));
        tinted.ao_map = Some(TextureSource::File("texture/ao.png".into()));
        tinted.emissive = Vec3::splat(0.2);
        let mesh = Mesh {
            primitives: vec![
                Primitive::cuboid(Vec3::ONE, tinted.clone()),
                Primitive::cuboid(Vec3::ONE, tinted),
            ],
        };
        let child = scene.add(root, SceneNode::new("part"));
        scene.add(child, SceneNode::new("leaf").with_mesh(mesh));
        root
    }

    #[test]
    fn catalog_lists_three_choices_per_kind() {
        let catalog = AppearanceCatalog::default();
        for kind in ItemKind::FURNITURE {
            assert_eq!(catalog.choices(kind).map(<[String]>::len), Some(3));
        }
        assert_eq!(
            catalog.choices(ItemKind::Sofa).unwrap()[0],
            "texture/sofa_putih.jpg"
        );
    }

    #[test]
    fn swap_resets_material_state() {
        let mut scene = Scene::new();
        let sofa = two_part_node(&mut scene, ItemKind::Sofa);

        assert_eq!(apply_texture(&mut scene, sofa, "texture/sofa_abu.jpg"), 2);

        for id in scene.mesh_descendants(sofa) {
            for primitive in &scene.get(id).unwrap().mesh.as_ref().unwrap().primitives {
                let m = &primitive.material;
                assert_eq!(m.map, Some(TextureSource::File("texture/sofa_abu.jpg".into())));
                assert_eq!(m.color, Vec3::ONE);
                assert_eq!(m.emissive, Vec3::ZERO);
                assert!(m.normal_map.is_none() && m.ao_map.is_none());
                assert_eq!(m.map_repeat, Vec2::ONE);
            }
        }
    }

    #[test]
    fn walls_tile_horizontally() {
        let mut scene = Scene::new();
        let wall = two_part_node(&mut scene, ItemKind::Wall);
        apply_texture(&mut scene, wall, "texture/dinding_bata.jpg");
        let leaf = scene.mesh_descendants(wall)[0];
        let material = &scene.get(leaf).unwrap().mesh.as_ref().unwrap().primitives[0].material;
        assert_eq!(material.map_repeat, WALL_TEXTURE_REPEAT);
    }

    #[test]
    fn missing_node_is_a_no_op() {
        let mut scene = Scene::new();
        let sofa = two_part_node(&mut scene, ItemKind::Sofa);
        scene.remove(sofa);
        assert_eq!(apply_texture(&mut scene, sofa, "texture/sofa_abu.jpg"), 0);
    }
}
