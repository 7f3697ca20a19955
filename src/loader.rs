// Asynchronous glTF model loading

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::error::LoadError;
use crate::inventory::Placement;
use crate::math::Transform;
use crate::scene::{ItemKind, Material, Mesh, NodeTemplate, Primitive, TextureSource};

/// What to do with a model once it arrives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadPurpose {
    /// Part of the starting room, placed at a fixed spot.
    Furnish(Placement),
    /// Spawned from the inventory in front of the camera.
    Spawn,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub path: PathBuf,
    pub kind: ItemKind,
    pub purpose: LoadPurpose,
}

#[derive(Debug)]
pub struct LoadCompletion {
    pub request: LoadRequest,
    pub result: Result<NodeTemplate, LoadError>,
}

/// Runs imports on the blocking pool and hands completions back through a
/// channel, in whatever order they finish.
pub struct ModelLoader {
    handle: Handle,
    sender: UnboundedSender<LoadCompletion>,
    receiver: UnboundedReceiver<LoadCompletion>,
}

impl ModelLoader {
    pub fn new(handle: Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            handle,
            sender,
            receiver,
        }
    }

    /// Fire and forget. The completion shows up in [`ModelLoader::try_next`].
    pub fn request(&self, request: LoadRequest) {
        let sender = self.sender.clone();
        let handle = self.handle.clone();
        log::debug!("Loading {}", request.path.display());
        self.handle.spawn(async move {
            let path = request.path.clone();
            let result = match handle.spawn_blocking(move || load_model(&path)).await {
                Ok(result) => result,
                Err(err) => Err(LoadError::Task {
                    path: request.path.clone(),
                    reason: err.to_string(),
                }),
            };
            // The receiver only goes away on shutdown.
            let _ = sender.send(LoadCompletion { request, result });
        });
    }

    /// Next finished load, if any, without blocking.
    pub fn try_next(&mut self) -> Option<LoadCompletion> {
        match self.receiver.try_recv() {
            Ok(completion) => Some(completion),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    #[cfg(test)]
    /// Waits for the next finished load.
    pub async fn next(&mut self) -> Option<LoadCompletion> {
        self.receiver.recv().await
    }
}

/// Imports a `.glb`/`.gltf` file into a detached node tree. Every scene node
/// of the default scene becomes a child of one group named after the file.
pub fn load_model(path: &Path) -> Result<NodeTemplate, LoadError> {
    let (document, buffers, images) = gltf::import(path).map_err(|source| LoadError::Import {
        path: path.to_path_buf(),
        source,
    })?;

    let file_key = path.display().to_string();
    let textures: Vec<Option<Arc<image::RgbaImage>>> = images.iter().map(to_rgba).collect();
    let context = ImportContext {
        file_key: &file_key,
        buffers: &buffers,
        textures: &textures,
    };

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| LoadError::EmptyScene(path.to_path_buf()))?;
    let children: Vec<NodeTemplate> = scene.nodes().map(|node| context.node(&node)).collect();
    if children.is_empty() {
        return Err(LoadError::EmptyScene(path.to_path_buf()));
    }

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    log::info!("Loaded model {} ({} root nodes)", path.display(), children.len());
    Ok(NodeTemplate::group(&name, children))
}

struct ImportContext<'a> {
    file_key: &'a str,
    buffers: &'a [gltf::buffer::Data],
    textures: &'a [Option<Arc<image::RgbaImage>>],
}

impl ImportContext<'_> {
    fn node(&self, node: &gltf::Node) -> NodeTemplate {
        let (translation, rotation, scale) = node.transform().decomposed();
        let transform = Transform::new(
            Vec3::from(translation),
            Quat::from_array(rotation),
            Vec3::from(scale),
        );
        NodeTemplate {
            name: node.name().unwrap_or("node").to_string(),
            transform,
            mesh: node.mesh().map(|mesh| self.mesh(&mesh)),
            children: node.children().map(|child| self.node(&child)).collect(),
        }
    }

    fn mesh(&self, mesh: &gltf::Mesh) -> Mesh {
        let primitives = mesh
            .primitives()
            .filter(|p| p.mode() == gltf::mesh::Mode::Triangles)
            .filter_map(|p| self.primitive(&p))
            .collect();
        Mesh { primitives }
    }

    fn primitive(&self, primitive: &gltf::Primitive) -> Option<Primitive> {
        let reader = primitive.reader(|buffer| self.buffers.get(buffer.index()).map(|data| data.0.as_slice()));
        let positions: Vec<Vec3> = reader.read_positions()?.map(Vec3::from).collect();
        let normals = match reader.read_normals() {
            Some(normals) => normals.map(Vec3::from).collect(),
            None => vec![Vec3::Y; positions.len()],
        };
        let uvs = match reader.read_tex_coords(0) {
            Some(uvs) => uvs.into_f32().map(Vec2::from).collect(),
            None => vec![Vec2::ZERO; positions.len()],
        };
        let indices = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        Some(Primitive {
            positions,
            normals,
            uvs,
            indices,
            material: self.material(&primitive.material()),
        })
    }

    fn material(&self, material: &gltf::Material) -> Material {
        let pbr = material.pbr_metallic_roughness();
        let [r, g, b, _] = pbr.base_color_factor();
        Material {
            name: material.name().unwrap_or_default().to_string(),
            color: Vec3::new(r, g, b),
            emissive: Vec3::ZERO,
            roughness: pbr.roughness_factor(),
            metalness: pbr.metallic_factor(),
            map: pbr.base_color_texture().and_then(|info| self.texture(&info.texture())),
            normal_map: material.normal_texture().and_then(|info| self.texture(&info.texture())),
            roughness_map: pbr
                .metallic_roughness_texture()
                .and_then(|info| self.texture(&info.texture())),
            metalness_map: pbr
                .metallic_roughness_texture()
                .and_then(|info| self.texture(&info.texture())),
            ao_map: material.occlusion_texture().and_then(|info| self.texture(&info.texture())),
            double_sided: material.double_sided(),
            ..Material::default()
        }
    }

    fn texture(&self, texture: &gltf::Texture) -> Option<TextureSource> {
        let index = texture.source().index();
        let image = self.textures.get(index)?.clone()?;
        Some(TextureSource::Embedded {
            key: format!("{}#image{}", self.file_key, index),
            image,
        })
    }
}

fn to_rgba(data: &gltf::image::Data) -> Option<Arc<image::RgbaImage>> {
    use gltf::image::Format;

    let pixels: Vec<u8> = match data.format {
        Format::R8G8B8A8 => data.pixels.clone(),
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
            .collect(),
        Format::R8 => data.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        Format::R8G8 => data
            .pixels
            .chunks_exact(2)
            .flat_map(|la| [la[0], la[0], la[0], la[1]])
            .collect(),
        other => {
            log::warn!("Unsupported embedded texture format {:?}", other);
            return None;
        }
    };
    image::RgbaImage::from_raw(data.width, data.height, pixels).map(Arc::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str) -> LoadRequest {
        LoadRequest {
            path: PathBuf::from(path),
            kind: ItemKind::Sofa,
            purpose: LoadPurpose::Spawn,
        }
    }

    #[test]
    fn missing_file_is_an_import_error() {
        let err = load_model(Path::new("does/not/exist.glb")).unwrap_err();
        assert!(matches!(err, LoadError::Import { .. }));
        assert!(err.to_string().contains("exist.glb"));
    }

    #[tokio::test]
    async fn failed_load_still_completes() {
        let mut loader = ModelLoader::new(Handle::current());
        loader.request(request("nowhere/sofa.glb"));

        let completion = loader.next().await.unwrap();
        assert_eq!(completion.request, request("nowhere/sofa.glb"));
        assert!(completion.result.is_err());
        assert!(loader.try_next().is_none());
    }

    #[tokio::test]
    async fn every_request_completes_once() {
        let mut loader = ModelLoader::new(Handle::current());
        for name in ["a.glb", "b.glb", "c.glb"] {
            loader.request(request(name));
        }
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(loader.next().await.unwrap().request.path);
        }
        seen.sort();
        assert_eq!(
            seen,
            vec![PathBuf::from("a.glb"), PathBuf::from("b.glb"), PathBuf::from("c.glb")]
        );
    }

    #[test]
    fn rgb_pixels_gain_opaque_alpha() {
        let data = gltf::image::Data {
            pixels: vec![10, 20, 30, 40, 50, 60],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };
        let image = to_rgba(&data).unwrap();
        assert_eq!(image.as_raw(), &vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }
}
