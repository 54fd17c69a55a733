//! glTF binary parsing for character assets.
//!
//! Extracts a single merged render mesh (all primitives, node transforms
//! baked in), the first base-color texture, the animation clip list, and
//! per-vertex morph target displacements.

use glam::{Mat3, Mat4, Vec3};
use tracing::info;

use crate::asset::{AssetError, ParsedCharacter, TextureData};
use crate::model::{Clip, MorphTarget};
use crate::utils::Vertex;

#[derive(serde::Deserialize, Default)]
struct MeshExtras {
    #[serde(rename = "targetNames", default)]
    target_names: Vec<String>,
}

struct MeshAccumulator {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    morph_deltas: Vec<Vec<[f32; 3]>>,
    morph_names: Vec<String>,
    base_color: [f32; 4],
    texture_image: Option<usize>,
}

pub fn parse_character(name: &str, bytes: &[u8]) -> Result<ParsedCharacter, AssetError> {
    let (document, buffers, images) = gltf::import_slice(bytes)?;

    let mut acc = MeshAccumulator {
        vertices: Vec::new(),
        indices: Vec::new(),
        morph_deltas: Vec::new(),
        morph_names: Vec::new(),
        base_color: [1.0, 1.0, 1.0, 1.0],
        texture_image: None,
    };

    for scene in document.scenes() {
        for node in scene.nodes() {
            process_node(&node, Mat4::IDENTITY, &buffers, &mut acc);
        }
    }

    if acc.vertices.is_empty() {
        return Err(AssetError::NoGeometry(name.to_string()));
    }

    let clips: Vec<Clip> = document
        .animations()
        .enumerate()
        .map(|(i, animation)| {
            let mut duration = 0.0f32;
            for channel in animation.channels() {
                let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
                if let Some(inputs) = reader.read_inputs() {
                    for t in inputs {
                        duration = duration.max(t);
                    }
                }
            }
            Clip {
                name: animation
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("clip {i}")),
                duration,
            }
        })
        .collect();

    let texture = acc
        .texture_image
        .and_then(|idx| images.get(idx))
        .and_then(decode_rgba8);

    let morph_targets = acc
        .morph_deltas
        .into_iter()
        .enumerate()
        .map(|(i, position_deltas)| MorphTarget {
            name: acc
                .morph_names
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("morph {i}")),
            position_deltas,
        })
        .collect::<Vec<_>>();

    info!(
        %name,
        vertices = acc.vertices.len(),
        clips = clips.len(),
        morphs = morph_targets.len(),
        textured = texture.is_some(),
        "parsed character asset"
    );

    Ok(ParsedCharacter {
        name: name.to_string(),
        vertices: acc.vertices,
        indices: acc.indices,
        base_color: acc.base_color,
        texture,
        clips,
        morph_targets,
    })
}

fn process_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    acc: &mut MeshAccumulator,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        if acc.morph_names.is_empty() {
            if let Some(raw) = mesh.extras().as_deref() {
                if let Ok(extras) = serde_json::from_str::<MeshExtras>(raw.get()) {
                    acc.morph_names = extras.target_names;
                }
            }
        }

        for primitive in mesh.primitives() {
            merge_primitive(&primitive, world, buffers, acc);
        }
    }

    for child in node.children() {
        process_node(&child, world, buffers, acc);
    }
}

fn merge_primitive(
    primitive: &gltf::Primitive,
    world: Mat4,
    buffers: &[gltf::buffer::Data],
    acc: &mut MeshAccumulator,
) {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let Some(positions) = reader.read_positions() else {
        return;
    };
    let positions: Vec<[f32; 3]> = positions.collect();
    let base = acc.vertices.len() as u32;
    let linear = Mat3::from_mat4(world);

    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|iter| iter.collect())
        .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);
    let colors: Vec<[f32; 4]> = reader
        .read_colors(0)
        .map(|c| c.into_rgba_f32().collect())
        .unwrap_or_else(|| vec![[1.0, 1.0, 1.0, 1.0]; positions.len()]);
    let uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect())
        .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

    for i in 0..positions.len() {
        let pos = world.transform_point3(Vec3::from_array(positions[i]));
        let normal = (linear * Vec3::from_array(normals[i])).normalize_or_zero();
        acc.vertices.push(Vertex {
            pos: pos.to_array(),
            normal: normal.to_array(),
            color: colors[i],
            uv: uvs[i],
        });
    }

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());
    acc.indices.extend(indices.iter().map(|i| i + base));

    // Morph displacements for this primitive, aligned to the merged vertex
    // list. Targets other primitives lack are padded with zeros below.
    for (k, (target_positions, _, _)) in reader.read_morph_targets().enumerate() {
        if acc.morph_deltas.len() <= k {
            acc.morph_deltas.push(vec![[0.0; 3]; base as usize]);
        }
        let deltas = &mut acc.morph_deltas[k];
        match target_positions {
            Some(displacements) => {
                deltas.extend(
                    displacements.map(|d| (linear * Vec3::from_array(d)).to_array()),
                );
            }
            None => deltas.extend(std::iter::repeat([0.0; 3]).take(positions.len())),
        }
    }
    let total = acc.vertices.len();
    for deltas in &mut acc.morph_deltas {
        deltas.resize(total, [0.0; 3]);
    }

    let material = primitive.material();
    let pbr = material.pbr_metallic_roughness();
    if acc.texture_image.is_none() {
        acc.base_color = pbr.base_color_factor();
        acc.texture_image = pbr
            .base_color_texture()
            .map(|info| info.texture().source().index());
    }
}

fn decode_rgba8(data: &gltf::image::Data) -> Option<TextureData> {
    use gltf::image::Format;

    let pixels: Vec<u8> = match data.format {
        Format::R8G8B8A8 => data.pixels.clone(),
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => data
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => data.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        // 16/32-bit formats do not appear in the supported character assets.
        _ => return None,
    };

    Some(TextureData {
        width: data.width,
        height: data.height,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_garbage_bytes() {
        let result = parse_character("broken", &[0u8; 16]);
        assert!(matches!(result, Err(AssetError::Gltf(_))));
    }

    #[test]
    fn rgb_decodes_to_rgba_with_opaque_alpha() {
        let data = gltf::image::Data {
            pixels: vec![10, 20, 30, 40, 50, 60],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };
        let tex = decode_rgba8(&data).unwrap();
        assert_eq!(tex.pixels, vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn grayscale_expands_to_rgba() {
        let data = gltf::image::Data {
            pixels: vec![128],
            format: gltf::image::Format::R8,
            width: 1,
            height: 1,
        };
        let tex = decode_rgba8(&data).unwrap();
        assert_eq!(tex.pixels, vec![128, 128, 128, 255]);
    }
}
