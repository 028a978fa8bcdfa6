//! CPU shadow of a WGSL uniform block, addressed by parameter name.
//!
//! Offsets follow the WGSL uniform address space rules for the types the
//! grammar uses: `i32`/`f32` align to 4, `vec3<f32>` aligns to 16 and
//! occupies 12 bytes, and every struct or array element starts on a 16-byte
//! boundary and is padded to a multiple of 16. A change of dotted parent
//! path between two consecutive names is exactly a struct boundary, so the
//! layout can be derived from the ordered binding list alone.

use std::collections::HashMap;

use crate::{BackendError, Binding, ParamKind, ParamValue};

const STRUCT_ALIGN: usize = 16;

#[derive(Debug, Clone, Copy)]
struct Slot {
    offset: usize,
    kind: ParamKind,
}

fn align_of(kind: ParamKind) -> usize {
    match kind {
        ParamKind::Int | ParamKind::Float => 4,
        ParamKind::Vec3 => 16,
    }
}

fn size_of(kind: ParamKind) -> usize {
    match kind {
        ParamKind::Int | ParamKind::Float => 4,
        ParamKind::Vec3 => 12,
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

fn parent(name: &str) -> &str {
    name.rsplit_once('.').map_or("", |(parent, _)| parent)
}

/// Named view over the bytes of one uniform buffer.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    slots: HashMap<String, Slot>,
    data: Vec<u8>,
    dirty: bool,
}

impl UniformBlock {
    /// Lay out a block holding `bindings` in declaration order.
    ///
    /// `names` with a common prefix must be contiguous, as `marshal`
    /// produces them. Values are ignored; only names and kinds matter.
    pub fn from_bindings<'a>(bindings: impl IntoIterator<Item = &'a Binding>) -> Self {
        let mut slots = HashMap::new();
        let mut offset = 0;
        let mut current_parent: Option<String> = None;

        for binding in bindings {
            let kind = binding.value.kind();
            let this_parent = parent(&binding.name);
            if current_parent.as_deref().is_some_and(|p| p != this_parent) {
                offset = align_up(offset, STRUCT_ALIGN);
            }
            if current_parent.as_deref() != Some(this_parent) {
                current_parent = Some(this_parent.to_string());
            }

            offset = align_up(offset, align_of(kind));
            slots.insert(binding.name.clone(), Slot { offset, kind });
            offset += size_of(kind);
        }

        Self {
            slots,
            data: vec![0; align_up(offset.max(1), STRUCT_ALIGN)],
            dirty: true,
        }
    }

    /// Check if the block has a slot for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Byte offset of `name`, if present.
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.slots.get(name).map(|slot| slot.offset)
    }

    /// Total size in bytes, a multiple of 16.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Write `value` into the slot for `name`.
    pub fn write(&mut self, name: &str, value: ParamValue) -> Result<(), BackendError> {
        let slot = *self
            .slots
            .get(name)
            .ok_or_else(|| BackendError::UnknownParameter(name.to_string()))?;
        if slot.kind != value.kind() {
            return Err(BackendError::TypeMismatch {
                name: name.to_string(),
                expected: slot.kind,
                found: value.kind(),
            });
        }

        let range = slot.offset..slot.offset + size_of(slot.kind);
        match value {
            ParamValue::Int(v) => self.data[range].copy_from_slice(bytemuck::bytes_of(&v)),
            ParamValue::Float(v) => self.data[range].copy_from_slice(bytemuck::bytes_of(&v)),
            ParamValue::Vec3(v) => {
                self.data[range].copy_from_slice(bytemuck::bytes_of(&v.to_array()))
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Return true once after any write, then reset.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::{marshal, NUM_SAMPLES, RNG_STATE};
    use glam::Vec3;
    use glint_core::{Camera, Scene, SceneSchema};

    fn scene_block() -> UniformBlock {
        let scene = Scene::new(SceneSchema::default(), 1, Camera::default());
        UniformBlock::from_bindings(&marshal(&scene, 1, 1))
    }

    #[test]
    fn test_scene_layout_matches_wgsl() {
        let block = scene_block();
        let offset = |name: &str| block.offset_of(name).unwrap();

        assert_eq!(offset("sceneData.width"), 0);
        assert_eq!(offset("sceneData.height"), 4);
        assert_eq!(offset("sceneData.depth"), 8);
        assert_eq!(offset("sceneData.camera.position"), 16);
        assert_eq!(offset("sceneData.camera.defocusDiskU"), 32);
        assert_eq!(offset("sceneData.camera.pixel00Loc"), 96);
        assert_eq!(offset("sceneData.camera.defocusAngle"), 108);

        // Sphere: material (32) + center + radius = 48 bytes
        assert_eq!(offset("sceneData.list.spheres[0].material.albedo"), 112);
        assert_eq!(offset("sceneData.list.spheres[0].material.ir"), 124);
        assert_eq!(offset("sceneData.list.spheres[0].material.roughness"), 128);
        assert_eq!(offset("sceneData.list.spheres[0].material.type"), 132);
        assert_eq!(offset("sceneData.list.spheres[0].material.scale"), 136);
        assert_eq!(offset("sceneData.list.spheres[0].center"), 144);
        assert_eq!(offset("sceneData.list.spheres[0].radius"), 156);
        assert_eq!(offset("sceneData.list.spheres[1].material.albedo"), 160);

        // Quad: material (32) + Q, u, v, w, normal + D = 112 bytes
        let quads = 112 + 4 * 48;
        assert_eq!(offset("sceneData.list.quads[0].material.albedo"), quads);
        assert_eq!(offset("sceneData.list.quads[0].Q"), quads + 32);
        assert_eq!(offset("sceneData.list.quads[0].normal"), quads + 96);
        assert_eq!(offset("sceneData.list.quads[0].D"), quads + 108);
        assert_eq!(offset("sceneData.list.quads[1].material.albedo"), quads + 112);

        assert_eq!(block.size(), quads + 7 * 112);
    }

    #[test]
    fn test_batch_layout() {
        let block = UniformBlock::from_bindings(&[
            Binding::new(NUM_SAMPLES, 0),
            Binding::new(RNG_STATE, 0.0_f32),
        ]);
        assert_eq!(block.offset_of(NUM_SAMPLES), Some(0));
        assert_eq!(block.offset_of(RNG_STATE), Some(4));
        assert_eq!(block.size(), 16);
    }

    #[test]
    fn test_write_places_bytes() {
        let mut block = scene_block();
        assert!(block.take_dirty());
        assert!(!block.take_dirty());

        block
            .write("sceneData.camera.position", Vec3::new(1.0, 2.0, 3.0).into())
            .unwrap();
        block.write("sceneData.depth", 7.into()).unwrap();
        assert!(block.take_dirty());

        let position: [f32; 3] = bytemuck::pod_read_unaligned(&block.bytes()[16..28]);
        assert_eq!(position, [1.0, 2.0, 3.0]);
        let depth: i32 = bytemuck::pod_read_unaligned(&block.bytes()[8..12]);
        assert_eq!(depth, 7);
    }

    #[test]
    fn test_write_rejects_unknown_and_mistyped() {
        let mut block = scene_block();

        let err = block.write("sceneData.fog", 1.0_f32.into()).unwrap_err();
        assert!(matches!(err, BackendError::UnknownParameter(name) if name == "sceneData.fog"));

        let err = block.write("sceneData.depth", 1.0_f32.into()).unwrap_err();
        assert!(matches!(
            err,
            BackendError::TypeMismatch {
                expected: ParamKind::Int,
                found: ParamKind::Float,
                ..
            }
        ));
    }
}
