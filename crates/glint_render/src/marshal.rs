//! Flattening a scene into the backend's named-parameter namespace.
//!
//! The names form a dotted path with bracket indices and must match the
//! shader's `sceneData` declaration exactly:
//!
//! ```text
//! sceneData.width, sceneData.height, sceneData.depth
//! sceneData.camera.{position,defocusDiskU,defocusDiskV,pixelDeltaU,pixelDeltaV,pixel00Loc,defocusAngle}
//! sceneData.list.spheres[i].material.{albedo,ir,roughness,type,scale}
//! sceneData.list.spheres[i].{center,radius}
//! sceneData.list.quads[i].material.{albedo,ir,roughness,type,scale}
//! sceneData.list.quads[i].{Q,u,v,w,normal,D}
//! ```
//!
//! Every slot up to the schema capacity is emitted, populated or not.

use glint_core::{FlatMaterial, Quad, Scene, SceneSchema};

use crate::{BackendError, Binding, ParamValue, RenderBackend};

/// Per-batch sample count parameter.
pub const NUM_SAMPLES: &str = "numSamples";
/// Per-batch random seed parameter.
pub const RNG_STATE: &str = "rngState";

const SCENE_SCALARS: usize = 3;
const CAMERA_FIELDS: usize = 7;
const MATERIAL_FIELDS: usize = 5;
const SPHERE_FIELDS: usize = MATERIAL_FIELDS + 2;
const QUAD_FIELDS: usize = MATERIAL_FIELDS + 6;

/// Number of bindings `marshal` emits for a schema.
pub fn binding_count(schema: SceneSchema) -> usize {
    SCENE_SCALARS + CAMERA_FIELDS + schema.spheres * SPHERE_FIELDS + schema.quads * QUAD_FIELDS
}

struct Bindings(Vec<Binding>);

impl Bindings {
    fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.push(Binding::new(name, value));
    }

    fn material(&mut self, prefix: &str, material: &FlatMaterial) {
        self.set(format!("{prefix}.material.albedo"), material.albedo);
        self.set(format!("{prefix}.material.ir"), material.ir);
        self.set(format!("{prefix}.material.roughness"), material.roughness);
        self.set(format!("{prefix}.material.type"), material.kind);
        self.set(format!("{prefix}.material.scale"), material.scale);
    }
}

/// Flatten `scene` into ordered bindings for a `width` x `height` target.
pub fn marshal(scene: &Scene, width: u32, height: u32) -> Vec<Binding> {
    let schema = scene.schema();
    let mut out = Bindings(Vec::with_capacity(binding_count(schema)));

    out.set("sceneData.width", width as i32);
    out.set("sceneData.height", height as i32);
    out.set("sceneData.depth", scene.depth as i32);

    let camera = &scene.camera;
    out.set("sceneData.camera.position", camera.position);
    out.set("sceneData.camera.defocusDiskU", camera.defocus_disk_u);
    out.set("sceneData.camera.defocusDiskV", camera.defocus_disk_v);
    out.set("sceneData.camera.pixelDeltaU", camera.pixel_delta_u);
    out.set("sceneData.camera.pixelDeltaV", camera.pixel_delta_v);
    out.set("sceneData.camera.pixel00Loc", camera.pixel00_loc);
    out.set("sceneData.camera.defocusAngle", camera.defocus_angle);

    for i in 0..schema.spheres {
        let prefix = format!("sceneData.list.spheres[{i}]");
        match scene.sphere(i) {
            Some(sphere) => {
                out.material(&prefix, &sphere.material.flatten());
                out.set(format!("{prefix}.center"), sphere.center);
                out.set(format!("{prefix}.radius"), sphere.radius);
            }
            None => {
                out.material(&prefix, &FlatMaterial::default());
                out.set(format!("{prefix}.center"), glam::Vec3::ZERO);
                out.set(format!("{prefix}.radius"), 0.0_f32);
            }
        }
    }

    let inert = Quad::inert();
    for i in 0..schema.quads {
        let prefix = format!("sceneData.list.quads[{i}]");
        let quad = scene.quad(i).unwrap_or(&inert);
        out.material(&prefix, &quad.material.flatten());
        out.set(format!("{prefix}.Q"), quad.q());
        out.set(format!("{prefix}.u"), quad.u());
        out.set(format!("{prefix}.v"), quad.v());
        out.set(format!("{prefix}.w"), quad.w());
        out.set(format!("{prefix}.normal"), quad.normal());
        out.set(format!("{prefix}.D"), quad.d());
    }

    debug_assert_eq!(out.0.len(), binding_count(schema));
    out.0
}

/// Push `bindings` to `backend` in order, stopping at the first failure.
pub fn upload<B: RenderBackend + ?Sized>(
    backend: &mut B,
    bindings: &[Binding],
) -> Result<(), BackendError> {
    for binding in bindings {
        backend.bind(&binding.name, binding.value)?;
    }
    Ok(())
}
