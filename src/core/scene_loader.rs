// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::core::scene::{Camera, Environment, Instance, Material, Scene};
use crate::core::texture::ImageTexture;
use crate::io::obj_utils;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;
use crate::math::transform::Transform;

#[derive(Debug)]
pub enum SceneLoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
}

impl From<std::io::Error> for SceneLoadError {
    fn from(err: std::io::Error) -> Self {
        SceneLoadError::Io(err)
    }
}

/// Loads a scene description:
///
/// ```xml
/// <scene>
///   <camera origin="0 1 4" target="0 1 0" up="0 1 0" yfov="0.785" aspect="1.778"/>
///   <material id="white" kd="0.7 0.7 0.7" ks="0.04" rs="0.15" kd_texture="wood.png"/>
///   <material id="lamp" kd="0" ke="12 12 10"/>
///   <shape filename="mesh.obj" material="white">
///     <translate x="0" y="1" z="0"/>
///     <scale x="2" y="2" z="2"/>
///   </shape>
///   <environment emission="1 1 1" texture="sky.exr"/>
/// </scene>
/// ```
///
/// Mesh files are Wavefront OBJ; point and line primitives take their
/// world radius from the shape's optional `radius` attribute.
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, SceneLoadError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_scene(&xml, base_dir)
}

struct PendingShape {
    filename: String,
    material: String,
    radius: Float,
    translate: Vector3f,
    scale: Vector3f,
}

struct Loader {
    scene: Scene,
    materials: HashMap<String, usize>,
    textures: HashMap<String, usize>,
    pending: Option<PendingShape>,
}

pub fn parse_scene(xml: &str, base_dir: &Path) -> Result<Scene, SceneLoadError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut loader = Loader {
        scene: Scene::new(),
        materials: HashMap::new(),
        textures: HashMap::new(),
        pending: None,
    };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => loader.handle_element(&e, false, base_dir)?,
            Ok(Event::Empty(e)) => loader.handle_element(&e, true, base_dir)?,
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"shape" {
                    loader.finish_shape(base_dir)?;
                }
            }
            Ok(_) => {}
            Err(err) => {
                return Err(SceneLoadError::Parse(format!(
                    "xml error at byte {}: {}",
                    reader.buffer_position(),
                    err
                )));
            }
        }
        buf.clear();
    }

    if loader.scene.cameras().is_empty() {
        return Err(SceneLoadError::MissingField("camera"));
    }

    let mut scene = loader.scene;
    scene.build_bvh();
    log::info!(
        "loaded scene: {} instances, {} environments, {} cameras",
        scene.instances().len(),
        scene.environments().len(),
        scene.cameras().len()
    );
    Ok(scene)
}

impl Loader {
    fn handle_element(&mut self, e: &BytesStart, is_empty: bool, base_dir: &Path)
        -> Result<(), SceneLoadError> {
        let attrs = attr_map(e);
        match e.name().as_ref() {
            b"camera" => {
                let origin = parse_vec3(attrs.get("origin").ok_or(SceneLoadError::MissingField("camera origin"))?)?;
                let target = parse_vec3(attrs.get("target").ok_or(SceneLoadError::MissingField("camera target"))?)?;
                let up = match attrs.get("up") {
                    Some(up) => parse_vec3(up)?,
                    None => Vector3f::new(0.0, 1.0, 0.0),
                };
                let yfov = match attrs.get("yfov") {
                    Some(yfov) => parse_float(yfov)?,
                    None => 0.785,
                };
                let aspect = match attrs.get("aspect") {
                    Some(aspect) => parse_float(aspect)?,
                    None => 16.0 / 9.0,
                };
                self.scene.add_camera(Camera::look_at(origin, target, up, yfov, aspect));
            }
            b"material" => {
                let id = attrs.get("id").ok_or(SceneLoadError::MissingField("material id"))?.clone();
                let mut material = Material::default();
                if let Some(kd) = attrs.get("kd") {
                    material.kd = parse_spectrum(kd)?;
                }
                if let Some(ks) = attrs.get("ks") {
                    material.ks = parse_spectrum(ks)?;
                }
                if let Some(ke) = attrs.get("ke") {
                    material.ke = parse_spectrum(ke)?;
                }
                if let Some(rs) = attrs.get("rs") {
                    material.rs = parse_float(rs)?;
                }
                if let Some(filename) = attrs.get("kd_texture") {
                    material.kd_texture = Some(self.load_texture(filename, base_dir)?);
                }
                if let Some(filename) = attrs.get("ke_texture") {
                    material.ke_texture = Some(self.load_texture(filename, base_dir)?);
                }
                let index = self.scene.add_material(material);
                self.materials.insert(id, index);
            }
            b"shape" => {
                let filename = attrs.get("filename")
                    .ok_or(SceneLoadError::MissingField("shape filename"))?
                    .clone();
                let material = attrs.get("material")
                    .ok_or(SceneLoadError::MissingField("shape material"))?
                    .clone();
                let radius = match attrs.get("radius") {
                    Some(radius) => parse_float(radius)?,
                    None => 1e-3,
                };
                self.pending = Some(PendingShape {
                    filename,
                    material,
                    radius,
                    translate: Vector3f::zeros(),
                    scale: Vector3f::new(1.0, 1.0, 1.0),
                });
                if is_empty {
                    self.finish_shape(base_dir)?;
                }
            }
            b"translate" => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.translate += parse_xyz(&attrs, 0.0)?;
                }
            }
            b"scale" => {
                if let Some(pending) = self.pending.as_mut() {
                    let s = parse_xyz(&attrs, 1.0)?;
                    pending.scale = Vector3f::new(
                        pending.scale.x * s.x,
                        pending.scale.y * s.y,
                        pending.scale.z * s.z,
                    );
                }
            }
            b"environment" => {
                let emission = match attrs.get("emission") {
                    Some(emission) => parse_spectrum(emission)?,
                    None => RGBSpectrum::white(),
                };
                let texture = match attrs.get("texture") {
                    Some(filename) => Some(self.load_texture(filename, base_dir)?),
                    None => None,
                };
                self.scene.add_environment(Environment { emission, texture });
            }
            _ => {}
        }
        Ok(())
    }

    fn finish_shape(&mut self, base_dir: &Path) -> Result<(), SceneLoadError> {
        let pending = match self.pending.take() {
            Some(pending) => pending,
            None => return Ok(()),
        };

        let material = *self.materials.get(&pending.material).ok_or_else(|| {
            SceneLoadError::Parse(format!("unknown material: {}", pending.material))
        })?;

        let to_world = Transform::from_translate_scale(pending.translate, pending.scale);
        let path = base_dir.join(&pending.filename);
        let shape = obj_utils::load_shape_from_file(&path, &to_world, pending.radius)
            .map_err(|err| SceneLoadError::Parse(format!(
                "failed to load {}: {}",
                path.display(),
                err
            )))?;

        let shape = self.scene.add_shape(shape);
        self.scene.add_instance(Instance { shape, material });
        Ok(())
    }

    fn load_texture(&mut self, filename: &str, base_dir: &Path)
        -> Result<usize, SceneLoadError> {
        if let Some(&index) = self.textures.get(filename) {
            return Ok(index);
        }
        let path = base_dir.join(filename);
        let texture = ImageTexture::from_file(&path.to_string_lossy())
            .map_err(SceneLoadError::Parse)?;
        let index = self.scene.add_texture(texture);
        self.textures.insert(filename.to_string(), index);
        Ok(index)
    }
}

fn attr_map(e: &BytesStart) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value().unwrap_or_default().to_string();
        map.insert(key, value);
    }
    map
}

fn parse_float(value: &str) -> Result<Float, SceneLoadError> {
    value.trim().parse::<Float>().map_err(|_| {
        SceneLoadError::Parse(format!("expected a number, got: {}", value))
    })
}

fn parse_vec3(value: &str) -> Result<Vector3f, SceneLoadError> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(SceneLoadError::Parse(format!(
            "expected three numbers, got: {}",
            value
        )));
    }
    Ok(Vector3f::new(
        parse_float(parts[0])?,
        parse_float(parts[1])?,
        parse_float(parts[2])?,
    ))
}

// Spectra accept either "v" or "r g b".
fn parse_spectrum(value: &str) -> Result<RGBSpectrum, SceneLoadError> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.len() {
        1 => Ok(RGBSpectrum::gray(parse_float(parts[0])?)),
        3 => Ok(RGBSpectrum::new(
            parse_float(parts[0])?,
            parse_float(parts[1])?,
            parse_float(parts[2])?,
        )),
        _ => Err(SceneLoadError::Parse(format!(
            "expected one or three numbers, got: {}",
            value
        ))),
    }
}

fn parse_xyz(attrs: &HashMap<String, String>, default: Float)
    -> Result<Vector3f, SceneLoadError> {
    let mut result = Vector3f::new(default, default, default);
    if let Some(x) = attrs.get("x") {
        result.x = parse_float(x)?;
    }
    if let Some(y) = attrs.get("y") {
        result.y = parse_float(y)?;
    }
    if let Some(z) = attrs.get("z") {
        result.z = parse_float(z)?;
    }
    Ok(result)
}
