use std::collections::HashMap;
use std::fs;
use std::path::Path;

use wavefront_obj::{obj, ParseError};
use std::fmt;

use crate::core::shape::{Shape, Topology};
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::transform::Transform;

#[derive(Debug)]
pub enum ObjLoadError {
    Io(std::io::Error),
    Parse(ParseError),
    Empty,
}

impl From<std::io::Error> for ObjLoadError {
    fn from(err: std::io::Error) -> Self {
        ObjLoadError::Io(err)
    }
}

impl From<ParseError> for ObjLoadError {
    fn from(err: ParseError) -> Self {
        ObjLoadError::Parse(err)
    }
}

impl fmt::Display for ObjLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjLoadError::Io(err) => write!(f, "io error: {}", err),
            ObjLoadError::Parse(err) => write!(f, "parse error: {}", err),
            ObjLoadError::Empty => write!(f, "obj contains no geometry"),
        }
    }
}

impl std::error::Error for ObjLoadError {}

/// Loads an OBJ file into one shape, baking `to_world` into the vertex
/// data. The element kind follows what the file contains, triangles
/// winning over lines over points when a file mixes them.
pub fn load_shape_from_file<P: AsRef<Path>>(path: P,
                                            to_world: &Transform,
                                            default_radius: Float)
    -> Result<Shape, ObjLoadError> {
    let data = fs::read_to_string(path)?;
    load_shape_from_str(&data, to_world, default_radius)
}

pub fn load_shape_from_str(input: &str,
                           to_world: &Transform,
                           default_radius: Float)
    -> Result<Shape, ObjLoadError> {
    let triangulated = triangulate_faces(input);
    let obj_set = obj::parse(triangulated)?;

    let mut builder = VertexBuilder::new();
    let mut triangles: Vec<[u32; 3]> = Vec::new();
    let mut lines: Vec<[u32; 2]> = Vec::new();
    let mut points: Vec<u32> = Vec::new();

    for object in &obj_set.objects {
        builder.begin_object();
        for geometry in &object.geometry {
            for shape in &geometry.shapes {
                match &shape.primitive {
                    obj::Primitive::Triangle(a, b, c) => {
                        triangles.push([
                            builder.resolve(object, *a, to_world),
                            builder.resolve(object, *b, to_world),
                            builder.resolve(object, *c, to_world),
                        ]);
                    }
                    obj::Primitive::Line(a, b) => {
                        lines.push([
                            builder.resolve(object, *a, to_world),
                            builder.resolve(object, *b, to_world),
                        ]);
                    }
                    obj::Primitive::Point(a) => {
                        points.push(builder.resolve(object, *a, to_world));
                    }
                }
            }
        }
    }

    let topology = if !triangles.is_empty() {
        Topology::Triangles(triangles)
    } else if !lines.is_empty() {
        Topology::Lines(lines)
    } else if !points.is_empty() {
        Topology::Points(points)
    } else {
        return Err(ObjLoadError::Empty);
    };

    let normals = if builder.missing_normals { Vec::new() } else { builder.normals };
    let radius = match topology {
        Topology::Triangles(_) => Vec::new(),
        _ => vec![default_radius * to_world.max_scale(); builder.positions.len()],
    };

    Ok(Shape::new(builder.positions, normals, builder.texcoords, radius, topology))
}

struct VertexBuilder {
    positions: Vec<Vector3f>,
    normals: Vec<Vector3f>,
    texcoords: Vec<Vector2f>,
    missing_normals: bool,
    remap: HashMap<(usize, Option<usize>, Option<usize>), u32>,
}

impl VertexBuilder {
    fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            missing_normals: false,
            remap: HashMap::new(),
        }
    }

    // OBJ indices are object-relative.
    fn begin_object(&mut self) {
        self.remap.clear();
    }

    fn resolve(&mut self, object: &obj::Object, vtn: obj::VTNIndex, to_world: &Transform) -> u32 {
        if let Some(&index) = self.remap.get(&vtn) {
            return index;
        }

        let (v, t, n) = vtn;
        let position = &object.vertices[v];
        self.positions.push(to_world.apply_point(Vector3f::new(
            position.x as Float,
            position.y as Float,
            position.z as Float,
        )));

        match t.and_then(|t| object.tex_vertices.get(t)) {
            Some(tc) => self.texcoords.push(Vector2f::new(tc.u as Float, tc.v as Float)),
            None => self.texcoords.push(Vector2f::zeros()),
        }

        match n.and_then(|n| object.normals.get(n)) {
            Some(normal) => {
                let world = to_world.apply_normal(Vector3f::new(
                    normal.x as Float,
                    normal.y as Float,
                    normal.z as Float,
                ));
                let len = world.norm();
                if len > 0.0 {
                    self.normals.push(world / len);
                } else {
                    self.normals.push(Vector3f::zeros());
                }
            }
            None => {
                self.missing_normals = true;
                self.normals.push(Vector3f::zeros());
            }
        }

        let index = (self.positions.len() - 1) as u32;
        self.remap.insert(vtn, index);
        index
    }
}

fn triangulate_faces(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 4);
    for line in input.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("f ") || trimmed.starts_with("f\t") {
            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            if parts.len() > 4 {
                let base = parts[1];
                for i in 2..(parts.len() - 1) {
                    out.push_str("f ");
                    out.push_str(base);
                    out.push(' ');
                    out.push_str(parts[i]);
                    out.push(' ');
                    out.push_str(parts[i + 1]);
                    out.push('\n');
                }
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
