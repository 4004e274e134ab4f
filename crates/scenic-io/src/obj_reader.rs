//! Wavefront OBJ decoder.
//!
//! Reads the line-oriented text format into shared position, normal and UV
//! lists plus named sub-meshes of triangles. Only `v`, `vn`, `vt`, `f` and
//! `o` lines are interpreted; comments, groups, smoothing and material
//! library lines are skipped. Every face must be a triangle.
//!
//! Indices are stored zero-based. Negative (relative) references are
//! resolved against the list lengths at the line they appear on; positive
//! references are range-checked when the scene is built.

use crate::error::{LoadError, Result};

/// Name given to faces that appear before the first `o` line.
pub const DEFAULT_OBJECT_NAME: &str = "default";

/// One corner of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceVertex {
    pub position: usize,
    pub uv: Option<usize>,
    pub normal: Option<usize>,
}

pub type Face = [FaceVertex; 3];

#[derive(Debug, Clone, PartialEq)]
pub struct ObjObject {
    pub name: String,
    pub faces: Vec<Face>,
}

impl ObjObject {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            faces: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjDocument {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// Sub-meshes in file order; never empty of faces.
    pub objects: Vec<ObjObject>,
}

impl ObjDocument {
    pub fn face_count(&self) -> usize {
        self.objects.iter().map(|o| o.faces.len()).sum()
    }

    /// First face of the file, whose corners decide which attributes exist.
    pub fn first_face(&self) -> Option<&Face> {
        self.objects.iter().find_map(|o| o.faces.first())
    }
}

/// Decodes OBJ text held in memory.
pub fn decode(data: &[u8]) -> Result<ObjDocument> {
    let text = String::from_utf8_lossy(data);
    let mut document = ObjDocument::default();
    let mut current = ObjObject::new(DEFAULT_OBJECT_NAME);

    for (number, raw) in text.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let error = || LoadError::Parse {
            line: number + 1,
            text: line.to_string(),
        };

        match line.get(..2) {
            Some("v ") => document.positions.push(parse_floats(line, error)?),
            Some("vn") => document.normals.push(parse_floats(line, error)?),
            Some("vt") => document.uvs.push(parse_floats(line, error)?),
            Some("f ") => {
                let face = parse_face(line, &document, error)?;
                current.faces.push(face);
            }
            Some("o ") => {
                let next = ObjObject::new(line[2..].trim());
                let finished = std::mem::replace(&mut current, next);
                if !finished.faces.is_empty() {
                    document.objects.push(finished);
                }
            }
            _ => {}
        }
    }
    if !current.faces.is_empty() {
        document.objects.push(current);
    }

    log::debug!(
        "OBJ: {} positions, {} normals, {} uvs, {} faces in {} objects",
        document.positions.len(),
        document.normals.len(),
        document.uvs.len(),
        document.face_count(),
        document.objects.len()
    );
    Ok(document)
}

/// Parses exactly `N` numbers following the two-character prefix.
fn parse_floats<const N: usize>(line: &str, error: impl Fn() -> LoadError) -> Result<[f32; N]> {
    let fields: Vec<&str> = line[2..].split_whitespace().collect();
    if fields.len() != N {
        return Err(error());
    }
    let mut values = [0.0f32; N];
    for (value, field) in values.iter_mut().zip(&fields) {
        *value = field.parse().map_err(|_| error())?;
    }
    Ok(values)
}

fn parse_face(line: &str, document: &ObjDocument, error: impl Fn() -> LoadError) -> Result<Face> {
    let references: Vec<&str> = line[2..].split_whitespace().collect();
    if references.len() != 3 {
        return Err(error());
    }

    let mut face = [FaceVertex {
        position: 0,
        uv: None,
        normal: None,
    }; 3];
    for (corner, reference) in face.iter_mut().zip(&references) {
        let fields: Vec<&str> = reference.split('/').collect();
        if fields.is_empty() || fields.len() > 3 {
            return Err(error());
        }
        let index = |slot: usize, len: usize| -> Result<Option<usize>> {
            match fields.get(slot) {
                None | Some(&"") => Ok(None),
                Some(field) => {
                    let value: i64 = field.parse().map_err(|_| error())?;
                    resolve_index(value, len).map(Some).ok_or_else(|| error())
                }
            }
        };
        corner.position = index(0, document.positions.len())?.ok_or_else(|| error())?;
        corner.uv = index(1, document.uvs.len())?;
        corner.normal = index(2, document.normals.len())?;
    }
    Ok(face)
}

/// One-based or negative relative reference to a zero-based index.
fn resolve_index(value: i64, len: usize) -> Option<usize> {
    match value {
        0 => None,
        v if v > 0 => Some(v as usize - 1),
        v => {
            let back = v.unsigned_abs() as usize;
            len.checked_sub(back)
        }
    }
}
