/// Numeric type of one component of an attribute entry.
///
/// Discriminants are the OpenGL enum values used by glTF accessors, so a
/// graphics context can pass them straight through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Int8 = 5120,
    Uint8 = 5121,
    Int16 = 5122,
    Uint16 = 5123,
    Uint32 = 5125,
    Float32 = 5126,
}

impl ComponentType {
    /// Maps a glTF `componentType` code.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            5120 => Some(ComponentType::Int8),
            5121 => Some(ComponentType::Uint8),
            5122 => Some(ComponentType::Int16),
            5123 => Some(ComponentType::Uint16),
            5125 => Some(ComponentType::Uint32),
            5126 => Some(ComponentType::Float32),
            _ => None,
        }
    }

    pub fn code(&self) -> u32 {
        *self as u32
    }

    pub fn byte_length(&self) -> usize {
        match self {
            ComponentType::Int8 | ComponentType::Uint8 => 1,
            ComponentType::Int16 | ComponentType::Uint16 => 2,
            ComponentType::Uint32 | ComponentType::Float32 => 4,
        }
    }
}

/// Number of components per entry for a glTF accessor `type` string.
pub fn components_per_entry(accessor_type: &str) -> Option<u8> {
    match accessor_type {
        "SCALAR" => Some(1),
        "VEC2" => Some(2),
        "VEC3" => Some(3),
        "VEC4" | "MAT2" => Some(4),
        "MAT3" => Some(9),
        "MAT4" => Some(16),
        _ => None,
    }
}
