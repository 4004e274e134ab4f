use std::fmt;

use crate::data_types::ComponentType;

/// Named vertex data stream of a primitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Semantic {
    Position,
    Normal,
    TexCoord0,
    /// Index list of an indexed primitive.
    Indices,
    /// Any other glTF attribute name (`TANGENT`, `COLOR_0`, ...).
    Other(String),
}

impl Semantic {
    pub fn from_name(name: &str) -> Self {
        match name {
            "POSITION" => Semantic::Position,
            "NORMAL" => Semantic::Normal,
            "TEXCOORD_0" => Semantic::TexCoord0,
            "INDICES" => Semantic::Indices,
            other => Semantic::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Semantic::Position => "POSITION",
            Semantic::Normal => "NORMAL",
            Semantic::TexCoord0 => "TEXCOORD_0",
            Semantic::Indices => "INDICES",
            Semantic::Other(name) => name,
        }
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed view over a byte range of the scene's binary blob.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub component_type: ComponentType,
    pub components_per_entry: u8,
    pub entry_count: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    /// Distance between consecutive entries when the data is interleaved.
    pub byte_stride: Option<usize>,
}

impl Attribute {
    /// Tightly packed float attribute.
    pub fn float32(components_per_entry: u8, entry_count: usize, byte_offset: usize, byte_length: usize) -> Self {
        Self {
            component_type: ComponentType::Float32,
            components_per_entry,
            entry_count,
            byte_offset,
            byte_length,
            byte_stride: None,
        }
    }

    pub fn with_stride(mut self, byte_stride: usize) -> Self {
        self.byte_stride = Some(byte_stride);
        self
    }

    /// Size of one entry in bytes.
    pub fn entry_size(&self) -> usize {
        self.component_type.byte_length() * self.components_per_entry as usize
    }

    /// Distance between entries, falling back to the packed entry size.
    pub fn effective_stride(&self) -> usize {
        self.byte_stride.unwrap_or_else(|| self.entry_size())
    }

    /// Bytes the entries actually touch, starting at `byte_offset`.
    ///
    /// `None` when the count is too large to address.
    pub fn required_length(&self) -> Option<usize> {
        match self.entry_count {
            0 => Some(0),
            n => (n - 1)
                .checked_mul(self.effective_stride())?
                .checked_add(self.entry_size()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_names_round_trip() {
        for name in ["POSITION", "NORMAL", "TEXCOORD_0", "INDICES", "COLOR_0"] {
            assert_eq!(Semantic::from_name(name).name(), name);
        }
        assert_eq!(Semantic::from_name("TANGENT"), Semantic::Other("TANGENT".into()));
    }

    #[test]
    fn test_required_length() {
        let packed = Attribute::float32(3, 4, 0, 48);
        assert_eq!(packed.entry_size(), 12);
        assert_eq!(packed.required_length(), Some(48));

        let interleaved = Attribute::float32(2, 3, 24, 72).with_stride(32);
        assert_eq!(interleaved.required_length(), Some(2 * 32 + 8));

        let empty = Attribute::float32(3, 0, 0, 0);
        assert_eq!(empty.required_length(), Some(0));

        let huge = Attribute::float32(3, 1 << 62, 0, 36);
        assert_eq!(huge.required_length(), None);
    }
}
