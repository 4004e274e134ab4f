//! FBX binary format decoder.
//!
//! Decodes the record tree of binary FBX files (versions below 7.5, which
//! use 32-bit record headers) into an [`FbxDocument`]: an arena of named
//! nodes with typed property lists. Records are walked with an explicit
//! work-list instead of recursion, so nesting depth is bounded by the heap
//! rather than the call stack.
//!
//! # Example
//!
//! ```ignore
//! use scenic_io::fbx_reader::FbxReader;
//!
//! let data = std::fs::read("cube.fbx")?;
//! let document = FbxReader::new(&data)?.read_document()?;
//! let objects = document.root().child("Objects").unwrap();
//! for geometry in objects.children("Geometry") {
//!     println!("{} has {} properties", geometry.name(), geometry.properties().len());
//! }
//! ```

use std::borrow::Cow;
use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use miniz_oxide::inflate::{decompress_to_vec_zlib_with_limit, TINFLStatus};
use scenic_core::ByteCursor;

use crate::error::{LoadError, Result};

/// FBX file magic: "Kaydara FBX Binary  \0"
pub const FBX_MAGIC: &[u8; 21] = b"Kaydara FBX Binary  \0";

/// First version whose record headers use 64-bit fields.
pub const FIRST_UNSUPPORTED_VERSION: u32 = 7500;

const VERSION_OFFSET: usize = 23;
const FIRST_RECORD_OFFSET: usize = 27;
const RECORD_HEADER_LEN: usize = 13;
const ARRAY_HEADER_LEN: usize = 12;

/// FBX property value.
#[derive(Debug, Clone, PartialEq)]
pub enum FbxProperty {
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Raw(Vec<u8>),
    BoolArray(Vec<bool>),
    I32Array(Vec<i32>),
    I64Array(Vec<i64>),
    F32Array(Vec<f32>),
    F64Array(Vec<f64>),
}

impl FbxProperty {
    /// The one-byte type tag this value is stored under.
    pub fn type_code(&self) -> u8 {
        match self {
            FbxProperty::Bool(_) => b'C',
            FbxProperty::I16(_) => b'Y',
            FbxProperty::I32(_) => b'I',
            FbxProperty::I64(_) => b'L',
            FbxProperty::F32(_) => b'F',
            FbxProperty::F64(_) => b'D',
            FbxProperty::String(_) => b'S',
            FbxProperty::Raw(_) => b'R',
            FbxProperty::BoolArray(_) => b'b',
            FbxProperty::I32Array(_) => b'i',
            FbxProperty::I64Array(_) => b'l',
            FbxProperty::F32Array(_) => b'f',
            FbxProperty::F64Array(_) => b'd',
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FbxProperty::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FbxProperty::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Integer scalar, widened.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            FbxProperty::I16(v) => Some(v as i64),
            FbxProperty::I32(v) => Some(v as i64),
            FbxProperty::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Any numeric scalar, widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FbxProperty::F32(v) => Some(v as f64),
            FbxProperty::F64(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Any numeric array, widened to `f64`.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            FbxProperty::F64Array(values) => Some(values.clone()),
            FbxProperty::F32Array(values) => Some(values.iter().map(|&v| v as f64).collect()),
            FbxProperty::I32Array(values) => Some(values.iter().map(|&v| v as f64).collect()),
            FbxProperty::I64Array(values) => Some(values.iter().map(|&v| v as f64).collect()),
            _ => None,
        }
    }

    /// Any integer array, widened to `i64`.
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        match self {
            FbxProperty::I32Array(values) => Some(values.iter().map(|&v| v as i64).collect()),
            FbxProperty::I64Array(values) => Some(values.clone()),
            _ => None,
        }
    }

    /// Element count for arrays, `None` for scalars.
    pub fn array_len(&self) -> Option<usize> {
        match self {
            FbxProperty::BoolArray(v) => Some(v.len()),
            FbxProperty::I32Array(v) => Some(v.len()),
            FbxProperty::I64Array(v) => Some(v.len()),
            FbxProperty::F32Array(v) => Some(v.len()),
            FbxProperty::F64Array(v) => Some(v.len()),
            _ => None,
        }
    }
}

impl fmt::Display for FbxProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FbxProperty::Bool(v) => write!(f, "{}", v),
            FbxProperty::I16(v) => write!(f, "{}", v),
            FbxProperty::I32(v) => write!(f, "{}", v),
            FbxProperty::I64(v) => write!(f, "{}", v),
            FbxProperty::F32(v) => write!(f, "{}", v),
            FbxProperty::F64(v) => write!(f, "{}", v),
            FbxProperty::String(s) => write!(f, "{:?}", s),
            FbxProperty::Raw(bytes) => write!(f, "<{} bytes>", bytes.len()),
            other => write!(
                f,
                "{}[{}]",
                other.type_code() as char,
                other.array_len().unwrap_or(0)
            ),
        }
    }
}

/// Index of a node inside an [`FbxDocument`].
pub type NodeId = usize;

/// Children sharing one name: a single node until a second one appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Single(NodeId),
    Many(Vec<NodeId>),
}

impl Child {
    fn push(&mut self, id: NodeId) {
        match self {
            Child::Single(first) => {
                let first = *first;
                *self = Child::Many(vec![first, id]);
            }
            Child::Many(ids) => ids.push(id),
        }
    }

    /// The children in file order, regardless of variant.
    pub fn as_slice(&self) -> &[NodeId] {
        match self {
            Child::Single(id) => std::slice::from_ref(id),
            Child::Many(ids) => ids,
        }
    }
}

/// A decoded record.
#[derive(Debug, Clone, PartialEq)]
pub struct FbxNode {
    pub name: String,
    /// Byte offset of the record in the source file.
    pub offset: usize,
    pub properties: Vec<FbxProperty>,
    /// All children in file order.
    pub children: Vec<NodeId>,
    /// Children grouped by name, groups in order of first appearance.
    pub named: Vec<(String, Child)>,
}

impl FbxNode {
    fn new(name: String, offset: usize) -> Self {
        Self {
            name,
            offset,
            properties: Vec::new(),
            children: Vec::new(),
            named: Vec::new(),
        }
    }
}

/// Decoded FBX record tree. Node 0 is a synthetic, unnamed root.
#[derive(Debug, Clone, PartialEq)]
pub struct FbxDocument {
    version: u32,
    nodes: Vec<FbxNode>,
}

pub const ROOT: NodeId = 0;

impl FbxDocument {
    fn new(version: u32) -> Self {
        Self {
            version,
            nodes: vec![FbxNode::new(String::new(), 0)],
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef { doc: self, id: ROOT }
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id < self.nodes.len()).then_some(NodeRef { doc: self, id })
    }

    /// Number of decoded records, not counting the synthetic root.
    pub fn record_count(&self) -> usize {
        self.nodes.len() - 1
    }

    fn attach(&mut self, parent: NodeId, node: FbxNode) -> NodeId {
        let id = self.nodes.len();
        let name = node.name.clone();
        self.nodes.push(node);

        let parent = &mut self.nodes[parent];
        parent.children.push(id);
        match parent.named.iter_mut().find(|(n, _)| *n == name) {
            Some((_, group)) => group.push(id),
            None => parent.named.push((name, Child::Single(id))),
        }
        id
    }
}

impl fmt::Display for FbxDocument {
    /// One line per record, indented by depth.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FBX {}", self.version)?;
        let mut stack: Vec<(NodeId, usize)> =
            self.nodes[ROOT].children.iter().rev().map(|&id| (id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id];
            write!(f, "{:indent$}{}", "", node.name, indent = depth * 2)?;
            for (i, property) in node.properties.iter().enumerate() {
                let sep = if i == 0 { ": " } else { ", " };
                write!(f, "{}{}", sep, property)?;
            }
            writeln!(f)?;
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
        Ok(())
    }
}

/// Borrowed handle to one node of a document.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a FbxDocument,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn node(&self) -> &'a FbxNode {
        &self.doc.nodes[self.id]
    }

    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    pub fn offset(&self) -> usize {
        self.node().offset
    }

    pub fn properties(&self) -> &'a [FbxProperty] {
        &self.node().properties
    }

    pub fn property(&self, index: usize) -> Option<&'a FbxProperty> {
        self.node().properties.get(index)
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<NodeRef<'a>> {
        self.children(name).next()
    }

    /// Every child with the given name, in file order.
    pub fn children(&self, name: &str) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        self.node()
            .named
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, group)| group.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&id| NodeRef { doc, id })
    }

    /// All children in file order.
    pub fn all_children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        self.node().children.iter().map(move |&id| NodeRef { doc, id })
    }
}

/// A record waiting to be decoded.
#[derive(Debug, Clone, Copy)]
struct Pending {
    offset: usize,
    depth: usize,
    /// End offset of the enclosing record (or the file).
    limit: usize,
}

/// FBX reader over an in-memory file.
pub struct FbxReader<'a> {
    cursor: ByteCursor<'a>,
    version: u32,
}

impl<'a> FbxReader<'a> {
    /// Validates the header and version.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let cursor = ByteCursor::new(data);
        if data.len() < FIRST_RECORD_OFFSET {
            return Err(LoadError::InvalidHeader("File too small for FBX header".into()));
        }
        if &data[..FBX_MAGIC.len()] != FBX_MAGIC {
            return Err(LoadError::InvalidHeader("Not a binary FBX file".into()));
        }

        let version = cursor.read_u32_le(VERSION_OFFSET)? & 0x00FF_FFFF;
        if version >= FIRST_UNSUPPORTED_VERSION {
            return Err(LoadError::UnsupportedVersion(version));
        }
        Ok(Self { cursor, version })
    }

    /// Get the FBX file version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Decodes every record into a document.
    pub fn read_document(&self) -> Result<FbxDocument> {
        let mut document = FbxDocument::new(self.version);
        // parents[d] is the most recent record at depth d - 1.
        let mut parents: Vec<NodeId> = vec![ROOT];
        let mut work = Vec::new();

        if !self.cursor.is_zero_block(FIRST_RECORD_OFFSET, RECORD_HEADER_LEN) {
            work.push(Pending {
                offset: FIRST_RECORD_OFFSET,
                depth: 0,
                limit: self.cursor.len(),
            });
        }

        while let Some(Pending { offset, depth, limit }) = work.pop() {
            let end = self.cursor.read_u32_le(offset)? as usize;
            let property_count = self.cursor.read_u32_le(offset + 4)? as usize;
            let property_list_len = self.cursor.read_u32_le(offset + 8)? as usize;
            let name_len = self.cursor.read_u8(offset + 12)? as usize;

            if end <= offset {
                return Err(LoadError::MalformedRecord {
                    offset,
                    reason: format!("end offset {} does not follow the record start", end),
                });
            }
            if end > limit {
                return Err(LoadError::MalformedRecord {
                    offset,
                    reason: format!("end offset {} extends past enclosing end {}", end, limit),
                });
            }

            let name = latin1(self.cursor.slice(offset + RECORD_HEADER_LEN, name_len)?);
            let properties_start = offset + RECORD_HEADER_LEN + name_len;
            let first_child = properties_start + property_list_len;
            if first_child > end {
                return Err(LoadError::MalformedRecord {
                    offset,
                    reason: "property list extends past the record end".into(),
                });
            }

            log::debug!("{:indent$}{} @{} ({} properties)", "", name, offset, property_count, indent = depth * 2);

            let mut node = FbxNode::new(name, offset);
            node.properties.reserve(property_count.min(property_list_len));
            let mut cursor = properties_start;
            for _ in 0..property_count {
                let (property, consumed) = self.read_property(cursor)?;
                node.properties.push(property);
                cursor += consumed;
            }
            if cursor > first_child {
                return Err(LoadError::MalformedProperty {
                    offset: properties_start,
                    reason: format!(
                        "properties occupy {} bytes, header declares {}",
                        cursor - properties_start,
                        property_list_len
                    ),
                });
            }

            parents.truncate(depth + 1);
            let parent = parents.get(depth).copied().ok_or_else(|| LoadError::MalformedRecord {
                offset,
                reason: format!("no parent at depth {}", depth),
            })?;
            let id = document.attach(parent, node);
            parents.push(id);

            // Sibling first so the child is popped first, preserving file order.
            if end < limit && !self.cursor.is_zero_block(end, RECORD_HEADER_LEN) {
                work.push(Pending { offset: end, depth, limit });
            }
            if first_child < end && !self.cursor.is_zero_block(first_child, RECORD_HEADER_LEN) {
                work.push(Pending {
                    offset: first_child,
                    depth: depth + 1,
                    limit: end,
                });
            }
        }

        log::info!(
            "Decoded {} FBX records (version {})",
            document.record_count(),
            self.version
        );
        Ok(document)
    }

    /// Decodes one property, returning it with the number of bytes it used.
    fn read_property(&self, offset: usize) -> Result<(FbxProperty, usize)> {
        let c = &self.cursor;
        let body = offset + 1;
        let decoded = match c.read_u8(offset)? {
            b'Y' => (FbxProperty::I16(c.read_i16_le(body)?), 3),
            b'C' => (FbxProperty::Bool(c.read_u8(body)? != 0), 2),
            b'I' => (FbxProperty::I32(c.read_i32_le(body)?), 5),
            b'F' => (FbxProperty::F32(c.read_f32_le(body)?), 5),
            b'D' => (FbxProperty::F64(c.read_f64_le(body)?), 9),
            b'L' => (FbxProperty::I64(c.read_i64_le(body)?), 9),
            b'S' => {
                let len = c.read_u32_le(body)? as usize;
                let text = latin1(c.slice(body + 4, len)?);
                (FbxProperty::String(text), 5 + len)
            }
            b'R' => {
                let len = c.read_u32_le(body)? as usize;
                (FbxProperty::Raw(c.slice(body + 4, len)?.to_vec()), 5 + len)
            }
            tag @ (b'f' | b'd' | b'l' | b'i' | b'b') => self.read_array(tag, offset)?,
            tag => {
                return Err(LoadError::MalformedProperty {
                    offset,
                    reason: format!("unknown type tag {:?}", tag as char),
                })
            }
        };
        Ok(decoded)
    }

    /// Array header: element count, encoding, payload length.
    fn read_array(&self, tag: u8, offset: usize) -> Result<(FbxProperty, usize)> {
        let c = &self.cursor;
        let body = offset + 1;
        let count = c.read_u32_le(body)? as usize;
        let encoding = c.read_u32_le(body + 4)?;
        let payload_len = c.read_u32_le(body + 8)? as usize;
        let payload = c.slice(body + ARRAY_HEADER_LEN, payload_len)?;

        let element_size = match tag {
            b'b' => 1,
            b'i' | b'f' => 4,
            _ => 8,
        };
        let expected = count * element_size;

        let raw: Cow<'_, [u8]> = if encoding == 0 {
            Cow::Borrowed(payload)
        } else {
            // Inflating stops once the declared size is exceeded.
            let inflated = decompress_to_vec_zlib_with_limit(payload, expected.max(1)).map_err(|e| match e.status {
                TINFLStatus::HasMoreOutput => LoadError::MalformedProperty {
                    offset,
                    reason: format!("array of {} elements inflates past {} bytes", count, expected),
                },
                status => LoadError::Decompression(format!("array at offset {}: {:?}", offset, status)),
            })?;
            Cow::Owned(inflated)
        };
        if raw.len() != expected {
            return Err(LoadError::MalformedProperty {
                offset,
                reason: format!(
                    "array of {} elements holds {} bytes, expected {}",
                    count,
                    raw.len(),
                    expected
                ),
            });
        }

        let property = match tag {
            b'f' => FbxProperty::F32Array(raw.chunks_exact(4).map(LittleEndian::read_f32).collect()),
            b'd' => FbxProperty::F64Array(raw.chunks_exact(8).map(LittleEndian::read_f64).collect()),
            b'l' => FbxProperty::I64Array(raw.chunks_exact(8).map(LittleEndian::read_i64).collect()),
            b'i' => FbxProperty::I32Array(raw.chunks_exact(4).map(LittleEndian::read_i32).collect()),
            _ => FbxProperty::BoolArray(raw.iter().map(|&b| b != 0).collect()),
        };
        Ok((property, 1 + ARRAY_HEADER_LEN + payload_len))
    }
}

/// Decodes an FBX file held in memory.
pub fn decode(data: &[u8]) -> Result<FbxDocument> {
    FbxReader::new(data)?.read_document()
}

/// One byte per character.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
