//! Scenic I/O library: scene ingestion for three mesh formats.
//!
//! Each format is decoded in two stages. A decoder turns raw bytes into a
//! format-specific document, and a builder turns that document into a
//! render-ready [`scenic_core::Scene`]: flat node list with composed world
//! matrices, meshes whose attributes are byte ranges of one shared blob,
//! materials and decoded textures.
//!
//! # Supported Formats
//!
//! | Format     | Extension | Decoder        | Builder       | Textures             |
//! |------------|-----------|----------------|---------------|----------------------|
//! | FBX binary | `.fbx`    | [`fbx_reader`] | [`fbx_scene`]  | embedded `Video`     |
//! | GLB        | `.glb`    | [`gltf_reader`]| [`gltf_scene`] | bufferView images    |
//! | OBJ        | `.obj`    | [`obj_reader`] | [`obj_scene`]  | caller-supplied      |
//!
//! # Loading
//!
//! ```no_run
//! use scenic_io::{load_scene, LoadOptions};
//!
//! let scene = load_scene("model.glb", &LoadOptions::default())?;
//! for node in &scene.nodes {
//!     println!("{} -> {:?}", node.name, node.mesh);
//! }
//! # Ok::<(), scenic_io::LoadError>(())
//! ```
//!
//! OBJ files carry no materials; supply them through a
//! [`MaterialAssignment`]:
//!
//! ```no_run
//! use scenic_io::{load_scene, LoadOptions, MaterialAssignment, MaterialDefinition};
//!
//! let mut assignment = MaterialAssignment::new();
//! let red = assignment.add_material(MaterialDefinition::from_hex("Red", "#ff0000")?);
//! assignment.assign(0, red);
//! let options = LoadOptions::default().with_material_assignment(assignment);
//! let scene = load_scene("model.obj", &options)?;
//! # Ok::<(), scenic_io::LoadError>(())
//! ```

pub mod error;
pub mod fbx_reader;
pub mod fbx_scene;
pub mod gltf_reader;
pub mod gltf_scene;
mod hierarchy;
pub mod loader;
pub mod material;
pub mod obj_reader;
pub mod obj_scene;
mod texture;
pub mod traits;

pub use error::{LoadError, Result};
pub use fbx_reader::{FbxDocument, FbxProperty, FbxReader};
pub use fbx_scene::FbxFormat;
pub use gltf_reader::{FieldAccess, GlbDocument};
pub use gltf_scene::GlbFormat;
pub use loader::{load_scene, load_scene_from_bytes, LoadOptions, SourceFormat};
pub use material::{MaterialAssignment, MaterialDefinition, MaterialSource};
pub use obj_reader::ObjDocument;
pub use obj_scene::ObjFormat;
pub use traits::SceneFormat;
