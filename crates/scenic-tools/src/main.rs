//! Loads a scene file through the engine and prints what it produced.
//!
//! Run with: scenic-inspect model.obj --color Cube=#ff8000 -v

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use scenic_core::math_utils::translation;
use scenic_core::{MaterialKind, Scene};
use scenic_io::{fbx_reader, load_scene, LoadOptions, MaterialAssignment, MaterialDefinition, SourceFormat};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect FBX, GLB and OBJ scenes")]
struct Args {
    /// Scene file to load (.fbx, .glb or .obj)
    file: PathBuf,

    /// Print the decoded FBX record tree instead of the scene summary
    #[arg(long)]
    tree: bool,

    /// Keep embedded images encoded instead of decoding them
    #[arg(long)]
    no_textures: bool,

    /// Solid color for a mesh, e.g. `Cube=#ff8000` (OBJ only)
    #[arg(long = "color", value_name = "MESH=#RRGGBB")]
    colors: Vec<String>,

    /// Image texture for a mesh, e.g. `Cube=wood.png` (OBJ only)
    #[arg(long = "image", value_name = "MESH=PATH")]
    images: Vec<String>,

    /// More log output; repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn split_assignment(arg: &str) -> Result<(&str, &str), Box<dyn Error>> {
    arg.split_once('=')
        .filter(|(mesh, value)| !mesh.is_empty() && !value.is_empty())
        .ok_or_else(|| format!("expected MESH=VALUE, got {:?}", arg).into())
}

fn material_assignment(args: &Args) -> Result<Option<MaterialAssignment>, Box<dyn Error>> {
    if args.colors.is_empty() && args.images.is_empty() {
        return Ok(None);
    }

    let mut assignment = MaterialAssignment::new();
    for arg in &args.colors {
        let (mesh, hex) = split_assignment(arg)?;
        let material = assignment.add_material(MaterialDefinition::from_hex(mesh, hex)?);
        assignment.assign_named(mesh, material);
    }
    for arg in &args.images {
        let (mesh, path) = split_assignment(arg)?;
        let bytes = fs::read(path)?;
        let material = assignment.add_material(MaterialDefinition::image(mesh, bytes));
        assignment.assign_named(mesh, material);
    }
    Ok(Some(assignment))
}

fn print_tree(path: &Path) -> Result<(), Box<dyn Error>> {
    if SourceFormat::from_path(path)? != SourceFormat::Fbx {
        return Err("--tree is only available for FBX files".into());
    }
    let data = fs::read(path)?;
    print!("{}", fbx_reader::decode(&data)?);
    Ok(())
}

fn print_summary(scene: &Scene) {
    println!("Nodes: {}", scene.nodes.len());
    for (i, node) in scene.nodes.iter().enumerate() {
        let [x, y, z] = translation(&node.matrix);
        let mesh = node.mesh.map_or_else(|| "-".to_string(), |m| m.to_string());
        let children = node.children.as_deref().unwrap_or(&[]);
        println!(
            "  [{}] {:<24} mesh {:<4} at ({:.3}, {:.3}, {:.3}) children {:?}",
            i, node.name, mesh, x, y, z, children
        );
    }

    println!("Meshes: {}", scene.meshes.len());
    for (i, mesh) in scene.meshes.iter().enumerate() {
        println!("  [{}] {}", i, mesh.name);
        for (j, primitive) in mesh.primitives.iter().enumerate() {
            let semantics: Vec<String> = primitive.attributes.keys().map(|s| s.to_string()).collect();
            println!(
                "    primitive {}: {} vertices{}, material {:?}, attributes {}",
                j,
                primitive.vertices,
                if primitive.indexed { " (indexed)" } else { "" },
                primitive.material,
                semantics.join(", ")
            );
        }
    }

    println!("Materials: {}", scene.materials.len());
    for (i, material) in scene.materials.iter().enumerate() {
        match material.kind {
            MaterialKind::Color([r, g, b, a]) => {
                println!("  [{}] {} color ({:.3}, {:.3}, {:.3}, {:.3})", i, material.name, r, g, b, a)
            }
            MaterialKind::Texture(t) => println!("  [{}] {} texture {}", i, material.name, t),
        }
    }

    println!("Textures: {}", scene.textures.len());
    for (i, texture) in scene.textures.iter().enumerate() {
        match texture.dimensions() {
            Some((w, h)) => println!("  [{}] {} {}x{}", i, texture.name, w, h),
            None => println!("  [{}] {} (not decoded)", i, texture.name),
        }
    }

    println!("Blob: {} bytes", scene.blob.len());
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.tree {
        return print_tree(&args.file);
    }

    let mut options = LoadOptions::new().with_texture_decoding(!args.no_textures);
    if let Some(assignment) = material_assignment(&args)? {
        options = options.with_material_assignment(assignment);
    }

    let scene = load_scene(&args.file, &options)?;
    scene.validate()?;
    print_summary(&scene);
    Ok(())
}
