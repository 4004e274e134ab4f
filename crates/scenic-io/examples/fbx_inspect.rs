//! Inspect an FBX file and print its record tree
//!
//! Run with: cargo run --example fbx_inspect -- model.fbx

use std::env;

use scenic_io::fbx_reader::{FbxReader, NodeRef};

fn print_node(node: NodeRef<'_>, indent: usize) {
    let pad = " ".repeat(indent);
    let children: Vec<NodeRef<'_>> = node.all_children().collect();
    println!(
        "{}Node: {} (props: {}, children: {})",
        pad,
        node.name(),
        node.properties().len(),
        children.len()
    );
    for child in children {
        print_node(child, indent + 2);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let path = if args.len() > 1 { &args[1] } else { "model.fbx" };
    let data = std::fs::read(path)?;
    let reader = FbxReader::new(&data)?;
    let document = reader.read_document()?;
    println!("FBX version {}, {} records", reader.version(), document.record_count());
    for node in document.root().all_children() {
        print_node(node, 0);
    }
    Ok(())
}
