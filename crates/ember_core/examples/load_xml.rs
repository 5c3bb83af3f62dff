//! Example: Load and inspect a markup file.
//!
//! Run with: cargo run --example load_xml -- assets/models/crate.xml

use std::env;

use ember_core::xml::XmlParser;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: load_xml <path-to-xml-file>");
        println!("\nExamples:");
        println!("  cargo run --example load_xml -- assets/models/crate.xml");
        println!("  cargo run --example load_xml -- assets/shaders/basic.xml");
        return;
    }

    let path = &args[1];
    println!("Loading markup file: {}", path);

    match XmlParser::from_file(path) {
        Ok(parser) => {
            let root = parser.top_node();
            println!("\n=== Document: {} ===", parser.file_path());
            println!("Root: <{}>", root.name());
            println!("Nodes: {}", root.descendants().count());

            println!("\n--- Nodes ---");
            for node in root.descendants() {
                let parent = root.parent_of(node).map(|p| p.name()).unwrap_or("-");
                println!(
                    "  {:<12} <{}> parent={} attributes={} data={:?}",
                    node.path().to_string(),
                    node.name(),
                    parent,
                    node.attributes().len(),
                    node.data().trim()
                );
            }
        }
        Err(e) => {
            eprintln!("Error loading markup file: {}", e);
        }
    }
}
