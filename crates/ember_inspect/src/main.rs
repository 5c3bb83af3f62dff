// Inspect the node tree of an engine markup file.
// Run with: cargo run --bin ember_inspect -- <path.xml> [--json] [--max-depth N]

use std::fmt::{self, Write as _};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ember_core::xml::{ParserConfig, XmlNode, XmlParser};

/// Print the node tree of a markup file
#[derive(Parser, Debug)]
#[command(name = "ember_inspect")]
#[command(version, about, long_about = None)]
struct Args {
    /// Markup file to load
    path: PathBuf,

    /// Print the tree as JSON instead of an outline
    #[arg(long)]
    json: bool,

    /// Maximum node nesting depth
    #[arg(long, default_value_t = ParserConfig::DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

impl Args {
    fn parser_config(&self) -> ParserConfig {
        ParserConfig::default().with_max_depth(self.max_depth)
    }
}

/// Indented outline of `node` and its subtree.
fn outline(node: &XmlNode) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for n in node.descendants() {
        let indent = "  ".repeat(n.path().depth());
        write!(out, "{}<{}", indent, n.name())?;
        for (key, value) in n.attributes() {
            write!(out, " {}=\"{}\"", key, value)?;
        }
        out.push('>');

        // Leaf text, trimmed to keep the outline on one line per node
        let data = n.data().trim();
        if !data.is_empty() {
            write!(out, " {:?}", data)?;
        }
        out.push('\n');
    }
    Ok(out)
}

fn run(args: &Args) -> Result<()> {
    let parser = XmlParser::from_file_with_config(&args.path, &args.parser_config())
        .with_context(|| format!("failed to load {}", args.path.display()))?;

    let root = parser.top_node();
    log::info!(
        "{}: {} nodes under <{}>",
        parser.file_path(),
        root.descendants().count(),
        root.name()
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(root)?);
    } else {
        print!("{}", outline(root)?);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    run(&args)
}
