//! Raw Relic Chunky container command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use dow_chunky::{Chunk, ChunkyFile, PLATFORM_PC};

use crate::utils::{format_bytes, render_tree, NodeType, TreeNode, TreeOptions};

#[derive(Subcommand)]
pub enum ChunkyCommands {
    /// Parse and display information about any Relic Chunky container
    Info {
        /// Path to the container file
        file: PathBuf,
    },

    /// Show the chunk tree of a Relic Chunky container
    Tree {
        /// Path to the container file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(long)]
        depth: Option<usize>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Show compact metadata inline
        #[arg(long)]
        compact: bool,
    },
}

pub fn execute(command: ChunkyCommands) -> Result<()> {
    match command {
        ChunkyCommands::Info { file } => execute_info(file),
        ChunkyCommands::Tree {
            file,
            depth,
            no_color,
            compact,
        } => execute_tree(file, depth, no_color, compact),
    }
}

fn execute_info(path: PathBuf) -> Result<()> {
    use console::style;

    println!("{}", style("Relic Chunky Container").bold().cyan());
    println!("{}", style("======================").cyan());
    println!();

    let file = File::open(&path).context("Failed to open container file")?;
    let chunky = ChunkyFile::read(BufReader::new(file)).context("Failed to parse container")?;

    let platform = if chunky.header.platform == PLATFORM_PC {
        format!("{} (PC)", chunky.header.platform)
    } else {
        chunky.header.platform.to_string()
    };
    let content: u64 = chunky.chunks.iter().map(Chunk::encoded_size).sum();

    println!("{}: {}", style("File").bold(), path.display());
    println!("{}: {}", style("Version").bold(), chunky.header.version);
    println!("{}: {}", style("Platform").bold(), platform);
    println!(
        "{}: {}",
        style("Chunks").bold(),
        count_chunks(&chunky.chunks)
    );
    println!("{}: {}", style("Content").bold(), format_bytes(content));
    println!();

    println!("{}", style("Top-level chunks:").bold());
    for chunk in &chunky.chunks {
        let name = if chunk.name.is_empty() {
            String::new()
        } else {
            format!(" \"{}\"", chunk.name)
        };
        println!(
            "  {} v{}{} ({})",
            style(&chunk.id).yellow(),
            chunk.version,
            name,
            format_bytes(chunk.content_size())
        );
    }

    Ok(())
}

fn execute_tree(
    path: PathBuf,
    depth: Option<usize>,
    no_color: bool,
    compact: bool,
) -> Result<()> {
    let file = File::open(&path).context("Failed to open container file")?;
    let chunky = ChunkyFile::read(BufReader::new(file)).context("Failed to parse container")?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let mut root = TreeNode::new(file_name, NodeType::Root).add_child(
        TreeNode::new("Relic Chunky", NodeType::Header)
            .with_metadata("version", &chunky.header.version.to_string())
            .with_metadata("platform", &chunky.header.platform.to_string()),
    );

    for chunk in &chunky.chunks {
        root = root.add_child(chunk_node(chunk));
    }

    let options = TreeOptions {
        max_depth: depth,
        no_color,
        compact,
        ..Default::default()
    };

    print!("{}", render_tree(&root, &options));

    Ok(())
}

fn chunk_node(chunk: &Chunk) -> TreeNode {
    let node_type = if chunk.id.is_folder() {
        NodeType::Folder
    } else {
        NodeType::Data
    };

    let mut node = TreeNode::new(chunk.id.to_string(), node_type)
        .with_size(chunk.content_size())
        .with_metadata("version", &chunk.version.to_string());

    if !chunk.name.is_empty() {
        node = node.with_metadata("name", &chunk.name);
    }

    for child in chunk.children() {
        node = node.add_child(chunk_node(child));
    }

    node
}

fn count_chunks(chunks: &[Chunk]) -> usize {
    chunks
        .iter()
        .map(|chunk| 1 + count_chunks(chunk.children()))
        .sum()
}
