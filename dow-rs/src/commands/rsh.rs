//! Shader texture command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;

use dow_tex::RshFile;

use crate::utils::format_bytes;

#[derive(Subcommand)]
pub enum RshCommands {
    /// Parse and display information about a shader texture
    Info {
        /// Path to the .rsh file
        file: PathBuf,
    },

    /// Extract the stored images as standalone DDS/TGA files
    Extract {
        /// Path to the .rsh file
        file: PathBuf,

        /// Output folder, defaults to the input file's folder
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn execute(command: RshCommands) -> Result<()> {
    match command {
        RshCommands::Info { file } => execute_info(file),
        RshCommands::Extract { file, output } => execute_extract(file, output),
    }
}

fn execute_info(path: PathBuf) -> Result<()> {
    use console::style;

    println!("{}", style("Shader Texture Information").bold().cyan());
    println!("{}", style("==========================").cyan());
    println!();

    let file = File::open(&path).context("Failed to open texture file")?;
    let rsh = RshFile::read(BufReader::new(file)).context("Failed to parse texture container")?;

    println!("{}: {}", style("File").bold(), path.display());
    println!("{}: {}", style("Material").bold(), rsh.material_name);
    println!("{}: {}", style("Declared path").bold(), rsh.declared_path);
    println!();

    println!("{}", style("Layers:").bold());
    for layer in &rsh.layers {
        println!(
            "  {}: {:?}, {}x{}, {} mip(s), {}",
            style(layer.role).green(),
            layer.image.format,
            layer.image.width,
            layer.image.height,
            layer.image.mip_count,
            format_bytes(layer.image.data.len() as u64)
        );
        if layer.declared_path != rsh.declared_path {
            println!("    Declared as: {}", layer.declared_path);
        }
    }

    Ok(())
}

fn execute_extract(path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    use console::style;

    let file = File::open(&path).context("Failed to open texture file")?;
    let rsh = RshFile::read(BufReader::new(file)).context("Failed to parse texture container")?;

    let folder = match output {
        Some(folder) => folder,
        None => path.parent().map(PathBuf::from).unwrap_or_default(),
    };
    fs::create_dir_all(&folder).context("Failed to create output folder")?;

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| rsh.material_name.clone());

    for layer in &rsh.layers {
        let name = format!(
            "{stem}{}.{}",
            layer.role.suffix(),
            layer.image.file_extension()
        );
        let target = folder.join(&name);
        fs::write(&target, layer.image.to_file_bytes())
            .with_context(|| format!("Failed to write {}", target.display()))?;
        println!(
            "{} {} ({}, {}x{})",
            style("✓").green(),
            target.display(),
            layer.role,
            layer.image.width,
            layer.image.height
        );
    }

    println!();
    println!("Extracted {} image(s)", rsh.layers.len());

    Ok(())
}
