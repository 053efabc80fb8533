//! Team colour pattern command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;

use dow_tex::tga::TgaHeader;
use dow_tex::WtpFile;

use crate::utils::format_bytes;

#[derive(Subcommand)]
pub enum WtpCommands {
    /// Parse and display information about a team colour pattern
    Info {
        /// Path to the .wtp file
        file: PathBuf,
    },

    /// Extract the tint masks as standalone TGA files
    Extract {
        /// Path to the .wtp file
        file: PathBuf,

        /// Output folder, defaults to the input file's folder
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn execute(command: WtpCommands) -> Result<()> {
    match command {
        WtpCommands::Info { file } => execute_info(file),
        WtpCommands::Extract { file, output } => execute_extract(file, output),
    }
}

fn execute_info(path: PathBuf) -> Result<()> {
    use console::style;

    println!("{}", style("Team Colour Pattern Information").bold().cyan());
    println!("{}", style("===============================").cyan());
    println!();

    let file = File::open(&path).context("Failed to open pattern file")?;
    let wtp = WtpFile::read(BufReader::new(file)).context("Failed to parse pattern container")?;

    println!("{}: {}", style("File").bold(), path.display());
    println!("{}: {}", style("Pattern").bold(), wtp.name);
    println!("{}: {}x{}", style("Size").bold(), wtp.width, wtp.height);
    println!(
        "{}: {}",
        style("Combined image").bold(),
        if wtp.combined.is_some() {
            "present"
        } else {
            "absent"
        }
    );
    println!();

    println!("{}", style("Tint masks:").bold());
    for layer in &wtp.layers {
        println!(
            "  {}: {}",
            style(layer.layer).green(),
            format_bytes(layer.data.len() as u64)
        );
    }

    if let Some(badge) = &wtp.badge {
        println!();
        println!(
            "{}: at ({}, {}), {}x{}",
            style("Badge").bold(),
            badge.position[0],
            badge.position[1],
            badge.display_size[0],
            badge.display_size[1]
        );
    }
    if let Some(banner) = &wtp.banner {
        println!(
            "{}: at ({}, {}), {}x{}",
            style("Banner").bold(),
            banner.position[0],
            banner.position[1],
            banner.display_size[0],
            banner.display_size[1]
        );
    }

    Ok(())
}

fn execute_extract(path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    use console::style;

    let file = File::open(&path).context("Failed to open pattern file")?;
    let wtp = WtpFile::read(BufReader::new(file)).context("Failed to parse pattern container")?;
    wtp.validate().context("Pattern data is inconsistent")?;

    let folder = match output {
        Some(folder) => folder,
        None => path.parent().map(PathBuf::from).unwrap_or_default(),
    };
    fs::create_dir_all(&folder).context("Failed to create output folder")?;

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| wtp.name.clone());
    let width = u16::try_from(wtp.width).context("Pattern too wide for a TGA file")?;
    let height = u16::try_from(wtp.height).context("Pattern too tall for a TGA file")?;

    let mut written = 0usize;
    for layer in &wtp.layers {
        let header = TgaHeader {
            width,
            height,
            grayscale: true,
        };
        let target = folder.join(format!("{stem}_{}.tga", layer.layer));
        fs::write(&target, header.assemble(&layer.data))
            .with_context(|| format!("Failed to write {}", target.display()))?;
        println!("{} {}", style("✓").green(), target.display());
        written += 1;
    }

    if let Some(combined) = &wtp.combined {
        let header = TgaHeader {
            width,
            height,
            grayscale: false,
        };
        let target = folder.join(format!("{stem}_combined.tga"));
        fs::write(&target, header.assemble(combined))
            .with_context(|| format!("Failed to write {}", target.display()))?;
        println!("{} {}", style("✓").green(), target.display());
        written += 1;
    }

    println!();
    println!("Extracted {written} image(s)");

    Ok(())
}
