//! Model container command implementations

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor};
use std::path::PathBuf;

use dow_chunky::{ChunkId, ChunkReader};
use dow_tex::{PathDispatcher, TextureLayout};
use dow_whm::scene::Mesh;
use dow_whm::{
    export_container, import_container, DowLayout, ExportOptions, ImportOptions, Report,
    SceneModel, Variant,
};

use crate::utils::{detect_ref_type, render_tree, NodeType, TreeNode, TreeOptions};

/// Model dialect for conversion targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dialect {
    /// The newer dialect the game loads directly
    Whm,
    /// The older dialect consumed by the object editor
    Sgm,
}

impl From<Dialect> for Variant {
    fn from(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Whm => Variant::Whm,
            Dialect::Sgm => Variant::Sgm,
        }
    }
}

#[derive(Subcommand)]
pub enum WhmCommands {
    /// Parse and display information about a model container
    Info {
        /// Path to the .whm or .sgm file
        file: PathBuf,

        /// Show per-mesh and per-action details
        #[arg(short, long)]
        detailed: bool,

        /// Mod folder to resolve textures from, e.g. <game>/W40k
        #[arg(long)]
        mod_folder: Option<PathBuf>,
    },

    /// Show the scene structure of a model container
    Tree {
        /// Path to the .whm or .sgm file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(long)]
        depth: Option<usize>,

        /// Hide external file references
        #[arg(long)]
        no_external_refs: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Show compact metadata inline
        #[arg(long)]
        compact: bool,
    },

    /// Decode a model container and list everything that degrades
    Validate {
        /// Path to the .whm or .sgm file
        file: PathBuf,

        /// Fail with a non-zero exit status when warnings are found
        #[arg(short, long)]
        strict: bool,

        /// Mod folder to resolve textures from, e.g. <game>/W40k
        #[arg(long)]
        mod_folder: Option<PathBuf>,
    },

    /// Convert a model container between the .whm and .sgm dialects
    Convert {
        /// Input model file
        input: PathBuf,

        /// Output model file
        output: PathBuf,

        /// Target dialect
        #[arg(short, long, value_enum)]
        to: Dialect,

        /// Extract companion texture files next to the output
        #[arg(short = 'x', long)]
        textures: bool,

        /// Mod folder to resolve textures from, e.g. <game>/W40k
        #[arg(long)]
        mod_folder: Option<PathBuf>,
    },
}

pub fn execute(command: WhmCommands) -> Result<()> {
    match command {
        WhmCommands::Info {
            file,
            detailed,
            mod_folder,
        } => execute_info(file, detailed, mod_folder),
        WhmCommands::Tree {
            file,
            depth,
            no_external_refs,
            no_color,
            compact,
        } => execute_tree(file, depth, !no_external_refs, no_color, compact),
        WhmCommands::Validate {
            file,
            strict,
            mod_folder,
        } => execute_validate(file, strict, mod_folder),
        WhmCommands::Convert {
            input,
            output,
            to,
            textures,
            mod_folder,
        } => execute_convert(input, output, to, textures, mod_folder),
    }
}

fn execute_info(path: PathBuf, detailed: bool, mod_folder: Option<PathBuf>) -> Result<()> {
    use console::style;

    println!("{}", style("Model Container Information").bold().cyan());
    println!("{}", style("===========================").cyan());
    println!();

    let data = fs::read(&path).context("Failed to open model file")?;
    let dialect = detect_dialect(&data);
    let scope = load_scope(mod_folder)?;
    let (model, report) = import_container(Cursor::new(data.as_slice()), &ImportOptions { scope })
        .context("Failed to parse model container")?;

    println!("{}: {}", style("File").bold(), path.display());
    println!("{}: {}", style("Model").bold(), model.name);
    if let Some(dialect) = dialect {
        println!("{}: {}", style("Dialect").bold(), dialect);
    }
    if let Some(info) = &model.burn_info {
        println!("{}: {}", style("Exported by").bold(), info.tool);
        if !info.date.is_empty() {
            println!("{}: {}", style("Exported on").bold(), info.date);
        }
    }
    println!();

    println!("{}: {}", style("Materials").bold(), model.materials.len());
    println!("{}: {} bones", style("Skeleton").bold(), model.skeleton.len());
    println!("{}: {}", style("Meshes").bold(), model.meshes.len());
    println!("{}: {}", style("Markers").bold(), model.markers.len());
    println!("{}: {}", style("Actions").bold(), model.actions.len());

    if !model.materials.is_empty() {
        println!();
        println!("{}", style("Materials:").bold());
        for material in &model.materials {
            let storage = if material.internal {
                "internal"
            } else if material.texture.is_some() {
                "resolved"
            } else {
                "unresolved"
            };
            match &material.full_path {
                Some(declared) => {
                    println!("  {} ({storage}) - {declared}", style(&material.name).green());
                }
                None => println!("  {} ({storage})", style(&material.name).green()),
            }
        }
    }

    if detailed {
        print_mesh_details(&model);
        print_action_details(&model);
    }

    print_report("Import", &report);

    Ok(())
}

fn print_mesh_details(model: &SceneModel) {
    use console::style;

    if model.meshes.is_empty() {
        return;
    }

    println!();
    println!("{}", style("Meshes:").bold());
    for mesh in &model.meshes {
        println!("\n  {}", style(&mesh.name).yellow());
        if let Some(source) = &mesh.xref_source {
            println!("    Geometry from: {source}");
        }
        if let Some(bone) = mesh.rigid_parent.and_then(|index| model.skeleton.bone(index)) {
            println!("    Rigid parent: {}", bone.name);
        }
        if let Some(geometry) = &mesh.geometry {
            println!("    Vertices: {}", geometry.vertices.len());
            println!("    Faces: {}", geometry.face_count());
            if geometry.is_skinned() {
                println!("    Skinned to: {} bones", geometry.skin_bones().len());
            }
            for group in &geometry.groups {
                println!("    Group {}: {} faces", group.material, group.faces.len());
            }
        }
    }
}

fn print_action_details(model: &SceneModel) {
    use console::style;

    if model.actions.is_empty() {
        return;
    }

    println!();
    println!("{}", style("Actions:").bold());
    for action in &model.actions {
        println!("\n  {}", style(&action.name).yellow());
        println!(
            "    Frames: {} ({:.2}s)",
            action.frames,
            action.duration()
        );
        let animated = action
            .bones
            .iter()
            .filter(|track| !track.positions.is_empty() || !track.rotations.is_empty())
            .count();
        println!("    Animated bones: {animated} / {}", action.bones.len());
        if !action.channels.is_empty() {
            println!("    Extra channels: {}", action.channels.len());
        }
        if let Some(source) = &action.xref_source {
            println!("    Keys from: {source}");
        }
    }
}

fn execute_tree(
    path: PathBuf,
    depth: Option<usize>,
    show_external_refs: bool,
    no_color: bool,
    compact: bool,
) -> Result<()> {
    let file = File::open(&path).context("Failed to open model file")?;
    let (model, _report) = import_container(BufReader::new(file), &ImportOptions { scope: None })
        .context("Failed to parse model container")?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let mut root = TreeNode::new(file_name, NodeType::Root).with_metadata("model", &model.name);

    if !model.materials.is_empty() {
        let mut node = TreeNode::new("Materials", NodeType::Directory);
        for material in &model.materials {
            let mut leaf = TreeNode::new(material.name.as_str(), NodeType::File);
            if material.internal {
                leaf = leaf.with_metadata("storage", "internal");
            } else if let Some(declared) = &material.full_path {
                let target = format!("{declared}.rsh");
                leaf = leaf.with_external_ref(&target, detect_ref_type(&target));
            }
            if let Some(texture) = &material.texture {
                leaf = leaf.with_metadata("layers", &texture.layers.len().to_string());
            }
            node = node.add_child(leaf);
        }
        root = root.add_child(node);
    }

    if !model.skeleton.is_empty() {
        let mut node = TreeNode::new("Skeleton", NodeType::Directory)
            .with_metadata("count", &model.skeleton.len().to_string());
        for (index, bone) in model.skeleton.bones.iter().enumerate() {
            if bone.parent.is_none() {
                node = node.add_child(bone_node(&model, index));
            }
        }
        root = root.add_child(node);
    }

    if !model.meshes.is_empty() {
        let mut node = TreeNode::new("Meshes", NodeType::Directory);
        for mesh in &model.meshes {
            node = node.add_child(mesh_node(mesh));
        }
        root = root.add_child(node);
    }

    if !model.markers.is_empty() {
        let mut node = TreeNode::new("Markers", NodeType::Directory);
        for marker in &model.markers {
            let mut leaf = TreeNode::new(marker.name.as_str(), NodeType::File);
            if let Some(parent) = &marker.parent {
                leaf = leaf.with_metadata("parent", parent);
            }
            node = node.add_child(leaf);
        }
        root = root.add_child(node);
    }

    if !model.actions.is_empty() {
        let mut node = TreeNode::new("Actions", NodeType::Directory);
        for action in &model.actions {
            let mut leaf = TreeNode::new(action.name.as_str(), NodeType::File)
                .with_metadata("frames", &action.frames.to_string());
            if !action.channels.is_empty() {
                leaf = leaf.with_metadata("channels", &action.channels.len().to_string());
            }
            if let Some(source) = &action.xref_source {
                let target = format!("{source}.whm");
                leaf = leaf.with_external_ref(&target, detect_ref_type(&target));
            }
            node = node.add_child(leaf);
        }
        root = root.add_child(node);
    }

    let options = TreeOptions {
        max_depth: depth,
        show_external_refs,
        no_color,
        compact,
        ..Default::default()
    };

    print!("{}", render_tree(&root, &options));

    Ok(())
}

fn bone_node(model: &SceneModel, index: usize) -> TreeNode {
    let bone = &model.skeleton.bones[index];
    let mut node = TreeNode::new(bone.name.as_str(), NodeType::File);
    for (child_index, child) in model.skeleton.bones.iter().enumerate() {
        if child.parent == Some(index) {
            node = node.add_child(bone_node(model, child_index));
        }
    }
    node
}

fn mesh_node(mesh: &Mesh) -> TreeNode {
    let node_type = if mesh.xref_source.is_some() {
        NodeType::Reference
    } else {
        NodeType::File
    };
    let mut node = TreeNode::new(mesh.name.as_str(), node_type);

    if let Some(source) = &mesh.xref_source {
        let target = format!("{source}.whm");
        node = node.with_external_ref(&target, detect_ref_type(&target));
    }
    if let Some(geometry) = &mesh.geometry {
        node = node
            .with_metadata("vertices", &geometry.vertices.len().to_string())
            .with_metadata("faces", &geometry.face_count().to_string());
        if geometry.is_skinned() {
            node = node.with_metadata("bones", &geometry.skin_bones().len().to_string());
        }
    }

    node
}

fn execute_validate(path: PathBuf, strict: bool, mod_folder: Option<PathBuf>) -> Result<()> {
    use console::style;

    println!("{}", style("Validating Model Container").bold().cyan());
    println!("{}", style("==========================").cyan());
    println!();

    let scope = load_scope(mod_folder)?;
    let file = File::open(&path).context("Failed to open model file")?;
    let (model, report) = import_container(BufReader::new(file), &ImportOptions { scope })
        .context("Failed to parse model container")?;

    println!("{}: {}", style("File").bold(), path.display());
    println!("{}: {}", style("Model").bold(), model.name);
    println!();

    if report.is_empty() {
        println!("{} {}", style("✓").green(), style("File decodes cleanly!").green());
    } else {
        println!("{} {} warning(s) found:", style("⚠").yellow(), report.len());
        for warning in &report {
            println!("  {} {}", style("•").yellow(), warning);
        }
        if strict {
            anyhow::bail!("validation found {} warning(s)", report.len());
        }
    }

    Ok(())
}

fn execute_convert(
    input: PathBuf,
    output: PathBuf,
    to: Dialect,
    textures: bool,
    mod_folder: Option<PathBuf>,
) -> Result<()> {
    use console::style;

    println!("{}", style("Model Dialect Conversion").bold().cyan());
    println!("{}", style("========================").cyan());
    println!();

    let scope = load_scope(mod_folder)?;
    let file = File::open(&input).context("Failed to open input model")?;
    let (model, import_report) = import_container(BufReader::new(file), &ImportOptions { scope })
        .context("Failed to parse model container")?;

    println!("{}: {}", style("Input").bold(), input.display());
    println!("{}: {}", style("Output").bold(), output.display());
    println!("{}: {}", style("Target dialect").bold(), Variant::from(to));

    let options = ExportOptions {
        variant: to.into(),
        max_texture_size: 768,
        ..Default::default()
    };

    let sink = BufWriter::new(File::create(&output).context("Failed to create output file")?);
    let export_report = if textures {
        let root = output.with_extension("");
        println!("{}: {}", style("Textures").bold(), root.display());
        let mut dispatcher = PathDispatcher::new(&root, TextureLayout::Flat);
        let report = export_container(&model, sink, Some(&mut dispatcher), &options)
            .context("Failed to write output model")?;
        if let Some(contents) = dispatcher.index_contents()
            && !contents.is_empty()
        {
            fs::create_dir_all(&root).context("Failed to create texture folder")?;
            fs::write(root.join("info.txt"), contents).context("Failed to write texture index")?;
        }
        report
    } else {
        export_container(&model, sink, None, &options).context("Failed to write output model")?
    };

    print_report("Import", &import_report);
    print_report("Export", &export_report);

    println!();
    println!("{} Conversion complete!", style("✓").green());

    Ok(())
}

/// Scan the mod folder into a search scope when one was given
fn load_scope(mod_folder: Option<PathBuf>) -> Result<Option<DowLayout>> {
    mod_folder
        .map(DowLayout::from_mod_folder)
        .transpose()
        .context("Failed to scan mod folder")
}

/// Dialect of a container from its model root version, header scan only
fn detect_dialect(data: &[u8]) -> Option<Variant> {
    let mut reader = ChunkReader::open(Cursor::new(data)).ok()?;
    loop {
        let header = reader.read_header().ok()??;
        if header.id == ChunkId::fold(b"RSGM") {
            return Variant::from_root_version(header.version);
        }
        reader.skip_chunk(&header).ok()?;
    }
}

fn print_report(stage: &str, report: &Report) {
    use console::style;

    if report.is_empty() {
        return;
    }
    println!();
    println!(
        "{} {} finished with {} warning(s):",
        style("⚠").yellow(),
        stage,
        report.len()
    );
    for warning in report {
        println!("  {} {}", style("•").yellow(), warning);
    }
}
