//! Export path resolution for texture files.
//!
//! Declared paths are the game-relative posix-style paths written inside
//! chunk names; real paths are where extracted files land on disk. The two
//! concerns are separate: [`resolve_declared_path`] picks the declared path
//! for a material, [`PathDispatcher`] maps declared paths to disk locations
//! under a chosen layout.

use std::path::{Path, PathBuf};

/// How extracted files are arranged on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureLayout {
    /// Everything in one folder, path components dropped
    #[default]
    Flat,
    /// One folder per immediate parent where a file requests it
    FlatFolders,
    /// Full declared paths mirrored under the root
    FullPath,
}

/// Pick the declared path for a material.
///
/// Strict precedence: an explicit per-image override wins, then a
/// user-supplied material path, then the default folder joined with the
/// material name. Callers targeting the legacy format pass no override
/// because only the newer format records one.
pub fn resolve_declared_path(
    single_image_path: Option<&str>,
    full_path: Option<&str>,
    material_name: &str,
    default_folder: &str,
) -> String {
    if let Some(path) = single_image_path {
        if !path.trim().is_empty() {
            return path.to_string();
        }
    }
    if let Some(path) = full_path {
        if !path.trim().is_empty() {
            return path.to_string();
        }
    }
    join_declared(default_folder, material_name)
}

/// Join declared path segments with forward slashes
pub fn join_declared(folder: &str, name: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

/// Maps declared paths to real disk paths and records what landed where
#[derive(Debug)]
pub struct PathDispatcher {
    root: PathBuf,
    layout: TextureLayout,
    entries: Vec<(PathBuf, String)>,
}

impl PathDispatcher {
    /// Dispatcher rooted at `root`
    pub fn new(root: impl Into<PathBuf>, layout: TextureLayout) -> Self {
        Self {
            root: root.into(),
            layout,
            entries: Vec::new(),
        }
    }

    /// The layout in use
    pub fn layout(&self) -> TextureLayout {
        self.layout
    }

    /// Disk path for a declared path.
    ///
    /// `keep_parent` asks the flat-folders layout to keep the immediate
    /// parent folder, used for images sharing a material folder.
    pub fn get_path(&self, declared: &str, keep_parent: bool) -> PathBuf {
        let declared_path = Path::new(declared);
        let file_name = declared_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_default();
        match self.layout {
            TextureLayout::Flat => self.root.join(file_name),
            TextureLayout::FlatFolders => {
                let parent = declared_path
                    .parent()
                    .and_then(Path::file_name)
                    .filter(|_| keep_parent);
                match parent {
                    Some(parent) => self.root.join(parent).join(file_name),
                    None => self.root.join(file_name),
                }
            }
            TextureLayout::FullPath => self.root.join(declared_path),
        }
    }

    /// Record where a declared path was written
    pub fn record(&mut self, declared: &str, real: &Path) {
        let relative = real.strip_prefix(&self.root).unwrap_or(real).to_path_buf();
        self.entries.push((relative, declared.to_string()));
    }

    /// Index file contents mapping real files back to declared paths.
    ///
    /// The full-path layout needs no index because the paths are the
    /// mapping; returns `None` there.
    pub fn index_contents(&self) -> Option<String> {
        if self.layout == TextureLayout::FullPath {
            return None;
        }
        let mut out = String::new();
        for (real, declared) in &self.entries {
            out.push_str(&format!("{} -> {}\n", real.display(), declared));
        }
        Some(out)
    }
}
