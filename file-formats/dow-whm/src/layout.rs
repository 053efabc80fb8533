//! Game data search scope.
//!
//! Dawn of War resolves asset paths against an ordered list of mod
//! folders: the mod itself, its required mods from the `.module` file, and
//! the implicit `engine` mod. Lookups are case-insensitive because the
//! files were authored on Windows and the declared paths inside containers
//! rarely match the on-disk casing. Archived `.sga` sources are not
//! searched; the game unpacks the interesting ones next to them anyway.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::Result;

/// Texture detail level the game can be configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureLevel {
    /// Full resolution, the only level shipped
    #[default]
    Full,
}

impl TextureLevel {
    /// Path fragment substituted for `%TEXTURE-LEVEL%`
    pub fn as_str(self) -> &'static str {
        "Full"
    }
}

/// Sound detail level the game can be configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoundLevel {
    /// Full quality
    #[default]
    Full,
    /// Medium quality
    Med,
    /// Low quality
    Low,
}

impl SoundLevel {
    /// Path fragment substituted for `%SOUND-LEVEL%`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "Full",
            Self::Med => "Med",
            Self::Low => "Low",
        }
    }
}

/// Model detail level the game can be configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelLevel {
    /// High detail
    #[default]
    High,
    /// Medium detail
    Medium,
    /// Low detail
    Low,
}

impl ModelLevel {
    /// Path fragment substituted for `%MODEL-LEVEL%`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// One searchable directory belonging to a mod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSource {
    /// Directory the source maps paths into; may not exist
    pub root: PathBuf,
    /// Name of the mod the source belongs to
    pub mod_name: String,
}

/// Mod description parsed from a `.module` file.
///
/// Data folder and archive names are kept for completeness even though
/// only directory sources are searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModConfig {
    /// Folder the mod's files live under
    pub modfolder: String,
    /// `DataFolder.N` values in numeric order
    pub datafolders: Vec<String>,
    /// `ArchiveFile.N` values in numeric order
    pub archivefiles: Vec<String>,
    /// `RequiredMod.N` values in numeric order; `None` when the mod has
    /// no `.module` file, which implies the stock campaign mods
    pub requiredmods: Option<Vec<String>>,
}

impl ModConfig {
    /// Fallback config for a mod without a `.module` file
    fn fallback(name: &str) -> Self {
        Self {
            modfolder: name.to_string(),
            datafolders: vec!["Data".to_string()],
            archivefiles: Vec::new(),
            requiredmods: None,
        }
    }

    /// The engine pseudo-mod every layout searches last
    fn engine() -> Self {
        Self {
            modfolder: "engine".to_string(),
            datafolders: Vec::new(),
            archivefiles: vec![
                "%LOCALE%\\EnginLoc".to_string(),
                "Engine".to_string(),
                "Engine-New".to_string(),
            ],
            requiredmods: None,
        }
    }
}

/// Ordered search scope over a game installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DowLayout {
    /// Language substituted for `%LOCALE%`
    pub default_lang: String,
    /// Detail level substituted for `%TEXTURE-LEVEL%`
    pub default_texture_level: TextureLevel,
    /// Detail level substituted for `%SOUND-LEVEL%`
    pub default_sound_level: SoundLevel,
    /// Detail level substituted for `%MODEL-LEVEL%`
    pub default_model_level: ModelLevel,
    /// Directories in search order
    pub sources: Vec<LayoutSource>,
}

impl Default for DowLayout {
    fn default() -> Self {
        Self {
            default_lang: "english".to_string(),
            default_texture_level: TextureLevel::default(),
            default_sound_level: SoundLevel::default(),
            default_model_level: ModelLevel::default(),
            sources: Vec::new(),
        }
    }
}

impl DowLayout {
    /// Build the search scope for a mod folder inside a game installation.
    ///
    /// `path` points at the mod's folder, e.g. `<game>/W40k`; the game
    /// root is its parent. Sources come out in search order: the data
    /// folder of the mod, of its required mods (stock `dxp2` and `w40k`
    /// when no `.module` file says otherwise) and of `engine`, then the
    /// movie and locale folders of the same mods.
    pub fn from_mod_folder(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let dow_folder = match path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
            Some(parent) => parent,
            None => Path::new("."),
        };

        let mut layout = Self {
            default_lang: load_default_lang(dow_folder)
                .unwrap_or_else(|| "english".to_string()),
            ..Self::default()
        };

        let configs = load_mod_configs(dow_folder)?;
        let mod_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let lookup = |name: &str| {
            configs
                .get(&name.to_ascii_lowercase())
                .cloned()
                .unwrap_or_else(|| ModConfig::fallback(name))
        };

        let first = lookup(&mod_name);
        let required_names = first
            .requiredmods
            .clone()
            .unwrap_or_else(|| vec!["dxp2".to_string(), "w40k".to_string()]);
        let mut mods = vec![first];
        for name in required_names.iter().map(String::as_str).chain(["engine"]) {
            mods.push(lookup(name));
        }

        for config in &mods {
            layout.sources.push(LayoutSource {
                root: try_find_path(dow_folder, &[&config.modfolder, "Data"]),
                mod_name: config.modfolder.clone(),
            });
        }
        for config in &mods {
            layout.sources.push(LayoutSource {
                root: try_find_path(dow_folder, &[&config.modfolder, "Movies"]),
                mod_name: config.modfolder.clone(),
            });
            let locale = layout.interpolate_path("%LOCALE%");
            let mut parts = vec![config.modfolder.as_str()];
            parts.extend(split_segments(&locale));
            layout.sources.push(LayoutSource {
                root: try_find_path(dow_folder, &parts),
                mod_name: config.modfolder.clone(),
            });
        }
        Ok(layout)
    }

    /// Expand `%LOCALE%` and detail-level placeholders and normalize the
    /// separators to `/`
    pub fn interpolate_path(&self, path: &str) -> String {
        let locale = format!("Locale/{}", ascii_title(&self.default_lang));
        path.replace("%LOCALE%", &locale)
            .replace("%TEXTURE-LEVEL%", self.default_texture_level.as_str())
            .replace("%SOUND-LEVEL%", self.default_sound_level.as_str())
            .replace("%MODEL-LEVEL%", self.default_model_level.as_str())
            .replace('\\', "/")
    }

    /// All existing matches for a relative path, in source order
    pub fn iter_paths<'a>(&'a self, path: &str) -> impl Iterator<Item = PathBuf> + 'a {
        let parts: Vec<String> = split_segments(path).map(str::to_string).collect();
        self.sources.iter().filter_map(move |source| {
            if !source.root.exists() {
                return None;
            }
            let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
            let candidate = try_find_path(&source.root, &parts);
            candidate.exists().then_some(candidate)
        })
    }

    /// First existing match for a relative path
    pub fn find(&self, path: &str) -> Option<PathBuf> {
        self.iter_paths(path).next()
    }

    /// Merged directory listing across sources.
    ///
    /// The first source wins for entries whose names collide
    /// case-insensitively.
    pub fn iter_dir(&self, path: &str) -> Vec<PathBuf> {
        let parts: Vec<&str> = split_segments(path).collect();
        let mut seen: Vec<String> = Vec::new();
        let mut entries = Vec::new();
        for source in &self.sources {
            if !source.root.exists() {
                continue;
            }
            let dir = try_find_path(&source.root, &parts);
            let Ok(listing) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in listing.flatten() {
                let key = entry.file_name().to_string_lossy().to_ascii_lowercase();
                if !seen.contains(&key) {
                    seen.push(key);
                    entries.push(entry.path());
                }
            }
        }
        entries
    }
}

/// Resolve a path against a root, matching each segment case-insensitively.
///
/// Each segment tries the given spelling, then lowercase, UPPERCASE and
/// Title-Case, then falls back to scanning the directory. When a segment
/// cannot be found at all the naive join of every segment onto the root is
/// returned so callers get a plausible path to report.
pub fn try_find_path(root: &Path, parts: &[&str]) -> PathBuf {
    let mut current = root.to_path_buf();
    for part in parts {
        let candidates = [
            (*part).to_string(),
            part.to_ascii_lowercase(),
            part.to_ascii_uppercase(),
            ascii_title(part),
        ];
        if let Some(hit) = candidates
            .iter()
            .map(|candidate| current.join(candidate))
            .find(|candidate| candidate.exists())
        {
            current = hit;
            continue;
        }
        if current.is_dir() {
            let scanned = fs::read_dir(&current).ok().and_then(|entries| {
                entries.flatten().find(|entry| {
                    entry
                        .file_name()
                        .to_string_lossy()
                        .eq_ignore_ascii_case(part)
                })
            });
            match scanned {
                Some(entry) => current = entry.path(),
                None => {
                    let mut fallback = root.to_path_buf();
                    for part in parts {
                        fallback.push(part);
                    }
                    return fallback;
                }
            }
        }
    }
    current
}

/// Split a declared path on both separator styles, dropping empty segments
pub(crate) fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\']).filter(|segment| !segment.is_empty())
}

/// Title-case every alphabetic run, the way `str.title` does
fn ascii_title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if c.is_ascii_alphabetic() {
            if word_start {
                out.push(c.to_ascii_uppercase());
                word_start = false;
            } else {
                out.push(c.to_ascii_lowercase());
            }
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

/// Default language from `regions.ini`, when present and well-formed
fn load_default_lang(dow_folder: &Path) -> Option<String> {
    let text = fs::read_to_string(dow_folder.join("regions.ini")).ok()?;
    let section = parse_ini_section(&text, "global");
    section.get("lang").cloned()
}

/// Parse every `.module` file in the game root, keyed by lowercase mod name
fn load_mod_configs(dow_folder: &Path) -> Result<HashMap<String, ModConfig>> {
    let mut configs = HashMap::new();
    // the engine has no .module file but every install carries its data
    configs.insert("engine".to_string(), ModConfig::engine());

    for entry in fs::read_dir(dow_folder)? {
        let entry = entry?;
        let path = entry.path();
        let is_module = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("module"));
        if !is_module || !path.is_file() {
            continue;
        }
        let Some(stem) = path.file_stem() else {
            continue;
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping unreadable module file {}: {e}", path.display());
                continue;
            }
        };
        let section = parse_ini_section(&text, "global");
        let Some(modfolder) = section.get("modfolder").cloned() else {
            warn!("Module file {} has no ModFolder entry", path.display());
            continue;
        };
        configs.insert(
            stem.to_string_lossy().to_ascii_lowercase(),
            ModConfig {
                modfolder,
                datafolders: numbered_values(&section, "datafolder"),
                archivefiles: numbered_values(&section, "archivefile"),
                requiredmods: Some(numbered_values(&section, "requiredmod")),
            },
        );
    }
    Ok(configs)
}

/// Keys and values of one INI section; keys come out lowercased.
///
/// `.module` files allow `#`, `;` and `--` comment lines.
fn parse_ini_section(text: &str, section: &str) -> HashMap<String, String> {
    let mut in_section = false;
    let mut values = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with(';')
            || line.starts_with("--")
        {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            in_section = name.eq_ignore_ascii_case(section);
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            values.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }
    values
}

/// Values of `<prefix>.N` keys ordered by N
fn numbered_values(section: &HashMap<String, String>, prefix: &str) -> Vec<String> {
    let mut entries: Vec<(i64, String)> = section
        .iter()
        .filter_map(|(key, value)| {
            let index = key.strip_prefix(prefix)?.strip_prefix('.')?;
            Some((index.parse().ok()?, value.clone()))
        })
        .collect();
    entries.sort_by_key(|(index, _)| *index);
    entries.into_iter().map(|(_, value)| value).collect()
}
