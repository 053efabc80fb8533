//! Tree rendering for container and scene visualization

use console::Style;

/// One node of a rendered tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub size: Option<u64>,
    pub children: Vec<TreeNode>,
    /// Key/value annotations, printed in insertion order
    pub metadata: Vec<(String, String)>,
    pub external_refs: Vec<ExternalRef>,
}

/// What a tree node stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Root,
    Header,
    Folder,
    Data,
    Directory,
    File,
    Reference,
}

/// A path into another file of the mod installation
#[derive(Debug, Clone)]
pub struct ExternalRef {
    pub path: String,
    pub ref_type: RefType,
}

/// What an external reference points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefType {
    Texture,
    Pattern,
    Model,
    Unknown,
}

/// Options for tree rendering
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub show_external_refs: bool,
    pub no_color: bool,
    pub show_metadata: bool,
    pub compact: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            show_external_refs: true,
            no_color: false,
            show_metadata: true,
            compact: false,
        }
    }
}

impl TreeNode {
    /// Create a new tree node
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            size: None,
            children: Vec::new(),
            metadata: Vec::new(),
            external_refs: Vec::new(),
        }
    }

    /// Add a child node
    pub fn add_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Set the size of this node
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Add a metadata annotation
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }

    /// Add an external reference
    pub fn with_external_ref(mut self, path: &str, ref_type: RefType) -> Self {
        self.external_refs.push(ExternalRef {
            path: path.to_string(),
            ref_type,
        });
        self
    }
}

impl ExternalRef {
    /// Icon for the referenced file kind
    pub fn icon(&self) -> &'static str {
        match self.ref_type {
            RefType::Texture => "🖼️",
            RefType::Pattern => "🎨",
            RefType::Model => "🏗️",
            RefType::Unknown => "📄",
        }
    }

    /// Color style for the reference line
    pub fn style(&self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self.ref_type {
                RefType::Texture | RefType::Pattern => Style::new().magenta(),
                RefType::Model => Style::new().yellow(),
                RefType::Unknown => Style::new().dim(),
            }
        }
    }
}

impl NodeType {
    /// Icon for this node type
    pub fn icon(&self) -> &'static str {
        match self {
            NodeType::Root => "📁",
            NodeType::Header => "📋",
            NodeType::Folder => "📦",
            NodeType::Data => "💾",
            NodeType::Directory => "📁",
            NodeType::File => "📄",
            NodeType::Reference => "🔗",
        }
    }

    /// Color style for this node type
    pub fn style(&self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self {
                NodeType::Root => Style::new().bold().cyan(),
                NodeType::Header => Style::new().bold().yellow(),
                NodeType::Folder => Style::new().blue(),
                NodeType::Data => Style::new().white(),
                NodeType::Directory => Style::new().cyan(),
                NodeType::File => Style::new().green(),
                NodeType::Reference => Style::new().yellow(),
            }
        }
    }
}

/// Render a tree structure to a string
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let mut output = String::new();
    render_node(root, &mut output, "", true, 0, options);
    output
}

fn render_node(
    node: &TreeNode,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &TreeOptions,
) {
    if let Some(max_depth) = options.max_depth
        && depth > max_depth
    {
        return;
    }

    let icon = node.node_type.icon();
    let style = node.node_type.style(options.no_color);
    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };

    let mut line = format!(
        "{}{}{} {}",
        prefix,
        connector,
        icon,
        style.apply_to(&node.name)
    );

    if let Some(size) = node.size {
        line.push_str(&format!(" ({})", format_bytes(size)));
    }

    if options.show_metadata && options.compact && !node.metadata.is_empty() {
        let mut meta_parts = Vec::new();
        for (key, value) in &node.metadata {
            if ["version", "count", "frames", "format"].contains(&key.as_str()) {
                meta_parts.push(format!("{key}:{value}"));
            }
        }
        if !meta_parts.is_empty() {
            line.push_str(&format!(" [{}]", meta_parts.join(", ")));
        }
    }

    output.push_str(&line);
    output.push('\n');

    let child_prefix = if depth == 0 {
        ""
    } else if is_last {
        "    "
    } else {
        "│   "
    };

    if options.show_metadata && !options.compact && !node.metadata.is_empty() {
        let meta_prefix = format!("{prefix}{child_prefix}    ");
        let meta_style = Style::new().dim();
        for (key, value) in &node.metadata {
            output.push_str(&format!(
                "{}🏷️  {}: {}\n",
                meta_prefix,
                meta_style.apply_to(key),
                value
            ));
        }
    }

    if options.show_external_refs && !node.external_refs.is_empty() {
        let ref_prefix = format!("{prefix}{child_prefix}    ");
        for external in &node.external_refs {
            let style = external.style(options.no_color);
            output.push_str(&format!(
                "{}└─→ {} {}\n",
                ref_prefix,
                external.icon(),
                style.apply_to(&external.path)
            ));
        }
    }

    if !node.children.is_empty() {
        let new_prefix = if depth == 0 {
            String::new()
        } else {
            format!("{prefix}{child_prefix}")
        };

        for (index, child) in node.children.iter().enumerate() {
            let is_last_child = index == node.children.len() - 1;
            render_node(
                child,
                output,
                &new_prefix,
                is_last_child,
                depth + 1,
                options,
            );
        }
    }
}

/// Format bytes in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Reference type for a declared path by its extension
pub fn detect_ref_type(path: &str) -> RefType {
    let path_lower = path.to_lowercase();

    if path_lower.ends_with(".rsh") || path_lower.ends_with(".tga") || path_lower.ends_with(".dds")
    {
        RefType::Texture
    } else if path_lower.ends_with(".wtp") {
        RefType::Pattern
    } else if path_lower.ends_with(".whm") || path_lower.ends_with(".sgm") {
        RefType::Model
    } else {
        RefType::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_rendering() {
        let root = TreeNode::new("guardsman.whm", NodeType::Root)
            .with_size(1024)
            .with_metadata("version", "3")
            .add_child(
                TreeNode::new("FOLDRSGM", NodeType::Folder).add_child(
                    TreeNode::new("DATASSHR", NodeType::Data)
                        .with_size(32)
                        .with_external_ref("art/unit/body.rsh", RefType::Texture),
                ),
            );

        let options = TreeOptions::default();
        let output = render_tree(&root, &options);

        assert!(output.contains("guardsman.whm"));
        assert!(output.contains("FOLDRSGM"));
        assert!(output.contains("DATASSHR"));
        assert!(output.contains("art/unit/body.rsh"));
    }

    #[test]
    fn test_ref_type_detection() {
        assert_eq!(detect_ref_type("art/unit/body.rsh"), RefType::Texture);
        assert_eq!(detect_ref_type("art/unit/body_default.wtp"), RefType::Pattern);
        assert_eq!(detect_ref_type("art/shared/wargear.whm"), RefType::Model);
        assert_eq!(detect_ref_type("readme.txt"), RefType::Unknown);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
