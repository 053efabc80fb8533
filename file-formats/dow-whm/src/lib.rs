//! # dow-whm
//!
//! Reader and writer for the model containers of Warhammer 40,000:
//! Dawn of War: `.whm` files and their older `.sgm` sibling.
//!
//! Both dialects pack the same scene into a Relic Chunky tree: materials
//! (referenced by path or embedded as texture chunks), a bone hierarchy,
//! skinned meshes with per-vertex weights, attachment markers and keyframed
//! actions. This crate decodes either dialect into one [`SceneModel`] and
//! re-encodes a model into whichever dialect is asked for. Problems a
//! container can survive (missing textures, unresolvable references,
//! meshes too large to address) degrade into a [`Report`] instead of
//! failing the whole file; malformed chunk structure stays fatal.
//!
//! Cross-referenced meshes and external materials live in other files of
//! a mod installation. Give [`parser::ImportOptions`] a [`DowLayout`] to
//! resolve them; without one every reference degrades into a placeholder.
//!
//! ## Usage
//!
//! ```no_run
//! use dow_whm::{import_container, ImportOptions};
//!
//! let file = std::fs::File::open("guardsman.whm")?;
//! let reader = std::io::BufReader::new(file);
//! let (model, report) = import_container(reader, &ImportOptions::default())?;
//! println!(
//!     "{}: {} meshes, {} actions",
//!     model.name,
//!     model.meshes.len(),
//!     model.actions.len()
//! );
//! for warning in report.warnings() {
//!     eprintln!("{warning}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod xref;

pub mod anim;
pub mod coordinate;
pub mod layout;
pub mod mesh;
pub mod parser;
pub mod props;
pub mod report;
pub mod scene;
pub mod versions;
pub mod writer;

pub use error::{Result, WhmError};
pub use layout::DowLayout;
pub use parser::{import_container, ImportOptions};
pub use report::{Report, Warning};
pub use scene::SceneModel;
pub use versions::Variant;
pub use writer::{export_container, ExportOptions};
