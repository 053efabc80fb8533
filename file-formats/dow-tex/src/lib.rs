//! # dow-tex
//!
//! Reader and writer for the texture-side Relic Chunky containers of
//! Warhammer 40,000: Dawn of War: `.rsh` shader textures and `.wtp` team
//! colour patterns.
//!
//! An RSH file bundles the textures of one material, one per image role
//! (diffuse, specularity, reflection, self-illumination, opacity), as DXT
//! payloads with their DDS headers stripped. A WTP file carries the
//! grayscale tint masks the engine recolours per player plus badge/banner
//! placements. This crate decodes both into owned structs, re-encodes them
//! byte-compatibly and rebuilds standalone DDS/TGA files for extraction.
//!
//! ## Usage
//!
//! ```no_run
//! use dow_tex::{LayerRole, RshFile};
//!
//! let data = std::fs::read("tactical_marine.rsh")?;
//! let rsh = RshFile::from_bytes(&data)?;
//! for layer in &rsh.layers {
//!     println!("{}: {}x{}", layer.role, layer.image.width, layer.image.height);
//! }
//! if let Some(diffuse) = rsh.layer(LayerRole::Diffuse) {
//!     std::fs::write("diffuse.dds", diffuse.image.to_file_bytes())?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;

pub mod dds;
pub mod layers;
pub mod paths;
pub mod rsh;
pub mod tga;
pub mod wtp;

pub use error::{Result, TexError};
pub use layers::{assign_channels, ChannelAssignment, ImageFormat, LayerRole, PatternLayer};
pub use paths::{resolve_declared_path, PathDispatcher, TextureLayout};
pub use rsh::{RshFile, RshLayer, RshWriteOptions, TextureImage};
pub use wtp::{PatternImage, SlotPlacement, WtpFile};
