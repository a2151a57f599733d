//! Pic Core - Raw negative collection management library.
//!
//! Pic treats a directory of raw negatives as a repository: an indexed
//! collection where every negative carries its checksum, camera metadata,
//! derived sidecar files and processing history.
//!
//! # Architecture
//!
//! Ingestion is a concurrent multi-stage pipeline over the repository:
//!
//! ```text
//! Negative → Hash → Metadata → Thumbnail → Autorot → Index
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use pic_core::{Picture, Pipeline, Recipe, Repo};
//!
//! fn main() -> pic_core::Result<()> {
//!     let mut repo = Repo::load("file:///photos/2026")?;
//!     let recipe = Recipe::parse(&repo.config.recipes.default)?;
//!
//!     let mut pipeline = Pipeline::new(&recipe, &repo.config, "/photos/2026".into());
//!     pipeline.start();
//!     pipeline.put(Picture::new("DSC_0001.NEF")?);
//!     for picture in pipeline.finish(&Default::default()) {
//!         repo.index.add(picture)?;
//!     }
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod connector;
pub mod error;
pub mod index;
pub mod picture;
pub mod pipeline;
pub mod recipe;
pub mod repo;
pub mod vurl;
pub mod worker;

// Re-exports for convenient access
pub use config::RepoConfig;
pub use connector::{connector_for, Connector};
pub use error::{PicError, Result};
pub use index::PictureIndex;
pub use picture::{ContentType, FileType, Picture, Sidecar};
pub use pipeline::Pipeline;
pub use recipe::Recipe;
pub use repo::Repo;
pub use vurl::PicUrl;
pub use worker::{Worker, WorkerKind};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
