//! A repository: a directory of negatives plus the `.pic/` control
//! directory holding configuration and the picture index.
//!
//! Every operation is mediated by a [`Connector`], so the repo code is
//! identical for local directories and remote SSH locations.

use std::path::Path;

use crate::config::RepoConfig;
use crate::connector::Connector;
use crate::error::{PicError, Result};
use crate::index::PictureIndex;

/// Name of the control directory at the repo root.
pub const CONTROL_DIR: &str = ".pic";

/// Config file path under the repo root.
pub const CONFIG_FILE: &str = ".pic/config";

const DIR_MODE: u32 = 0o755;

/// Binds a configuration and a picture index; persists both through a
/// connector whose lifetime is the operation in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Repo {
    pub config: RepoConfig,
    pub index: PictureIndex,
}

impl Repo {
    /// Initialize a new repository at the connector's base.
    ///
    /// Creates the base directory if missing, creates the control
    /// directory, writes the configuration and an empty index.
    pub fn init(conn: &mut dyn Connector, config: RepoConfig) -> Result<Self> {
        if !conn.exists(Path::new("."))? {
            conn.mkdir(Path::new("."), DIR_MODE)?;
        }
        conn.mkdir(Path::new(CONTROL_DIR), DIR_MODE)?;

        let repo = Self {
            config,
            index: PictureIndex::new(),
        };
        repo.save_config(conn)?;
        repo.save_index(conn)?;
        tracing::info!(url = %conn.url(), "initialized repository");
        Ok(repo)
    }

    /// Load an existing repository from the connector's base.
    pub fn load(conn: &mut dyn Connector) -> Result<Self> {
        if !conn.exists(Path::new("."))? || !conn.exists(Path::new(CONTROL_DIR))? {
            return Err(PicError::RepoNotFound(conn.url().to_string()));
        }

        let mut reader = conn.open_read(Path::new(CONFIG_FILE))?;
        let config = RepoConfig::read_from(&mut reader)?;

        let index_path = Path::new(&config.index.file);
        let mut reader = conn.open_read(index_path)?;
        let index = PictureIndex::read_from(&mut reader, index_path)?;

        Ok(Self { config, index })
    }

    /// Write the current index back to `config.index.file`.
    pub fn save_index(&self, conn: &mut dyn Connector) -> Result<()> {
        let mut writer = conn.open_write(Path::new(&self.config.index.file))?;
        self.index
            .write_to(&mut writer, self.config.index.format_version)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the configuration to `.pic/config`.
    pub fn save_config(&self, conn: &mut dyn Connector) -> Result<()> {
        let mut writer = conn.open_write(Path::new(CONFIG_FILE))?;
        self.config.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Clone the repository at `src` into a freshly initialized repo at
    /// `dst`: deep-copy config and index, then copy the bytes of every
    /// indexed negative.
    ///
    /// `src` must already be connected. `dst` is connected on demand and
    /// disconnected again on return.
    pub fn clone_repo(src: &mut dyn Connector, dst: &mut dyn Connector) -> Result<Self> {
        let origin = Self::load(src)?;

        let was_connected = dst.is_connected();
        if !was_connected {
            dst.connect()?;
        }
        let result = (|| {
            let repo = Self::init(dst, origin.config.clone())?;
            for picture in origin.index.iter() {
                let filename = Path::new(picture.filename());
                tracing::debug!(file = picture.filename(), "copying");
                src.copy_to(filename, dst, filename)?;
            }
            let repo = Self {
                config: repo.config,
                index: origin.index.clone(),
            };
            repo.save_index(dst)?;
            Ok(repo)
        })();
        if !was_connected {
            dst.disconnect();
        }
        result
    }
}
