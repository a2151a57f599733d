//! Workers that shell out to external tools.
//!
//! All four external steps (dcraw thumbnail extraction, exiv2 XMP
//! extraction, jhead auto-rotation, git staging) share one runner: a
//! command template expanded per picture, executed in the repo working
//! directory, with exit status and captured output turned into a worker
//! failure on anything but success.

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::config::RepoConfig;
use crate::error::{PicError, Result};
use crate::picture::{ContentType, Picture, Sidecar};

use super::Worker;

/// One argument slot in a command template.
#[derive(Debug, Clone)]
enum Arg {
    Lit(String),
    /// The picture's filename.
    Filename,
    /// The picture's current thumbnail path. Expansion fails when the
    /// picture has none.
    Thumbnail,
    /// All current sidecar paths, in order.
    Sidecars,
}

/// What the tool leaves behind on success.
#[derive(Debug, Clone)]
enum Produces {
    Nothing,
    /// `<basename>.thumb.jpg` in the repo root.
    Thumbnail,
    /// `<basename>.xmp` in the repo root, moved into the sidecar dir.
    Xmp { sidecar_dir: String },
}

pub struct ExternalWorker {
    name: &'static str,
    program: String,
    args: Vec<Arg>,
    produces: Produces,
}

impl ExternalWorker {
    /// `dcraw -e <filename>`, leaving `<basename>.thumb.jpg` behind.
    pub fn dcraw_thumb(config: &RepoConfig) -> Self {
        Self {
            name: "dcraw-thumb",
            program: config.tools.dcraw.clone(),
            args: vec![Arg::Lit("-e".into()), Arg::Filename],
            produces: Produces::Thumbnail,
        }
    }

    /// `exiv2 -e X ex <filename>`, leaving `<basename>.xmp` behind.
    pub fn exiv2_xmp(config: &RepoConfig) -> Self {
        Self {
            name: "exiv2-xmp",
            program: config.tools.exiv2.clone(),
            args: vec![
                Arg::Lit("-e".into()),
                Arg::Lit("X".into()),
                Arg::Lit("ex".into()),
                Arg::Filename,
            ],
            produces: Produces::Xmp {
                sidecar_dir: config.xmp.sidecar_dir.clone(),
            },
        }
    }

    /// `jhead -autorot <thumbnail>`, rotating the extracted thumbnail in
    /// place per its orientation tag.
    pub fn autorot(config: &RepoConfig) -> Self {
        Self {
            name: "autorot",
            program: config.tools.jhead.clone(),
            args: vec![Arg::Lit("-autorot".into()), Arg::Thumbnail],
            produces: Produces::Nothing,
        }
    }

    /// `git add <filename> <sidecars..>`, staging the negative and its
    /// derived files in a repo that is also a git work tree.
    pub fn git_add(config: &RepoConfig) -> Self {
        Self {
            name: "git-add",
            program: config.tools.git.clone(),
            args: vec![Arg::Lit("add".into()), Arg::Filename, Arg::Sidecars],
            produces: Produces::Nothing,
        }
    }

    fn failed(&self, picture: &Picture, reason: impl std::fmt::Display) -> PicError {
        PicError::WorkerFailed {
            worker: self.name.to_string(),
            filename: picture.filename().to_string(),
            reason: reason.to_string(),
        }
    }

    fn expand(&self, picture: &Picture) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            match arg {
                Arg::Lit(s) => out.push(s.clone()),
                Arg::Filename => out.push(picture.filename().to_string()),
                Arg::Thumbnail => {
                    let thumb = picture
                        .thumbnail()
                        .ok_or_else(|| self.failed(picture, "picture has no thumbnail"))?;
                    out.push(thumb.to_string());
                }
                Arg::Sidecars => {
                    out.extend(picture.sidecars().iter().map(|s| s.path.clone()));
                }
            }
        }
        Ok(out)
    }
}

/// Describe a failed exit status, including death by signal.
fn describe_status(status: std::process::ExitStatus) -> String {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return format!("killed by signal {sig}");
        }
    }
    match status.code() {
        Some(code) => format!("exited with status {code}"),
        None => "exited abnormally".to_string(),
    }
}

impl Worker for ExternalWorker {
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&self, picture: &mut Picture, repo_root: &Path) -> Result<Option<Sidecar>> {
        let args = self.expand(picture)?;
        tracing::debug!(
            worker = self.name,
            program = self.program,
            args = args.join(" "),
            "running external tool"
        );

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(repo_root)
            .output()
            .map_err(|e| self.failed(picture, format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                worker = self.name,
                program = self.program,
                status = %output.status,
                stderr = stderr.trim(),
                "external tool failed"
            );
            return Err(self.failed(
                picture,
                format!("{} {}", self.program, describe_status(output.status)),
            ));
        }

        match &self.produces {
            Produces::Nothing => Ok(None),
            Produces::Thumbnail => {
                let path = format!("{}.thumb.jpg", picture.basename());
                if !repo_root.join(&path).is_file() {
                    return Err(self.failed(picture, format!("{path} was not produced")));
                }
                Ok(Some(Sidecar {
                    path,
                    content_type: ContentType::Thumbnail,
                }))
            }
            Produces::Xmp { sidecar_dir } => {
                let extracted = format!("{}.xmp", picture.basename());
                if !repo_root.join(&extracted).is_file() {
                    return Err(self.failed(picture, format!("{extracted} was not produced")));
                }
                fs::create_dir_all(repo_root.join(sidecar_dir))?;
                let path = format!("{sidecar_dir}/{extracted}");
                fs::rename(repo_root.join(&extracted), repo_root.join(&path))?;
                Ok(Some(Sidecar {
                    path,
                    content_type: ContentType::XmpMetadata,
                }))
            }
        }
    }
}
