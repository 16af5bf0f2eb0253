//! OBJ (master image) acquisition.
//!
//! Sources are tried in order: the local master file, the JP2 written for
//! the page, the preview JPEG written for the page, then a download from the
//! catalog. The first that succeeds wins.

use std::path::{Path, PathBuf};

use tracing::{error, info, instrument};

use super::PackageError;
use crate::catalog::{CatalogSource, ItemInfo};
use crate::filegetter::LocalFileGetter;

/// OBJ extension for local masters when none is configured.
pub const DEFAULT_OBJ_EXTENSION: &str = "tiff";

/// Extension used for remote objects whose filename has none.
pub const FALLBACK_OBJ_EXTENSION: &str = "bin";

/// OBJ behaviour configured for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjSettings {
    /// Extension given to copied local masters.
    pub extension: String,
    /// Never derive OBJ from JP2, JPEG or the catalog.
    pub skip_obj: bool,
}

impl Default for ObjSettings {
    fn default() -> Self {
        Self {
            extension: DEFAULT_OBJ_EXTENSION.to_string(),
            skip_obj: false,
        }
    }
}

/// The page being given an OBJ.
#[derive(Debug, Clone, Copy)]
pub struct ObjRequest<'a> {
    /// Page directory inside the package.
    pub page_dir: &'a Path,
    /// Page directory name, checked against the local master filename.
    pub page_name: &'a str,
    /// Local master file at this page's index, if any.
    pub local_path: Option<&'a Path>,
    /// JP2 written for this page, if any.
    pub jp2_written: Option<&'a Path>,
    /// Preview JPEG written for this page, if any.
    pub jpeg_written: Option<&'a Path>,
    /// Catalog pointer of the page.
    pub pointer: &'a str,
    /// Item info of the page.
    pub info: &'a ItemInfo,
}

/// Where a written OBJ came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjSource {
    /// Local master file.
    Local,
    /// Copy of the page JP2.
    Jp2,
    /// Copy of the page preview JPEG.
    Jpeg,
    /// Downloaded from the catalog.
    Remote,
}

/// Result of OBJ acquisition for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjOutcome {
    /// An OBJ file was written.
    Written {
        /// Which source supplied it.
        source: ObjSource,
        /// The written file.
        path: PathBuf,
    },
    /// No local master and derived OBJs are disabled.
    Skipped,
    /// Every source was tried and none produced a file.
    Unavailable,
}

/// Produces the OBJ file for one page.
///
/// `obj_selected` gates only the local master; the derived sources are
/// governed by [`ObjSettings::skip_obj`].
///
/// # Errors
///
/// Returns [`PackageError::ObjPathRejected`] when the local master fails the
/// getter's path check and [`PackageError::CopyFile`] when it cannot be copied.
#[instrument(skip_all, fields(pointer = %request.pointer, page = %request.page_name))]
pub async fn acquire_obj(
    request: &ObjRequest<'_>,
    settings: &ObjSettings,
    obj_selected: bool,
    files: &dyn LocalFileGetter,
    catalog: &dyn CatalogSource,
) -> Result<ObjOutcome, PackageError> {
    if obj_selected && let Some(local) = request.local_path {
        if !files.check_page_file_path(local, request.page_name) {
            return Err(PackageError::obj_path_rejected(local, request.page_name));
        }
        let target = request.page_dir.join(format!("OBJ.{}", settings.extension));
        tokio::fs::copy(local, &target)
            .await
            .map_err(|e| PackageError::copy_file(local, &target, e))?;
        return Ok(ObjOutcome::Written {
            source: ObjSource::Local,
            path: target,
        });
    }

    if settings.skip_obj {
        return Ok(ObjOutcome::Skipped);
    }

    if let Some(jp2) = request.jp2_written {
        info!("local master not found; using JP2");
        let target = request.page_dir.join("OBJ.jp2");
        return Ok(copy_derived(jp2, target, ObjSource::Jp2).await);
    }

    if let Some(jpeg) = request.jpeg_written {
        info!("local master not found; using JPEG");
        let target = request.page_dir.join("OBJ.jpg");
        return Ok(copy_derived(jpeg, target, ObjSource::Jpeg).await);
    }

    info!("local master not found; downloading from catalog");
    Ok(download_obj(request, catalog).await)
}

async fn copy_derived(from: &Path, target: PathBuf, source: ObjSource) -> ObjOutcome {
    match tokio::fs::copy(from, &target).await {
        Ok(_) => ObjOutcome::Written { source, path: target },
        Err(e) => {
            error!(from = %from.display(), to = %target.display(), error = %e, "failed to copy derived OBJ");
            ObjOutcome::Unavailable
        }
    }
}

async fn download_obj(request: &ObjRequest<'_>, catalog: &dyn CatalogSource) -> ObjOutcome {
    let remote = match catalog.download_remote_object(request.pointer, request.info).await {
        Ok(remote) => remote,
        Err(e) => {
            error!(error = %e, "OBJ download from catalog failed");
            return ObjOutcome::Unavailable;
        }
    };

    let extension = remote.extension().unwrap_or(FALLBACK_OBJ_EXTENSION);
    let target = request.page_dir.join(format!("OBJ.{extension}"));

    match move_file(&remote.temp_path, &target).await {
        Ok(()) => ObjOutcome::Written {
            source: ObjSource::Remote,
            path: target,
        },
        Err(e) => {
            error!(from = %remote.temp_path.display(), to = %target.display(), error = %e, "failed to move downloaded OBJ");
            ObjOutcome::Unavailable
        }
    }
}

/// Renames, falling back to copy and remove across filesystems.
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await
}
