//! Filesystem layout of a run: materialized variants, decode scratch pipes and
//! per-cell scorer logs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::errors::DomainError;

/// File name of the decoded reference scratch pipe
pub const REFERENCE_SCRATCH: &str = "reference.yuv";

/// File name of the decoded rendition scratch pipe
pub const DISTORTED_SCRATCH: &str = "distorted.yuv";

/// The two scratch locations shared by every quality cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchPaths {
    pub reference: PathBuf,
    pub distorted: PathBuf,
}

impl ScratchPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            reference: dir.join(REFERENCE_SCRATCH),
            distorted: dir.join(DISTORTED_SCRATCH),
        }
    }
}

/// Path helpers for run artifacts
pub struct PathUtils;

impl PathUtils {
    /// Local file a ladder variant is copied to (`ladder_index` is 0-based)
    pub fn variant_output(work_dir: &Path, ladder_index: usize) -> PathBuf {
        work_dir.join(format!("variant_{}.ts", ladder_index))
    }

    /// Scorer log for one cell, keyed by 0-based ladder index and target size
    pub fn cell_log(logs_dir: &Path, ladder_index: usize, width: u64, height: u64) -> PathBuf {
        logs_dir.join(format!("{}_{}_{}.log", ladder_index, width, height))
    }

    /// Create a directory and its parents
    pub async fn ensure_dir(dir: &Path) -> Result<(), DomainError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| DomainError::io(dir, e))
    }

    /// Create the two scratch pipes inside `work_dir`, reusing existing ones
    pub async fn prepare_scratch(work_dir: &Path) -> Result<ScratchPaths, DomainError> {
        Self::ensure_dir(work_dir).await?;
        let scratch = ScratchPaths::in_dir(work_dir);
        make_fifo(&scratch.reference).await?;
        make_fifo(&scratch.distorted).await?;
        Ok(scratch)
    }
}

#[cfg(unix)]
async fn make_fifo(path: &Path) -> Result<(), DomainError> {
    use nix::sys::stat::Mode;
    use std::os::unix::fs::FileTypeExt;

    match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) if metadata.file_type().is_fifo() => {
            debug!(path = %path.display(), "Reusing existing scratch pipe");
            return Ok(());
        }
        Ok(_) => {
            // scratch locations must be pipes; replace stale regular files
            tokio::fs::remove_file(path)
                .await
                .map_err(|e| DomainError::io(path, e))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(DomainError::io(path, e)),
    }

    nix::unistd::mkfifo(path, Mode::S_IRUSR | Mode::S_IWUSR)
        .map_err(|errno| DomainError::io(path, std::io::Error::from(errno)))?;
    debug!(path = %path.display(), "Created scratch pipe");
    Ok(())
}

#[cfg(not(unix))]
async fn make_fifo(path: &Path) -> Result<(), DomainError> {
    Err(DomainError::Config(format!(
        "cannot create scratch pipe {}: named pipes require a unix platform",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        let dir = Path::new("/work");
        assert_eq!(
            PathUtils::variant_output(dir, 2),
            PathBuf::from("/work/variant_2.ts")
        );
        assert_eq!(
            PathUtils::cell_log(Path::new("logs"), 1, 720, 404),
            PathBuf::from("logs/1_720_404.log")
        );
        assert_eq!(
            ScratchPaths::in_dir(dir).distorted,
            PathBuf::from("/work/distorted.yuv")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_prepare_scratch_creates_and_reuses_pipes() {
        use std::os::unix::fs::FileTypeExt;

        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join(DISTORTED_SCRATCH), b"stale").unwrap();

        let scratch = PathUtils::prepare_scratch(temp.path()).await.unwrap();
        for path in [&scratch.reference, &scratch.distorted] {
            let metadata = std::fs::symlink_metadata(path).unwrap();
            assert!(metadata.file_type().is_fifo(), "{} is not a pipe", path.display());
        }

        let again = PathUtils::prepare_scratch(temp.path()).await.unwrap();
        assert_eq!(again, scratch);
    }
}
