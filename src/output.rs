use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

/// File being written under a `.partial` name. It only appears at its final
/// path after `commit`; dropping it earlier removes the partial file.
pub struct PendingFile {
    writer: Option<BufWriter<File>>,
    partial: PathBuf,
    target: PathBuf,
}

impl PendingFile {
    pub fn create(target: &Path) -> anyhow::Result<Self> {
        let mut partial = target.as_os_str().to_owned();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        let file = File::create(&partial)
            .with_context(|| format!("failed to create {}", partial.display()))?;

        Ok(PendingFile {
            writer: Some(BufWriter::new(file)),
            partial,
            target: target.to_path_buf(),
        })
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .context("pending file already closed")?;
        writer
            .write_all(bytes)
            .with_context(|| format!("failed to write {}", self.partial.display()))
    }

    pub fn commit(mut self) -> anyhow::Result<PathBuf> {
        let writer = self
            .writer
            .take()
            .context("pending file already closed")?;
        let file = writer
            .into_inner()
            .map_err(|err| err.into_error())
            .with_context(|| format!("failed to flush {}", self.partial.display()))?;
        file.sync_all()
            .with_context(|| format!("failed to sync {}", self.partial.display()))?;
        drop(file);

        std::fs::rename(&self.partial, &self.target).with_context(|| {
            format!(
                "failed to move {} to {}",
                self.partial.display(),
                self.target.display()
            )
        })?;

        Ok(self.target.clone())
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        // Close before unlinking; after a successful rename the partial path
        // no longer exists and removal is a no-op.
        self.writer.take();
        if self.partial.exists() {
            if let Err(err) = std::fs::remove_file(&self.partial) {
                tracing::warn!(path = %self.partial.display(), error = %err, "failed to remove partial file");
            }
        }
    }
}

/// Writes `bytes` to `dir/name`, leaving nothing behind on failure.
pub fn write_atomically(dir: &Path, name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let mut pending = PendingFile::create(&dir.join(name))?;
    pending.write_all(bytes)?;
    pending.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "student-appraisal-{}-{}",
            label,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn commit_moves_file_into_place() {
        let dir = scratch_dir("commit");
        let path = write_atomically(&dir, "report.pdf", b"%PDF-1.3").unwrap();

        assert_eq!(path, dir.join("report.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.3");
        assert!(!dir.join("report.pdf.partial").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn dropped_file_is_removed() {
        let dir = scratch_dir("drop");
        let target = dir.join("report.pdf");
        {
            let mut pending = PendingFile::create(&target).unwrap();
            pending.write_all(b"half a document").unwrap();
            assert!(dir.join("report.pdf.partial").exists());
        }

        assert!(!dir.join("report.pdf.partial").exists());
        assert!(!target.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
