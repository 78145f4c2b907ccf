//! Share/export capability for the rendered conversion card.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub trait CardExporter: Send + Sync {
    /// Persists a rendered card and returns where it landed.
    fn export(&self, card: &str) -> Result<PathBuf>;
}

/// Writes the card to a timestamped file under a fixed directory. This is
/// the file-download path; a native share sheet has no CLI equivalent.
pub struct FileExporter {
    dir: PathBuf,
}

impl FileExporter {
    pub fn new(dir: &Path) -> Self {
        FileExporter {
            dir: dir.to_path_buf(),
        }
    }
}

impl CardExporter for FileExporter {
    fn export(&self, card: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create export directory: {}", self.dir.display()))?;

        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let path = self.dir.join(format!("bcv-conversion-{stamp}.txt"));
        fs::write(&path, card)
            .with_context(|| format!("Failed to write card to {}", path.display()))?;

        debug!("Exported conversion card to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_export_writes_card_file() {
        let dir = tempdir().unwrap();
        let exporter = FileExporter::new(dir.path());

        let path = exporter.export("10.00 USD = 365.00 VES (Tasa: 36.50)").unwrap();

        assert!(path.exists());
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("365.00 VES"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("bcv-conversion-"));
    }

    #[test]
    fn test_export_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("exports");
        let exporter = FileExporter::new(&nested);

        let path = exporter.export("card").unwrap();
        assert!(path.starts_with(&nested));
    }
}
