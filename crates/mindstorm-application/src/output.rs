//! Writes rendered mindmap pages to disk.

use std::fs;
use std::path::{Path, PathBuf};

use mindstorm_core::Result;
use mindstorm_core::session::SessionCode;

/// Writes one HTML file per session, named after the session code.
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default location: an `output` directory under the working directory.
    pub fn default_location() -> Self {
        Self::new("output")
    }

    /// Writes the page as `<CODE>.html`, creating the directory if needed.
    /// A newer generation for the same session overwrites the older file.
    pub fn write(&self, code: &SessionCode, html: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.html", code.as_str()));
        fs::write(&path, html)?;
        tracing::info!(path = %path.display(), "mindmap page written");
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_directory_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(tmp.path().join("maps"));
        let code = SessionCode::normalize("AB12CD");

        let path = writer.write(&code, "<html>v1</html>").unwrap();
        assert_eq!(path.file_name().unwrap(), "AB12CD.html");
        assert_eq!(fs::read_to_string(&path).unwrap(), "<html>v1</html>");

        // A second generation replaces the file.
        writer.write(&code, "<html>v2</html>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<html>v2</html>");
    }
}
