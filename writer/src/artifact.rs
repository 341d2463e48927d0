use crate::error::GenerationError;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Filesystem-safe name for a topic: lower-cased, with whitespace and path
/// separators replaced by underscores.
pub fn slugify(topic: &str) -> String {
    topic
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeneratedFile {
    pub filename: String,
    pub created: String,
    pub size: u64,
}

/// Directory of generated articles, one `<slug>.md` per topic.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `content` to `<dir>/<slug>.md`, replacing any previous version.
    pub async fn save(&self, slug: &str, content: &str) -> Result<PathBuf, GenerationError> {
        if slug.is_empty() || slug.contains(['/', '\\']) {
            return Err(GenerationError::InvalidFilename(slug.to_string()));
        }
        self.ensure_dir().await?;

        let path = self.dir.join(format!("{}.md", slug));
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| GenerationError::Write {
                path: path.clone(),
                source,
            })?;

        tracing::info!(path = %path.display(), bytes = content.len(), "content saved");
        Ok(path)
    }

    pub async fn ensure_dir(&self) -> Result<(), GenerationError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| GenerationError::Write {
                path: self.dir.clone(),
                source,
            })
    }

    /// Generated markdown files, newest first. A missing directory is empty.
    pub async fn list(&self) -> std::io::Result<Vec<GeneratedFile>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !filename.ends_with(".md") {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((created, filename, metadata.len()));
        }

        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        Ok(files
            .into_iter()
            .map(|(created, filename, size)| GeneratedFile {
                filename,
                created: DateTime::<Local>::from(created)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
                size,
            })
            .collect())
    }

    pub async fn read(&self, filename: &str) -> Result<String, GenerationError> {
        let reserved = filename == "." || filename == "..";
        if filename.is_empty() || reserved || filename.contains(['/', '\\']) {
            return Err(GenerationError::InvalidFilename(filename.to_string()));
        }
        let path = self.dir.join(filename);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(GenerationError::NotFound(filename.to_string()))
            }
            Err(source) => Err(GenerationError::Write { path, source }),
        }
    }
}
