//! Local filesystem storage backend.

use crate::config::result_error::result::Result;
use crate::config::settings::Settings;
use crate::config::storage::{Folder, FolderBuilder};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub struct FsFolder {
    root: PathBuf,
}

impl FsFolder {
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

/// The file adapter has no settings beyond its activation prefix.
pub(crate) fn load_file_settings(_settings: &dyn Settings) -> Result<FolderBuilder> {
    Ok(Box::new(|prefix| {
        FsFolder::create(prefix).map(|folder| Arc::new(folder) as Arc<dyn Folder>)
    }))
}

impl Folder for FsFolder {
    fn scheme(&self) -> &'static str {
        "file"
    }

    fn put_object(&self, name: &str, content: &[u8]) -> Result<()> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    fn get_object(&self, name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.root.join(name))?)
    }

    fn list_objects(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort_unstable();
        Ok(names)
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.root.join(name).exists())
    }
}
