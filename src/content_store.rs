use std::{io, path::PathBuf};

use futures::future::{BoxFuture, FutureExt};
use tokio::fs;
use tracing::warn;

/// Read-only view of the directory holding blog posts.
///
/// Entry names are bare file names (`hello.md`), never paths. Callers are
/// responsible for only passing names that are a single safe segment.
pub trait ContentStore: Send + Sync {
    /// Names of the regular files in the store, in no particular order.
    fn list_entries(&self) -> BoxFuture<'_, io::Result<Vec<String>>>;

    /// Contents of one entry. Invalid UTF-8 is replaced, never an error.
    fn read_entry<'a>(&'a self, name: &'a str) -> BoxFuture<'a, io::Result<String>>;

    fn exists<'a>(&'a self, name: &'a str) -> BoxFuture<'a, bool>;

    /// Location used in error messages and logs.
    fn describe(&self, name: &str) -> PathBuf;
}

pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ContentStore for FsContentStore {
    fn list_entries(&self) -> BoxFuture<'_, io::Result<Vec<String>>> {
        async move {
            let mut names = Vec::new();
            let mut entries = fs::read_dir(&self.root).await?;

            while let Some(entry) = entries.next_entry().await? {
                // Follows symlinks; dangling links are skipped.
                let is_file = fs::metadata(entry.path())
                    .await
                    .map(|meta| meta.is_file())
                    .unwrap_or(false);
                if !is_file {
                    continue;
                }
                // Non UTF-8 names can never match a slug lookup, so they are skipped.
                if let Ok(name) = entry.file_name().into_string() {
                    names.push(name);
                }
            }
            Ok(names)
        }
        .boxed()
    }

    fn read_entry<'a>(&'a self, name: &'a str) -> BoxFuture<'a, io::Result<String>> {
        async move {
            let path = self.root.join(name);
            let bytes = fs::read(&path).await?;
            Ok(match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    warn!("{} is not valid UTF-8; invalid bytes replaced", path.display());
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            })
        }
        .boxed()
    }

    fn exists<'a>(&'a self, name: &'a str) -> BoxFuture<'a, bool> {
        async move {
            fs::metadata(self.root.join(name))
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false)
        }
        .boxed()
    }

    fn describe(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}
