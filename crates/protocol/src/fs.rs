//! The only filesystem surface the resolver and responder need.

use std::fs::Metadata;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

/// What a `stat` found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Sockets, FIFOs, devices and anything else that is neither.
    Other,
}

/// Tagged outcome of a `stat`, so callers branch on variants rather than error codes.
#[derive(Debug)]
pub enum Stat {
    Found(EntryKind),
    NotFound,
    Failed(io::Error),
}

impl From<io::Result<Metadata>> for Stat {
    fn from(result: io::Result<Metadata>) -> Self {
        match result {
            Ok(meta) if meta.is_file() => Self::Found(EntryKind::File),
            Ok(meta) if meta.is_dir() => Self::Found(EntryKind::Directory),
            Ok(_) => Self::Found(EntryKind::Other),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::NotFound,
            Err(e) => Self::Failed(e),
        }
    }
}

/// Asynchronous filesystem collaborator.
pub trait FileSystem: Send + Sync {
    /// Follows symlinks.
    fn stat(&self, path: &Path) -> impl Future<Output = Stat> + Send;

    fn read(&self, path: &Path) -> impl Future<Output = io::Result<Vec<u8>>> + Send;

    fn canonicalize(&self, path: &Path) -> impl Future<Output = io::Result<PathBuf>> + Send;
}

/// [`FileSystem`] backed by `tokio::fs`; blocking calls run on Tokio's blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFs;

impl FileSystem for TokioFs {
    async fn stat(&self, path: &Path) -> Stat {
        tokio::fs::metadata(path).await.into()
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        tokio::fs::canonicalize(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn stat_tags_files_directories_and_missing() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        std::fs::write(&file, b"a").unwrap();

        assert!(matches!(TokioFs.stat(&file).await, Stat::Found(EntryKind::File)));
        assert!(matches!(TokioFs.stat(tmp.path()).await, Stat::Found(EntryKind::Directory)));
        assert!(matches!(TokioFs.stat(&tmp.path().join("missing")).await, Stat::NotFound));
    }

    #[test]
    fn other_errors_are_kept() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        match Stat::from(Err(denied)) {
            Stat::Failed(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("unexpected {other:?}"),
        }
    }
}
