//! Named media resource lookup.
//!
//! The decoder consumes clips as seekable byte ranges; where those bytes come
//! from is the host's business. [`DirAssets`] covers the common case of clips
//! shipped as files under an asset root.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::PathBuf;

/// Blanket alias for the reader a clip source hands to the decoder.
pub trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

/// An opened clip: a seekable byte range over the container data.
pub struct ClipSource {
    pub reader: Box<dyn ReadSeek>,
    pub len: u64,
}

impl std::fmt::Debug for ClipSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipSource")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Capability for resolving named media resources.
pub trait AssetProvider {
    /// Open the named resource as a seekable byte range.
    fn open(&self, name: &str) -> std::io::Result<ClipSource>;
}

/// Assets resolved as files under a root directory.
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetProvider for DirAssets {
    fn open(&self, name: &str) -> std::io::Result<ClipSource> {
        let path = self.root.join(name);
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        Ok(ClipSource {
            reader: Box::new(file),
            len,
        })
    }
}
