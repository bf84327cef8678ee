//! Named outputs handed to the archiving collaborator.

/// One file of an output archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path inside the archive, such as `png/page-1-512x384.png`.
    pub path: String,
    pub bytes: Vec<u8>,
}
