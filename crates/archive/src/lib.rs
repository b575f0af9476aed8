//! Archive packing, partitioning and reassembly.
//!
//! A game folder becomes one tar archive ([`pack_dir`]), the archive becomes
//! an ordered sequence of bounded-size parts ([`split_archive`]), and on the
//! way back the parts are concatenated strictly in index order
//! ([`merge_parts`]) and unpacked ([`extract_archive`]).

mod extract;
mod merge;
mod pack;
mod split;

pub use extract::extract_archive;
pub use merge::merge_parts;
pub use pack::pack_dir;
pub use split::{DEFAULT_PART_SIZE, PartFile, split_archive};

/// Errors produced by archive operations.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a valid archive: {0}")]
    Extraction(String),
}
