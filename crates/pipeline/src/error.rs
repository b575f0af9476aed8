//! Session errors with step attribution.

use galpack_archive::ArchiveError;
use galpack_client::ClientError;
use galpack_manifest::ManifestError;

/// The pipeline step a failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Archiving,
    Partitioning,
    Uploading,
    WritingManifest,
    ReadingManifest,
    Downloading,
    Merging,
    Extracting,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::Archiving => "archiving",
            Step::Partitioning => "partitioning",
            Step::Uploading => "uploading",
            Step::WritingManifest => "writing manifest",
            Step::ReadingManifest => "reading manifest",
            Step::Downloading => "downloading",
            Step::Merging => "merging",
            Step::Extracting => "extracting",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a session: the step that failed and its cause.
///
/// Remaining steps are never attempted. Parts already uploaded stay on the
/// server, orphaned; parts already downloaded stay on disk for inspection.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("archiving failed: {0}")]
    Archiving(#[source] ArchiveError),

    #[error("partitioning failed: {0}")]
    Partitioning(#[source] ArchiveError),

    #[error("upload of part {index} failed: {source}")]
    Uploading {
        index: u32,
        #[source]
        source: ClientError,
    },

    #[error("writing manifest failed: {0}")]
    WritingManifest(#[source] ManifestError),

    #[error("reading manifest failed: {0}")]
    ReadingManifest(#[source] ManifestError),

    #[error("download of part {index} failed: {source}")]
    Downloading {
        index: u32,
        #[source]
        source: ClientError,
    },

    #[error("merging parts failed: {0}")]
    Merging(#[source] ArchiveError),

    #[error("extraction failed: {0}")]
    Extracting(#[source] ArchiveError),
}

impl PipelineError {
    /// The step this failure occurred in.
    pub fn step(&self) -> Step {
        match self {
            PipelineError::Archiving(_) => Step::Archiving,
            PipelineError::Partitioning(_) => Step::Partitioning,
            PipelineError::Uploading { .. } => Step::Uploading,
            PipelineError::WritingManifest(_) => Step::WritingManifest,
            PipelineError::ReadingManifest(_) => Step::ReadingManifest,
            PipelineError::Downloading { .. } => Step::Downloading,
            PipelineError::Merging(_) => Step::Merging,
            PipelineError::Extracting(_) => Step::Extracting,
        }
    }
}
