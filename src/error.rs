// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while deriving identity tokens from references, filenames and tags
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Invalid playlist reference '{reference}': no list token found")]
    InvalidReference { reference: String },

    #[error("Cannot find a bracketed identity token in '{filename}'")]
    MalformedFilename { filename: String },

    #[error("Identity data is not valid UTF-16LE ({len} bytes)")]
    InvalidEncoding { len: usize },

    #[error("'{filename}' repeats identity token '{token}' already claimed by another item")]
    DuplicateIdentity { token: String, filename: String },
}

/// Errors that can occur when reading or writing embedded audio tags
#[derive(Error, Debug)]
pub enum TagError {
    #[error("Failed to read tags from {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: id3::Error,
    },

    #[error("Failed to write tags to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: id3::Error,
    },

    #[error("Track {path} carries no identity token")]
    MissingIdentity { path: PathBuf },

    #[error("Track {path} carries an unreadable identity token: {source}")]
    MalformedIdentity {
        path: PathBuf,
        #[source]
        source: IdentityError,
    },
}

/// Errors that can occur when scanning an existing bundle
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to read directory {path}: {source}")]
    ReadDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tag error: {0}")]
    Tag(#[from] TagError),
}

/// Errors that can occur while fetching raw items into the work directory
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("Failed to launch {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    ExitFailure {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to prepare work directory in {path}: {source}")]
    WorkDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read sidecar {path}: {source}")]
    ReadSidecarFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while transcoding a single item
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to launch {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    ExitFailure {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Transcoder produced no output at {path}")]
    OutputMissing { path: PathBuf },

    #[error("Failed to remove raw source {path}: {source}")]
    RemoveSourceFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to tag converted track: {0}")]
    MetadataFailed(#[from] TagError),

    #[error("Failed to move {from} into place at {to}: {source}")]
    PublishFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur when writing the bundle's manifest and info files
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read metadata file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write metadata file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse metadata JSON in {path}: {source}")]
    JsonParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize metadata: {0}")]
    JsonSerializeFailed(#[from] serde_json::Error),

    #[error("Cannot express {path} as a playlist location")]
    InvalidLocation { path: PathBuf },
}

/// Top-level errors for sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Bundle {path} already exists; use append to add to it")]
    BundleExists { path: PathBuf },

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
}
