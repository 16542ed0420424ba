// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use crate::acquire::{Collection, MatchedItem};
use crate::error::ConversionError;
use crate::metadata::{TrackTags, compose_description, write_track_tags};
use crate::naming::{TARGET_EXTENSION, track_target_path};
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::tool::Transcoder;

/// A track that was transcoded, tagged and moved into the bundle
#[derive(Debug, Clone)]
pub struct ConvertedItem {
    pub path: PathBuf,
    pub title: String,
    pub token: String,
    pub size: u64,
}

/// Result of converting a batch of matched items
#[derive(Debug, Default)]
pub struct ConversionOutcome {
    /// Converted items in input order
    pub converted: Vec<ConvertedItem>,
    /// Items that failed (title, error message)
    pub failed: Vec<(String, String)>,
    /// Sum of the converted files' sizes in bytes
    pub total_bytes: u64,
}

async fn transcode_one<T: Transcoder>(
    transcoder: &T,
    source: &Path,
    target: &Path,
) -> Result<(), ConversionError> {
    transcoder.transcode(source, target).await?;

    match tokio::fs::metadata(target).await {
        Ok(metadata) if metadata.is_file() => Ok(()),
        _ => Err(ConversionError::OutputMissing {
            path: target.to_path_buf(),
        }),
    }
}

/// Tag a staged track and rename it into the tracks directory
///
/// Only a fully tagged file ever appears under its final name, so an
/// interrupted run leaves nothing a later append cannot identify.
async fn publish_one(
    staged: &Path,
    item: &MatchedItem<'_>,
    collection: &Collection,
    tracks_dir: &Path,
) -> Result<(PathBuf, u64), ConversionError> {
    let description =
        compose_description(&item.token, &collection.token, item.sidecar.as_deref());
    write_track_tags(
        staged,
        &TrackTags {
            title: &item.title,
            collection: &collection.name,
            description: &description,
            token: &item.token,
        },
    )?;

    let size = tokio::fs::metadata(staged)
        .await
        .map_err(|_| ConversionError::OutputMissing {
            path: staged.to_path_buf(),
        })?
        .len();

    let target = track_target_path(tracks_dir, &item.title, &item.token);
    tokio::fs::rename(staged, &target)
        .await
        .map_err(|e| ConversionError::PublishFailed {
            from: staged.to_path_buf(),
            to: target.clone(),
            source: e,
        })?;

    Ok((target, size))
}

/// Convert every matched item into `tracks_dir`, one after another
///
/// Each item is transcoded into `staging_dir`, tagged there and then
/// renamed into place. A failed item is recorded and skipped; its raw
/// source stays in place. The raw source of a converted item is deleted
/// only after it has been published.
pub async fn convert_items<T: Transcoder>(
    transcoder: &T,
    items: Vec<MatchedItem<'_>>,
    collection: &Collection,
    staging_dir: &Path,
    tracks_dir: &Path,
    reporter: &SharedProgressReporter,
) -> ConversionOutcome {
    let total = items.len();
    let mut outcome = ConversionOutcome::default();

    for (index, item) in items.into_iter().enumerate() {
        reporter.report(ProgressEvent::ConversionStarting {
            title: item.title.clone(),
            index,
            total,
        });

        let staged = staging_dir.join(format!(".staging-{index}.{TARGET_EXTENSION}"));

        if let Err(e) = transcode_one(transcoder, &item.raw.path, &staged).await {
            reporter.report(ProgressEvent::ConversionFailed {
                title: item.title.clone(),
                error: e.to_string(),
            });
            outcome.failed.push((item.title, e.to_string()));
            continue;
        }

        let (path, size) = match publish_one(&staged, &item, collection, tracks_dir).await {
            Ok(published) => published,
            Err(e) => {
                // The staged file stays in the work directory and goes with it
                reporter.report(ProgressEvent::TaggingFailed {
                    title: item.title.clone(),
                    error: e.to_string(),
                });
                outcome.failed.push((item.title, e.to_string()));
                continue;
            }
        };

        if let Err(e) = tokio::fs::remove_file(&item.raw.path).await {
            let error = ConversionError::RemoveSourceFailed {
                path: item.raw.path.clone(),
                source: e,
            };
            reporter.report(ProgressEvent::SourceCleanupFailed {
                title: item.title.clone(),
                error: error.to_string(),
            });
        }

        reporter.report(ProgressEvent::ConversionCompleted {
            title: item.title.clone(),
            bytes: size,
        });

        outcome.total_bytes += size;
        outcome.converted.push(ConvertedItem {
            path,
            title: item.title,
            token: item.token,
            size,
        });
    }

    outcome
}
