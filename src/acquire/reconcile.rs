// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;

use crate::error::{AcquisitionError, IdentityError};
use crate::identity::{extract_item_token, strip_item_token};
use crate::naming::sanitize_collection_name;
use crate::progress::{ProgressEvent, SharedProgressReporter};

use super::workdir::{RawItem, RawItems};

/// Name, description and token of the playlist being synced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// Filesystem-safe display name
    pub name: String,
    pub description: String,
    pub token: String,
}

impl Collection {
    /// Collection used when the fetch produced no collection-level sidecar
    pub fn fallback(token: &str) -> Self {
        Self {
            name: sanitize_collection_name(&format!("Collection [{token}]")),
            description: String::new(),
            token: token.to_string(),
        }
    }
}

/// A raw audio item paired with its identity and optional sidecar text
#[derive(Debug, Clone)]
pub struct MatchedItem<'r> {
    pub raw: &'r RawItem,
    pub title: String,
    pub token: String,
    pub sidecar: Option<String>,
}

/// Output of reconciling one fetch
#[derive(Debug)]
pub struct Reconciliation<'r> {
    /// Matched items in arrival order
    pub items: Vec<MatchedItem<'r>>,
    pub collection: Collection,
    /// Raw audio items that could not be matched (file name, reason)
    pub skipped: Vec<(String, String)>,
}

fn read_sidecar(item: &RawItem) -> Result<String, AcquisitionError> {
    let bytes = std::fs::read(&item.path).map_err(|e| AcquisitionError::ReadSidecarFailed {
        path: item.path.clone(),
        source: e,
    })?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn find_sidecar<'a>(raw: &'a RawItems<'_>, token: &str) -> Option<&'a RawItem> {
    let needle = format!("[{token}]");
    raw.sidecars().find(|item| item.file_name.contains(&needle))
}

fn resolve_collection(
    raw: &RawItems<'_>,
    playlist_token: &str,
    reporter: &SharedProgressReporter,
) -> Result<Collection, AcquisitionError> {
    let Some(sidecar) = find_sidecar(raw, playlist_token) else {
        reporter.report(ProgressEvent::CollectionSidecarMissing {
            token: playlist_token.to_string(),
        });
        return Ok(Collection::fallback(playlist_token));
    };

    let name = strip_item_token(&sidecar.file_name)
        .map(|name| sanitize_collection_name(&name))
        .unwrap_or_default();

    if name.is_empty() {
        return Ok(Collection::fallback(playlist_token));
    }

    Ok(Collection {
        name,
        description: read_sidecar(sidecar)?,
        token: playlist_token.to_string(),
    })
}

/// Pair every raw audio item with its sidecar and resolve the collection
///
/// Audio items without a bracketed token are skipped. When two audio items
/// carry the same token the first one (in file name order) wins and the
/// later one is skipped as a duplicate. A missing sidecar only produces a
/// warning.
pub fn reconcile<'r>(
    raw: &'r RawItems<'_>,
    playlist_token: &str,
    reporter: &SharedProgressReporter,
) -> Result<Reconciliation<'r>, AcquisitionError> {
    let collection = resolve_collection(raw, playlist_token, reporter)?;

    reporter.report(ProgressEvent::CollectionResolved {
        name: collection.name.clone(),
        token: collection.token.clone(),
    });

    let mut items = Vec::new();
    let mut skipped = Vec::new();
    let mut seen = HashSet::new();

    for audio in raw.audio() {
        let identity = extract_item_token(&audio.file_name).and_then(|token| {
            if seen.contains(&token) {
                return Err(IdentityError::DuplicateIdentity {
                    token,
                    filename: audio.file_name.clone(),
                });
            }
            let title = strip_item_token(&audio.file_name)?;
            Ok((token, title))
        });

        let (token, title) = match identity {
            Ok(identity) => identity,
            Err(e) => {
                reporter.report(ProgressEvent::ItemSkipped {
                    filename: audio.file_name.clone(),
                    reason: e.to_string(),
                });
                skipped.push((audio.file_name.clone(), e.to_string()));
                continue;
            }
        };

        let sidecar = match find_sidecar(raw, &token) {
            Some(item) => Some(read_sidecar(item)?),
            None => {
                reporter.report(ProgressEvent::ItemSidecarMissing {
                    title: title.clone(),
                    token: token.clone(),
                });
                None
            }
        };

        seen.insert(token.clone());
        items.push(MatchedItem {
            raw: audio,
            title,
            token,
            sidecar,
        });
    }

    Ok(Reconciliation {
        items,
        collection,
        skipped,
    })
}
