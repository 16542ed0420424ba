// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use chrono::Local;
use id3::frame::{Comment, Content, Frame, Private};
use id3::{ErrorKind, Tag, TagLike, Version};

use crate::error::TagError;
use crate::identity::{decode_identity, encode_identity, playlist_url, watch_url};

/// Owner identifier of the private frame that holds an item's token
pub const IDENTITY_OWNER: &str = "yt-id";

const PRIVATE_FRAME_ID: &str = "PRIV";
const TAGGING_TIME_FRAME_ID: &str = "TDTG";
const PROVENANCE_PREAMBLE: &str = "Created from a YouTube music playlist.";
const ORIGINAL_DESCRIPTION_SEPARATOR: &str = "--- ORIGINAL DESCRIPTION ---";

/// Canonical tags written onto every converted track
#[derive(Debug, Clone)]
pub struct TrackTags<'a> {
    pub title: &'a str,
    pub collection: &'a str,
    pub description: &'a str,
    pub token: &'a str,
}

/// What a tagged track tells us about itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackIdentity {
    pub token: String,
    pub title: Option<String>,
}

/// Build a track's description: provenance links, then the item's own
/// description when one was fetched and is not empty
pub fn compose_description(
    item_token: &str,
    playlist_token: &str,
    sidecar: Option<&str>,
) -> String {
    let mut description = format!(
        "{PROVENANCE_PREAMBLE}\n{}\n{}",
        watch_url(item_token),
        playlist_url(playlist_token)
    );

    if let Some(text) = sidecar.filter(|text| !text.is_empty()) {
        description.push('\n');
        description.push_str(ORIGINAL_DESCRIPTION_SEPARATOR);
        description.push('\n');
        description.push_str(text);
    }

    description
}

/// Write the canonical tags onto a track, replacing earlier values
pub fn write_track_tags(path: &Path, tags: &TrackTags<'_>) -> Result<(), TagError> {
    let mut tag = match Tag::read_from_path(path) {
        Ok(tag) => tag,
        Err(e) if matches!(e.kind, ErrorKind::NoTag) => Tag::new(),
        Err(e) => {
            return Err(TagError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    tag.set_text(
        TAGGING_TIME_FRAME_ID,
        Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
    );
    tag.set_title(tags.title);
    tag.set_album(tags.collection);

    tag.remove("COMM");
    tag.add_frame(Comment {
        lang: "eng".to_string(),
        description: String::new(),
        text: tags.description.to_string(),
    });

    tag.remove(PRIVATE_FRAME_ID);
    tag.add_frame(Frame::with_content(
        PRIVATE_FRAME_ID,
        Content::Private(Private {
            owner_identifier: IDENTITY_OWNER.to_string(),
            private_data: encode_identity(tags.token),
        }),
    ));

    tag.write_to_path(path, Version::Id3v24)
        .map_err(|e| TagError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Read the identity token (and title, if any) back from a tagged track
pub fn read_track_identity(path: &Path) -> Result<TrackIdentity, TagError> {
    let tag = match Tag::read_from_path(path) {
        Ok(tag) => tag,
        Err(e) if matches!(e.kind, ErrorKind::NoTag) => {
            return Err(TagError::MissingIdentity {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(TagError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let data = tag
        .frames()
        .filter(|frame| frame.id() == PRIVATE_FRAME_ID)
        .find_map(|frame| match frame.content() {
            Content::Private(private) if private.owner_identifier == IDENTITY_OWNER => {
                Some(private.private_data.as_slice())
            }
            _ => None,
        })
        .ok_or_else(|| TagError::MissingIdentity {
            path: path.to_path_buf(),
        })?;

    let token = decode_identity(data).map_err(|e| TagError::MalformedIdentity {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(TrackIdentity {
        token,
        title: tag.title().map(str::to_string),
    })
}
