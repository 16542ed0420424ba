// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bundle's human-facing files: an XSPF playlist and `description.txt`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use html_escape::encode_text;
use url::Url;

use crate::acquire::Collection;
use crate::error::MetadataError;
use crate::identity::{playlist_url, watch_url};
use crate::state::ExistingTrack;

pub const MANIFEST_FILENAME: &str = "playlist.xspf";
pub const DESCRIPTION_FILENAME: &str = "description.txt";

const SECTION_BREAK: &str = "\n-_-_-_-_-_-_-_-_-_\n";

/// One track listed in the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub path: PathBuf,
    pub title: String,
    pub token: String,
    pub size: u64,
}

impl From<ExistingTrack> for ManifestEntry {
    fn from(track: ExistingTrack) -> Self {
        Self {
            path: track.path,
            title: track.title,
            token: track.token,
            size: track.size,
        }
    }
}

/// Location of a track relative to the bundle directory, percent-encoded
fn track_location(bundle_dir: &Path, track: &Path) -> Result<String, MetadataError> {
    let invalid = |path: &Path| MetadataError::InvalidLocation {
        path: path.to_path_buf(),
    };

    let base = Url::from_directory_path(bundle_dir).map_err(|_| invalid(bundle_dir))?;
    let target = Url::from_file_path(track).map_err(|_| invalid(track))?;

    base.make_relative(&target).ok_or_else(|| invalid(track))
}

/// Render the XSPF playlist for a bundle
pub fn render_manifest(
    bundle_dir: &Path,
    collection: &Collection,
    entries: &[ManifestEntry],
) -> Result<String, MetadataError> {
    let mut xml = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(xml, r#"<playlist version="1" xmlns="http://xspf.org/ns/0/">"#);
    let _ = writeln!(xml, "  <title>{}</title>", encode_text(&collection.name));
    let _ = writeln!(
        xml,
        "  <info>{}</info>",
        encode_text(&playlist_url(&collection.token))
    );
    let _ = writeln!(xml, "  <trackList>");

    for entry in entries {
        let location = track_location(bundle_dir, &entry.path)?;

        let _ = writeln!(xml, "    <track>");
        let _ = writeln!(xml, "      <location>{}</location>", encode_text(&location));
        let _ = writeln!(xml, "      <title>{}</title>", encode_text(&entry.title));
        let _ = writeln!(
            xml,
            "      <identifier>{}</identifier>",
            encode_text(&watch_url(&entry.token))
        );
        let _ = writeln!(xml, "    </track>");
    }

    let _ = writeln!(xml, "  </trackList>");
    let _ = writeln!(xml, "</playlist>");

    Ok(xml)
}

/// Render the human-readable description of a bundle
pub fn render_description(collection: &Collection, entries: &[ManifestEntry]) -> String {
    let total_bytes: u64 = entries.iter().map(|entry| entry.size).sum();

    let mut text = String::new();
    let _ = writeln!(text, "{}", collection.name);
    let _ = writeln!(text, "{SECTION_BREAK}");
    let _ = writeln!(
        text,
        "Playlist sourced from {}",
        playlist_url(&collection.token)
    );
    let _ = writeln!(text, "{SECTION_BREAK}");
    let _ = writeln!(text, "{}", collection.description);
    let _ = writeln!(text, "{SECTION_BREAK}");
    let _ = writeln!(text, "Stats:");
    let _ = writeln!(text, "Track count: {}", entries.len());
    let _ = writeln!(text, "File size: {} KB", total_bytes / 1000);

    text
}

fn write_file(path: PathBuf, contents: &str) -> Result<PathBuf, MetadataError> {
    std::fs::write(&path, contents).map_err(|e| MetadataError::WriteFailed {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}

/// Write (or overwrite) the bundle's XSPF playlist
pub fn write_manifest(
    bundle_dir: &Path,
    collection: &Collection,
    entries: &[ManifestEntry],
) -> Result<PathBuf, MetadataError> {
    let xml = render_manifest(bundle_dir, collection, entries)?;
    write_file(bundle_dir.join(MANIFEST_FILENAME), &xml)
}

/// Write (or overwrite) the bundle's `description.txt`
pub fn write_description(
    bundle_dir: &Path,
    collection: &Collection,
    entries: &[ManifestEntry],
) -> Result<PathBuf, MetadataError> {
    let text = render_description(collection, entries);
    write_file(bundle_dir.join(DESCRIPTION_FILENAME), &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn collection() -> Collection {
        Collection {
            name: "Rock & Roll".to_string(),
            description: "Loud songs".to_string(),
            token: "PLX".to_string(),
        }
    }

    fn entry(bundle_dir: &Path, file: &str, title: &str, token: &str, size: u64) -> ManifestEntry {
        ManifestEntry {
            path: bundle_dir.join("tracks").join(file),
            title: title.to_string(),
            token: token.to_string(),
            size,
        }
    }

    #[test]
    fn manifest_lists_tracks_in_order() {
        let dir = tempdir().unwrap();
        let entries = vec![
            entry(dir.path(), "B.mp3", "B", "tb", 10),
            entry(dir.path(), "A.mp3", "A", "ta", 10),
        ];

        let xml = render_manifest(dir.path(), &collection(), &entries).unwrap();

        let b = xml.find("<title>B</title>").unwrap();
        let a = xml.find("<title>A</title>").unwrap();
        assert!(b < a);
        assert!(xml.contains("<location>tracks/B.mp3</location>"));
        assert!(xml.contains("<identifier>https://youtube.com/watch?v=ta</identifier>"));
    }

    #[test]
    fn manifest_escapes_text_and_encodes_locations() {
        let dir = tempdir().unwrap();
        let entries = vec![entry(dir.path(), "Salt & Pepper.mp3", "Salt & <Pepper>", "t1", 1)];

        let xml = render_manifest(dir.path(), &collection(), &entries).unwrap();

        assert!(xml.contains("<title>Rock &amp; Roll</title>"));
        assert!(xml.contains("<title>Salt &amp; &lt;Pepper&gt;</title>"));
        assert!(xml.contains("<location>tracks/Salt%20&amp;%20Pepper.mp3</location>"));
    }

    #[test]
    fn empty_manifest_is_valid_playlist() {
        let dir = tempdir().unwrap();
        let xml = render_manifest(dir.path(), &collection(), &[]).unwrap();

        assert!(xml.contains("<trackList>"));
        assert!(xml.contains("</trackList>"));
        assert!(!xml.contains("<track>"));
    }

    #[test]
    fn description_contains_stats() {
        let dir = tempdir().unwrap();
        let entries = vec![
            entry(dir.path(), "A.mp3", "A", "ta", 1500),
            entry(dir.path(), "B.mp3", "B", "tb", 1999),
        ];

        let text = render_description(&collection(), &entries);

        assert!(text.starts_with("Rock & Roll\n"));
        assert!(text.contains("Playlist sourced from https://youtube.com/playlist?list=PLX"));
        assert!(text.contains("Loud songs"));
        assert!(text.contains("Track count: 2"));
        assert!(text.contains("File size: 3 KB"));
    }

    #[test]
    fn files_are_overwritten() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILENAME), "stale").unwrap();

        let path = write_manifest(dir.path(), &collection(), &[]).unwrap();
        write_description(dir.path(), &collection(), &[]).unwrap();

        assert!(std::fs::read_to_string(path).unwrap().starts_with("<?xml"));
        let text = std::fs::read_to_string(dir.path().join(DESCRIPTION_FILENAME)).unwrap();
        assert!(text.contains("Track count: 0"));
    }
}
