// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

/// Extension of every converted track
pub const TARGET_EXTENSION: &str = "mp3";

/// Characters that are rejected in file names on at least one major platform
fn is_invalid_filename_char(c: char) -> bool {
    c.is_control() || matches!(c, '"' | '<' | '>' | '|' | ':' | '*' | '?' | '\\' | '/')
}

/// Turn a collection name into a directory name
///
/// Runs of invalid characters collapse into a single `_`, leading and trailing
/// invalid runs are dropped, and trailing dots are trimmed.
pub fn sanitize_collection_name(name: &str) -> String {
    let joined = name
        .split(is_invalid_filename_char)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    joined.trim_end_matches('.').to_string()
}

/// Filesystem-safe stem for a track title, falling back to the token
fn track_stem(title: &str, token: &str) -> String {
    let options = sanitize_filename::Options {
        windows: true,
        truncate: true,
        replacement: "_",
    };
    let stem = sanitize_filename::sanitize_with_options(title, options);
    let stem = stem.trim().trim_end_matches('.');

    if stem.is_empty() {
        token.to_string()
    } else {
        stem.to_string()
    }
}

/// Pick the output path for a converted track inside `tracks_dir`
///
/// Uses `<title>.mp3` unless that file already exists, in which case the
/// token is appended so an existing track is never overwritten.
pub fn track_target_path(tracks_dir: &Path, title: &str, token: &str) -> PathBuf {
    let stem = track_stem(title, token);
    let preferred = tracks_dir.join(format!("{stem}.{TARGET_EXTENSION}"));

    if !preferred.exists() {
        return preferred;
    }

    tracks_dir.join(format!("{stem} ({token}).{TARGET_EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sanitize_keeps_plain_names() {
        assert_eq!(sanitize_collection_name("My Mix"), "My Mix");
    }

    #[test]
    fn sanitize_replaces_invalid_runs() {
        assert_eq!(sanitize_collection_name("Rock: 80s/90s"), "Rock_ 80s_90s");
        assert_eq!(sanitize_collection_name("a::??b"), "a_b");
    }

    #[test]
    fn sanitize_drops_leading_and_trailing_invalid_chars() {
        assert_eq!(sanitize_collection_name("<Best Of>"), "Best Of");
    }

    #[test]
    fn sanitize_trims_trailing_dots() {
        assert_eq!(sanitize_collection_name("Vol. 2..."), "Vol. 2");
        assert_eq!(sanitize_collection_name("Hits.."), "Hits");
        assert_eq!(sanitize_collection_name("Hits?."), "Hits_");
    }

    #[test]
    fn sanitize_output_has_no_invalid_chars() {
        let name = sanitize_collection_name("a\"b<c>d|e:f*g?h\\i/j\tk.");
        assert!(!name.chars().any(is_invalid_filename_char));
        assert!(!name.ends_with('.'));
        assert_eq!(name, "a_b_c_d_e_f_g_h_i_j_k");
    }

    #[test]
    fn target_path_uses_title() {
        let dir = tempdir().unwrap();
        assert_eq!(
            track_target_path(dir.path(), "My Song", "t1"),
            dir.path().join("My Song.mp3")
        );
    }

    #[test]
    fn target_path_sanitizes_title() {
        let dir = tempdir().unwrap();
        let path = track_target_path(dir.path(), "AC/DC: Live", "t1");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(!name.contains('/'));
        assert!(!name.contains(':'));
        assert!(name.ends_with(".mp3"));
    }

    #[test]
    fn target_path_falls_back_to_token() {
        let dir = tempdir().unwrap();
        assert_eq!(
            track_target_path(dir.path(), "", "t1"),
            dir.path().join("t1.mp3")
        );
    }

    #[test]
    fn target_path_avoids_existing_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("My Song.mp3"), b"taken").unwrap();

        assert_eq!(
            track_target_path(dir.path(), "My Song", "t2"),
            dir.path().join("My Song (t2).mp3")
        );
    }
}
