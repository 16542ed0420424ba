// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identity tokens: the externally assigned ids that tie a raw download, its
//! sidecar and the final tagged track together.

use crate::error::IdentityError;

/// Query parameter carrying the playlist token in a reference
const LIST_PARAM: &str = "list=";

/// Extract the playlist token from a playlist reference
///
/// The token is the value of the `list` query parameter, up to the next `&`
/// or `#`. Fails when the parameter is absent or empty.
pub fn extract_playlist_token(reference: &str) -> Result<String, IdentityError> {
    let invalid = || IdentityError::InvalidReference {
        reference: reference.to_string(),
    };

    let start = reference
        .match_indices(LIST_PARAM)
        .find(|(index, _)| {
            *index > 0 && matches!(reference.as_bytes()[index - 1], b'?' | b'&')
        })
        .map(|(index, _)| index + LIST_PARAM.len())
        .ok_or_else(invalid)?;

    let rest = &reference[start..];
    let token = rest.split(['&', '#']).next().unwrap_or("").trim();

    if token.is_empty() {
        return Err(invalid());
    }

    Ok(token.to_string())
}

/// Locate the last `[...]` pair in a filename
fn last_bracket_pair(filename: &str) -> Result<(usize, usize), IdentityError> {
    let malformed = || IdentityError::MalformedFilename {
        filename: filename.to_string(),
    };

    let open = filename.rfind('[').ok_or_else(malformed)?;
    let close = filename[open..]
        .find(']')
        .map(|offset| open + offset)
        .ok_or_else(malformed)?;

    Ok((open, close))
}

/// Remove the bracketed item token (and whatever follows it) from a filename
///
/// `"My Song [abc123].webm"` becomes `"My Song"`.
pub fn strip_item_token(filename: &str) -> Result<String, IdentityError> {
    let (open, _) = last_bracket_pair(filename)?;
    Ok(filename[..open].trim().to_string())
}

/// Return the contents of the last bracket pair of a filename
pub fn extract_item_token(filename: &str) -> Result<String, IdentityError> {
    let (open, close) = last_bracket_pair(filename)?;
    let token = &filename[open + 1..close];

    if token.is_empty() {
        return Err(IdentityError::MalformedFilename {
            filename: filename.to_string(),
        });
    }

    Ok(token.to_string())
}

/// Encode a token for storage in a private tag frame (UTF-16LE)
pub fn encode_identity(token: &str) -> Vec<u8> {
    token.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Decode a token previously written with [`encode_identity`]
pub fn decode_identity(bytes: &[u8]) -> Result<String, IdentityError> {
    let invalid = || IdentityError::InvalidEncoding { len: bytes.len() };

    if bytes.len() % 2 != 0 {
        return Err(invalid());
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    String::from_utf16(&units).map_err(|_| invalid())
}

/// Public watch URL for a single item
pub fn watch_url(item_token: &str) -> String {
    format!("https://youtube.com/watch?v={item_token}")
}

/// Public URL for a playlist
pub fn playlist_url(playlist_token: &str) -> String {
    format!("https://youtube.com/playlist?list={playlist_token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlist_token_from_list_param() {
        assert_eq!(extract_playlist_token("https://x/?list=PL9").unwrap(), "PL9");
    }

    #[test]
    fn playlist_token_from_watch_url() {
        let reference = "https://www.youtube.com/watch?v=abc&list=PLxyz&index=3";
        assert_eq!(extract_playlist_token(reference).unwrap(), "PLxyz");
    }

    #[test]
    fn playlist_token_stops_at_fragment() {
        assert_eq!(
            extract_playlist_token("https://x/playlist?list=PL1#top").unwrap(),
            "PL1"
        );
    }

    #[test]
    fn playlist_token_requires_list_param() {
        assert!(matches!(
            extract_playlist_token("https://x/nofilter"),
            Err(IdentityError::InvalidReference { .. })
        ));
    }

    #[test]
    fn playlist_token_rejects_empty_value() {
        assert!(extract_playlist_token("https://x/?list=").is_err());
        assert!(extract_playlist_token("https://x/?list=&v=1").is_err());
    }

    #[test]
    fn playlist_token_ignores_lookalike_params() {
        assert!(extract_playlist_token("https://x/?playlist=PL9").is_err());
    }

    #[test]
    fn strip_removes_token_and_whitespace() {
        assert_eq!(strip_item_token("My Song [abc123]").unwrap(), "My Song");
    }

    #[test]
    fn strip_drops_extension_after_token() {
        assert_eq!(strip_item_token("My Song [abc123].webm").unwrap(), "My Song");
    }

    #[test]
    fn strip_uses_last_bracket_pair() {
        assert_eq!(
            strip_item_token("Live [2019] Remaster [id_9]").unwrap(),
            "Live [2019] Remaster"
        );
    }

    #[test]
    fn extract_returns_bracket_contents() {
        assert_eq!(extract_item_token("My Song [abc123]").unwrap(), "abc123");
        assert_eq!(
            extract_item_token("Live [2019] Remaster [id_9].opus").unwrap(),
            "id_9"
        );
    }

    #[test]
    fn missing_brackets_are_malformed() {
        assert!(matches!(
            extract_item_token("no token here.webm"),
            Err(IdentityError::MalformedFilename { .. })
        ));
        assert!(strip_item_token("no token here.webm").is_err());
        assert!(extract_item_token("unclosed [abc").is_err());
        assert!(extract_item_token("empty [].webm").is_err());
    }

    #[test]
    fn identity_round_trips() {
        for token in ["dQw4w9WgXcQ", "a-b_c", "with space", "ü ñ 中 🎵", "", "[]&!="] {
            assert_eq!(decode_identity(&encode_identity(token)).unwrap(), token);
        }
    }

    #[test]
    fn identity_is_utf16_le() {
        assert_eq!(encode_identity("ab"), vec![b'a', 0, b'b', 0]);
    }

    #[test]
    fn decode_rejects_odd_length() {
        assert!(matches!(
            decode_identity(&[b'a', 0, b'b']),
            Err(IdentityError::InvalidEncoding { len: 3 })
        ));
    }

    #[test]
    fn decode_rejects_lone_surrogate() {
        assert!(decode_identity(&0xD800u16.to_le_bytes()).is_err());
    }

    #[test]
    fn provenance_urls() {
        assert_eq!(watch_url("t1"), "https://youtube.com/watch?v=t1");
        assert_eq!(playlist_url("PL1"), "https://youtube.com/playlist?list=PL1");
    }
}
