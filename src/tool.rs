// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{AcquisitionError, ConversionError};
use crate::state::ExclusionFilter;

/// Everything the remote fetch needs to populate a work directory
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    /// Playlist reference to fetch
    pub reference: &'a str,
    /// Directory the raw items are written to
    pub destination: &'a Path,
    /// Items that must not be fetched again
    pub exclusion: Option<&'a ExclusionFilter>,
}

/// Remote-fetch abstraction for testability
///
/// Implementations write raw audio files named `<title> [<token>].<ext>` and
/// matching `.description` sidecars (plus one collection-level sidecar) into
/// the destination, returning only once the fetch has finished.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<(), AcquisitionError>;
}

/// Transcoder abstraction for testability
///
/// Either produces a file at `destination` or leaves none behind.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, source: &Path, destination: &Path) -> Result<(), ConversionError>;
}

/// Last non-empty line of a process' stderr, for error messages
fn stderr_tail(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Fetcher backed by the yt-dlp executable
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    show_output: bool,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            show_output: false,
        }
    }

    /// Let yt-dlp write its own progress to the terminal
    pub fn with_output(mut self, show_output: bool) -> Self {
        self.show_output = show_output;
        self
    }

    /// Command line arguments for a fetch request
    pub fn arguments(request: &FetchRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            request.reference.into(),
            "-P".into(),
            request.destination.as_os_str().to_owned(),
            "-f".into(),
            "bestaudio".into(),
            "--force-overwrites".into(),
            "--yes-playlist".into(),
            "--no-write-comments".into(),
            "--write-description".into(),
            "--write-playlist-metafiles".into(),
        ];

        if let Some(expression) = request.exclusion.and_then(ExclusionFilter::to_match_filter) {
            args.push("--match-filter".into());
            args.push(expression.into());
        }

        args
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl Fetcher for YtDlp {
    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<(), AcquisitionError> {
        let program = self.program.display().to_string();

        let mut command = Command::new(&self.program);
        command
            .args(Self::arguments(request))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if self.show_output {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        let output = command
            .output()
            .await
            .map_err(|e| AcquisitionError::SpawnFailed {
                program: program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(AcquisitionError::ExitFailure {
                program,
                status: output.status.to_string(),
                stderr: stderr_tail(&output),
            });
        }

        Ok(())
    }
}

/// Transcoder backed by the ffmpeg executable
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command line arguments for one conversion
    pub fn arguments(source: &Path, destination: &Path) -> Vec<OsString> {
        vec![
            "-nostdin".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            source.as_os_str().to_owned(),
            destination.as_os_str().to_owned(),
        ]
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl Transcoder for Ffmpeg {
    async fn transcode(&self, source: &Path, destination: &Path) -> Result<(), ConversionError> {
        let program = self.program.display().to_string();

        let output = Command::new(&self.program)
            .args(Self::arguments(source, destination))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ConversionError::SpawnFailed {
                program: program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            // Never leave a half-written target behind
            let _ = tokio::fs::remove_file(destination).await;

            return Err(ConversionError::ExitFailure {
                program,
                status: output.status.to_string(),
                stderr: stderr_tail(&output),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// One remote item served by [`CatalogFetcher`]
    #[derive(Debug, Clone)]
    pub struct CatalogItem {
        pub title: String,
        pub token: String,
        pub description: Option<String>,
    }

    impl CatalogItem {
        pub fn new(title: &str, token: &str, description: Option<&str>) -> Self {
            Self {
                title: title.to_string(),
                token: token.to_string(),
                description: description.map(String::from),
            }
        }
    }

    /// Fetcher that writes a fixed catalog, honoring the exclusion filter
    #[derive(Debug, Default)]
    pub struct CatalogFetcher {
        pub collection: Option<(String, String, String)>,
        pub items: Vec<CatalogItem>,
        pub fail: bool,
        pub requests: Mutex<Vec<Option<String>>>,
    }

    impl CatalogFetcher {
        pub fn new(name: &str, token: &str, description: &str, items: Vec<CatalogItem>) -> Self {
            Self {
                collection: Some((name.to_string(), token.to_string(), description.to_string())),
                items,
                ..Default::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        /// Match filters passed to each fetch, in call order
        pub fn match_filters(&self) -> Vec<Option<String>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for CatalogFetcher {
        async fn fetch(&self, request: &FetchRequest<'_>) -> Result<(), AcquisitionError> {
            self.requests
                .lock()
                .unwrap()
                .push(request.exclusion.and_then(ExclusionFilter::to_match_filter));

            if self.fail {
                return Err(AcquisitionError::ExitFailure {
                    program: "catalog".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "ERROR: playlist unavailable".to_string(),
                });
            }

            let dir = request.destination;
            if let Some((name, token, description)) = &self.collection {
                std::fs::write(dir.join(format!("{name} [{token}].description")), description)
                    .unwrap();
            }

            for item in &self.items {
                if request.exclusion.is_some_and(|f| f.excludes(&item.token)) {
                    continue;
                }
                let stem = format!("{} [{}]", item.title, item.token);
                std::fs::write(dir.join(format!("{stem}.webm")), format!("audio {stem}")).unwrap();
                if let Some(description) = &item.description {
                    std::fs::write(dir.join(format!("{stem}.description")), description).unwrap();
                }
            }

            Ok(())
        }
    }

    /// Transcoder that copies bytes, optionally misbehaving for some tokens
    #[derive(Debug, Clone)]
    pub struct CopyTranscoder {
        fail_tokens: Vec<String>,
        corrupt_tokens: Vec<String>,
        stall_tokens: Vec<String>,
        produce_output: bool,
        stalled: Arc<AtomicBool>,
    }

    impl Default for CopyTranscoder {
        fn default() -> Self {
            Self {
                fail_tokens: Vec::new(),
                corrupt_tokens: Vec::new(),
                stall_tokens: Vec::new(),
                produce_output: true,
                stalled: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    fn bracketed(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| format!("[{t}]")).collect()
    }

    impl CopyTranscoder {
        pub fn failing_for(tokens: &[&str]) -> Self {
            Self {
                fail_tokens: bracketed(tokens),
                ..Default::default()
            }
        }

        /// Writes output whose ID3 header cannot be parsed
        pub fn corrupting_for(tokens: &[&str]) -> Self {
            Self {
                corrupt_tokens: bracketed(tokens),
                ..Default::default()
            }
        }

        /// Never finishes once it reaches one of these tokens
        pub fn stalling_for(tokens: &[&str]) -> Self {
            Self {
                stall_tokens: bracketed(tokens),
                ..Default::default()
            }
        }

        /// Reports success without writing anything
        pub fn silent() -> Self {
            Self {
                produce_output: false,
                ..Default::default()
            }
        }

        /// True once a stalling token has been reached
        pub fn has_stalled(&self) -> bool {
            self.stalled.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transcoder for CopyTranscoder {
        async fn transcode(
            &self,
            source: &Path,
            destination: &Path,
        ) -> Result<(), ConversionError> {
            let name = source.to_string_lossy();
            let hits = |tokens: &[String]| tokens.iter().any(|t| name.contains(t.as_str()));

            if hits(&self.stall_tokens) {
                self.stalled.store(true, Ordering::SeqCst);
                std::future::pending::<()>().await;
            }

            if hits(&self.fail_tokens) {
                return Err(ConversionError::ExitFailure {
                    program: "copy".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "Invalid data found when processing input".to_string(),
                });
            }

            let spawn_failed = |e| ConversionError::SpawnFailed {
                program: "copy".to_string(),
                source: e,
            };

            if hits(&self.corrupt_tokens) {
                // Claims an ID3 major version that does not exist
                tokio::fs::write(destination, b"ID3\x09\x00\x00\x00\x00\x00\x10audio")
                    .await
                    .map_err(spawn_failed)?;
            } else if self.produce_output {
                tokio::fs::copy(source, destination)
                    .await
                    .map_err(spawn_failed)?;
            }

            Ok(())
        }
    }
}
