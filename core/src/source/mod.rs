//! Source acquisition for scripts stored in files or behind URLs.
//!
//! Loaders read the whole resource line by line and terminate every line
//! with `\n`, whatever the original line endings were. Readers are dropped
//! on every exit path, so files and connections are always closed.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use url::Url;

use crate::{String, ToString};

/// Why a script's text could not be obtained.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("no script source was given")]
    Missing,

    #[error("cannot read {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("'{url}' is not a valid file URL")]
    InvalidFileUrl { url: Url },

    #[error("unsupported URL scheme '{scheme}' in '{url}'")]
    UnsupportedScheme { scheme: String, url: Url },

    #[error("cannot fetch '{url}': {message}")]
    Fetch { url: Url, message: String },
}

/// Anything that can produce script text.
pub trait SourceLoader {
    fn load(&self) -> Result<String, SourceError>;
}

/// A handle to a script stored outside the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    File(PathBuf),
    Url(Url),
}

impl ScriptSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ScriptSource::File(path.into())
    }

    pub fn url(url: Url) -> Self {
        ScriptSource::Url(url)
    }
}

impl SourceLoader for ScriptSource {
    fn load(&self) -> Result<String, SourceError> {
        match self {
            ScriptSource::File(path) => FileSource::new(path).load(),
            ScriptSource::Url(url) => UrlSource::new(url).load(),
        }
    }
}

/// Reads a script from the local file system.
#[derive(Debug, Clone, Copy)]
pub struct FileSource<'a> {
    path: &'a Path,
}

impl<'a> FileSource<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self { path }
    }
}

impl SourceLoader for FileSource<'_> {
    fn load(&self) -> Result<String, SourceError> {
        let io_error = |error| SourceError::Io {
            path: self.path.to_path_buf(),
            error,
        };
        let file = File::open(self.path).map_err(io_error)?;
        read_lines(BufReader::new(file)).map_err(io_error)
    }
}

/// Reads a script from a URL.
///
/// `file:` URLs are always supported. `http:` and `https:` need the `http`
/// feature.
#[derive(Debug, Clone, Copy)]
pub struct UrlSource<'a> {
    url: &'a Url,
}

impl<'a> UrlSource<'a> {
    pub fn new(url: &'a Url) -> Self {
        Self { url }
    }
}

impl SourceLoader for UrlSource<'_> {
    fn load(&self) -> Result<String, SourceError> {
        match self.url.scheme() {
            "file" => {
                let path = self
                    .url
                    .to_file_path()
                    .map_err(|()| SourceError::InvalidFileUrl {
                        url: self.url.clone(),
                    })?;
                FileSource::new(&path).load()
            }
            #[cfg(feature = "http")]
            "http" | "https" => fetch(self.url),
            scheme => Err(SourceError::UnsupportedScheme {
                scheme: scheme.to_string(),
                url: self.url.clone(),
            }),
        }
    }
}

#[cfg(feature = "http")]
fn fetch(url: &Url) -> Result<String, SourceError> {
    let fetch_error = |e: reqwest::Error| SourceError::Fetch {
        url: url.clone(),
        message: e.to_string(),
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(fetch_error)?;
    let response = client
        .get(url.as_str())
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(fetch_error)?;
    read_lines(BufReader::new(response)).map_err(|e| SourceError::Fetch {
        url: url.clone(),
        message: e.to_string(),
    })
}

/// Reads all lines, terminating each one with `\n`.
pub fn read_lines(reader: impl BufRead) -> io::Result<String> {
    let mut text = String::new();
    for line in reader.lines() {
        text.push_str(&line?);
        text.push('\n');
    }
    Ok(text)
}
