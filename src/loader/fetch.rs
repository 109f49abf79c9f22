use crate::error::MapError;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Where a document or image lives: a local path or an http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Path(PathBuf),
    Url(String),
}

impl Location {
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Location::Url(source.to_owned())
        } else {
            Location::Path(PathBuf::from(source))
        }
    }

    /// Directory-like base used to resolve relative references.
    pub fn parent(&self) -> Location {
        match self {
            Location::Path(p) => Location::Path(
                p.parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("./")),
            ),
            Location::Url(u) => match u.rfind('/') {
                Some(i) if i > u.find("://").map_or(0, |s| s + 2) => Location::Url(u[..=i].to_owned()),
                _ => Location::Url(format!("{u}/")),
            },
        }
    }

    /// Resolve `rel` against this base. Absolute references are kept as is.
    pub fn join(&self, rel: &str) -> Location {
        if rel.starts_with("http://") || rel.starts_with("https://") {
            return Location::Url(rel.to_owned());
        }
        match self {
            Location::Path(p) => Location::Path(p.join(rel)),
            Location::Url(u) => {
                let base = if u.ends_with('/') {
                    u.clone()
                } else {
                    format!("{u}/")
                };
                Location::Url(format!("{base}{}", rel.trim_start_matches("./")))
            }
        }
    }

    /// File extension, lowercase.
    pub fn extension(&self) -> Option<String> {
        let tail = match self {
            Location::Path(p) => return p.extension().and_then(|e| e.to_str()).map(str::to_lowercase),
            Location::Url(u) => u.split(['?', '#']).next().unwrap_or(u),
        };
        let file = tail.rsplit('/').next()?;
        file.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
    }

    pub(crate) fn path_for_errors(&self) -> PathBuf {
        match self {
            Location::Path(p) => p.clone(),
            Location::Url(u) => PathBuf::from(u),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Path(p) => write!(f, "{}", p.display()),
            Location::Url(u) => f.write_str(u),
        }
    }
}

/// Read a text document from disk or over HTTP.
pub fn fetch_text(loc: &Location) -> Result<String, MapError> {
    match loc {
        Location::Path(p) => std::fs::read_to_string(p).map_err(|source| MapError::Io {
            path: p.clone(),
            source,
        }),
        Location::Url(url) => {
            log::debug!("GET {url}");
            ureq::get(url)
                .call()
                .map_err(|e| fetch_error(url, e))?
                .into_string()
                .map_err(|e| MapError::Fetch {
                    url: url.clone(),
                    reason: e.to_string(),
                })
        }
    }
}

/// Read raw bytes (tileset images) from disk or over HTTP.
pub fn fetch_bytes(loc: &Location) -> Result<Vec<u8>, MapError> {
    match loc {
        Location::Path(p) => std::fs::read(p).map_err(|source| MapError::Io {
            path: p.clone(),
            source,
        }),
        Location::Url(url) => {
            log::debug!("GET {url}");
            let response = ureq::get(url).call().map_err(|e| fetch_error(url, e))?;
            let mut bytes = Vec::new();
            response
                .into_reader()
                .read_to_end(&mut bytes)
                .map_err(|e| MapError::Fetch {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
            Ok(bytes)
        }
    }
}

fn fetch_error(url: &str, e: ureq::Error) -> MapError {
    let reason = match e {
        ureq::Error::Status(code, _) => format!("HTTP {code}"),
        ureq::Error::Transport(t) => t.to_string(),
    };
    MapError::Fetch {
        url: url.to_owned(),
        reason,
    }
}
