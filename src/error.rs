use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors raised while decoding a map document or loading its tilesets.
///
/// Any of these aborts map initialization; there is no partial map.
#[derive(Debug)]
pub enum MapError {
    /// Reading a local file failed
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
    /// A document was not valid JSON for the expected shape
    Json {
        /// Document being parsed
        path: PathBuf,
        /// Underlying parse error
        source: serde_json::Error,
    },
    /// A remote document or image could not be fetched
    Fetch {
        /// Requested URL
        url: String,
        /// Human readable reason
        reason: String,
    },
    /// The document is structurally wrong (wrong extension, missing fields)
    InvalidMap(String),
    /// A layer's data length does not match its width * height
    InvalidLayerSize(String),
    /// A tile layer references a gid no tileset claims
    InvalidTileGid {
        /// Offending layer
        layer: String,
        /// Gid with flip flags removed
        gid: u32,
        /// Highest gid claimed by any tileset
        max_gid: u32,
    },
    /// A tile object references a gid no tileset claims
    InvalidObjectGid {
        /// Offending layer
        layer: String,
        /// Object id inside that layer
        object_id: u32,
        /// Gid with flip flags removed
        gid: u32,
        /// Highest gid claimed by any tileset
        max_gid: u32,
    },
    /// A custom property declared a type this crate does not understand
    UnsupportedPropertyType {
        /// Property name
        name: String,
        /// Declared Tiled type
        kind: String,
    },
    /// A tileset image failed to load
    Texture {
        /// Image path or URL
        image: String,
        /// Human readable reason
        reason: String,
    },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Io { path, source } => {
                write!(f, "I/O error reading {}: {}", path.display(), source)
            }
            MapError::Json { path, source } => {
                write!(f, "Failed to parse JSON in {}: {}", path.display(), source)
            }
            MapError::Fetch { url, reason } => write!(f, "Failed to fetch {url}: {reason}"),
            MapError::InvalidMap(msg) => write!(f, "Invalid map: {msg}"),
            MapError::InvalidLayerSize(name) => write!(
                f,
                "Invalid layer size for layer '{name}': data length does not match its dimensions"
            ),
            MapError::InvalidTileGid {
                layer,
                gid,
                max_gid,
            } => write!(
                f,
                "Layer '{layer}' references gid {gid} but tilesets only cover up to {max_gid}"
            ),
            MapError::InvalidObjectGid {
                layer,
                object_id,
                gid,
                max_gid,
            } => write!(
                f,
                "Object {object_id} in layer '{layer}' references gid {gid} but tilesets only cover up to {max_gid}"
            ),
            MapError::UnsupportedPropertyType { name, kind } => {
                write!(f, "Property '{name}' has unsupported type '{kind}'")
            }
            MapError::Texture { image, reason } => {
                write!(f, "Failed to load tileset image {image}: {reason}")
            }
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Io { source, .. } => Some(source),
            MapError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors around collision overrides: editing them and syncing them with
/// the remote store.
#[derive(Debug)]
pub enum OverrideError {
    /// The remote store answered 401/403; the feature is unavailable
    PermissionDenied {
        /// HTTP status returned
        status: u16,
    },
    /// The current identity may not edit collision
    Unauthorized,
    /// The `floor` layer can never be overridden
    FloorExempt,
    /// No tile exists at the requested position on that layer
    NoTile {
        /// Layer name
        layer: String,
        /// Tile column
        x: i32,
        /// Tile row
        y: i32,
    },
    /// The remote store answered with a non-2xx status other than 401/403
    Http {
        /// HTTP status returned
        status: u16,
        /// Response body, possibly empty
        body: String,
    },
    /// The request never got an HTTP answer
    Transport(String),
    /// The response body was not the expected JSON
    Decode(String),
    /// An override key did not have the `x,y,layer` form
    InvalidKey(String),
}

impl OverrideError {
    /// True for errors that mean "feature unavailable" rather than failure.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, OverrideError::PermissionDenied { .. })
    }
}

impl fmt::Display for OverrideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideError::PermissionDenied { status } => {
                write!(f, "Override service denied access ({status})")
            }
            OverrideError::Unauthorized => write!(f, "Not allowed to edit collision"),
            OverrideError::FloorExempt => write!(f, "The floor layer cannot be toggled"),
            OverrideError::NoTile { layer, x, y } => {
                write!(f, "No tile at ({x},{y}) on layer '{layer}'")
            }
            OverrideError::Http { status, body } => {
                write!(f, "Override service returned {status}: {body}")
            }
            OverrideError::Transport(msg) => write!(f, "Override service unreachable: {msg}"),
            OverrideError::Decode(msg) => write!(f, "Malformed override payload: {msg}"),
            OverrideError::InvalidKey(key) => write!(f, "Invalid override key '{key}'"),
        }
    }
}

impl std::error::Error for OverrideError {}
