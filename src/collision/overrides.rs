use super::remote::{OverrideBackend, OverridePayload};
use super::{is_floor, CollisionRules};
use crate::error::OverrideError;
use crate::map::TileWorld;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// `(tile x, tile y, layer name)`; printed as `"x,y,layer"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverrideKey {
    pub x: i32,
    pub y: i32,
    pub layer: String,
}

impl OverrideKey {
    pub fn new(x: i32, y: i32, layer: impl Into<String>) -> Self {
        Self {
            x,
            y,
            layer: layer.into(),
        }
    }
}

impl fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.layer)
    }
}

impl FromStr for OverrideKey {
    type Err = OverrideError;

    /// Splits on the first two commas only; layer names may contain commas.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || OverrideError::InvalidKey(s.to_owned());
        let mut parts = s.splitn(3, ',');
        let x = parts.next().and_then(|p| p.trim().parse().ok()).ok_or_else(bad)?;
        let y = parts.next().and_then(|p| p.trim().parse().ok()).ok_or_else(bad)?;
        let layer = parts.next().filter(|l| !l.is_empty()).ok_or_else(bad)?;
        Ok(Self::new(x, y, layer))
    }
}

/// Explicit per-tile collision decisions. Absence means "layer default".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionOverrides {
    map: HashMap<OverrideKey, bool>,
}

impl CollisionOverrides {
    /// Stored override; always `None` for the floor layer.
    pub fn get(&self, x: i32, y: i32, layer: &str) -> Option<bool> {
        if is_floor(layer) {
            return None;
        }
        self.map.get(&OverrideKey::new(x, y, layer)).copied()
    }

    pub fn set(&mut self, key: OverrideKey, value: bool) {
        self.map.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OverrideKey, bool)> {
        self.map.iter().map(|(k, v)| (k, *v))
    }

    /// Keys that fail to parse are logged and skipped.
    pub fn from_payload(payload: &OverridePayload) -> Self {
        let mut map = HashMap::with_capacity(payload.overrides.len());
        for (raw, value) in &payload.overrides {
            match raw.parse::<OverrideKey>() {
                Ok(key) => {
                    map.insert(key, *value);
                }
                Err(e) => log::warn!("Ignoring override: {e}"),
            }
        }
        Self { map }
    }

    pub fn to_payload(&self) -> OverridePayload {
        OverridePayload {
            overrides: self.map.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }
}

/// The session's override map plus its remote mirror.
///
/// Every change is applied locally first and then submitted; a failed
/// submission is logged and the local change stays.
pub struct OverrideStore {
    overrides: CollisionOverrides,
    backend: Option<Box<dyn OverrideBackend>>,
}

impl OverrideStore {
    /// Store with no remote mirror.
    pub fn local() -> Self {
        Self {
            overrides: CollisionOverrides::default(),
            backend: None,
        }
    }

    /// Load from `backend`. Permission denied yields an empty store that
    /// still submits; other failures are returned.
    pub fn load(backend: Box<dyn OverrideBackend>) -> Result<Self, OverrideError> {
        let overrides = match backend.fetch() {
            Ok(payload) => {
                let o = CollisionOverrides::from_payload(&payload);
                log::info!("Loaded {} collision overrides", o.len());
                o
            }
            Err(e) if e.is_permission_denied() => {
                log::info!("Collision overrides unavailable: {e}");
                CollisionOverrides::default()
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            overrides,
            backend: Some(backend),
        })
    }

    pub fn overrides(&self) -> &CollisionOverrides {
        &self.overrides
    }

    /// Write an override directly, bypassing tile checks. The floor
    /// exemption still applies at read time.
    pub fn force(&mut self, key: OverrideKey, value: bool) {
        self.overrides.set(key, value);
    }

    /// Flip the effective collision of one tile and persist the result.
    /// Returns the new state.
    pub fn toggle(
        &mut self,
        world: &TileWorld,
        rules: &CollisionRules,
        layer_name: &str,
        x: i32,
        y: i32,
    ) -> Result<bool, OverrideError> {
        if is_floor(layer_name) {
            return Err(OverrideError::FloorExempt);
        }
        let no_tile = || OverrideError::NoTile {
            layer: layer_name.to_owned(),
            x,
            y,
        };
        let layer = world.layer(layer_name).ok_or_else(no_tile)?;
        layer.tiles().and_then(|t| t.tile_at(x, y)).ok_or_else(no_tile)?;

        let current = self
            .overrides
            .get(x, y, layer_name)
            .unwrap_or_else(|| rules.layer_collidable(layer));
        let next = !current;
        self.overrides.set(OverrideKey::new(x, y, layer_name), next);
        log::info!("Collision at ({x},{y}) on '{layer_name}' -> {next}");

        self.persist();
        Ok(next)
    }

    fn persist(&self) {
        let Some(backend) = &self.backend else {
            return;
        };
        match backend.submit(self.overrides.to_payload()) {
            Ok(()) => {}
            Err(e) if e.is_permission_denied() => log::debug!("Override save skipped: {e}"),
            Err(e) => log::error!("Failed to save collision overrides: {e}"),
        }
    }
}
