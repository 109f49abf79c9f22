mod host;
mod manager;
mod overlay;

pub use host::{CursorHint, DebugHost, InteractiveHost, NullHost, Panel, PointerEvent, Shape};
pub use manager::{DebugManager, SetupOptions, PLAYER_BOX};
pub use overlay::{CollisionDebugOverlay, DebugLayerEntry, HoverTarget, OverlayState};
