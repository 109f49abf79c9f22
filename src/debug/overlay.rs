use super::host::{CursorHint, DebugHost, Panel};
use crate::collision::is_floor;
use crate::error::OverrideError;
use crate::session::MapSession;
use crate::spatial::for_each_filled_tile;
use macroquad::prelude::*;
use std::collections::{HashMap, HashSet};

const BLOCKED_COLOR: Color = Color::new(1.0, 0.1, 0.1, 0.35);
const PASSABLE_COLOR: Color = Color::new(0.1, 1.0, 0.2, 0.25);
const HOVER_COLOR: Color = Color::new(1.0, 0.9, 0.1, 1.0);

const INSTRUCTIONS: &[&str] = &[
    "Collision debug",
    "red: blocked  green: passable",
    "click a tile to toggle (admin)",
    "F3: hide overlay",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Disabled,
    Enabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DebugTile {
    x: i32,
    y: i32,
    blocked: bool,
}

/// A tile layer registered with the overlay, with its effective collision
/// cached from the last reapply.
#[derive(Debug, Clone)]
pub struct DebugLayerEntry {
    pub id: String,
    offset: Vec2,
    tiles: Vec<DebugTile>,
    // (x, y) -> position in `tiles`
    index: HashMap<(i32, i32), usize>,
    last_drawn: Option<usize>,
}

impl DebugLayerEntry {
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn blocked_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.blocked).count()
    }

    pub fn last_drawn(&self) -> Option<usize> {
        self.last_drawn
    }

    fn tile(&self, x: i32, y: i32) -> Option<&DebugTile> {
        self.index.get(&(x, y)).and_then(|&i| self.tiles.get(i))
    }

    fn tile_mut(&mut self, x: i32, y: i32) -> Option<&mut DebugTile> {
        let i = *self.index.get(&(x, y))?;
        self.tiles.get_mut(i)
    }
}

/// Tile under the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverTarget {
    pub layer: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq)]
struct TrackedBox {
    label: String,
    rect: Rect,
}

/// Visual collision debugger.
///
/// Rendering only happens on enable, click, registration and explicit
/// requests; pointer movement and tracked boxes only touch host slots.
#[derive(Debug)]
pub struct CollisionDebugOverlay {
    state: OverlayState,
    layers: Vec<DebugLayerEntry>,
    filter: Option<HashSet<String>>,
    hover: Option<HoverTarget>,
    tracked: Vec<TrackedBox>,
    render_passes: usize,
}

impl Default for CollisionDebugOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionDebugOverlay {
    pub fn new() -> Self {
        Self {
            state: OverlayState::Disabled,
            layers: Vec::new(),
            filter: None,
            hover: None,
            tracked: Vec::new(),
            render_passes: 0,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == OverlayState::Enabled
    }

    pub fn layers(&self) -> &[DebugLayerEntry] {
        &self.layers
    }

    pub fn layer(&self, id: &str) -> Option<&DebugLayerEntry> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn hover(&self) -> Option<&HoverTarget> {
        self.hover.as_ref()
    }

    pub fn render_passes(&self) -> usize {
        self.render_passes
    }

    pub fn filter(&self) -> Option<&HashSet<String>> {
        self.filter.as_ref()
    }

    /// Restrict rendering to the given layer ids; `None` or an empty set
    /// shows all.
    pub fn set_filter(&mut self, filter: Option<HashSet<String>>) {
        self.filter = filter;
    }

    /// Add a tile layer. Floor, unknown and already registered layers are
    /// refused.
    pub fn register_layer(&mut self, session: &MapSession, id: &str) -> bool {
        if is_floor(id) || self.layer(id).is_some() {
            return false;
        }
        let Some(layer) = session.world().layer(id) else {
            log::warn!("Collision debug: no layer named '{id}'");
            return false;
        };
        if layer.tiles().is_none() {
            log::warn!("Collision debug: '{id}' is not a tile layer");
            return false;
        }

        let mut entry = DebugLayerEntry {
            id: id.to_owned(),
            offset: layer.offset,
            tiles: Vec::new(),
            index: HashMap::new(),
            last_drawn: None,
        };
        Self::refresh_entry(&mut entry, session);
        log::debug!(
            "Collision debug: registered '{}' ({} tiles, {} blocked)",
            id,
            entry.tile_count(),
            entry.blocked_count()
        );
        self.layers.push(entry);
        true
    }

    /// Register and, when enabled, render straight away.
    pub fn add_layer(&mut self, host: &mut dyn DebugHost, session: &MapSession, id: &str) -> bool {
        let added = self.register_layer(session, id);
        if added && self.is_enabled() {
            self.show_layer_panel(host);
            self.render(host, session);
        }
        added
    }

    fn refresh_entry(entry: &mut DebugLayerEntry, session: &MapSession) {
        entry.tiles.clear();
        entry.index.clear();
        let Some(layer) = session.world().layer(&entry.id) else {
            return;
        };
        let Some(storage) = layer.tiles() else {
            return;
        };
        let resolver = session.resolver();
        let DebugLayerEntry { tiles, index, .. } = entry;
        for_each_filled_tile(storage, |_, x, y| {
            let blocked = resolver.tile_state(layer, x, y).unwrap_or(false);
            index.insert((x, y), tiles.len());
            tiles.push(DebugTile { x, y, blocked });
        });
    }

    /// Recompute every registered layer's effective collision.
    pub fn reapply_overrides(&mut self, session: &MapSession) {
        for entry in &mut self.layers {
            Self::refresh_entry(entry, session);
        }
    }

    /// Show an auxiliary box such as the player hitbox. The host draws it
    /// next to the surface, so moving it never re-renders tiles.
    pub fn track_box(&mut self, host: &mut dyn DebugHost, label: &str, rect: Rect) {
        match self.tracked.iter_mut().find(|t| t.label == label) {
            Some(t) => t.rect = rect,
            None => self.tracked.push(TrackedBox {
                label: label.to_owned(),
                rect,
            }),
        }
        if self.is_enabled() {
            host.set_tracked(label, Some(rect));
        }
    }

    pub fn untrack_box(&mut self, host: &mut dyn DebugHost, label: &str) {
        self.tracked.retain(|t| t.label != label);
        host.set_tracked(label, None);
    }

    pub fn tracked_box(&self, label: &str) -> Option<Rect> {
        self.tracked.iter().find(|t| t.label == label).map(|t| t.rect)
    }

    pub fn enable(&mut self, host: &mut dyn DebugHost, session: &MapSession) {
        if self.is_enabled() {
            return;
        }
        self.state = OverlayState::Enabled;
        host.create_surface();

        if let Some(names) = host.discover_layers() {
            for name in names {
                let candidate = session
                    .world()
                    .layer(&name)
                    .is_some_and(|l| session.rules().layer_collidable(l));
                if candidate && self.layer(&name).is_none() {
                    self.register_layer(session, &name);
                }
            }
        }

        host.attach_pointer();
        host.show_panel(
            Panel::Instructions,
            INSTRUCTIONS.iter().map(|s| s.to_string()).collect(),
        );
        self.show_layer_panel(host);
        for t in &self.tracked {
            host.set_tracked(&t.label, Some(t.rect));
        }
        self.reapply_overrides(session);
        self.render(host, session);
        log::info!("Collision debug enabled ({} layers)", self.layers.len());
    }

    /// Tear down listeners and visuals; registered layers, filter and
    /// overrides are kept for the next enable.
    pub fn disable(&mut self, host: &mut dyn DebugHost) {
        if !self.is_enabled() {
            return;
        }
        self.state = OverlayState::Disabled;
        host.detach_pointer();
        host.clear_surface();
        host.set_highlight(None);
        host.hide_panels();
        host.set_cursor(CursorHint::Default);
        for t in &self.tracked {
            host.set_tracked(&t.label, None);
        }
        self.hover = None;
        for entry in &mut self.layers {
            entry.last_drawn = None;
        }
        log::info!("Collision debug disabled");
    }

    pub fn toggle(&mut self, host: &mut dyn DebugHost, session: &MapSession) -> OverlayState {
        match self.state {
            OverlayState::Disabled => self.enable(host, session),
            OverlayState::Enabled => self.disable(host),
        }
        self.state
    }

    /// An empty filter set restricts nothing.
    fn passes_filter(&self, id: &str) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |f| f.is_empty() || f.contains(id))
    }

    fn hit_test(&self, session: &MapSession, pos: Vec2) -> Option<HoverTarget> {
        self.layers
            .iter()
            .rev()
            .filter(|e| self.passes_filter(&e.id))
            .find_map(|e| {
                let (x, y) = session.world().world_to_tile(pos - e.offset);
                e.tile(x, y).map(|_| HoverTarget {
                    layer: e.id.clone(),
                    x,
                    y,
                })
            })
    }

    fn hover_rect(&self, session: &MapSession, target: &HoverTarget) -> Rect {
        let offset = self.layer(&target.layer).map_or(Vec2::ZERO, |e| e.offset);
        session
            .world()
            .tile_rect(target.x, target.y)
            .offset(offset)
    }

    /// Track the tile under the pointer. Only the highlight and cursor
    /// change; the surface is left alone.
    pub fn pointer_move(&mut self, host: &mut dyn DebugHost, session: &MapSession, pos: Vec2) {
        if !self.is_enabled() {
            return;
        }
        let target = self.hit_test(session, pos);
        if target == self.hover {
            return;
        }
        match &target {
            Some(t) => {
                host.set_highlight(Some(self.hover_rect(session, t)));
                host.set_cursor(CursorHint::Pointer);
            }
            None => {
                host.set_highlight(None);
                host.set_cursor(CursorHint::Default);
            }
        }
        self.hover = target;
    }

    /// Toggle collision of the tile under the pointer. `None` when the
    /// overlay is disabled or nothing is under the pointer.
    pub fn pointer_down(
        &mut self,
        host: &mut dyn DebugHost,
        session: &mut MapSession,
        pos: Vec2,
    ) -> Option<Result<bool, OverrideError>> {
        if !self.is_enabled() {
            return None;
        }
        self.pointer_move(host, session, pos);
        let target = self.hover.clone()?;
        let result = self.apply_toggle(host, session, &target.layer, target.x, target.y);
        if let Err(e) = &result {
            log::warn!("Collision toggle refused: {e}");
        }
        Some(result)
    }

    /// Toggle one tile through the session and refresh what the overlay
    /// shows. Works while disabled too.
    pub fn apply_toggle(
        &mut self,
        host: &mut dyn DebugHost,
        session: &mut MapSession,
        layer: &str,
        x: i32,
        y: i32,
    ) -> Result<bool, OverrideError> {
        let blocked = session.toggle_collision(layer, x, y)?;
        if let Some(entry) = self.layers.iter_mut().find(|e| e.id == layer) {
            if let Some(tile) = entry.tile_mut(x, y) {
                tile.blocked = blocked;
            }
        }
        if self.is_enabled() {
            self.render(host, session);
        }
        Ok(blocked)
    }

    fn show_layer_panel(&self, host: &mut dyn DebugHost) {
        let mut lines = vec![format!("Layers ({})", self.layers.len())];
        for e in &self.layers {
            let mark = if self.passes_filter(&e.id) { "*" } else { " " };
            lines.push(format!(
                "{mark} {} {}/{}",
                e.id,
                e.blocked_count(),
                e.tile_count()
            ));
        }
        host.show_panel(Panel::Layers, lines);
    }

    /// Redraw the surface. Returns the number of tiles drawn.
    pub fn render(&mut self, host: &mut dyn DebugHost, session: &MapSession) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        self.render_passes += 1;
        host.clear_surface();

        if let Some(filter) = &self.filter {
            if !filter.is_empty() && !self.layers.iter().any(|e| filter.contains(&e.id)) {
                log::warn!(
                    "Collision debug filter {:?} matches no registered layer; nothing drawn",
                    filter
                );
                return 0;
            }
        }

        let world = session.world();
        let mut total = 0;
        for i in 0..self.layers.len() {
            if !self.passes_filter(&self.layers[i].id) {
                continue;
            }
            let entry = &self.layers[i];
            let mut drawn = 0;
            for tile in &entry.tiles {
                let rect = world.tile_rect(tile.x, tile.y).offset(entry.offset);
                let color = if tile.blocked {
                    BLOCKED_COLOR
                } else {
                    PASSABLE_COLOR
                };
                host.fill_rect(rect, color);
                let hovered = self
                    .hover
                    .as_ref()
                    .is_some_and(|h| h.layer == entry.id && h.x == tile.x && h.y == tile.y);
                if hovered {
                    host.stroke_rect(rect, 2.0, HOVER_COLOR);
                }
                drawn += 1;
            }

            let entry = &mut self.layers[i];
            if entry.last_drawn != Some(drawn) {
                log::debug!("Collision debug: drew {} tiles for '{}'", drawn, entry.id);
                entry.last_drawn = Some(drawn);
            }
            total += drawn;
        }

        self.show_layer_panel(host);
        total
    }
}
