use super::host::{DebugHost, InteractiveHost, PointerEvent};
use super::overlay::{CollisionDebugOverlay, OverlayState};
use crate::error::OverrideError;
use crate::render::Camera;
use crate::session::MapSession;
use macroquad::prelude::*;
use std::collections::HashSet;

/// Label of the tracked player hitbox.
pub const PLAYER_BOX: &str = "player";

/// Options for [`DebugManager::setup_collision_debug`].
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    /// Layer names never registered
    pub exclude_layers: Vec<String>,
    /// Initial player hitbox to visualise
    pub player: Option<Rect>,
    /// Enable the overlay once set up
    pub auto_enable: bool,
    /// Limit the overlay to exactly the layers registered by this call
    pub narrow_filter: bool,
}

/// Binds one overlay to one host.
pub struct DebugManager<H: DebugHost> {
    host: H,
    overlay: CollisionDebugOverlay,
}

impl<H: DebugHost> DebugManager<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            overlay: CollisionDebugOverlay::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn overlay(&self) -> &CollisionDebugOverlay {
        &self.overlay
    }

    /// Register the collidable, non-excluded layers among `layers` and
    /// prepare the overlay. Returns the ids registered by this call.
    pub fn setup_collision_debug(
        &mut self,
        session: &MapSession,
        layers: &[&str],
        options: SetupOptions,
    ) -> Vec<String> {
        let excluded: HashSet<&str> = options.exclude_layers.iter().map(String::as_str).collect();
        let mut registered = Vec::new();

        for &name in layers {
            if excluded.contains(name) {
                continue;
            }
            let collidable = session
                .world()
                .layer(name)
                .is_some_and(|l| session.rules().layer_collidable(l));
            if !collidable {
                log::debug!("Collision debug: skipping non-collidable layer '{name}'");
                continue;
            }
            if self.overlay.register_layer(session, name) {
                registered.push(name.to_owned());
            }
        }

        self.overlay.reapply_overrides(session);

        // a call that registered nothing keeps the current filter
        if options.narrow_filter && !registered.is_empty() {
            self.overlay
                .set_filter(Some(registered.iter().cloned().collect()));
        }
        if let Some(rect) = options.player {
            self.overlay.track_box(&mut self.host, PLAYER_BOX, rect);
        }
        if options.auto_enable {
            self.overlay.enable(&mut self.host, session);
        } else if self.overlay.is_enabled() {
            self.overlay.render(&mut self.host, session);
        }

        log::info!(
            "Collision debug set up with {} layers (interactive host: {})",
            registered.len(),
            self.host.is_interactive()
        );
        registered
    }

    pub fn toggle_overlay(&mut self, session: &MapSession) -> OverlayState {
        self.overlay.toggle(&mut self.host, session)
    }

    pub fn set_filter(&mut self, session: &MapSession, filter: Option<HashSet<String>>) {
        self.overlay.set_filter(filter);
        self.overlay.render(&mut self.host, session);
    }

    /// Move the tracked player hitbox. Cheap enough to call every frame:
    /// the tile surface is not redrawn.
    pub fn update_player(&mut self, rect: Rect) {
        self.overlay.track_box(&mut self.host, PLAYER_BOX, rect);
    }

    pub fn handle_pointer(
        &mut self,
        session: &mut MapSession,
        event: PointerEvent,
    ) -> Option<Result<bool, OverrideError>> {
        match event {
            PointerEvent::Move(pos) => {
                self.overlay.pointer_move(&mut self.host, session, pos);
                None
            }
            PointerEvent::Down(pos) => self.overlay.pointer_down(&mut self.host, session, pos),
        }
    }

    /// Toggle a tile directly, e.g. from a console command. Works with any
    /// host, enabled or not.
    pub fn toggle_tile(
        &mut self,
        session: &mut MapSession,
        layer: &str,
        x: i32,
        y: i32,
    ) -> Result<bool, OverrideError> {
        self.overlay
            .apply_toggle(&mut self.host, session, layer, x, y)
    }

    /// Force a full redraw, e.g. after overrides were reloaded.
    pub fn refresh(&mut self, session: &MapSession) -> usize {
        self.overlay.reapply_overrides(session);
        self.overlay.render(&mut self.host, session)
    }

    pub fn shutdown(&mut self) {
        self.overlay.disable(&mut self.host);
        self.host.destroy_surface();
    }
}

impl DebugManager<InteractiveHost> {
    /// Per-frame input pump: feeds pointer events to the overlay. Does not
    /// re-render unless a click changed something.
    pub fn update(&mut self, session: &mut MapSession, camera: &Camera) {
        for event in self.host.poll_pointer(camera) {
            self.handle_pointer(session, event);
        }
    }

    pub fn present(&self, camera: &Camera) {
        if self.overlay.is_enabled() {
            self.host.present(camera);
        }
    }
}
