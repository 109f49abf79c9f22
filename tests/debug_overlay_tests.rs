mod common;

use common::*;
use macroquad::prelude::*;
use macroquad_tiled_collision::{
    CursorHint, DebugHost, DebugManager, InteractiveHost, NullHost, OverlayState, OverrideError,
    OverrideStore, Panel, PointerEvent, Role, SetupOptions, Shape, PLAYER_BOX,
};
use std::collections::HashSet;

const LAYERS: &[&str] = &["floor", "Walls", "decor"];

fn wall_centre() -> Vec2 {
    vec2(10.5 * TILE, 12.5 * TILE)
}

fn manager() -> DebugManager<InteractiveHost> {
    DebugManager::new(InteractiveHost::new())
}

fn fills(host: &InteractiveHost) -> usize {
    host.shapes()
        .iter()
        .filter(|s| matches!(s, Shape::Fill(..)))
        .count()
}

#[test]
fn setup_registers_only_collidable_layers() {
    let session = admin_session(town());
    let mut dbg = manager();
    let registered = dbg.setup_collision_debug(
        &session,
        LAYERS,
        SetupOptions {
            auto_enable: true,
            ..SetupOptions::default()
        },
    );

    assert_eq!(registered, vec!["Walls".to_string()]);
    assert_eq!(dbg.overlay().state(), OverlayState::Enabled);
    let walls = dbg.overlay().layer("Walls").expect("registered");
    assert_eq!(walls.tile_count(), 2);
    assert_eq!(walls.blocked_count(), 2);
    assert_eq!(walls.last_drawn(), Some(2));

    let host = dbg.host();
    assert!(host.has_surface());
    assert!(host.is_listening());
    assert_eq!(fills(host), 2);
    assert!(host.panel(Panel::Instructions).is_some());
    assert!(host.panel(Panel::Layers).is_some());
}

#[test]
fn excluded_layers_are_skipped() {
    let session = admin_session(town());
    let mut dbg = manager();
    let registered = dbg.setup_collision_debug(
        &session,
        LAYERS,
        SetupOptions {
            exclude_layers: vec!["Walls".into()],
            ..SetupOptions::default()
        },
    );
    assert!(registered.is_empty());
    assert_eq!(dbg.overlay().state(), OverlayState::Disabled);
    assert!(!dbg.host().has_surface());
}

#[test]
fn hover_moves_highlight_without_rendering() {
    let mut session = admin_session(town());
    let mut dbg = manager();
    dbg.setup_collision_debug(
        &session,
        LAYERS,
        SetupOptions {
            auto_enable: true,
            ..SetupOptions::default()
        },
    );
    let passes = dbg.overlay().render_passes();

    assert!(dbg
        .handle_pointer(&mut session, PointerEvent::Move(wall_centre()))
        .is_none());
    assert_eq!(dbg.overlay().render_passes(), passes);
    assert_eq!(dbg.host().highlight(), Some(Rect::new(160.0, 192.0, 16.0, 16.0)));
    assert_eq!(dbg.host().cursor(), CursorHint::Pointer);
    let hover = dbg.overlay().hover().expect("hovering");
    assert_eq!((hover.layer.as_str(), hover.x, hover.y), ("Walls", 10, 12));

    dbg.handle_pointer(&mut session, PointerEvent::Move(vec2(1.0, 1.0)));
    assert_eq!(dbg.host().highlight(), None);
    assert_eq!(dbg.host().cursor(), CursorHint::Default);
    assert_eq!(dbg.overlay().render_passes(), passes);
}

#[test]
fn click_toggles_and_redraws() {
    let mut session = admin_session(town());
    let mut dbg = manager();
    dbg.setup_collision_debug(
        &session,
        LAYERS,
        SetupOptions {
            auto_enable: true,
            ..SetupOptions::default()
        },
    );
    let passes = dbg.overlay().render_passes();

    let result = dbg.handle_pointer(&mut session, PointerEvent::Down(wall_centre()));
    assert!(matches!(result, Some(Ok(false))));
    assert_eq!(dbg.overlay().render_passes(), passes + 1);
    assert_eq!(dbg.overlay().layer("Walls").map(|l| l.blocked_count()), Some(1));
    let (x, y, w, h) = tile_box(10, 12);
    assert!(!session.is_blocked(x, y, w, h));

    // hovered tile gets an outline on top of its fill
    assert!(dbg
        .host()
        .shapes()
        .iter()
        .any(|s| matches!(s, Shape::Stroke(r, _, _) if *r == Rect::new(160.0, 192.0, 16.0, 16.0))));
}

#[test]
fn click_on_empty_space_does_nothing() {
    let mut session = admin_session(town());
    let mut dbg = manager();
    dbg.setup_collision_debug(
        &session,
        LAYERS,
        SetupOptions {
            auto_enable: true,
            ..SetupOptions::default()
        },
    );
    assert!(dbg
        .handle_pointer(&mut session, PointerEvent::Down(vec2(40.0, 40.0)))
        .is_none());
    assert!(session.overrides().is_empty());
}

#[test]
fn player_click_is_refused() {
    let mut session = session_with(town(), OverrideStore::local(), Role::Player);
    let mut dbg = manager();
    dbg.setup_collision_debug(
        &session,
        LAYERS,
        SetupOptions {
            auto_enable: true,
            ..SetupOptions::default()
        },
    );
    let result = dbg.handle_pointer(&mut session, PointerEvent::Down(wall_centre()));
    assert!(matches!(result, Some(Err(OverrideError::Unauthorized))));
    assert_eq!(dbg.overlay().layer("Walls").map(|l| l.blocked_count()), Some(2));
}

#[test]
fn filter_matching_nothing_draws_nothing() {
    let session = admin_session(town());
    let mut dbg = manager();
    dbg.setup_collision_debug(
        &session,
        LAYERS,
        SetupOptions {
            auto_enable: true,
            ..SetupOptions::default()
        },
    );
    assert_eq!(fills(dbg.host()), 2);

    dbg.set_filter(&session, Some(HashSet::from(["Roof".to_string()])));
    assert!(dbg.host().shapes().is_empty());
    assert_eq!(dbg.refresh(&session), 0);

    dbg.set_filter(&session, None);
    assert_eq!(dbg.refresh(&session), 2);
}

#[test]
fn narrow_filter_and_player_box() {
    let session = admin_session(town());
    let mut dbg = manager();
    let player = Rect::new(32.0, 32.0, 12.0, 14.0);
    dbg.setup_collision_debug(
        &session,
        LAYERS,
        SetupOptions {
            player: Some(player),
            auto_enable: true,
            narrow_filter: true,
            ..SetupOptions::default()
        },
    );
    let filter = dbg.overlay().filter().expect("narrowed");
    assert_eq!(filter.len(), 1);
    assert!(filter.contains("Walls"));
    assert_eq!(dbg.host().tracked(), &[(PLAYER_BOX.to_string(), player)]);
    // tracked boxes live beside the surface, not on it
    assert!(!dbg
        .host()
        .shapes()
        .iter()
        .any(|s| matches!(s, Shape::Stroke(r, _, _) if *r == player)));
}

#[test]
fn moving_the_player_never_rerenders() {
    let session = admin_session(town());
    let mut dbg = manager();
    dbg.setup_collision_debug(
        &session,
        LAYERS,
        SetupOptions {
            player: Some(Rect::new(32.0, 32.0, 12.0, 14.0)),
            auto_enable: true,
            ..SetupOptions::default()
        },
    );
    let passes = dbg.overlay().render_passes();
    let shapes = dbg.host().shapes().len();

    for step in 1..=30 {
        dbg.update_player(Rect::new(32.0 + step as f32, 32.0, 12.0, 14.0));
    }
    assert_eq!(dbg.overlay().render_passes(), passes);
    assert_eq!(dbg.host().shapes().len(), shapes);
    let moved = Rect::new(62.0, 32.0, 12.0, 14.0);
    assert_eq!(dbg.host().tracked(), &[(PLAYER_BOX.to_string(), moved)]);

    // hidden while disabled, restored on the next enable
    dbg.toggle_overlay(&session);
    assert!(dbg.host().tracked().is_empty());
    dbg.toggle_overlay(&session);
    assert_eq!(dbg.host().tracked(), &[(PLAYER_BOX.to_string(), moved)]);
}

#[test]
fn repeated_narrow_setup_keeps_layers_visible() {
    let session = admin_session(town());
    let mut dbg = manager();
    let narrow = || SetupOptions {
        auto_enable: true,
        narrow_filter: true,
        ..SetupOptions::default()
    };
    dbg.setup_collision_debug(&session, LAYERS, narrow());
    assert_eq!(dbg.refresh(&session), 2);

    // everything is already registered, so this call registers nothing
    let second = dbg.setup_collision_debug(&session, LAYERS, narrow());
    assert!(second.is_empty());
    assert_eq!(dbg.refresh(&session), 2);
    assert_eq!(dbg.overlay().filter().map(|f| f.len()), Some(1));
}

#[test]
fn empty_filter_set_shows_every_layer() {
    let session = admin_session(town());
    let mut dbg = manager();
    dbg.setup_collision_debug(
        &session,
        LAYERS,
        SetupOptions {
            auto_enable: true,
            ..SetupOptions::default()
        },
    );
    dbg.set_filter(&session, Some(HashSet::new()));
    assert_eq!(fills(dbg.host()), 2);
    assert_eq!(dbg.refresh(&session), 2);
}

#[test]
fn hit_testing_a_large_layer_finds_the_exact_tile() {
    let cells: Vec<(usize, usize, u32)> = (0..64)
        .flat_map(|y| (0..64).map(move |x| (x, y, 5)))
        .collect();
    let big = world(&map_json(&[flat_layer("Walls", 64, 64, &cells)]));
    let mut session = admin_session(big);
    let mut dbg = manager();
    dbg.setup_collision_debug(
        &session,
        &["Walls"],
        SetupOptions {
            auto_enable: true,
            ..SetupOptions::default()
        },
    );

    let pos = vec2(40.5 * TILE, 50.5 * TILE);
    dbg.handle_pointer(&mut session, PointerEvent::Move(pos));
    let hover = dbg.overlay().hover().expect("hovering");
    assert_eq!((hover.x, hover.y), (40, 50));

    let result = dbg.handle_pointer(&mut session, PointerEvent::Down(pos));
    assert!(matches!(result, Some(Ok(false))));
    let walls = dbg.overlay().layer("Walls").expect("registered");
    assert_eq!(walls.tile_count(), 64 * 64);
    assert_eq!(walls.blocked_count(), 64 * 64 - 1);
    assert_eq!(session.overrides().get(40, 50, "Walls"), Some(false));
}

#[test]
fn disable_tears_down_but_keeps_layers() {
    let mut session = admin_session(town());
    let mut dbg = manager();
    dbg.setup_collision_debug(
        &session,
        LAYERS,
        SetupOptions {
            auto_enable: true,
            ..SetupOptions::default()
        },
    );
    dbg.handle_pointer(&mut session, PointerEvent::Move(wall_centre()));

    assert_eq!(dbg.toggle_overlay(&session), OverlayState::Disabled);
    let host = dbg.host();
    assert!(!host.is_listening());
    assert!(host.shapes().is_empty());
    assert_eq!(host.highlight(), None);
    assert_eq!(host.cursor(), CursorHint::Default);
    assert!(host.panel(Panel::Instructions).is_none());
    assert!(dbg.overlay().hover().is_none());
    assert_eq!(dbg.overlay().layers().len(), 1);
    assert_eq!(dbg.overlay().layer("Walls").and_then(|l| l.last_drawn()), None);

    // pointer input is ignored while disabled
    assert!(dbg
        .handle_pointer(&mut session, PointerEvent::Down(wall_centre()))
        .is_none());

    assert_eq!(dbg.toggle_overlay(&session), OverlayState::Enabled);
    assert_eq!(fills(dbg.host()), 2);
}

#[test]
fn enable_discovers_host_layers() {
    let session = admin_session(town());
    let host = InteractiveHost::with_layers(LAYERS.iter().map(|s| s.to_string()).collect());
    let mut dbg = DebugManager::new(host);
    dbg.toggle_overlay(&session);
    let ids: Vec<&str> = dbg.overlay().layers().iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["Walls"]);
}

#[test]
fn null_host_still_toggles() {
    let mut session = admin_session(town());
    let mut dbg = DebugManager::new(NullHost);
    assert!(!dbg.host().is_interactive());
    dbg.setup_collision_debug(
        &session,
        LAYERS,
        SetupOptions {
            auto_enable: true,
            ..SetupOptions::default()
        },
    );

    assert!(!dbg.toggle_tile(&mut session, "Walls", 10, 12).expect("toggle"));
    assert_eq!(dbg.overlay().layer("Walls").map(|l| l.blocked_count()), Some(1));
    let (x, y, w, h) = tile_box(10, 12);
    assert!(!session.is_blocked(x, y, w, h));

    dbg.toggle_overlay(&session);
    assert!(dbg.toggle_tile(&mut session, "Walls", 10, 12).expect("toggle"));
    dbg.shutdown();
}

#[test]
fn shutdown_releases_the_surface() {
    let session = admin_session(town());
    let mut dbg = manager();
    dbg.toggle_overlay(&session);
    assert!(dbg.host().has_surface());
    dbg.shutdown();
    assert!(!dbg.host().has_surface());
    assert_eq!(dbg.overlay().state(), OverlayState::Disabled);
}
