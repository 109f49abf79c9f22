//! Walk a map with the collision debugger attached.
//!
//! `cargo run --example debug_map -- assets/town.json [debug.json]`
//!
//! Arrow keys move the player, F3 toggles the overlay and clicking a tile
//! flips its collision.

use macroquad::prelude::*;
use macroquad_tiled_collision::{
    Camera, DebugConfig, DebugManager, InteractiveHost, Map, MapRenderer, MapSession, Role,
    SetupOptions,
};

const PLAYER_SIZE: Vec2 = Vec2::new(12.0, 14.0);
const SPEED: f32 = 90.0;

fn window_conf() -> Conf {
    Conf {
        window_title: "Collision debug".into(),
        window_width: 960,
        window_height: 640,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let map_path = args.next().unwrap_or_else(|| "assets/town.json".into());
    let config = match args.next() {
        Some(path) => DebugConfig::load(&path).unwrap_or_else(|e| {
            log::warn!("Using default debug config: {e}");
            DebugConfig::default()
        }),
        None => DebugConfig::default(),
    };

    let map = match Map::load(&map_path).await {
        Ok(map) => map,
        Err(e) => {
            log::error!("Failed to load map: {e:#}");
            return;
        }
    };

    let auto_enable = config.auto_enable;
    let mut session = match MapSession::open(map.world().clone(), Box::new(Role::Admin), config) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Failed to open map session: {e}");
            return;
        }
    };

    let layer_names: Vec<String> = session
        .world()
        .tile_layers()
        .map(|(_, l)| l.name.clone())
        .collect();
    let layer_refs: Vec<&str> = layer_names.iter().map(String::as_str).collect();

    let mut player = session.find_player_start().unwrap_or(Vec2::ZERO);
    let mut debug = DebugManager::new(InteractiveHost::with_layers(layer_names.clone()));
    debug.setup_collision_debug(
        &session,
        &layer_refs,
        SetupOptions {
            player: Some(Rect::new(player.x, player.y, PLAYER_SIZE.x, PLAYER_SIZE.y)),
            auto_enable,
            ..SetupOptions::default()
        },
    );

    let mut renderer = MapRenderer::new();
    renderer.set_map(map);

    loop {
        let dt = get_frame_time();
        let mut step = Vec2::ZERO;
        if is_key_down(KeyCode::Left) {
            step.x -= 1.0;
        }
        if is_key_down(KeyCode::Right) {
            step.x += 1.0;
        }
        if is_key_down(KeyCode::Up) {
            step.y -= 1.0;
        }
        if is_key_down(KeyCode::Down) {
            step.y += 1.0;
        }
        let step = step.normalize_or_zero() * SPEED * dt;

        // axis-separated so the player slides along walls
        if !session.is_blocked(player.x + step.x, player.y, PLAYER_SIZE.x, PLAYER_SIZE.y) {
            player.x += step.x;
        }
        if !session.is_blocked(player.x, player.y + step.y, PLAYER_SIZE.x, PLAYER_SIZE.y) {
            player.y += step.y;
        }
        debug.update_player(Rect::new(player.x, player.y, PLAYER_SIZE.x, PLAYER_SIZE.y));

        let camera = Camera::new(
            player.x - screen_width() / 4.0,
            player.y - screen_height() / 4.0,
            screen_width(),
            screen_height(),
        )
        .with_zoom(2.0);

        if is_key_pressed(KeyCode::F3) {
            debug.toggle_overlay(&session);
        }
        debug.update(&mut session, &camera);

        clear_background(BLACK);
        renderer.draw(&camera);
        let p = camera.world_to_screen(player);
        draw_rectangle(p.x, p.y, PLAYER_SIZE.x * camera.zoom, PLAYER_SIZE.y * camera.zoom, ORANGE);
        debug.present(&camera);

        next_frame().await;
    }
}
