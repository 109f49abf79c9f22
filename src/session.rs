use crate::collision::{
    CollisionOverrides, CollisionResolver, CollisionRules, HttpOverrideBackend, Identity,
    OverrideStore,
};
use crate::config::DebugConfig;
use crate::error::OverrideError;
use crate::map::TileWorld;
use crate::objects::{process_map_objects, MapObjects};
use macroquad::prelude::Vec2;

/// Everything one map visit needs: the world, its collision overrides, the
/// extracted gameplay objects and who is playing. Built when a map is
/// entered and dropped on navigation.
pub struct MapSession {
    world: TileWorld,
    store: OverrideStore,
    rules: CollisionRules,
    objects: MapObjects,
    identity: Box<dyn Identity>,
    config: DebugConfig,
}

impl MapSession {
    pub fn new(
        world: TileWorld,
        store: OverrideStore,
        identity: Box<dyn Identity>,
        config: DebugConfig,
    ) -> Self {
        let rules = CollisionRules::from_config(&config);
        let objects = process_map_objects(&world, &config);
        Self {
            world,
            store,
            rules,
            objects,
            identity,
            config,
        }
    }

    /// Session with a remote override store when the config names an
    /// endpoint, a local one otherwise.
    pub fn open(
        world: TileWorld,
        identity: Box<dyn Identity>,
        config: DebugConfig,
    ) -> Result<Self, OverrideError> {
        let store = match &config.override_endpoint {
            Some(endpoint) => OverrideStore::load(Box::new(HttpOverrideBackend::new(
                endpoint.clone(),
                config.auth_token.clone(),
            )))?,
            None => OverrideStore::local(),
        };
        Ok(Self::new(world, store, identity, config))
    }

    pub fn world(&self) -> &TileWorld {
        &self.world
    }

    pub fn rules(&self) -> &CollisionRules {
        &self.rules
    }

    pub fn config(&self) -> &DebugConfig {
        &self.config
    }

    pub fn objects(&self) -> &MapObjects {
        &self.objects
    }

    pub fn overrides(&self) -> &CollisionOverrides {
        self.store.overrides()
    }

    pub fn store_mut(&mut self) -> &mut OverrideStore {
        &mut self.store
    }

    pub fn resolver(&self) -> CollisionResolver<'_> {
        CollisionResolver::new(&self.world, self.store.overrides(), &self.rules)
    }

    pub fn is_blocked(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        self.resolver().is_blocked(x, y, width, height)
    }

    pub fn find_player_start(&self) -> Option<Vec2> {
        self.world.find_player_start()
    }

    pub fn can_edit_collision(&self) -> bool {
        self.identity.can_edit_collision()
    }

    /// Flip one tile's collision if the current identity may edit it.
    pub fn toggle_collision(&mut self, layer: &str, x: i32, y: i32) -> Result<bool, OverrideError> {
        if !self.identity.can_edit_collision() {
            return Err(OverrideError::Unauthorized);
        }
        self.store.toggle(&self.world, &self.rules, layer, x, y)
    }
}
