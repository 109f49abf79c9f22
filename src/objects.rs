use crate::config::DebugConfig;
use crate::ir_map::{IrObject, Properties};
use crate::map::TileWorld;
use macroquad::prelude::{vec2, Rect, Vec2};
use std::collections::HashSet;

/// One gameplay entity taken from an object layer.
#[derive(Debug, Clone)]
pub struct MapEntity {
    pub id: u32,
    pub name: String,
    pub layer: String,
    pub position: Vec2,
    pub size: Vec2,
    pub gid: Option<u32>,
    pub dialogue: Option<String>,
    pub properties: Properties,
}

impl MapEntity {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.size.x, self.size.y)
    }
}

/// NPCs, quests and rewards found on the map, in document order.
#[derive(Debug, Clone, Default)]
pub struct MapObjects {
    npcs: Vec<MapEntity>,
    quests: Vec<MapEntity>,
    rewards: Vec<MapEntity>,
}

impl MapObjects {
    pub fn npcs(&self) -> &[MapEntity] {
        &self.npcs
    }

    pub fn quests(&self) -> &[MapEntity] {
        &self.quests
    }

    pub fn rewards(&self) -> &[MapEntity] {
        &self.rewards
    }
}

fn dialogue_of(obj: &IrObject, names: &[String]) -> Option<String> {
    names
        .iter()
        .find_map(|n| obj.properties.get_string(n))
        .map(str::to_owned)
}

/// Scan every object layer once and sort entries into NPCs, quests and
/// rewards.
///
/// A name containing the quest marker makes a quest no matter which layer
/// holds it. Otherwise the layer name decides: `npc` layers give NPCs,
/// `reward` layers give rewards, anything else is ignored. Quests are
/// unique by object id; the first occurrence wins.
pub fn process_map_objects(world: &TileWorld, config: &DebugConfig) -> MapObjects {
    let marker = config.quest_marker.to_lowercase();
    let mut out = MapObjects::default();
    let mut quest_ids = HashSet::new();

    for layer in world.object_layers() {
        let layer_lower = layer.name.to_lowercase();
        for obj in layer.objects().unwrap_or_default() {
            let entity = MapEntity {
                id: obj.id,
                name: obj.name.clone(),
                layer: layer.name.clone(),
                position: vec2(obj.x, obj.y),
                size: vec2(obj.width, obj.height),
                gid: obj.gid(),
                dialogue: dialogue_of(obj, &config.dialogue_properties),
                properties: obj.properties.clone(),
            };

            if !marker.is_empty() && obj.name.to_lowercase().contains(&marker) {
                if quest_ids.insert(obj.id) {
                    out.quests.push(entity);
                } else {
                    log::debug!(
                        "Dropping duplicate quest {} ('{}') from layer '{}'",
                        obj.id,
                        obj.name,
                        layer.name
                    );
                }
            } else if layer_lower.contains("npc") {
                out.npcs.push(entity);
            } else if layer_lower.contains("reward") {
                out.rewards.push(entity);
            }
        }
    }

    log::info!(
        "Map objects: {} npcs, {} quests, {} rewards",
        out.npcs.len(),
        out.quests.len(),
        out.rewards.len()
    );
    out
}
