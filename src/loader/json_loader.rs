// src/loader/json_loader.rs
use super::fetch::{fetch_text, Location};
use crate::error::MapError;
use crate::ir_map::*;
use crate::spatial::GID_MASK;
use macroquad::prelude::*;
use serde::Deserialize;
use serde_json::Value as JsonValue;

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(default)]
    data: Vec<u32>,
    #[serde(default)]
    chunks: Vec<JsonChunk>,
    #[serde(default)]
    width: usize,
    #[serde(default)]
    height: usize,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default = "one")]
    opacity: f32,
    #[serde(default)]
    offsetx: f32,
    #[serde(default)]
    offsety: f32,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>, // "tilelayer" expected here
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    objects: Vec<JsonObject>,
}

fn default_true() -> bool {
    true
}
fn one() -> f32 {
    1.0
}

#[derive(Deserialize)]
struct JsonChunk {
    x: i32,
    y: i32,
    width: usize,
    height: usize,
    data: Vec<u32>,
}

/// Either an inline tileset or a `source` reference to an external one.
#[derive(Deserialize)]
struct JsonTilesetEntry {
    firstgid: u32,
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    inline: JsonTileset,
}

#[derive(Deserialize, Default)]
struct JsonTileset {
    #[serde(default)]
    tilewidth: Option<u32>,
    #[serde(default)]
    tileheight: Option<u32>,
    #[serde(default)]
    tilecount: Option<u32>,
    #[serde(default)]
    columns: Option<u32>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    imagewidth: Option<u32>,
    #[serde(default)]
    imageheight: Option<u32>,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    margin: u32,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

#[derive(Deserialize)]
struct JsonMap {
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    infinite: bool,
    layers: Vec<JsonLayer>,
    #[serde(default)]
    tilesets: Vec<JsonTilesetEntry>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonProperty {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    value: JsonValue,
}

#[derive(Deserialize)]
struct JsonObject {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    rotation: f32,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    point: bool,
    #[serde(default)]
    polygon: Vec<JsonObjectPoint>,
    #[serde(default)]
    polyline: Vec<JsonObjectPoint>,
    #[serde(default)]
    gid: Option<u32>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonObjectPoint {
    x: f32,
    y: f32,
}

#[derive(Deserialize)]
struct JsonFrame {
    tileid: u32,
    duration: u32,
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    animation: Vec<JsonFrame>,
}

fn json_property_to_ir(prop: JsonProperty) -> Result<Option<(String, PropertyValue)>, MapError> {
    let JsonProperty { name, kind, value } = prop;

    let parsed = match kind.as_deref() {
        Some("bool") => value.as_bool().map(PropertyValue::Bool),
        Some("int") | Some("object") => value.as_i64().map(PropertyValue::I64),
        Some("float") => value.as_f64().map(|n| PropertyValue::F32(n as f32)),
        Some("string") | Some("file") | Some("color") | Some("class") => {
            value.as_str().map(|s| PropertyValue::String(s.to_owned()))
        }
        Some(other) => {
            return Err(MapError::UnsupportedPropertyType {
                name,
                kind: other.to_owned(),
            });
        }
        None => {
            if let Some(v) = value.as_bool() {
                Some(PropertyValue::Bool(v))
            } else if let Some(v) = value.as_i64() {
                Some(PropertyValue::I64(v))
            } else if let Some(v) = value.as_f64() {
                Some(PropertyValue::F32(v as f32))
            } else {
                value.as_str().map(|s| PropertyValue::String(s.to_owned()))
            }
        }
    };

    Ok(parsed.map(|value| (name, value)))
}

fn properties_from_json(props: Vec<JsonProperty>) -> Result<Properties, MapError> {
    let mut out = Properties::new();
    for p in props {
        if let Some((name, value)) = json_property_to_ir(p)? {
            out.insert(name, value);
        }
    }
    Ok(out)
}

fn object_to_ir(obj: JsonObject) -> Result<IrObject, MapError> {
    let shape = if let Some(gid) = obj.gid {
        IrObjectShape::Tile { gid }
    } else if obj.point {
        IrObjectShape::Point
    } else if !obj.polygon.is_empty() {
        IrObjectShape::Polygon(obj.polygon.into_iter().map(|p| vec2(p.x, p.y)).collect())
    } else if !obj.polyline.is_empty() {
        IrObjectShape::Polyline(obj.polyline.into_iter().map(|p| vec2(p.x, p.y)).collect())
    } else {
        IrObjectShape::Rectangle
    };

    let class_name = if !obj.class.is_empty() {
        obj.class
    } else {
        obj.kind
    };

    Ok(IrObject {
        id: obj.id,
        name: obj.name,
        class_name,
        x: obj.x,
        y: obj.y,
        width: obj.width,
        height: obj.height,
        rotation: obj.rotation,
        visible: obj.visible,
        shape,
        properties: properties_from_json(obj.properties)?,
    })
}

fn tileset_to_ir(first_gid: u32, ts: JsonTileset, origin: &Location) -> Result<IrTileset, MapError> {
    let missing = |field: &str| {
        MapError::InvalidMap(format!(
            "Tileset with firstgid {first_gid} in {origin} has no '{field}'"
        ))
    };
    let image = ts.image.ok_or_else(|| missing("image"))?;
    let tile_w = ts.tilewidth.ok_or_else(|| missing("tilewidth"))?;
    let tile_h = ts.tileheight.ok_or_else(|| missing("tileheight"))?;
    if tile_w == 0 || tile_h == 0 {
        return Err(MapError::InvalidMap(format!(
            "Tileset with firstgid {first_gid} has a zero tile size"
        )));
    }

    let columns = ts.columns.filter(|c| *c > 0).unwrap_or_else(|| {
        ts.imagewidth
            .map(|w| grid_cells(w, tile_w, ts.spacing, ts.margin))
            .unwrap_or(1)
            .max(1)
    });
    let tilecount = ts.tilecount.unwrap_or_else(|| match ts.imageheight {
        Some(h) => columns * grid_cells(h, tile_h, ts.spacing, ts.margin),
        None => 0,
    });

    let tiles = ts
        .tiles
        .into_iter()
        .map(|tile| -> Result<IrTileMetadata, MapError> {
            Ok(IrTileMetadata {
                id: tile.id,
                properties: properties_from_json(tile.properties)?,
                animation: tile
                    .animation
                    .into_iter()
                    .map(|f| IrFrame {
                        local_id: f.tileid,
                        duration_ms: f.duration,
                    })
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(IrTileset {
        first_gid,
        image: origin.parent().join(&image).to_string(),
        tile_w,
        tile_h,
        tilecount,
        columns,
        spacing: ts.spacing,
        margin: ts.margin,
        properties: properties_from_json(ts.properties)?,
        tiles,
    })
}

fn grid_cells(extent: u32, tile: u32, spacing: u32, margin: u32) -> u32 {
    let usable = extent.saturating_sub(2 * margin) + spacing;
    usable / (tile + spacing)
}

fn check_gids(layer: &str, data: &[u32], max_gid: u32) -> Result<(), MapError> {
    for &raw_gid in data {
        let gid = raw_gid & GID_MASK;
        if gid != 0 && gid > max_gid {
            return Err(MapError::InvalidTileGid {
                layer: layer.to_owned(),
                gid,
                max_gid,
            });
        }
    }
    Ok(())
}

fn parse_json<T: for<'de> Deserialize<'de>>(txt: &str, loc: &Location) -> Result<T, MapError> {
    serde_json::from_str(txt).map_err(|source| MapError::Json {
        path: loc.path_for_errors(),
        source,
    })
}

/// Decode a map document already in memory. `origin` is where it came
/// from; external tilesets and images are resolved relative to it.
pub fn decode_map_str(txt: &str, origin: &Location) -> Result<IrMap, MapError> {
    let j: JsonMap = parse_json(txt, origin)?;

    // Build IR tilesets
    let mut ir_tilesets = Vec::with_capacity(j.tilesets.len());
    for entry in j.tilesets {
        let ts = match entry.source {
            Some(source) => {
                if !source.ends_with(".json") {
                    return Err(MapError::InvalidMap(format!(
                        "External tileset must be JSON: {source}"
                    )));
                }
                let ts_loc = origin.parent().join(&source);
                let ext_txt = fetch_text(&ts_loc)?;
                let ext: JsonTileset = parse_json(&ext_txt, &ts_loc)?;
                tileset_to_ir(entry.firstgid, ext, &ts_loc)?
            }
            None => tileset_to_ir(entry.firstgid, entry.inline, origin)?,
        };
        ir_tilesets.push(ts);
    }

    // Sort by first_gid so resolution is a function of the ordering only
    ir_tilesets.sort_by_key(|t| t.first_gid);

    let max_gid = ir_tilesets.iter().map(IrTileset::last_gid).max().unwrap_or(0);

    // Build IR layers
    let mut ir_layers = Vec::with_capacity(j.layers.len());
    for l in j.layers {
        let layer_name = l.name.clone();
        let properties = properties_from_json(l.properties)?;
        let layer_kind = match l.kind.as_deref().unwrap_or("tilelayer") {
            "tilelayer" if !l.chunks.is_empty() => {
                let mut chunks = Vec::with_capacity(l.chunks.len());
                for c in l.chunks {
                    if c.data.len() != c.width * c.height {
                        return Err(MapError::InvalidLayerSize(layer_name));
                    }
                    check_gids(&layer_name, &c.data, max_gid)?;
                    chunks.push(IrChunk {
                        x: c.x,
                        y: c.y,
                        width: c.width,
                        height: c.height,
                        data: c.data,
                    });
                }
                IrLayerKind::Tiles(TileStorage::Chunked { chunks })
            }
            "tilelayer" => {
                // height may be left out; the row stride is `width`
                let height = match (l.width, l.height) {
                    (w, 0) if w > 0 && l.data.len() % w == 0 => l.data.len() / w,
                    (_, h) => h,
                };
                if l.data.len() != l.width * height {
                    return Err(MapError::InvalidLayerSize(layer_name));
                }
                check_gids(&layer_name, &l.data, max_gid)?;
                IrLayerKind::Tiles(TileStorage::Flat {
                    width: l.width,
                    height,
                    data: l.data,
                })
            }
            "objectgroup" => IrLayerKind::Objects {
                objects: l
                    .objects
                    .into_iter()
                    .map(|obj| {
                        if let Some(raw_gid) = obj.gid {
                            let gid = raw_gid & GID_MASK;
                            if gid == 0 || gid > max_gid {
                                return Err(MapError::InvalidObjectGid {
                                    layer: layer_name.clone(),
                                    object_id: obj.id,
                                    gid,
                                    max_gid,
                                });
                            }
                        }
                        object_to_ir(obj)
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            },
            other => {
                log::debug!("Skipping layer '{}' of unsupported type '{}'", layer_name, other);
                IrLayerKind::Unsupported
            }
        };
        ir_layers.push(IrLayer {
            name: l.name,
            visible: l.visible,
            opacity: l.opacity,
            offset: vec2(l.offsetx, l.offsety),
            properties,
            kind: layer_kind,
        });
    }

    Ok(IrMap {
        tile_w: j.tilewidth,
        tile_h: j.tileheight,
        infinite: j.infinite,
        properties: properties_from_json(j.properties)?,
        tilesets: ir_tilesets,
        layers: ir_layers,
    })
}

/// Fetch and decode a map document from a path or URL.
pub fn decode_map_to_ir(source: &str) -> Result<(IrMap, Location), MapError> {
    let loc = Location::parse(source);
    if loc.extension().as_deref() != Some("json") {
        return Err(MapError::InvalidMap(format!(
            "Map file must be a JSON file: {source}"
        )));
    }

    let txt = fetch_text(&loc)?;
    let ir = decode_map_str(&txt, &loc)?;
    log::info!(
        "Decoded map {} ({} layers, {} tilesets, infinite={})",
        loc,
        ir.layers.len(),
        ir.tilesets.len(),
        ir.infinite
    );
    Ok((ir, loc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock went backwards")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("mq_tiled_collision_{nanos}"));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    fn origin() -> Location {
        Location::parse("maps/test.json")
    }

    #[test]
    fn parses_properties_for_map_layer_object_and_tile() {
        let map_json = r#"{
          "tilewidth": 16,
          "tileheight": 16,
          "properties": [
            {"name":"indoors","type":"bool","value":false},
            {"name":"walk_speed","type":"float","value":1.5},
            {"name":"music","type":"string","value":"town_day"}
          ],
          "layers": [
            {
              "type":"tilelayer",
              "name":"Walls",
              "width":2,
              "height":2,
              "data":[1,0,0,0],
              "properties":[
                {"name":"collides","type":"bool","value":true},
                {"name":"z_order","type":"int","value":2}
              ]
            },
            {
              "type":"objectgroup",
              "name":"npcs",
              "objects":[
                {
                  "id": 12,
                  "name":"elder",
                  "type":"npc",
                  "properties":[{"name":"dialogue","type":"string","value":"hello"}]
                }
              ]
            }
          ],
          "tilesets":[{
            "firstgid":1, "image":"tiles.png", "tilewidth":16, "tileheight":16,
            "tilecount":4, "columns":2,
            "properties":[{"name":"biome","type":"string","value":"forest"}],
            "tiles":[{"id":0,"properties":[{"name":"damage","type":"int","value":10}]}]
          }]
        }"#;

        let ir = decode_map_str(map_json, &origin()).expect("decode");

        assert_eq!(ir.properties.get_bool("indoors"), Some(false));
        assert_eq!(ir.properties.get_f32("walk_speed"), Some(1.5));
        assert_eq!(ir.properties.get_string("music"), Some("town_day"));
        assert_eq!(ir.layers[0].properties.get_bool("collides"), Some(true));
        assert_eq!(ir.layers[0].properties.get_i32("z_order"), Some(2));

        let objects = ir.layers[1].objects().expect("object layer");
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].properties.get_string("dialogue"), Some("hello"));
        assert_eq!(objects[0].class_name, "npc");

        let ts = &ir.tilesets[0];
        assert_eq!(ts.properties.get_string("biome"), Some("forest"));
        assert_eq!(ts.tiles[0].properties.get_i32("damage"), Some(10));
        assert_eq!(ts.image, PathBuf::from("maps").join("tiles.png").display().to_string());
    }

    #[test]
    fn decodes_chunked_layers_and_animations() {
        let map_json = r#"{
          "tilewidth": 16, "tileheight": 16, "infinite": true,
          "layers": [{
            "type":"tilelayer", "name":"Walls",
            "chunks":[
              {"x":0,"y":0,"width":2,"height":1,"data":[1,0]},
              {"x":-2,"y":0,"width":2,"height":1,"data":[0,2]}
            ]
          }],
          "tilesets":[{
            "firstgid":1, "image":"tiles.png", "tilewidth":16, "tileheight":16,
            "tilecount":4, "columns":2,
            "tiles":[{"id":1,"animation":[{"tileid":1,"duration":200},{"tileid":2,"duration":300}]}]
          }]
        }"#;

        let ir = decode_map_str(map_json, &origin()).expect("decode");
        assert!(ir.infinite);
        match ir.layers[0].tiles() {
            Some(TileStorage::Chunked { chunks }) => {
                assert_eq!(chunks.len(), 2);
                assert_eq!(chunks[1].x, -2);
            }
            _ => panic!("expected chunked storage"),
        }
        let anim = &ir.tilesets[0].tiles[0].animation;
        assert_eq!(anim.len(), 2);
        assert_eq!(anim[1].duration_ms, 300);
    }

    #[test]
    fn loads_external_tileset_relative_to_map() {
        let dir = temp_dir();
        let map_path = dir.join("map.json");
        fs::write(
            dir.join("tileset.json"),
            r#"{"tilewidth":16,"tileheight":16,"tilecount":4,"columns":2,"image":"tiles.png"}"#,
        )
        .expect("write tileset");
        fs::write(
            &map_path,
            r#"{"tilewidth":16,"tileheight":16,"layers":[],
                "tilesets":[{"firstgid":5,"source":"tileset.json"}]}"#,
        )
        .expect("write map");

        let (ir, _) = decode_map_to_ir(map_path.to_str().expect("path utf8")).expect("decode");
        assert_eq!(ir.tilesets[0].first_gid, 5);
        assert_eq!(ir.tilesets[0].last_gid(), 8);
        assert_eq!(ir.tilesets[0].image, dir.join("tiles.png").display().to_string());
    }

    #[test]
    fn derives_columns_and_count_from_image_size() {
        let map_json = r#"{
          "tilewidth": 16, "tileheight": 16, "layers": [],
          "tilesets":[{"firstgid":1,"image":"t.png","tilewidth":16,"tileheight":16,
                       "imagewidth":64,"imageheight":32}]
        }"#;
        let ir = decode_map_str(map_json, &origin()).expect("decode");
        assert_eq!(ir.tilesets[0].columns, 4);
        assert_eq!(ir.tilesets[0].tilecount, 8);
    }

    #[test]
    fn keeps_large_int_property_values() {
        let map_json = r#"{
          "tilewidth": 16, "tileheight": 16,
          "properties": [{"name":"big_id","type":"object","value":5000000000}],
          "layers": []
        }"#;
        let ir = decode_map_str(map_json, &origin()).expect("decode");
        assert_eq!(ir.properties.get_i64("big_id"), Some(5_000_000_000));
        assert_eq!(ir.properties.get_i32("big_id"), None);
    }

    #[test]
    fn returns_typed_error_for_malformed_json() {
        let err = decode_map_str("{ not json", &origin()).err().expect("expected decode error");
        assert!(matches!(err, MapError::Json { .. }));
    }

    #[test]
    fn returns_typed_error_for_missing_tileset_file() {
        let dir = temp_dir();
        let map_path = dir.join("map.json");
        fs::write(
            &map_path,
            r#"{"tilewidth":16,"tileheight":16,"layers":[],
                "tilesets":[{"firstgid":1,"source":"missing_tileset.json"}]}"#,
        )
        .expect("failed to write map");

        let err = decode_map_to_ir(map_path.to_str().expect("path utf8"))
            .err()
            .expect("expected decode error");
        assert!(matches!(err, MapError::Io { .. }));
    }

    #[test]
    fn returns_typed_error_for_invalid_gid_reference() {
        let map_json = r#"{
          "tilewidth": 16, "tileheight": 16,
          "layers": [{"type":"tilelayer","name":"ground","width":1,"height":1,"data":[99]}],
          "tilesets":[{"firstgid":1,"image":"t.png","tilewidth":16,"tileheight":16,"tilecount":1,"columns":1}]
        }"#;
        let err = decode_map_str(map_json, &origin()).err().expect("expected decode error");
        assert!(matches!(err, MapError::InvalidTileGid { gid: 99, max_gid: 1, .. }));
    }

    #[test]
    fn returns_typed_error_for_layer_size_mismatch() {
        let map_json = r#"{
          "tilewidth": 8, "tileheight": 8,
          "layers": [{"type":"tilelayer","name":"oops","width":2,"height":2,"data":[0,0,0]}]
        }"#;
        let err = decode_map_str(map_json, &origin()).err().expect("expected decode error");
        assert!(matches!(err, MapError::InvalidLayerSize(name) if name == "oops"));
    }

    #[test]
    fn flat_layer_height_follows_from_width() {
        let json = r#"{"tilewidth":16,"tileheight":16,"layers":[
            {"type":"tilelayer","name":"Walls","width":2,"data":[1,0,0,1]}
        ],"tilesets":[{"firstgid":1,"image":"t.png","tilewidth":16,"tileheight":16,"tilecount":4,"columns":2}]}"#;
        let ir = decode_map_str(json, &origin()).expect("decode");
        match ir.layers[0].tiles() {
            Some(TileStorage::Flat { width, height, .. }) => assert_eq!((*width, *height), (2, 2)),
            other => panic!("expected flat storage, got {other:?}"),
        }

        let ragged = json.replace("[1,0,0,1]", "[1,0,0]");
        let err = decode_map_str(&ragged, &origin()).unwrap_err();
        assert!(matches!(err, MapError::InvalidLayerSize(name) if name == "Walls"));
    }

    #[test]
    fn returns_typed_error_for_unknown_property_type() {
        let map_json = r#"{
          "tilewidth": 16, "tileheight": 16,
          "properties": [{"name":"mystery","type":"not_supported","value":"x"}],
          "layers": []
        }"#;
        let err = decode_map_str(map_json, &origin()).err().expect("expected decode error");
        assert!(matches!(err, MapError::UnsupportedPropertyType { .. }));
    }

    #[test]
    fn rejects_non_json_map_source() {
        let err = decode_map_to_ir("foo.tmx").err().expect("expected error");
        assert!(matches!(err, MapError::InvalidMap(_)));
    }
}
