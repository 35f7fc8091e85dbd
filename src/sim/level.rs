/// Level pack loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory, `.txt` text maps (sorted by file name)
///   2. `levels/` directory, Tiled `.json` maps
///   3. Built-in embedded levels
///
/// ## Text format (`.txt`):
///   Line 1: `# Level Name`
///   Optional: `@reveal c,r c,r c,r = id,id,id -> c,r` (pattern trigger)
///   Lines: map rows, right-padded with "no tile"
///
/// ## Tile legend:
///   '#' = 1 ground      '=' = 2 stone      '%' = 3 brick
///   'o' = 5 crate       '"' = 92 grass     '*' = 94 flower
///   '[' '|' ']' = 104 105 106 console      'G' = 140 exit
///   'S' = 152 start     ' ' '.' = no tile
///
/// ## Tiled format (`.json`):
///   Tile layer `fg` (or the first tile layer); `data` holds gids, 0 = no
///   tile. Map property `reveal` carries triggers, `;`-separated.
///
/// Level numbers are 1-based everywhere outside this module.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::grid::TileGrid;
use crate::domain::tile::{id_for_char, TileId, TileRules};
use crate::error::LevelError;
use crate::sim::win::PatternTrigger;

/// Authored level data (never mutated at runtime).
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub width: usize,
    pub height: usize,
    /// Row-major, `width * height` long.
    pub cells: Vec<Option<TileId>>,
    pub triggers: Vec<PatternTrigger>,
}

impl LevelDef {
    /// Build a fresh collision grid for this level.
    pub fn grid(&self, tile_size: f32, rules: &TileRules) -> TileGrid {
        TileGrid::from_ids(self.width, self.height, tile_size, &self.cells, rules)
    }

    /// Build from legend rows. Unknown characters are an error.
    pub fn from_rows<S: AsRef<str>>(name: &str, rows: &[S]) -> Result<Self, LevelError> {
        let height = rows.len();
        let width = rows.iter().map(|r| r.as_ref().chars().count()).max().unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(LevelError::MalformedMap {
                name: name.to_string(),
                reason: "no map rows".into(),
            });
        }

        let mut cells = vec![None; width * height];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.as_ref().chars().enumerate() {
                cells[y * width + x] = match ch {
                    ' ' | '.' => None,
                    _ => Some(id_for_char(ch).ok_or_else(|| LevelError::MalformedMap {
                        name: name.to_string(),
                        reason: format!("unknown tile '{ch}' at {x},{y}"),
                    })?),
                };
            }
        }

        Ok(LevelDef { name: name.to_string(), width, height, cells, triggers: vec![] })
    }
}

/// Where the active pack came from (shown in the HUD).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackSource {
    Directory(PathBuf),
    Embedded,
}

#[derive(Clone, Debug)]
pub struct LevelPack {
    levels: Vec<LevelDef>,
    source: PackSource,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

impl LevelPack {
    /// Load from `levels_dir` if it holds any usable level, else the embedded pack.
    pub fn load(levels_dir: &Path) -> Self {
        if levels_dir.is_dir() {
            let levels = load_from_directory(levels_dir);
            if !levels.is_empty() {
                info!(dir = %levels_dir.display(), count = levels.len(), "level_pack_loaded");
                return LevelPack { levels, source: PackSource::Directory(levels_dir.to_path_buf()) };
            }
            warn!(dir = %levels_dir.display(), "no usable levels in directory, using built-in pack");
        }
        Self::embedded()
    }

    pub fn embedded() -> Self {
        let levels = EMBEDDED.iter()
            .filter_map(|(name, rows, triggers)| match build_embedded(name, rows, triggers) {
                Ok(def) => Some(def),
                Err(e) => {
                    warn!(error = %e, "built-in level rejected");
                    None
                }
            })
            .collect();
        Self::from_levels(levels)
    }

    /// Wrap already-built levels (treated as the built-in pack).
    pub fn from_levels(levels: Vec<LevelDef>) -> Self {
        LevelPack { levels, source: PackSource::Embedded }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn source(&self) -> &PackSource {
        &self.source
    }

    /// 1-based lookup.
    pub fn get(&self, level: usize) -> Result<&LevelDef, LevelError> {
        level.checked_sub(1)
            .and_then(|i| self.levels.get(i))
            .ok_or(LevelError::UnknownLevel { level, count: self.levels.len() })
    }
}

// ══════════════════════════════════════════════════════════════
// Text map parsing
// ══════════════════════════════════════════════════════════════

fn parse_level_text(content: &str, fallback_name: &str) -> Result<LevelDef, LevelError> {
    let mut name = String::new();
    let mut rows: Vec<&str> = vec![];
    let mut triggers = vec![];

    for line in content.lines() {
        if line.starts_with('#') && name.is_empty() && rows.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else if let Some(rest) = line.strip_prefix("@reveal") {
            triggers.push(PatternTrigger::parse(rest)?);
        } else {
            rows.push(line);
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    if name.is_empty() {
        name = fallback_name.to_string();
    }

    let mut def = LevelDef::from_rows(&name, &rows)?;
    def.triggers = triggers;
    Ok(def)
}

/// Distinguish `# Level Name` from `##########` (map data).
/// A name line contains at least one letter.
fn is_name_line(line: &str) -> bool {
    line[1..].chars().any(|c| c.is_alphabetic())
}

// ══════════════════════════════════════════════════════════════
// Tiled JSON parsing
// ══════════════════════════════════════════════════════════════

/// Tiled stores flip/rotation flags in the top bits of each gid.
const GID_MASK: u32 = 0x1FFF_FFFF;

#[derive(Deserialize)]
struct TiledMap {
    width: usize,
    height: usize,
    #[serde(default)]
    layers: Vec<TiledLayer>,
    #[serde(default)]
    properties: Vec<TiledProperty>,
}

#[derive(Deserialize)]
struct TiledLayer {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<Vec<u32>>,
}

#[derive(Deserialize)]
struct TiledProperty {
    name: String,
    value: serde_json::Value,
}

fn parse_tiled(content: &str, path: &Path, fallback_name: &str) -> Result<LevelDef, LevelError> {
    let map: TiledMap = serde_json::from_str(content)
        .map_err(|source| LevelError::Json { path: path.to_path_buf(), source })?;

    let malformed = |reason: &str| LevelError::MalformedMap {
        name: fallback_name.to_string(),
        reason: reason.to_string(),
    };

    let tile_layers = || map.layers.iter().filter(|l| l.kind == "tilelayer");
    let layer = tile_layers()
        .find(|l| l.name == "fg")
        .or_else(|| tile_layers().next())
        .ok_or_else(|| malformed("no tile layer"))?;
    let data = layer.data.as_ref().ok_or_else(|| malformed("tile layer has no data"))?;
    if data.len() != map.width * map.height {
        return Err(malformed("layer size does not match map size"));
    }

    let cells = data.iter()
        .map(|&gid| match gid & GID_MASK {
            0 => None,
            id => Some(id),
        })
        .collect();

    let mut name = fallback_name.to_string();
    let mut triggers = vec![];
    for prop in &map.properties {
        match (prop.name.as_str(), prop.value.as_str()) {
            ("name", Some(v)) => name = v.to_string(),
            ("reveal", Some(v)) => {
                for text in v.split(';').filter(|t| !t.trim().is_empty()) {
                    triggers.push(PatternTrigger::parse(text)?);
                }
            }
            _ => {}
        }
    }

    Ok(LevelDef { name, width: map.width, height: map.height, cells, triggers })
}

// ══════════════════════════════════════════════════════════════
// Directory loading
// ══════════════════════════════════════════════════════════════

fn read_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    let stem = path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_tiled(&content, path, &stem),
        _ => parse_level_text(&content, &stem),
    }
}

fn files_with_extension(dir: &Path, ext: &str) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries.flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |e| e == ext))
            .collect(),
        Err(_) => vec![],
    };
    paths.sort();
    paths
}

/// `.txt` maps if any parse, otherwise `.json` maps. Bad files are skipped.
fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    for ext in ["txt", "json"] {
        let levels: Vec<LevelDef> = files_with_extension(dir, ext).iter()
            .filter_map(|path| match read_level_file(path) {
                Ok(def) => Some(def),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping level file");
                    None
                }
            })
            .collect();
        if !levels.is_empty() {
            return levels;
        }
    }
    vec![]
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn build_embedded(name: &str, rows: &[&str], triggers: &[&str]) -> Result<LevelDef, LevelError> {
    let mut def = LevelDef::from_rows(name, rows)?;
    def.triggers = triggers.iter()
        .map(|t| PatternTrigger::parse(t))
        .collect::<Result<_, _>>()?;
    Ok(def)
}

type EmbeddedLevel = (&'static str, &'static [&'static str], &'static [&'static str]);

const EMBEDDED: &[EmbeddedLevel] = &[
    ("Copy That", &[
        "=                                      =",
        "=                                      =",
        "=                                      =",
        "=                                      =",
        "=                                      =",
        "=                                      =",
        "=                     ==               =",
        "=                     ==               =",
        "=                     ==               =",
        "=                     ==               =",
        "=  S  \"  o     *      ==      \"   G    =",
        "########################################",
    ], &[]),
    ("Mind the Gap", &[
        "=                                      =",
        "=                                      =",
        "=                                      =",
        "=                                      =",
        "=                                      =",
        "=                                      =",
        "=                                      =",
        "=     %%                               =",
        "=                                      =",
        "=                                      =",
        "=  S    \"                     *    G   =",
        "##############            ##############",
    ], &[]),
    ("Tall Order", &[
        "=                                      =",
        "=                                      =",
        "=                   ===                =",
        "=                   ===                =",
        "=                   ===                =",
        "=                   ===                =",
        "=                   ===                =",
        "=                   ===                =",
        "=                   ===                =",
        "=          o        ===                =",
        "=  S      oo        ===     \"     G    =",
        "########################################",
    ], &[]),
    ("Both Ways", &[
        "=                                      =",
        "=                                      =",
        "=                                      =",
        "=                                      =",
        "=                          %%          =",
        "=                          %%          =",
        "=                          %%          =",
        "=                          %%          =",
        "=                          %%          =",
        "=                          %%          =",
        "=  S  o                    %%    *  G  =",
        "##########          ####################",
    ], &[]),
    ("Out of Control", &[
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                                              =",
        "=          [|]                                                 =",
        "=       %%%%%%%%%                                              =",
        "=                                                              =",
        "=                                                              =",
        "=                                             %%%%%%           =",
        "=                                                              =",
        "=                                    *                         =",
        "=                                 %%%%%%%                      =",
        "=                                                              =",
        "=                       \"                   ==                 =",
        "=                     %%%%%%                ==                 =",
        "=                                           ==                 =",
        "=                                           ==                 =",
        "=  S      \"                                 ==         *       =",
        "############################################################[ ]#",
        "================================================================",
    ], &["60,34 61,34 62,34 = 104,105,106 -> 61,33"]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_pack_has_five_valid_levels() {
        let pack = LevelPack::embedded();
        assert_eq!(pack.len(), 5);
        assert_eq!(pack.source(), &PackSource::Embedded);
        let rules = TileRules::default();
        for level in 1..=5 {
            let def = pack.get(level).unwrap();
            let grid = def.grid(16.0, &rules);
            assert!(grid.find_first(rules.spawn).is_some(), "level {level} needs a spawn");
        }
    }

    #[test]
    fn final_level_carries_console_trigger() {
        let pack = LevelPack::embedded();
        let def = pack.get(5).unwrap();
        assert_eq!((def.width, def.height), (64, 36));
        assert_eq!(def.triggers.len(), 1);
        let t = &def.triggers[0];
        assert_eq!(t.pattern(), &[((60, 34), 104), ((61, 34), 105), ((62, 34), 106)]);
        assert_eq!(t.target(), (61, 33));

        let grid = def.grid(16.0, &TileRules::default());
        assert_eq!(grid.type_at(60, 34), Some(104));
        assert!(grid.is_empty(61, 34));
        assert_eq!(grid.type_at(62, 34), Some(106));
        assert!(grid.is_empty(61, 33));
        assert_eq!(grid.find_first(140), None, "exit only appears via the trigger");
    }

    #[test]
    fn lookup_is_one_based() {
        let pack = LevelPack::embedded();
        assert_eq!(pack.get(1).unwrap().name, "Copy That");
        assert!(matches!(pack.get(0), Err(LevelError::UnknownLevel { level: 0, count: 5 })));
        assert!(matches!(pack.get(6), Err(LevelError::UnknownLevel { level: 6, .. })));
    }

    #[test]
    fn parses_text_map_with_trigger() {
        let text = "# Tiny\n@reveal 1,1 = 105 -> 2,0\n  .\n S|\n###\n\n";
        let def = parse_level_text(text, "fallback").unwrap();
        assert_eq!(def.name, "Tiny");
        assert_eq!((def.width, def.height), (3, 3));
        assert_eq!(def.cells[0], None);
        assert_eq!(def.cells[4], Some(152));
        assert_eq!(def.cells[5], Some(105));
        assert_eq!(def.triggers[0].target(), (2, 0));
    }

    #[test]
    fn hash_row_is_map_data_not_a_name() {
        let def = parse_level_text("###\n S \n###", "anon").unwrap();
        assert_eq!(def.name, "anon");
        assert_eq!(def.height, 3);
    }

    #[test]
    fn unknown_tile_char_is_rejected() {
        let err = parse_level_text("# Bad\n S?\n###", "x").unwrap_err();
        assert!(matches!(err, LevelError::MalformedMap { .. }));
    }

    #[test]
    fn empty_map_is_rejected() {
        assert!(matches!(
            parse_level_text("# Only a name\n", "x"),
            Err(LevelError::MalformedMap { .. }),
        ));
    }

    #[test]
    fn parses_tiled_json() {
        let json = r#"{
        "width": 3, "height": 2,
        "layers": [
                {"name": "bg", "type": "tilelayer", "data": [9,9,9,9,9,9]},
                {"name": "objects", "type": "objectgroup"},
                {"name": "fg", "type": "tilelayer", "data": [0,152,0,1,1,2147483649]}
            ],
        "properties": [
                {"name": "reveal", "type": "string", "value": "0,1 1,1 = 1,1 -> 2,0"},
                {"name": "name", "type": "string", "value": "From Tiled"}
            ]
        }"#;
        let def = parse_tiled(json, Path::new("t.json"), "t").unwrap();
        assert_eq!(def.name, "From Tiled");
        assert_eq!(def.cells, vec![None, Some(152), None, Some(1), Some(1), Some(1)]);
        assert_eq!(def.triggers.len(), 1);
    }

    #[test]
    fn tiled_size_mismatch_is_rejected() {
        let json = r#"{"width": 2, "height": 2, "layers": [{"type": "tilelayer", "data": [1]}]}"#;
        assert!(matches!(
            parse_tiled(json, Path::new("t.json"), "t"),
            Err(LevelError::MalformedMap { .. }),
        ));
        assert!(matches!(
            parse_tiled("{", Path::new("t.json"), "t"),
            Err(LevelError::Json { .. }),
        ));
    }

    #[test]
    fn directory_pack_prefers_text_maps_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for (file, body) in [
            ("02.txt", "# Second\nS\n#"),
            ("01.txt", "# First\nS\n#"),
            ("03.txt", "# Broken\nS?\n#"),
            ("00.json", r#"{"width":1,"height":1,"layers":[{"type":"tilelayer","data":[152]}]}"#),
        ] {
            let mut f = std::fs::File::create(dir.path().join(file)).unwrap();
            f.write_all(body.as_bytes()).unwrap();
        }
        let pack = LevelPack::load(dir.path());
        assert_eq!(pack.len(), 2);
        assert_eq!(pack.get(1).unwrap().name, "First");
        assert_eq!(pack.get(2).unwrap().name, "Second");
        assert_eq!(pack.source(), &PackSource::Directory(dir.path().to_path_buf()));
    }

    #[test]
    fn missing_directory_falls_back_to_embedded() {
        let pack = LevelPack::load(Path::new("/nonexistent/ctrlv/levels"));
        assert_eq!(pack.source(), &PackSource::Embedded);
    }
}
