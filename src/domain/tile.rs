/// Tile ids and the collidability rule table.
///
/// Tile ids are opaque integers (Tiled gids in JSON maps).
/// Whether a tile blocks movement is NOT stored in level data: it is derived
/// from `TileRules` and cached per cell by the grid, so the rule lives here
/// and only here.
///
/// ## Rule table
///
///   1. Default: id inside `collidable_range` → solid, outside → walkable.
///   2. Overrides: ordered `(id, collidable)` pairs. The LAST matching
///      override wins, regardless of range membership.
///
/// Default table (the shipped game):
///   range 0..=200 solid, overrides 92/94 (decor), 140 (goal), 152 (spawn)
///   forced walkable.

use std::ops::RangeInclusive;

use crate::config::TileConfig;

pub type TileId = u32;

/// One grid slot that holds a tile. Empty slots are `None` at the grid level.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TileCell {
    pub type_id: TileId,
    pub collidable: bool,
}

/// An explicit per-id override of the range rule.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TileOverride {
    pub id: TileId,
    pub collidable: bool,
}

#[derive(Clone, Debug)]
pub struct TileRules {
    pub collidable_range: RangeInclusive<TileId>,
    pub overrides: Vec<TileOverride>,
    /// Marker tile whose cell sets the player's spawn position.
    pub spawn: TileId,
    /// Tile that ends the level when the player stands in it.
    pub goal: TileId,
}

impl TileRules {
    pub fn from_config(cfg: &TileConfig) -> Self {
        TileRules {
            collidable_range: cfg.collidable_min..=cfg.collidable_max,
            overrides: cfg.walkable.iter()
                .map(|&id| TileOverride { id, collidable: false })
                .collect(),
            spawn: cfg.spawn,
            goal: cfg.goal,
        }
    }

    /// Is a tile of this type solid? Pure function of the table.
    pub fn collidable(&self, id: TileId) -> bool {
        self.overrides.iter()
            .rev()
            .find(|o| o.id == id)
            .map(|o| o.collidable)
            .unwrap_or_else(|| self.collidable_range.contains(&id))
    }

    /// Build a cell for `id` with its collidable flag resolved.
    #[inline]
    pub fn cell(&self, id: TileId) -> TileCell {
        TileCell { type_id: id, collidable: self.collidable(id) }
    }
}

impl Default for TileRules {
    fn default() -> Self {
        TileRules::from_config(&TileConfig::default())
    }
}

// ── Text-map legend ──

/// Character ↔ tile id mapping shared by the text level format and the renderer.
/// ' ' and '.' are "no tile".
pub const LEGEND: &[(char, TileId)] = &[
    ('#', 1),   // ground
    ('=', 2),   // stone
    ('%', 3),   // brick
    ('o', 5),   // crate
    ('"', 92),  // grass (walkable)
    ('*', 94),  // flower (walkable)
    ('[', 104), // console left
    ('|', 105), // console middle
    (']', 106), // console right
    ('G', 140), // exit
    ('S', 152), // start pad
];

pub fn id_for_char(ch: char) -> Option<TileId> {
    LEGEND.iter().find(|(c, _)| *c == ch).map(|&(_, id)| id)
}

pub fn char_for_id(id: TileId) -> Option<char> {
    LEGEND.iter().find(|(_, i)| *i == id).map(|&(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipped() -> TileRules {
        TileRules::default()
    }

    #[test]
    fn range_members_are_solid() {
        let r = shipped();
        assert!(r.collidable(0));
        assert!(r.collidable(1));
        assert!(r.collidable(105));
        assert!(r.collidable(200));
    }

    #[test]
    fn outside_range_is_walkable() {
        let r = shipped();
        assert!(!r.collidable(201));
        assert!(!r.collidable(1000));
    }

    #[test]
    fn exceptions_beat_range() {
        let r = shipped();
        for id in [92, 94, 140, 152] {
            assert!(r.collidable_range.contains(&id));
            assert!(!r.collidable(id), "id {id} must be walkable");
        }
    }

    #[test]
    fn last_override_wins() {
        let mut r = shipped();
        r.overrides.push(TileOverride { id: 92, collidable: true });
        r.overrides.push(TileOverride { id: 300, collidable: true });
        assert!(r.collidable(92));
        assert!(r.collidable(300));
        assert!(!r.collidable(94));
    }

    #[test]
    fn answer_independent_of_query_order() {
        let r = shipped();
        let forward: Vec<bool> = (0..=210).map(|id| r.collidable(id)).collect();
        let backward: Vec<bool> = (0..=210).rev().map(|id| r.collidable(id)).collect();
        let backward: Vec<bool> = backward.into_iter().rev().collect();
        assert_eq!(forward, backward);
    }

    #[test]
    fn legend_round_trips_every_char() {
        for &(ch, id) in LEGEND {
            assert_eq!(id_for_char(ch), Some(id));
            assert_eq!(char_for_id(id), Some(ch));
        }
        assert_eq!(id_for_char(' '), None);
    }
}
