/// Events emitted during a simulation step.
/// The presentation layer consumes these for messages/sound.

use crate::domain::grid::Cell;
use crate::domain::tile::TileId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Jumped,
    Landed,
    Selected { cell: Cell, type_id: TileId },
    Copied { type_id: TileId },
    PasteArmed,
    Pasted { cell: Cell, type_id: TileId },
    PasteRejected,
    /// Budget just reached zero.
    OutOfBudget,
    /// A pattern trigger placed the goal tile.
    ExitRevealed { cell: Cell },
    LevelComplete { level: usize },
    GameWon,
    Restarted,
}
