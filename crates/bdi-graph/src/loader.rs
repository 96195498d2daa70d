//! CSV tile-map loader.
//!
//! # CSV format
//!
//! One row per walkable tile.  Positions absent from the file are walls.
//!
//! ```csv
//! x,y,kind
//! 0,0,spawn
//! 1,0,spawn
//! 2,0,delivery
//! ```
//!
//! **`kind`** field:
//!
//! | Value      | Meaning                 |
//! |------------|-------------------------|
//! | `spawn`    | `TileKind::Spawn`       |
//! | `walkable` | alias for `spawn`       |
//! | `delivery` | `TileKind::Delivery`    |

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use bdi_core::Position;

use crate::tiles::{TileKind, TileMap, TileMapBuilder};
use crate::GraphError;

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TileRecord {
    x:    i32,
    y:    i32,
    kind: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a [`TileMap`] from a CSV file.
pub fn load_tiles_csv(path: &Path) -> Result<TileMap, GraphError> {
    let file = std::fs::File::open(path).map_err(GraphError::Io)?;
    load_tiles_reader(file)
}

/// Like [`load_tiles_csv`] but accepts any `Read` source.
///
/// Useful for testing (pass a `std::io::Cursor` or a byte slice).
pub fn load_tiles_reader<R: Read>(reader: R) -> Result<TileMap, GraphError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut builder = TileMapBuilder::new();

    for result in csv_reader.deserialize::<TileRecord>() {
        let row = result?;
        let kind: TileKind = row.kind.parse()?;
        builder.add_tile(Position::new(row.x, row.y), kind);
    }

    Ok(builder.build())
}
