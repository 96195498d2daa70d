//! Grid positions, movement directions, and in-transit resolution.
//!
//! The world is a 2-D grid of integer tiles with `y` growing upwards.  The
//! server reports entities that are mid-step with a fractional coordinate on
//! the axis of travel: a tenths digit of `6` means the entity left the lower
//! tile and is heading to the higher one, `4` means the opposite.  Any other
//! value is treated as stationary.

use std::fmt;
use std::str::FromStr;

use crate::{CoreError, CoreResult};

// ── Position ──────────────────────────────────────────────────────────────────

/// Integer coordinates of a tile.  Equality is exact-coordinate match.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "(i32, i32)", into = "(i32, i32)"))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring position one step in `direction`.
    #[inline]
    pub fn step(self, direction: Direction) -> Position {
        let (dx, dy) = direction.offset();
        Position::new(self.x + dx, self.y + dy)
    }

    /// The direction leading from `self` to the unit-adjacent `other`, or
    /// `None` if the two positions are not neighbours.
    pub fn direction_to(self, other: Position) -> Option<Direction> {
        Direction::ALL.into_iter().find(|&d| self.step(d) == other)
    }

    /// `true` if `self` is directly above `other`.
    #[inline]
    pub fn is_above_of(self, other: Position) -> bool {
        self.x == other.x && self.y == other.y + 1
    }

    #[inline]
    pub fn is_below_of(self, other: Position) -> bool {
        self.x == other.x && self.y == other.y - 1
    }

    #[inline]
    pub fn is_left_of(self, other: Position) -> bool {
        self.x == other.x - 1 && self.y == other.y
    }

    #[inline]
    pub fn is_right_of(self, other: Position) -> bool {
        self.x == other.x + 1 && self.y == other.y
    }

    /// Manhattan distance in tiles.
    #[inline]
    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Position::new(x, y)
    }
}

impl From<Position> for (i32, i32) {
    fn from(p: Position) -> Self {
        (p.x, p.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ── Direction ─────────────────────────────────────────────────────────────────

/// One of the four grid moves.  Also labels every edge of the belief graph.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// `(dx, dy)` applied by a move in this direction.
    #[inline]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up    => (0, 1),
            Direction::Down  => (0, -1),
            Direction::Left  => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// The move that undoes this one.
    #[inline]
    pub fn inverse(self) -> Direction {
        match self {
            Direction::Up    => Direction::Down,
            Direction::Down  => Direction::Up,
            Direction::Left  => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up    => "up",
            Direction::Down  => "down",
            Direction::Left  => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "up"    => Ok(Direction::Up),
            "down"  => Ok(Direction::Down),
            "left"  => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _       => Err(CoreError::UnknownDirection(s.to_owned())),
        }
    }
}

// ── PerceptPosition ───────────────────────────────────────────────────────────

/// A possibly fractional position as reported by a percept.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "(f64, f64)", into = "(f64, f64)"))]
pub struct PerceptPosition {
    pub x: f64,
    pub y: f64,
}

/// Axis motion encoded by the tenths digit of one coordinate.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Transit {
    /// Leaving the lower tile, heading to the higher one.
    Ascending,
    /// Leaving the higher tile, heading to the lower one.
    Descending,
    Still,
}

fn transit(v: f64) -> Transit {
    match ((v * 10.0).round() as i64).rem_euclid(10) {
        6 => Transit::Ascending,
        4 => Transit::Descending,
        _ => Transit::Still,
    }
}

fn to_coord(v: f64) -> CoreResult<i32> {
    if !v.is_finite() || v < i32::MIN as f64 || v > i32::MAX as f64 {
        return Err(CoreError::CoordinateOutOfRange(v));
    }
    Ok(v as i32)
}

impl PerceptPosition {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Resolve into `(source, destination)` tiles.
    ///
    /// The source is where the entity logically still is; the destination is
    /// where it is heading (or already stands, when stationary).  The `x`
    /// axis is inspected first, as the server only moves along one axis at
    /// a time.
    pub fn resolve(self) -> CoreResult<(Position, Position)> {
        let (x, y) = (self.x, self.y);
        let still = || -> CoreResult<Position> {
            Ok(Position::new(to_coord(x.round())?, to_coord(y.round())?))
        };

        match (transit(x), transit(y)) {
            (Transit::Ascending, _) => {
                let y = to_coord(y.round())?;
                Ok((Position::new(to_coord(x.floor())?, y), Position::new(to_coord(x.ceil())?, y)))
            }
            (Transit::Descending, _) => {
                let y = to_coord(y.round())?;
                Ok((Position::new(to_coord(x.ceil())?, y), Position::new(to_coord(x.floor())?, y)))
            }
            (Transit::Still, Transit::Ascending) => {
                let x = to_coord(x.round())?;
                Ok((Position::new(x, to_coord(y.floor())?), Position::new(x, to_coord(y.ceil())?)))
            }
            (Transit::Still, Transit::Descending) => {
                let x = to_coord(x.round())?;
                Ok((Position::new(x, to_coord(y.ceil())?), Position::new(x, to_coord(y.floor())?)))
            }
            (Transit::Still, Transit::Still) => {
                let p = still()?;
                Ok((p, p))
            }
        }
    }

    /// Where the entity logically still is.
    pub fn source(self) -> CoreResult<Position> {
        self.resolve().map(|(source, _)| source)
    }

    /// Where the entity is heading, or stands.
    pub fn destination(self) -> CoreResult<Position> {
        self.resolve().map(|(_, destination)| destination)
    }
}

impl From<Position> for PerceptPosition {
    fn from(p: Position) -> Self {
        PerceptPosition::new(p.x as f64, p.y as f64)
    }
}

impl From<(f64, f64)> for PerceptPosition {
    fn from((x, y): (f64, f64)) -> Self {
        PerceptPosition::new(x, y)
    }
}

impl From<PerceptPosition> for (f64, f64) {
    fn from(p: PerceptPosition) -> Self {
        (p.x, p.y)
    }
}
