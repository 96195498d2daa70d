//! Ordered action sequences.

use std::fmt;

use bdi_core::Position;

use crate::Action;

/// Actions to run front to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> + '_ {
        self.actions.iter()
    }

    /// Replay the moves from `start` and return every tile stood on,
    /// `start` first, each tile listed once in order of first visit.
    pub fn walked_tiles(&self, start: Position) -> Vec<Position> {
        let mut tiles = vec![start];
        let mut at = start;
        for d in self.actions.iter().filter_map(Action::as_move) {
            at = at.step(d);
            if !tiles.contains(&at) {
                tiles.push(at);
            }
        }
        tiles
    }

    /// Where the agent stands after every move has succeeded.
    pub fn final_position(&self, start: Position) -> Position {
        self.actions
            .iter()
            .filter_map(Action::as_move)
            .fold(start, Position::step)
    }
}

impl From<Vec<Action>> for Plan {
    fn from(actions: Vec<Action>) -> Self {
        Self::new(actions)
    }
}

impl IntoIterator for Plan {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, a) in self.actions.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{a}")?;
        }
        Ok(())
    }
}
