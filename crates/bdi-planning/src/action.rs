//! Primitive actions dispatched to the world.

use std::fmt;

use bdi_core::{Direction, ParcelId};

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Step one tile in a direction.
    Move(Direction),
    /// Pick up whatever is on the current tile; succeeds only if the named
    /// parcel is among the ones picked up.
    PickUp(ParcelId),
    /// Put down the named parcel on the current tile.
    PutDown(ParcelId),
    /// Sleep for the given number of milliseconds.  Never fails.
    Wait(u64),
}

impl Action {
    pub fn as_move(&self) -> Option<Direction> {
        match self {
            Action::Move(d) => Some(*d),
            _               => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move(Direction::Up)    => f.write_str("GoUp"),
            Action::Move(Direction::Down)  => f.write_str("GoDown"),
            Action::Move(Direction::Left)  => f.write_str("GoLeft"),
            Action::Move(Direction::Right) => f.write_str("GoRight"),
            Action::PickUp(id)             => write!(f, "PickUp {id}"),
            Action::PutDown(id)            => write!(f, "PutDown {id}"),
            Action::Wait(ms)               => write!(f, "Wait {ms} ms"),
        }
    }
}
