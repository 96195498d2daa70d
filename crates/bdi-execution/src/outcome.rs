//! Per-action outcomes reported to the execution hooks.

use std::fmt;

use bdi_core::{Direction, ParcelId};
use bdi_graph::ParcelReport;

#[derive(Debug, Clone, PartialEq)]
pub enum ActionSuccess {
    Moved(Direction),
    PickedUp(Vec<ParcelReport>),
    PutDown(Vec<ParcelReport>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionFailure {
    MoveFailed(Direction),
    PickUpFailed(Vec<ParcelId>),
    PutDownFailed(Vec<ParcelId>),
}

fn join_ids<'a>(f: &mut fmt::Formatter<'_>, ids: impl Iterator<Item = &'a ParcelId>) -> fmt::Result {
    for (i, id) in ids.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{id}")?;
    }
    Ok(())
}

impl fmt::Display for ActionSuccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionSuccess::Moved(d) => write!(f, "Moved {d}"),
            ActionSuccess::PickedUp(ps) => {
                f.write_str("PickUpSuccess: ")?;
                join_ids(f, ps.iter().map(|p| &p.id))
            }
            ActionSuccess::PutDown(ps) => {
                f.write_str("PutDownSuccess: ")?;
                join_ids(f, ps.iter().map(|p| &p.id))
            }
        }
    }
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionFailure::MoveFailed(d) => write!(f, "MoveFailed {d}"),
            ActionFailure::PickUpFailed(ids) => {
                f.write_str("PickUpFailure: ")?;
                join_ids(f, ids.iter())
            }
            ActionFailure::PutDownFailed(ids) => {
                f.write_str("PutDownFailure: ")?;
                join_ids(f, ids.iter())
            }
        }
    }
}
