//! `bdi-planning` — turning one intention into an ordered action sequence.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                       |
//! |-------------|----------------------------------------------------------------|
//! | [`action`]  | `Action` (`Move`, `PickUp`, `PutDown`, `Wait`)                  |
//! | [`plan`]    | `Plan` — ordered actions, walked-tile replay                   |
//! | [`planner`] | `Planner` trait                                                |
//! | [`local`]   | `LocalPlanner<R>` — shortest paths over the belief graph       |
//! | [`solver`]  | `SolverPlanner<C>`, `SolverClient`, `HttpSolver`, PDDL encoding |
//! | [`error`]   | `PlanningError`, `PlanningResult<T>`                           |
//!
//! # Planning contract
//!
//! A planner either returns a complete plan or an error; it never returns a
//! partially valid plan.  Both planners avoid tiles occupied by other agents
//! and tiles reserved by the peer.  The caller picks which planner serves
//! which intention kind.

pub mod action;
pub mod error;
pub mod local;
pub mod plan;
pub mod planner;
pub mod solver;


pub use action::Action;
pub use error::{PlanningError, PlanningResult};
pub use local::LocalPlanner;
pub use plan::Plan;
pub use planner::Planner;
pub use solver::{HttpSolver, Problem, SolverClient, SolverOutcome, SolverPlanner, DEFAULT_SOLVER_URL, DOMAIN};
