//! `bdi-execution` — running a plan against the world.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                    |
//! |----------------|-------------------------------------------------------------|
//! | [`world`]      | `World` trait — move / pickup / putdown                     |
//! | [`outcome`]    | `ActionSuccess`, `ActionFailure`                            |
//! | [`control`]    | `ExecutionControl` — the action deque and stop/outcome flags |
//! | [`executor`]   | `PlanExecutor`, `ExecutionHooks`, `CommitmentHooks`         |
//! | [`commitment`] | `Commitment` trait, `BacktrackCommitment`, `MaxConsecutiveFailures` |
//!
//! # Execution model
//!
//! The executor pops one action at a time from the front of a deque and
//! awaits the world's answer before touching the deque again.  A failed
//! world action halts the loop *before* the failure hook runs, so the hook
//! alone decides whether to resume, what to splice in front, or to stop for
//! good.  Between steps the executor yields to
//! [`ExecutionHooks::between_steps`], which is where the caller folds in
//! percepts and may preempt the run.

pub mod commitment;
pub mod control;
pub mod executor;
pub mod outcome;
pub mod world;


pub use commitment::{BacktrackCommitment, Commitment, MaxConsecutiveFailures};
pub use control::ExecutionControl;
pub use executor::{CommitmentHooks, ExecutionHooks, PlanExecutor};
pub use outcome::{ActionFailure, ActionSuccess};
pub use world::World;
