//! Planner backed by an external PDDL solving service.
//!
//! # Encoding
//!
//! Every walkable tile becomes an object named `x{X}y{Y}`.  The initial
//! state holds `agent-on` for self, `occupied` for every tile another agent
//! stands on or the peer has reserved, and one adjacency fact per directed
//! edge of the belief graph: an `up` edge from `a` to `b` is encoded as
//! `(above-of b a)`, and likewise for the other directions.  The goal is
//! `agent-on` the destination.
//!
//! # Transport
//!
//! The wire call sits behind [`SolverClient`] so the encoding and the plan
//! decoding can be exercised with a stub.  [`HttpSolver`] POSTs
//! `{"domain": .., "problem": ..}` as JSON and reads back
//! `{"status": .., "result": {"plan": [{"name": "(goup x0y0 x0y1)"}, ..]}}`.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use bdi_core::{Direction, Position};
use bdi_deliberation::Intention;
use bdi_graph::BeliefGraph;

use crate::local::{my_tile, tile_at};
use crate::{Action, Plan, Planner, PlanningError, PlanningResult};

pub const DEFAULT_SOLVER_URL: &str = "http://solver.planning.domains/solve";

/// Grid-walking domain: four symmetric moves onto unoccupied neighbours.
pub const DOMAIN: &str = "\
(define (domain deliveroo)
    (:requirements :strips)
    (:predicates
        (agent-on ?x)
        (occupied ?x)
        (right-of ?x ?y)
        (left-of ?x ?y)
        (above-of ?x ?y)
        (below-of ?x ?y)
    )
    (:action goup
        :parameters (?x ?y)
        :precondition (and (agent-on ?x) (or (above-of ?y ?x) (below-of ?x ?y)) (not (occupied ?y)))
        :effect (agent-on ?y)
    )
    (:action godown
        :parameters (?x ?y)
        :precondition (and (agent-on ?x) (or (below-of ?y ?x) (above-of ?x ?y)) (not (occupied ?y)))
        :effect (agent-on ?y)
    )
    (:action goleft
        :parameters (?x ?y)
        :precondition (and (agent-on ?x) (or (left-of ?y ?x) (right-of ?x ?y)) (not (occupied ?y)))
        :effect (agent-on ?y)
    )
    (:action goright
        :parameters (?x ?y)
        :precondition (and (agent-on ?x) (or (right-of ?y ?x) (left-of ?x ?y)) (not (occupied ?y)))
        :effect (agent-on ?y)
    )
)";

// ── Encoding ──────────────────────────────────────────────────────────────────

fn object(p: Position) -> String {
    format!("x{}y{}", p.x, p.y)
}

fn relation(d: Direction) -> &'static str {
    match d {
        Direction::Up    => "above-of",
        Direction::Down  => "below-of",
        Direction::Left  => "left-of",
        Direction::Right => "right-of",
    }
}

/// Problem description for walking self to `destination`.
pub struct Problem<'a> {
    graph:       &'a BeliefGraph,
    destination: Position,
}

impl<'a> Problem<'a> {
    pub fn new(graph: &'a BeliefGraph, destination: Position) -> Self {
        Self { graph, destination }
    }
}

impl fmt::Display for Problem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.graph;
        let map   = graph.tiles();

        let objects: Vec<String> = map.tile_pos.iter().map(|&p| object(p)).collect();
        writeln!(f, "(define (problem default)")?;
        writeln!(f, "    (:domain deliveroo)")?;
        writeln!(f, "    (:objects {})", objects.join(" "))?;
        writeln!(f, "    (:init")?;
        writeln!(f, "        (agent-on {})", object(graph.me().position))?;

        for &p in graph.reserved() {
            writeln!(f, "        (occupied {})", object(p))?;
        }
        for p in graph.occupied_positions() {
            if !graph.is_reserved(p) {
                writeln!(f, "        (occupied {})", object(p))?;
            }
        }
        for e in 0..map.edge_count() {
            let from = map.position(map.edge_from[e]);
            let to   = map.position(map.edge_to[e]);
            writeln!(f, "        ({} {} {})", relation(map.edge_dir[e]), object(to), object(from))?;
        }

        writeln!(f, "    )")?;
        writeln!(f, "    (:goal (and (agent-on {})))", object(self.destination))?;
        write!(f, ")")
    }
}

/// Render the problem for walking self to `destination`.
pub fn encode_problem(graph: &BeliefGraph, destination: Position) -> String {
    Problem::new(graph, destination).to_string()
}

/// Map a solver step such as `(goup x0y0 x0y1)` back to a move.
pub fn decode_action(name: &str) -> PlanningResult<Direction> {
    let verb = name
        .trim()
        .trim_start_matches('(')
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    verb.strip_prefix("go")
        .and_then(|d| d.parse::<Direction>().ok())
        .ok_or_else(|| PlanningError::UnknownAction(name.to_owned()))
}

// ── SolverClient ──────────────────────────────────────────────────────────────

/// What a solving service answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverOutcome {
    /// Step names in execution order.
    Plan(Vec<String>),
    /// The service ran but found no plan.
    NoPlan,
}

/// Request/response call to a solving service.
#[async_trait]
pub trait SolverClient: Send + Sync {
    async fn solve(&self, domain: &str, problem: &str) -> PlanningResult<SolverOutcome>;
}

#[derive(Serialize)]
struct SolveRequest<'a> {
    domain:  &'a str,
    problem: &'a str,
}

/// [`SolverClient`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpSolver {
    client: reqwest::Client,
    url:    String,
}

impl HttpSolver {
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into() }
    }
}

impl Default for HttpSolver {
    fn default() -> Self {
        Self::new(DEFAULT_SOLVER_URL)
    }
}

#[async_trait]
impl SolverClient for HttpSolver {
    async fn solve(&self, domain: &str, problem: &str) -> PlanningResult<SolverOutcome> {
        let response = self
            .client
            .post(&self.url)
            .json(&SolveRequest { domain, problem })
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlanningError::Solver(format!("error at {}: {body}", self.url)));
        }

        let json: serde_json::Value = response.json().await?;
        parse_response(&json)
    }
}

/// Interpret a solver JSON body.
pub fn parse_response(json: &serde_json::Value) -> PlanningResult<SolverOutcome> {
    if json.get("status").and_then(|s| s.as_str()) == Some("error") {
        return Ok(SolverOutcome::NoPlan);
    }
    let steps = json
        .pointer("/result/plan")
        .and_then(|p| p.as_array())
        .ok_or_else(|| PlanningError::Solver("response carries no plan".to_owned()))?;

    steps
        .iter()
        .map(|step| {
            step.get("name")
                .and_then(|n| n.as_str())
                .map(str::to_owned)
                .ok_or_else(|| PlanningError::Solver(format!("malformed plan step {step}")))
        })
        .collect::<PlanningResult<Vec<_>>>()
        .map(SolverOutcome::Plan)
}

// ── SolverPlanner ─────────────────────────────────────────────────────────────

/// Plans `GoTo` intentions by delegating to a [`SolverClient`].
///
/// `Stay` yields an empty plan; `Deliver` is not supported.
pub struct SolverPlanner<C: SolverClient> {
    pub client: C,
}

impl<C: SolverClient> SolverPlanner<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: SolverClient> Planner for SolverPlanner<C> {
    async fn plan(&self, intention: &Intention, graph: &BeliefGraph) -> PlanningResult<Plan> {
        let destination = match intention {
            Intention::Stay           => return Ok(Plan::empty()),
            Intention::GoTo(p)        => *p,
            Intention::Deliver { .. } => return Err(PlanningError::Unsupported(intention.kind())),
        };
        my_tile(graph)?;
        tile_at(graph, destination)?;

        let from    = graph.me().position;
        let problem = encode_problem(graph, destination);
        debug!(%from, to = %destination, "submitting problem to solver");

        let outcome = self
            .client
            .solve(DOMAIN, &problem)
            .await
            .map_err(|e| PlanningError::Unreachable { to: destination, cause: Box::new(e) })?;

        match outcome {
            SolverOutcome::NoPlan => {
                warn!(%from, to = %destination, "solver found no plan");
                Err(PlanningError::NoPlan { from, to: destination })
            }
            SolverOutcome::Plan(steps) => {
                let actions = steps
                    .iter()
                    .map(|s| decode_action(s).map(Action::Move))
                    .collect::<PlanningResult<Vec<_>>>()?;
                Ok(Plan::new(actions))
            }
        }
    }
}
