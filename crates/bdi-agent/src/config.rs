//! Agent configuration (TOML).
//!
//! Every field has a default, so an empty or missing file yields a working
//! solo agent.  A fully spelled-out file looks like:
//!
//! ```toml
//! agent_decay_interval_ms  = 2000
//! announcement_interval_ms = 1000
//! parcel_decay             = "1s"
//! coordination             = false
//! reconsideration          = "cautious"
//! goto_planner             = "local"
//! solver_url               = "http://solver.planning.domains/solve"
//!
//! [commitment]
//! policy       = "backtrack"
//! delay_ms     = 1000
//! depth        = 5
//! max_failures = 3
//! within_ms    = 1000
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use bdi_core::Clock;
use bdi_deliberation::{Bold, Cautious, Reconsideration};
use bdi_execution::{BacktrackCommitment, Commitment, MaxConsecutiveFailures};
use bdi_planning::DEFAULT_SOLVER_URL;

use crate::{AgentError, AgentResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Age after which other agents' beliefs are dropped; also the decay
    /// timer period.  `None` keeps agent beliefs forever.
    pub agent_decay_interval_ms:  Option<u64>,
    pub announcement_interval_ms: u64,
    /// The world's parcel reward decay interval.
    pub parcel_decay:             ParcelDecay,
    /// Look for a peer and run the paired loop.
    pub coordination:             bool,
    pub commitment:               CommitmentConfig,
    pub reconsideration:          ReconsiderationPolicy,
    pub goto_planner:             GotoPlanner,
    pub solver_url:               String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_decay_interval_ms:  Some(2000),
            announcement_interval_ms: 1000,
            parcel_decay:             ParcelDecay::default(),
            coordination:             false,
            commitment:               CommitmentConfig::default(),
            reconsideration:          ReconsiderationPolicy::default(),
            goto_planner:             GotoPlanner::default(),
            solver_url:               DEFAULT_SOLVER_URL.to_owned(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> AgentResult<()> {
        if self.agent_decay_interval_ms == Some(0) {
            return Err(AgentError::Config("agent_decay_interval_ms must be > 0".into()));
        }
        if self.announcement_interval_ms == 0 {
            return Err(AgentError::Config("announcement_interval_ms must be > 0".into()));
        }
        if self.goto_planner == GotoPlanner::Solver && self.solver_url.trim().is_empty() {
            return Err(AgentError::Config("solver_url must be set for the solver planner".into()));
        }
        match self.commitment {
            CommitmentConfig::Backtrack { max_failures: 0, .. } => {
                Err(AgentError::Config("commitment.max_failures must be > 0".into()))
            }
            CommitmentConfig::MaxConsecutiveFailures { max: 0 } => {
                Err(AgentError::Config("commitment.max must be > 0".into()))
            }
            _ => Ok(()),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AgentConfig::default()`.
pub fn load_config(path: &Path) -> AgentResult<AgentConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AgentConfig::default());
    }
    let raw = fs::read_to_string(path)?;
    let cfg: AgentConfig = toml::from_str(&raw)?;
    cfg.validate()?;
    Ok(cfg)
}

// ── ParcelDecay ───────────────────────────────────────────────────────────────

/// How often the world takes one point off each parcel's reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParcelDecay {
    #[default]
    #[serde(rename = "1s")]
    OneSecond,
    #[serde(rename = "2s")]
    TwoSeconds,
    #[serde(rename = "5s")]
    FiveSeconds,
    #[serde(rename = "10s")]
    TenSeconds,
    #[serde(rename = "infinite")]
    Infinite,
}

impl ParcelDecay {
    /// `None` when rewards never decay.
    pub fn interval_ms(self) -> Option<u64> {
        match self {
            ParcelDecay::OneSecond   => Some(1_000),
            ParcelDecay::TwoSeconds  => Some(2_000),
            ParcelDecay::FiveSeconds => Some(5_000),
            ParcelDecay::TenSeconds  => Some(10_000),
            ParcelDecay::Infinite    => None,
        }
    }
}

// ── CommitmentConfig ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum CommitmentConfig {
    Backtrack {
        #[serde(default = "default_delay_ms")]
        delay_ms:     u64,
        #[serde(default = "default_depth")]
        depth:        usize,
        #[serde(default = "default_max_failures")]
        max_failures: usize,
        #[serde(default = "default_within_ms")]
        within_ms:    u64,
    },
    MaxConsecutiveFailures {
        #[serde(default = "default_max")]
        max: u32,
    },
}

fn default_delay_ms() -> u64 {
    BacktrackCommitment::DEFAULT_DELAY_MS
}
fn default_depth() -> usize {
    BacktrackCommitment::DEFAULT_DEPTH
}
fn default_max_failures() -> usize {
    BacktrackCommitment::DEFAULT_MAX_FAILURES
}
fn default_within_ms() -> u64 {
    BacktrackCommitment::DEFAULT_WITHIN_MS
}
fn default_max() -> u32 {
    10
}

impl Default for CommitmentConfig {
    fn default() -> Self {
        CommitmentConfig::Backtrack {
            delay_ms:     default_delay_ms(),
            depth:        default_depth(),
            max_failures: default_max_failures(),
            within_ms:    default_within_ms(),
        }
    }
}

impl CommitmentConfig {
    /// A fresh policy instance for one plan run.
    pub fn build(&self, clock: Arc<dyn Clock>) -> Box<dyn Commitment> {
        match *self {
            CommitmentConfig::Backtrack { delay_ms, depth, max_failures, within_ms } => {
                Box::new(BacktrackCommitment::new(delay_ms, depth, max_failures, within_ms, clock))
            }
            CommitmentConfig::MaxConsecutiveFailures { max } => Box::new(MaxConsecutiveFailures::new(max)),
        }
    }
}

// ── Policies ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconsiderationPolicy {
    #[default]
    Cautious,
    Bold,
}

impl ReconsiderationPolicy {
    pub fn build(self) -> Box<dyn Reconsideration> {
        match self {
            ReconsiderationPolicy::Cautious => Box::new(Cautious),
            ReconsiderationPolicy::Bold     => Box::new(Bold),
        }
    }
}

/// Which planner serves `GoTo` intentions in the solo loop.  The paired
/// loop always plans locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GotoPlanner {
    #[default]
    Local,
    Solver,
}

impl fmt::Display for GotoPlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GotoPlanner::Local  => f.write_str("local"),
            GotoPlanner::Solver => f.write_str("solver"),
        }
    }
}
