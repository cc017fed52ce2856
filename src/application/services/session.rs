//! Tree session service
//!
//! Owns one integer tree and executes script commands against it.

use std::fmt;

use tracing::{debug, info, instrument};

use crate::application::presets::{Aggregation, IntTree};
use crate::application::render::TreeRender;
use crate::application::script::{parse_script, Command};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::UpdateMode;

/// Result of executing one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Built { len: usize, padded_len: usize },
    Value(i64),
    Values(Vec<i64>),
    Len(usize),
    Updated {
        left: i64,
        right: i64,
        mode: UpdateMode,
    },
    Tree(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Built { len, padded_len } => {
                write!(f, "built {len} elements (padded to {padded_len})")
            }
            Outcome::Value(v) => write!(f, "{v}"),
            Outcome::Values(values) => {
                let joined: Vec<String> = values.iter().map(i64::to_string).collect();
                write!(f, "{}", joined.join(" "))
            }
            Outcome::Len(len) => write!(f, "len = {len}"),
            Outcome::Updated { left, right, mode } => {
                write!(f, "updated [{left}, {right}] ({mode})")
            }
            Outcome::Tree(rendered) => write!(f, "{}", rendered.trim_end()),
        }
    }
}

/// Service executing commands against a single integer tree.
pub struct TreeSession {
    aggregation: Aggregation,
    default_mode: UpdateMode,
    tree: Option<IntTree>,
}

impl TreeSession {
    /// Create a session without a tree; the first `build` creates one.
    pub fn new(aggregation: Aggregation, default_mode: UpdateMode) -> Self {
        Self {
            aggregation,
            default_mode,
            tree: None,
        }
    }

    /// Create a session and build its tree from `values` right away.
    pub fn with_values(
        aggregation: Aggregation,
        default_mode: UpdateMode,
        values: &[i64],
    ) -> ApplicationResult<Self> {
        let mut session = Self::new(aggregation, default_mode);
        session.execute(&Command::Build(values.to_vec()))?;
        Ok(session)
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    pub fn default_mode(&self) -> UpdateMode {
        self.default_mode
    }

    fn tree_mut(&mut self) -> ApplicationResult<&mut IntTree> {
        self.tree.as_mut().ok_or(ApplicationError::NoTree)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn execute(&mut self, command: &Command) -> ApplicationResult<Outcome> {
        match command {
            Command::Build(values) => {
                let tree = self.aggregation.build(values)?;
                let outcome = Outcome::Built {
                    len: tree.len(),
                    padded_len: tree.padded_len(),
                };
                self.tree = Some(tree);
                Ok(outcome)
            }
            Command::Query { left, right } => {
                let value = self.tree_mut()?.query_range(*left, *right);
                Ok(Outcome::Value(value))
            }
            Command::Update {
                left,
                right,
                operation,
                mode,
            } => {
                let aggregation = self.aggregation;
                let requested = mode.unwrap_or(self.default_mode);
                let effective = operation.effective_mode(aggregation, requested);
                if effective != requested {
                    debug!("{operation} cannot be lifted for {aggregation}; running {effective}");
                }
                self.tree_mut()?.update_range_with(
                    *left,
                    *right,
                    operation.lifted(aggregation),
                    effective,
                );
                Ok(Outcome::Updated {
                    left: *left,
                    right: *right,
                    mode: effective,
                })
            }
            Command::Values => Ok(Outcome::Values(self.tree_mut()?.values())),
            Command::Len => Ok(Outcome::Len(self.tree_mut()?.len())),
            Command::Tree => {
                let rendered = self.tree_mut()?.to_tree_string().to_string();
                Ok(Outcome::Tree(rendered))
            }
        }
    }

    /// Parse and execute a whole script, stopping at the first failing line.
    pub fn run_script(&mut self, source: &str) -> ApplicationResult<Vec<Outcome>> {
        let lines = parse_script(source)?;
        info!("run_script: {} commands", lines.len());
        lines
            .iter()
            .map(|entry| {
                self.execute(&entry.command).map_err(|e| match e {
                    ApplicationError::Script { .. } => e,
                    other => ApplicationError::script(entry.line, other.to_string()),
                })
            })
            .collect()
    }
}
