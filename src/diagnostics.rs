//! Non-fatal findings accumulated alongside a region run.
//!
//! The analysis never guesses: whenever an input is ambiguous (two basin
//! flowlines sharing a border point, two equally close snap candidates) the
//! conservative choice is made and a [`Diagnostic`] is recorded. The
//! [`Diagnostics`] collector is returned with the outputs for batch
//! reporting; it never aborts the run.

use crate::barrier::BarrierId;
use crate::flowline::FlowlineId;
use serde::Serialize;
use std::fmt;

/// A single non-fatal finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// More than one candidate continuation at a basin border point; the
    /// sentinel joins were left in place.
    BorderAmbiguity {
        upstream: FlowlineId,
        candidates: Vec<FlowlineId>,
    },
    /// Two or more snap candidates within 0.1 m of each other; the closest
    /// (ties by ascending id) was chosen.
    AmbiguousSnap {
        barrier: BarrierId,
        chosen: FlowlineId,
        contenders: Vec<FlowlineId>,
    },
    /// No flowline within the configured snap distance; the barrier is
    /// excluded from cutting.
    OffNetworkBarrier { barrier: BarrierId },
    /// An upstream walk reached a flowline already owned by another network.
    DoubleAssignment {
        flowline: FlowlineId,
        network: FlowlineId,
        prior: FlowlineId,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::BorderAmbiguity { upstream, candidates } => write!(
                f,
                "border ambiguity: flowline {upstream} matches {} downstream candidates",
                candidates.len()
            ),
            Diagnostic::AmbiguousSnap { barrier, chosen, contenders } => write!(
                f,
                "ambiguous snap: barrier {barrier} chose flowline {chosen} over {} contenders",
                contenders.len()
            ),
            Diagnostic::OffNetworkBarrier { barrier } => {
                write!(f, "barrier {barrier} is off-network")
            }
            Diagnostic::DoubleAssignment { flowline, network, prior } => write!(
                f,
                "flowline {flowline} reached from network {network} but already owned by {prior}"
            ),
        }
    }
}

/// Collects non-fatal findings for batch reporting.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    findings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Diagnostic) {
        self.findings.push(finding);
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.findings.iter()
    }

    /// Export all findings to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.findings)
    }

    /// Print all findings to stderr.
    pub fn print(&self) {
        for (idx, finding) in self.findings.iter().enumerate() {
            eprintln!("diagnostic #{idx}: {finding}");
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Diagnostics({} findings)", self.len())
    }
}
