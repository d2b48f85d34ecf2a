//! Fork container layouts.
//!
//! The layout is data, not code: the field count of each container crossed
//! by the proven path. Field counts only determine tree depths, so a layout
//! can be swapped without touching the walker. The fork is always supplied
//! by the caller; nothing here guesses which fork a network is on.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::gindex::{compose, cover_depth, GeneralizedIndex, PathStep};
use crate::proof::ProofError;

/// Field positions on the `block -> body -> execution_payload` path.
pub mod positions {
    pub const BEACON_BLOCK_SLOT: usize = 0;
    pub const BEACON_BLOCK_BODY: usize = 4;
    pub const EXECUTION_PAYLOAD: usize = 9;
    pub const EXECUTION_STATE_ROOT: usize = 2;
    pub const EXECUTION_BLOCK_NUMBER: usize = 6;
    pub const EXECUTION_TIMESTAMP: usize = 9;
}

/// Beacon chain forks with a supported block schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fork {
    Deneb,
    /// Also covers fulu, whose block body is unchanged.
    #[serde(alias = "fulu")]
    Electra,
}

impl Fork {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Deneb => "deneb",
            Self::Electra => "electra",
        }
    }
}

impl fmt::Display for Fork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Fork {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deneb" => Ok(Self::Deneb),
            "electra" | "fulu" => Ok(Self::Electra),
            other => Err(ProofError::InvalidLayout(format!("unsupported fork '{other}'"))),
        }
    }
}

/// Field counts of the containers on the proven path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerLayout {
    pub fork: Fork,
    pub beacon_block: usize,
    pub beacon_block_body: usize,
    pub execution_payload: usize,
}

impl ContainerLayout {
    /// Built-in layout for a fork.
    #[must_use]
    pub const fn for_fork(fork: Fork) -> Self {
        match fork {
            Fork::Deneb => Self {
                fork,
                beacon_block: 5,
                beacon_block_body: 12,
                execution_payload: 17,
            },
            Fork::Electra => Self {
                fork,
                beacon_block: 5,
                beacon_block_body: 13,
                execution_payload: 17,
            },
        }
    }

    /// Load a layout from a JSON file and validate it.
    ///
    /// # Errors
    /// Returns [`ProofError::InvalidLayout`] if the file cannot be read,
    /// parsed, or fails [`ContainerLayout::validate`].
    pub fn from_json_file(path: &Path) -> Result<Self, ProofError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ProofError::InvalidLayout(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    /// Parse a layout from JSON and validate it.
    ///
    /// # Errors
    /// Returns [`ProofError::InvalidLayout`] on malformed JSON or a layout
    /// that fails [`ContainerLayout::validate`].
    pub fn from_json(raw: &str) -> Result<Self, ProofError> {
        let layout: Self = serde_json::from_str(raw)
            .map_err(|e| ProofError::InvalidLayout(format!("malformed layout: {e}")))?;
        layout.validate()?;
        Ok(layout)
    }

    /// Check that every fixed position fits its container and that the
    /// state root path fits a `u64` generalized index.
    ///
    /// # Errors
    /// Returns [`ProofError::InvalidLayout`] naming the first container
    /// that cannot hold its position, or if the path is too deep.
    pub fn validate(&self) -> Result<(), ProofError> {
        let checks = [
            ("beacon_block", self.beacon_block, positions::BEACON_BLOCK_BODY),
            ("beacon_block", self.beacon_block, positions::BEACON_BLOCK_SLOT),
            (
                "beacon_block_body",
                self.beacon_block_body,
                positions::EXECUTION_PAYLOAD,
            ),
            (
                "execution_payload",
                self.execution_payload,
                positions::EXECUTION_STATE_ROOT,
            ),
            (
                "execution_payload",
                self.execution_payload,
                positions::EXECUTION_BLOCK_NUMBER,
            ),
            (
                "execution_payload",
                self.execution_payload,
                positions::EXECUTION_TIMESTAMP,
            ),
        ];
        for (container, field_count, position) in checks {
            if position >= field_count {
                return Err(ProofError::InvalidLayout(format!(
                    "{container} has {field_count} fields, needs position {position}"
                )));
            }
        }
        self.state_root_gindex().map(|_| ())
    }

    /// Path from the block root to the execution state root.
    #[must_use]
    pub const fn state_root_path(&self) -> [PathStep; 3] {
        [
            PathStep::new(positions::BEACON_BLOCK_BODY, self.beacon_block),
            PathStep::new(positions::EXECUTION_PAYLOAD, self.beacon_block_body),
            PathStep::new(positions::EXECUTION_STATE_ROOT, self.execution_payload),
        ]
    }

    /// Generalized index of the execution state root from the block root.
    ///
    /// # Errors
    /// Returns [`ProofError::InvalidLayout`] if a position does not fit.
    pub fn state_root_gindex(&self) -> Result<GeneralizedIndex, ProofError> {
        compose(&self.state_root_path())
    }

    /// Number of siblings a state root proof carries under this layout.
    #[must_use]
    pub fn state_root_proof_length(&self) -> u32 {
        cover_depth(self.beacon_block)
            + cover_depth(self.beacon_block_body)
            + cover_depth(self.execution_payload)
    }
}
