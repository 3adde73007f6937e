//! Per-agent-type movement capability descriptors.

use std::slice;

use serde::Deserialize;

use crate::CellOffset;

/// Describes how an agent type chooses its next cell once it roams freely.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AiProfile {
    /// Candidate destinations are the current cell plus each listed offset.
    GridMove {
        /// Relative cell offsets in preference order.
        move_pattern: Vec<CellOffset>,
    },
    /// Candidate destinations are a unit step along each listed angle.
    StrategicMove {
        /// Travel angles in degrees, in preference order.
        movable_angles: Vec<f32>,
        /// Multiplier applied to the agent's base speed.
        speed_rate: f32,
    },
}

impl AiProfile {
    /// Profile used by enemy types that do not declare one: straight down.
    #[must_use]
    pub fn straight_down() -> Self {
        Self::GridMove {
            move_pattern: vec![CellOffset::new(0, 1)],
        }
    }

    /// Multiplier applied to an agent's base speed when animating a move.
    #[must_use]
    pub fn speed_rate(&self) -> f32 {
        match self {
            Self::GridMove { .. } => 1.0,
            Self::StrategicMove { speed_rate, .. } => *speed_rate,
        }
    }

    /// Iterates the candidate offsets in preference order.
    ///
    /// Angles whose rounded step does not leave the cell are skipped.
    #[must_use]
    pub fn candidate_offsets(&self) -> CandidateOffsets<'_> {
        let source = match self {
            Self::GridMove { move_pattern } => OffsetSource::Pattern(move_pattern.iter()),
            Self::StrategicMove { movable_angles, .. } => {
                OffsetSource::Angles(movable_angles.iter())
            }
        };
        CandidateOffsets { source }
    }
}

impl Default for AiProfile {
    fn default() -> Self {
        Self::straight_down()
    }
}

/// Iterator over the candidate offsets declared by an [`AiProfile`].
#[derive(Clone, Debug)]
pub struct CandidateOffsets<'a> {
    source: OffsetSource<'a>,
}

#[derive(Clone, Debug)]
enum OffsetSource<'a> {
    Pattern(slice::Iter<'a, CellOffset>),
    Angles(slice::Iter<'a, f32>),
}

impl Iterator for CandidateOffsets<'_> {
    type Item = CellOffset;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            OffsetSource::Pattern(offsets) => offsets.next().copied(),
            OffsetSource::Angles(angles) => loop {
                let step = CellOffset::from_degrees(*angles.next()?);
                if !step.is_zero() {
                    return Some(step);
                }
            },
        }
    }
}
