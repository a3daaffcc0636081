//! Phase identifiers.
//!
//! `SinglePhaseKind` names one conductor, `PhaseCode` is a small set of them
//! used for terminal phases, switch open phases and energised phases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A single conductor phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SinglePhaseKind {
    /// Phase A.
    A,
    /// Phase B.
    B,
    /// Phase C.
    C,
    /// Neutral.
    N,
}

impl SinglePhaseKind {
    /// Every phase in bit order.
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::N];

    const fn bit(self) -> u8 {
        match self {
            Self::A => 0b0001,
            Self::B => 0b0010,
            Self::C => 0b0100,
            Self::N => 0b1000,
        }
    }
}

impl fmt::Display for SinglePhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::N => "N",
        };
        f.write_str(s)
    }
}

/// A set of phases, displayed and serialized as e.g. `"ABCN"` or `"NONE"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PhaseCode(u8);

impl PhaseCode {
    /// The empty set.
    pub const NONE: Self = Self(0);
    /// Phase A only.
    pub const A: Self = Self(0b0001);
    /// Phase B only.
    pub const B: Self = Self(0b0010);
    /// Phase C only.
    pub const C: Self = Self(0b0100);
    /// Neutral only.
    pub const N: Self = Self(0b1000);
    /// Three phases without neutral.
    pub const ABC: Self = Self(0b0111);
    /// Three phases with neutral.
    pub const ABCN: Self = Self(0b1111);

    /// Builds a set from individual phases.
    #[must_use]
    pub fn from_phases(phases: impl IntoIterator<Item = SinglePhaseKind>) -> Self {
        Self(phases.into_iter().fold(0, |acc, p| acc | p.bit()))
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if `phase` is in the set.
    #[must_use]
    pub const fn contains(self, phase: SinglePhaseKind) -> bool {
        self.0 & phase.bit() != 0
    }

    /// Returns true if every phase of `self` is also in `other`.
    #[must_use]
    pub const fn is_subset_of(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Phases present in both sets.
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Phases present in either set.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Phases of `self` not present in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Iterates the phases in the set in `A, B, C, N` order.
    pub fn iter(self) -> impl Iterator<Item = SinglePhaseKind> {
        SinglePhaseKind::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl From<SinglePhaseKind> for PhaseCode {
    fn from(phase: SinglePhaseKind) -> Self {
        Self(phase.bit())
    }
}

impl fmt::Display for PhaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        for phase in self.iter() {
            write!(f, "{phase}")?;
        }
        Ok(())
    }
}

impl FromStr for PhaseCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("NONE") {
            return Ok(Self::NONE);
        }
        let mut code = Self::NONE;
        for c in s.chars() {
            let phase = match c.to_ascii_uppercase() {
                'A' => SinglePhaseKind::A,
                'B' => SinglePhaseKind::B,
                'C' => SinglePhaseKind::C,
                'N' => SinglePhaseKind::N,
                other => {
                    return Err(ValidationError::InvalidField {
                        field: "phases".to_string(),
                        reason: format!("unknown phase '{other}' in '{s}'"),
                    })
                }
            };
            code = code.union(phase.into());
        }
        Ok(code)
    }
}

impl Serialize for PhaseCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PhaseCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
