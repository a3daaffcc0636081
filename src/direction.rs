//! Feeder direction lattice.
//!
//! A terminal's feeder direction describes which way tracing out of that
//! terminal moves relative to the feeder head. The values do not form a
//! linear order: `Both` satisfies any directional request and `Connector`
//! acts as a wildcard for the directional requests as well.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a terminal relative to its feeder head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeederDirection {
    /// No direction has been assigned.
    #[default]
    None,
    /// Tracing out of the terminal moves towards the feeder head.
    Upstream,
    /// Tracing out of the terminal moves away from the feeder head.
    Downstream,
    /// The terminal is both upstream and downstream (typically in a loop).
    Both,
    /// The terminal sits on a connector; any directional request passes it.
    Connector,
}

impl FeederDirection {
    /// Every direction, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::Upstream,
        Self::Downstream,
        Self::Both,
        Self::Connector,
    ];

    /// The direction seen from the other side of an equipment boundary.
    ///
    /// `complement(complement(d)) == d` for every direction.
    #[must_use]
    pub const fn complement(self) -> Self {
        match self {
            Self::Upstream => Self::Downstream,
            Self::Downstream => Self::Upstream,
            other => other,
        }
    }

    /// Returns true when a terminal whose actual direction is `self`
    /// satisfies a request for `requested`.
    ///
    /// | actual       | satisfied requests                |
    /// |--------------|-----------------------------------|
    /// | `None`       | `None`                            |
    /// | `Upstream`   | `Upstream`                        |
    /// | `Downstream` | `Downstream`                      |
    /// | `Both`       | `Upstream`, `Downstream`, `Both`  |
    /// | `Connector`  | `Upstream`, `Downstream`, `Both`, `Connector` |
    #[must_use]
    pub const fn contains(self, requested: Self) -> bool {
        match self {
            Self::None => matches!(requested, Self::None),
            Self::Upstream => matches!(requested, Self::Upstream),
            Self::Downstream => matches!(requested, Self::Downstream),
            Self::Both => matches!(requested, Self::Upstream | Self::Downstream | Self::Both),
            Self::Connector => !matches!(requested, Self::None),
        }
    }

    /// Combines two directions, e.g. `Upstream + Downstream = Both`.
    ///
    /// `Connector` absorbs everything, `None` is the identity.
    #[must_use]
    pub const fn plus(self, other: Self) -> Self {
        match (self, other) {
            (Self::Connector, _) | (_, Self::Connector) => Self::Connector,
            (Self::None, d) | (d, Self::None) => d,
            (Self::Upstream, Self::Upstream) => Self::Upstream,
            (Self::Downstream, Self::Downstream) => Self::Downstream,
            _ => Self::Both,
        }
    }

    /// Removes `other` from `self`, e.g. `Both - Upstream = Downstream`.
    #[must_use]
    pub const fn minus(self, other: Self) -> Self {
        match (self, other) {
            (Self::Both, Self::Upstream) => Self::Downstream,
            (Self::Both, Self::Downstream) => Self::Upstream,
            (Self::Upstream, Self::Upstream | Self::Both)
            | (Self::Downstream, Self::Downstream | Self::Both)
            | (Self::Both, Self::Both)
            | (Self::Connector, Self::Connector) => Self::None,
            (current, _) => current,
        }
    }
}

impl fmt::Display for FeederDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "NONE",
            Self::Upstream => "UPSTREAM",
            Self::Downstream => "DOWNSTREAM",
            Self::Both => "BOTH",
            Self::Connector => "CONNECTOR",
        };
        f.write_str(s)
    }
}
