//! Equipment, terminals and connectivity nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{EquipmentId, NodeId, TerminalId};
use crate::phase::PhaseCode;

/// Runtime type token for conducting equipment.
///
/// Classes form a single-inheritance tree rooted at `ConductingEquipment`.
/// Filters are matched with [`EquipmentClass::is_instance_of`], so a filter
/// on `Switch` also matches breakers, reclosers, fuses and cuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum EquipmentClass {
    ConductingEquipment,
    Connector,
    Junction,
    BusbarSection,
    Conductor,
    AcLineSegment,
    Switch,
    ProtectedSwitch,
    Breaker,
    Recloser,
    LoadBreakSwitch,
    Fuse,
    Disconnector,
    Jumper,
    Cut,
    Clamp,
    EnergySource,
    EnergyConsumer,
    PowerTransformer,
    RegulatingCondEq,
    ShuntCompensator,
    LinearShuntCompensator,
}

impl EquipmentClass {
    /// The direct superclass, or `None` for the root.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        use EquipmentClass as C;
        match self {
            C::ConductingEquipment => None,
            C::Connector
            | C::Conductor
            | C::Switch
            | C::Clamp
            | C::EnergySource
            | C::EnergyConsumer
            | C::PowerTransformer
            | C::RegulatingCondEq => Some(C::ConductingEquipment),
            C::Junction | C::BusbarSection => Some(C::Connector),
            C::AcLineSegment => Some(C::Conductor),
            C::ProtectedSwitch | C::Fuse | C::Disconnector | C::Jumper | C::Cut => Some(C::Switch),
            C::Breaker | C::Recloser | C::LoadBreakSwitch => Some(C::ProtectedSwitch),
            C::ShuntCompensator => Some(C::RegulatingCondEq),
            C::LinearShuntCompensator => Some(C::ShuntCompensator),
        }
    }

    /// Returns true if `self` is `class` or one of its subclasses.
    #[must_use]
    pub fn is_instance_of(self, class: Self) -> bool {
        let mut current = Some(self);
        while let Some(c) = current {
            if c == class {
                return true;
            }
            current = c.parent();
        }
        false
    }

    /// Shorthand for `is_instance_of(EquipmentClass::Switch)`.
    #[must_use]
    pub fn is_switch(self) -> bool {
        self.is_instance_of(Self::Switch)
    }
}

impl fmt::Display for EquipmentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Where a cut or clamp sits along an AC line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPosition {
    /// The segment the equipment is attached to.
    pub segment: EquipmentId,
    /// Distance from the segment's first terminal.
    pub length_from_terminal_1: f64,
}

/// A piece of conducting equipment.
#[derive(Debug, Clone)]
pub struct Equipment {
    /// Network-local identifier.
    pub id: EquipmentId,
    /// Master resource identifier.
    pub mrid: String,
    /// Optional human readable name.
    pub name: Option<String>,
    /// Runtime type token.
    pub class: EquipmentClass,
    /// Terminals in sequence-number order.
    pub terminals: Vec<TerminalId>,
    /// Phases the equipment is built for.
    pub phases: PhaseCode,
    /// Grounding terminal of a shunt compensator.
    pub grounding_terminal: Option<TerminalId>,
    /// Position on a line segment, for cuts and clamps.
    pub segment_position: Option<SegmentPosition>,
}

impl Equipment {
    /// Returns true if the equipment is an instance of `class`.
    #[must_use]
    pub fn is_instance_of(&self, class: EquipmentClass) -> bool {
        self.class.is_instance_of(class)
    }

    /// Name if set, otherwise the mRID.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.mrid)
    }
}

/// A connection point on a piece of equipment.
#[derive(Debug, Clone)]
pub struct Terminal {
    /// Network-local identifier.
    pub id: TerminalId,
    /// Master resource identifier.
    pub mrid: String,
    /// Owning equipment.
    pub equipment: EquipmentId,
    /// 1-based position on the equipment.
    pub sequence_number: u32,
    /// Phases carried by the terminal.
    pub phases: PhaseCode,
    /// Node joining this terminal to others.
    pub connectivity_node: Option<NodeId>,
}

/// Joins terminals of different equipment.
#[derive(Debug, Clone)]
pub struct ConnectivityNode {
    /// Network-local identifier.
    pub id: NodeId,
    /// Terminals attached to the node.
    pub terminals: Vec<TerminalId>,
}
