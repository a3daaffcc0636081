//! Paths and steps: the traversal's unit of work.

use serde::{Deserialize, Serialize};

use crate::network::{EquipmentId, Network, TerminalId};

/// Kind of step a gated condition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    /// Every step.
    #[default]
    All,
    /// Steps between terminals of the same equipment.
    Internal,
    /// Steps between terminals of different equipment.
    External,
}

/// A directed move from one terminal to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepPath {
    /// Terminal the step leaves.
    pub from_terminal: TerminalId,
    /// Terminal the step arrives at.
    pub to_terminal: TerminalId,
    /// Equipment owning `from_terminal`.
    pub from_equipment: EquipmentId,
    /// Equipment owning `to_terminal`.
    pub to_equipment: EquipmentId,
    /// True if the step walked along an AC line segment.
    pub traversed_ac_line_segment: bool,
}

impl StepPath {
    /// The zero-length path a trace starts from.
    #[must_use]
    pub fn start(network: &Network, terminal: TerminalId) -> Self {
        let equipment = network.terminal(terminal).equipment;
        Self {
            from_terminal: terminal,
            to_terminal: terminal,
            from_equipment: equipment,
            to_equipment: equipment,
            traversed_ac_line_segment: false,
        }
    }

    /// Path between two terminals, resolving their equipment.
    #[must_use]
    pub fn between(network: &Network, from: TerminalId, to: TerminalId, traversed_ac_line_segment: bool) -> Self {
        Self {
            from_terminal: from,
            to_terminal: to,
            from_equipment: network.terminal(from).equipment,
            to_equipment: network.terminal(to).equipment,
            traversed_ac_line_segment,
        }
    }

    /// True if both ends belong to the same equipment.
    #[must_use]
    pub fn traced_internally(&self) -> bool {
        self.from_equipment == self.to_equipment
    }

    /// True if the ends belong to different equipment.
    #[must_use]
    pub fn traced_externally(&self) -> bool {
        !self.traced_internally()
    }

    /// True for the zero-length start path.
    #[must_use]
    pub fn is_start(&self) -> bool {
        self.from_terminal == self.to_terminal
    }

    /// `Internal` or `External`; never `All`.
    #[must_use]
    pub fn step_type(&self) -> StepType {
        if self.traced_internally() {
            StepType::Internal
        } else {
            StepType::External
        }
    }
}

/// A path plus running counters and caller data.
#[derive(Debug, Clone)]
pub struct NetworkTraceStep<T> {
    /// The move that produced this step.
    pub path: StepPath,
    /// Steps taken since the start item.
    pub num_total_steps: usize,
    /// External steps taken since the start item.
    pub num_equipment_steps: usize,
    /// Caller payload.
    pub data: T,
}

impl<T> NetworkTraceStep<T> {
    /// A start step at `path` with zeroed counters.
    pub fn start(path: StepPath, data: T) -> Self {
        Self {
            path,
            num_total_steps: 0,
            num_equipment_steps: 0,
            data,
        }
    }

    /// The step following `self` along `path`.
    #[must_use]
    pub fn next<U>(&self, path: StepPath, data: U) -> NetworkTraceStep<U> {
        NetworkTraceStep {
            path,
            num_total_steps: self.num_total_steps + 1,
            num_equipment_steps: self.num_equipment_steps + usize::from(path.traced_externally()),
            data,
        }
    }

    /// Step type of the underlying path.
    #[must_use]
    pub fn step_type(&self) -> StepType {
        self.path.step_type()
    }
}
