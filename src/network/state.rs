//! Operating state of a network, kept separately for each view.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::ids::{EquipmentId, TerminalId};
use crate::direction::FeederDirection;
use crate::phase::PhaseCode;

/// Which copy of the operating state a trace reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateView {
    /// The planned configuration.
    #[default]
    Normal,
    /// The as-switched configuration.
    Current,
}

/// Operating state for one view.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    directions: HashMap<TerminalId, FeederDirection>,
    open_phases: HashMap<EquipmentId, PhaseCode>,
    out_of_service: HashSet<EquipmentId>,
    energised: HashMap<TerminalId, PhaseCode>,
}

impl ViewState {
    /// Feeder direction of a terminal, `None` when unassigned.
    #[must_use]
    pub fn direction(&self, terminal: TerminalId) -> FeederDirection {
        self.directions.get(&terminal).copied().unwrap_or_default()
    }

    /// Overwrites the direction of a terminal.
    pub fn set_direction(&mut self, terminal: TerminalId, direction: FeederDirection) {
        if direction == FeederDirection::None {
            self.directions.remove(&terminal);
        } else {
            self.directions.insert(terminal, direction);
        }
    }

    /// Adds `direction` to the terminal. Returns true if the value changed.
    pub fn add_direction(&mut self, terminal: TerminalId, direction: FeederDirection) -> bool {
        let previous = self.direction(terminal);
        let next = previous.plus(direction);
        self.set_direction(terminal, next);
        next != previous
    }

    /// Removes `direction` from the terminal. Returns true if the value changed.
    pub fn remove_direction(&mut self, terminal: TerminalId, direction: FeederDirection) -> bool {
        let previous = self.direction(terminal);
        let next = previous.minus(direction);
        self.set_direction(terminal, next);
        next != previous
    }

    /// Forgets every assigned direction.
    pub fn clear_directions(&mut self) {
        self.directions.clear();
    }

    /// Phases on which a switch is open.
    #[must_use]
    pub fn open_phases(&self, switch: EquipmentId) -> PhaseCode {
        self.open_phases.get(&switch).copied().unwrap_or_default()
    }

    /// Sets the phases on which a switch is open.
    pub fn set_open_phases(&mut self, switch: EquipmentId, phases: PhaseCode) {
        if phases.is_empty() {
            self.open_phases.remove(&switch);
        } else {
            self.open_phases.insert(switch, phases);
        }
    }

    /// Opens or closes a switch on every phase.
    pub fn set_open(&mut self, switch: EquipmentId, open: bool) {
        let phases = if open { PhaseCode::ABCN } else { PhaseCode::NONE };
        self.set_open_phases(switch, phases);
    }

    /// Returns true unless the equipment was taken out of service.
    #[must_use]
    pub fn is_in_service(&self, equipment: EquipmentId) -> bool {
        !self.out_of_service.contains(&equipment)
    }

    /// Puts equipment in or out of service.
    pub fn set_in_service(&mut self, equipment: EquipmentId, in_service: bool) {
        if in_service {
            self.out_of_service.remove(&equipment);
        } else {
            self.out_of_service.insert(equipment);
        }
    }

    /// Phases energised at a terminal.
    #[must_use]
    pub fn energised_phases(&self, terminal: TerminalId) -> PhaseCode {
        self.energised.get(&terminal).copied().unwrap_or_default()
    }

    /// Adds energised phases to a terminal. Returns true if the value changed.
    pub fn add_energised_phases(&mut self, terminal: TerminalId, phases: PhaseCode) -> bool {
        let previous = self.energised_phases(terminal);
        let next = previous.union(phases);
        if next == previous {
            return false;
        }
        self.energised.insert(terminal, next);
        true
    }

    /// Forgets every energised phase.
    pub fn clear_energised_phases(&mut self) {
        self.energised.clear();
    }
}

/// Normal and current operating state of a network.
#[derive(Debug, Clone, Default)]
pub struct NetworkState {
    normal: ViewState,
    current: ViewState,
}

impl NetworkState {
    /// Creates an empty state: all switches closed, all equipment in service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows the state for a view.
    #[must_use]
    pub fn view(&self, view: StateView) -> &ViewState {
        match view {
            StateView::Normal => &self.normal,
            StateView::Current => &self.current,
        }
    }

    /// Mutably borrows the state for a view.
    pub fn view_mut(&mut self, view: StateView) -> &mut ViewState {
        match view {
            StateView::Normal => &mut self.normal,
            StateView::Current => &mut self.current,
        }
    }

    /// Opens or closes a switch in both views.
    pub fn set_switch_open(&mut self, switch: EquipmentId, open: bool) {
        self.normal.set_open(switch, open);
        self.current.set_open(switch, open);
    }
}
