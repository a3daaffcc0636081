//! Serializable trace configuration.
//!
//! A [`TraceConfig`] describes a reachability trace without code: which view
//! to read, how to queue, and which of the stock conditions to apply. It is
//! used by [`trace_reachable`](crate::algorithms::trace_reachable) and by the
//! [`TraceRuntime`](crate::runtime::TraceRuntime).

use serde::{Deserialize, Serialize};

use crate::direction::FeederDirection;
use crate::error::ValidationError;
use crate::network::{EquipmentClass, StateView};
use crate::phase::SinglePhaseKind;
use crate::trace::{NetworkTraceActionType, QueueStrategy};

/// Limit on steps onto equipment of one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EquipmentTypeLimit {
    /// Class counted, subclasses included.
    pub class: EquipmentClass,
    /// Count at which the trace stops.
    pub limit: usize,
}

/// Configuration for a reachability trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    /// Worklist order.
    pub queue: QueueStrategy,
    /// State view to read.
    pub state_view: StateView,
    /// Which steps are reported.
    pub action_type: NetworkTraceActionType,
    /// Block internal steps through open switches.
    pub stop_at_open: bool,
    /// Phase to test switches on; any phase when unset.
    pub open_phase: Option<SinglePhaseKind>,
    /// Only follow steps heading this way.
    pub direction: Option<FeederDirection>,
    /// Stop after this many equipment steps.
    pub max_equipment_steps: Option<usize>,
    /// Stop after stepping onto this many pieces of a class.
    pub equipment_type_limit: Option<EquipmentTypeLimit>,
    /// Block internal steps through shunt compensator grounding terminals.
    pub stop_at_grounding_terminals: bool,
    /// Whether stop conditions apply to the start item.
    pub can_stop_on_start_item: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            queue: QueueStrategy::BreadthFirst,
            state_view: StateView::Normal,
            action_type: NetworkTraceActionType::AllSteps,
            stop_at_open: true,
            open_phase: None,
            direction: None,
            max_equipment_steps: None,
            equipment_type_limit: None,
            stop_at_grounding_terminals: false,
            can_stop_on_start_item: true,
        }
    }
}

impl TraceConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidConfig`] for malformed JSON or
    /// unknown fields, and any error from [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ValidationError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to JSON.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidConfig`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ValidationError> {
        serde_json::to_string(self).map_err(|e| ValidationError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(direction) = self.direction {
            if direction == FeederDirection::Connector {
                return Err(ValidationError::UnsupportedDirection { direction });
            }
        }
        if self.open_phase.is_some() && !self.stop_at_open {
            return Err(ValidationError::InvalidConfig {
                reason: "open_phase requires stop_at_open".to_string(),
            });
        }
        Ok(())
    }

    /// Sets the state view.
    #[must_use]
    pub fn with_state_view(mut self, view: StateView) -> Self {
        self.state_view = view;
        self
    }

    /// Sets the queue strategy.
    #[must_use]
    pub fn with_queue(mut self, queue: QueueStrategy) -> Self {
        self.queue = queue;
        self
    }

    /// Sets the action type.
    #[must_use]
    pub fn with_action_type(mut self, action_type: NetworkTraceActionType) -> Self {
        self.action_type = action_type;
        self
    }

    /// Enables or disables open-switch stopping.
    #[must_use]
    pub fn with_stop_at_open(mut self, stop_at_open: bool, phase: Option<SinglePhaseKind>) -> Self {
        self.stop_at_open = stop_at_open;
        self.open_phase = phase;
        self
    }

    /// Restricts the trace to a feeder direction.
    #[must_use]
    pub fn with_direction(mut self, direction: FeederDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Limits equipment steps.
    #[must_use]
    pub fn with_max_equipment_steps(mut self, limit: usize) -> Self {
        self.max_equipment_steps = Some(limit);
        self
    }

    /// Limits steps onto equipment of `class`.
    #[must_use]
    pub fn with_equipment_type_limit(mut self, class: EquipmentClass, limit: usize) -> Self {
        self.equipment_type_limit = Some(EquipmentTypeLimit { class, limit });
        self
    }

    /// Enables grounding-terminal blocking.
    #[must_use]
    pub fn with_stop_at_grounding_terminals(mut self, stop: bool) -> Self {
        self.stop_at_grounding_terminals = stop;
        self
    }

    /// Sets whether the start item may stop.
    #[must_use]
    pub fn with_can_stop_on_start_item(mut self, can_stop: bool) -> Self {
        self.can_stop_on_start_item = can_stop;
        self
    }
}
