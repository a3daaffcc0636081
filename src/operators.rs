//! State operator traits.
//!
//! Conditions and algorithms never read [`NetworkState`] directly. They hold
//! one operator bundle, fixed at construction, which answers direction,
//! switch and service questions for a single [`StateView`]. The same trace
//! code therefore runs against the normal or the current configuration.

use std::fmt;

use crate::direction::FeederDirection;
use crate::network::{EquipmentId, Network, NetworkState, StateView, TerminalId, ViewState};
use crate::phase::{PhaseCode, SinglePhaseKind};

/// Feeder direction lookup.
pub trait FeederDirectionStateOperators {
    /// Direction assigned to `terminal`, `None` when unassigned.
    fn get_direction(&self, terminal: TerminalId) -> FeederDirection;
}

/// Switch position lookup.
pub trait OpenStateOperators {
    /// Phases on which `switch` is open. Non-switch equipment is never open.
    fn open_phases(&self, switch: EquipmentId) -> PhaseCode;

    /// Returns true if `switch` is open on `phase`, or on any phase when
    /// `phase` is `None`.
    fn is_open(&self, switch: EquipmentId, phase: Option<SinglePhaseKind>) -> bool {
        let open = self.open_phases(switch);
        match phase {
            Some(phase) => open.contains(phase),
            None => !open.is_empty(),
        }
    }
}

/// In-service lookup.
pub trait InServiceStateOperators {
    /// Returns true if `equipment` is in service.
    fn is_in_service(&self, equipment: EquipmentId) -> bool;
}

/// Energised phase lookup.
pub trait PhaseStateOperators {
    /// Phases energised at `terminal`.
    fn energised_phases(&self, terminal: TerminalId) -> PhaseCode;
}

/// Every state question a trace may ask, for one view of one network.
pub trait NetworkStateOperators:
    FeederDirectionStateOperators
    + OpenStateOperators
    + InServiceStateOperators
    + PhaseStateOperators
    + fmt::Debug
    + Send
    + Sync
{
    /// The network being traced.
    fn network(&self) -> &Network;

    /// The view these operators read.
    fn view(&self) -> StateView;
}

macro_rules! view_operators {
    ($(#[$meta:meta])* $name:ident, $view:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'a> {
            network: &'a Network,
            state: &'a ViewState,
        }

        impl<'a> $name<'a> {
            /// Creates operators over `network` reading `state`.
            #[must_use]
            pub fn new(network: &'a Network, state: &'a NetworkState) -> Self {
                Self {
                    network,
                    state: state.view($view),
                }
            }
        }

        impl FeederDirectionStateOperators for $name<'_> {
            fn get_direction(&self, terminal: TerminalId) -> FeederDirection {
                self.state.direction(terminal)
            }
        }

        impl OpenStateOperators for $name<'_> {
            fn open_phases(&self, switch: EquipmentId) -> PhaseCode {
                match self.network.get_equipment(switch) {
                    Ok(eq) if eq.class.is_switch() => self.state.open_phases(switch),
                    _ => PhaseCode::NONE,
                }
            }
        }

        impl InServiceStateOperators for $name<'_> {
            fn is_in_service(&self, equipment: EquipmentId) -> bool {
                self.state.is_in_service(equipment)
            }
        }

        impl PhaseStateOperators for $name<'_> {
            fn energised_phases(&self, terminal: TerminalId) -> PhaseCode {
                self.state.energised_phases(terminal)
            }
        }

        impl NetworkStateOperators for $name<'_> {
            fn network(&self) -> &Network {
                self.network
            }

            fn view(&self) -> StateView {
                $view
            }
        }
    };
}

view_operators!(
    /// Operators over the normal (planned) view.
    NormalStateOperators,
    StateView::Normal
);

view_operators!(
    /// Operators over the current (as-switched) view.
    CurrentStateOperators,
    StateView::Current
);

/// Builds the operators for `view`.
#[must_use]
pub fn state_operators<'a>(
    view: StateView,
    network: &'a Network,
    state: &'a NetworkState,
) -> Box<dyn NetworkStateOperators + 'a> {
    match view {
        StateView::Normal => Box::new(NormalStateOperators::new(network, state)),
        StateView::Current => Box::new(CurrentStateOperators::new(network, state)),
    }
}
