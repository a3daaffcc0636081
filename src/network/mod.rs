//! In-memory equipment graph and its operating state.

mod equipment;
mod ids;
mod model;
mod state;

pub use equipment::{ConnectivityNode, Equipment, EquipmentClass, SegmentPosition, Terminal};
pub use ids::{generate_mrid, EquipmentId, NodeId, TerminalId};
pub use model::{Network, NetworkBuilder};
pub use state::{NetworkState, StateView, ViewState};
