//! Next-path expansion over the equipment graph.
//!
//! Where a trace may go next depends on how it arrived at a terminal and on
//! the role of that terminal's equipment:
//!
//! | role                | start                 | internal              | external                  | segment walk          |
//! |---------------------|-----------------------|-----------------------|---------------------------|-----------------------|
//! | ordinary            | outward               | outward               | internal                  | outward               |
//! | line segment        | outward               | outward               | segment walk              | outward               |
//! | clamp on segment    | outward, segment walk | outward               | segment walk              | outward               |
//! | cut on segment      | outward, segment walk | outward, segment walk | through cut, segment walk | outward, through cut  |

use crate::network::{EquipmentClass, Network, TerminalId};
use crate::operators::NetworkStateOperators;

use super::path::StepPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arrival {
    Start,
    Internal,
    External,
    SegmentWalk,
}

impl Arrival {
    fn of(path: &StepPath) -> Self {
        if path.is_start() {
            Self::Start
        } else if path.traversed_ac_line_segment {
            Self::SegmentWalk
        } else if path.traced_internally() {
            Self::Internal
        } else {
            Self::External
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Ordinary,
    Segment,
    Clamp,
    Cut,
}

impl Role {
    fn of(network: &Network, terminal: TerminalId) -> Self {
        if network.segment_of(terminal).is_none() {
            return Self::Ordinary;
        }
        match network.equipment(network.terminal(terminal).equipment).class {
            EquipmentClass::Clamp => Self::Clamp,
            EquipmentClass::Cut => Self::Cut,
            _ => Self::Segment,
        }
    }
}

/// Paths leaving the end of `path`.
///
/// Moves into equipment that is out of service in the operators' view are
/// skipped.
#[must_use]
pub fn next_paths(ops: &dyn NetworkStateOperators, path: &StepPath) -> Vec<StepPath> {
    let network = ops.network();
    let terminal = path.to_terminal;
    let mut paths = Vec::new();

    match (Role::of(network, terminal), Arrival::of(path)) {
        (Role::Ordinary, Arrival::External) => internal(ops, terminal, &mut paths),
        (Role::Segment | Role::Clamp, Arrival::External) => segment_walk(ops, terminal, &mut paths),
        (Role::Clamp | Role::Cut, Arrival::Start) | (Role::Cut, Arrival::Internal) => {
            outward(ops, terminal, &mut paths);
            segment_walk(ops, terminal, &mut paths);
        }
        (Role::Cut, Arrival::External) => {
            internal(ops, terminal, &mut paths);
            segment_walk(ops, terminal, &mut paths);
        }
        (Role::Cut, Arrival::SegmentWalk) => {
            outward(ops, terminal, &mut paths);
            internal(ops, terminal, &mut paths);
        }
        _ => outward(ops, terminal, &mut paths),
    }
    paths
}

fn outward(ops: &dyn NetworkStateOperators, terminal: TerminalId, paths: &mut Vec<StepPath>) {
    let network = ops.network();
    paths.extend(
        network
            .connected_terminals(terminal)
            .filter(|other| ops.is_in_service(network.terminal(*other).equipment))
            .map(|other| StepPath::between(network, terminal, other, false)),
    );
}

fn internal(ops: &dyn NetworkStateOperators, terminal: TerminalId, paths: &mut Vec<StepPath>) {
    let network = ops.network();
    let equipment = network.equipment(network.terminal(terminal).equipment);
    paths.extend(
        equipment
            .terminals
            .iter()
            .copied()
            .filter(|other| *other != terminal)
            .map(|other| StepPath::between(network, terminal, other, false)),
    );
}

fn segment_walk(ops: &dyn NetworkStateOperators, terminal: TerminalId, paths: &mut Vec<StepPath>) {
    let network = ops.network();
    let Some(segment) = network.segment_of(terminal) else {
        return;
    };
    if !ops.is_in_service(segment) {
        return;
    }
    paths.extend(
        network
            .segment_section_neighbours(terminal)
            .into_iter()
            .filter(|other| ops.is_in_service(network.terminal(*other).equipment))
            .map(|other| StepPath::between(network, terminal, other, true)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{EquipmentId, NetworkState};
    use crate::operators::NormalStateOperators;

    struct Fixture {
        net: Network,
        source: EquipmentId,
        line: EquipmentId,
        cut: EquipmentId,
        clamp: EquipmentId,
        load: EquipmentId,
    }

    // source -- line(t1 ... clamp@10 ... cut@20 ... t2) -- load
    fn fixture() -> Fixture {
        let mut b = Network::builder();
        let source = b.add_equipment("source", EquipmentClass::EnergySource, 1).unwrap();
        let line = b.add_equipment("line", EquipmentClass::AcLineSegment, 2).unwrap();
        let load = b.add_equipment("load", EquipmentClass::EnergyConsumer, 1).unwrap();
        let cut = b.add_equipment("cut", EquipmentClass::Cut, 2).unwrap();
        let clamp = b.add_equipment("clamp", EquipmentClass::Clamp, 1).unwrap();
        b.chain(&[source, line, load]).unwrap();
        b.attach_to_segment(clamp, line, 10.0).unwrap();
        b.attach_to_segment(cut, line, 20.0).unwrap();
        Fixture {
            net: b.build(),
            source,
            line,
            cut,
            clamp,
            load,
        }
    }

    fn targets(paths: &[StepPath]) -> Vec<TerminalId> {
        let mut t: Vec<_> = paths.iter().map(|p| p.to_terminal).collect();
        t.sort();
        t
    }

    #[test]
    fn external_arrival_at_segment_walks_its_section() {
        let f = fixture();
        let state = NetworkState::new();
        let ops = NormalStateOperators::new(&f.net, &state);
        let source_t = f.net.equipment(f.source).terminals[0];
        let line_t1 = f.net.equipment(f.line).terminals[0];
        let path = StepPath::between(&f.net, source_t, line_t1, false);

        let next = next_paths(&ops, &path);
        let mut expected = vec![f.net.equipment(f.clamp).terminals[0], f.net.equipment(f.cut).terminals[0]];
        expected.sort();
        assert_eq!(targets(&next), expected);
        assert!(next.iter().all(|p| p.traversed_ac_line_segment));
    }

    #[test]
    fn cut_entered_by_walk_goes_through_and_out() {
        let f = fixture();
        let state = NetworkState::new();
        let ops = NormalStateOperators::new(&f.net, &state);
        let line_t1 = f.net.equipment(f.line).terminals[0];
        let cut_t1 = f.net.equipment(f.cut).terminals[0];
        let cut_t2 = f.net.equipment(f.cut).terminals[1];

        let walk = StepPath::between(&f.net, line_t1, cut_t1, true);
        assert_eq!(targets(&next_paths(&ops, &walk)), vec![cut_t2]);

        let through = StepPath::between(&f.net, cut_t1, cut_t2, false);
        let line_t2 = f.net.equipment(f.line).terminals[1];
        assert_eq!(targets(&next_paths(&ops, &through)), vec![line_t2]);
    }

    #[test]
    fn internal_then_outward_on_ordinary_equipment() {
        let f = fixture();
        let state = NetworkState::new();
        let ops = NormalStateOperators::new(&f.net, &state);
        let line_t2 = f.net.equipment(f.line).terminals[1];
        let load_t = f.net.equipment(f.load).terminals[0];

        let walk_end = StepPath::between(&f.net, f.net.equipment(f.cut).terminals[1], line_t2, true);
        let out = next_paths(&ops, &walk_end);
        assert_eq!(targets(&out), vec![load_t]);
        assert!(out[0].traced_externally());

        let into_load = StepPath::between(&f.net, line_t2, load_t, false);
        assert!(next_paths(&ops, &into_load).is_empty());
    }

    #[test]
    fn out_of_service_equipment_is_skipped() {
        let f = fixture();
        let mut state = NetworkState::new();
        state.view_mut(crate::network::StateView::Normal).set_in_service(f.line, false);
        let ops = NormalStateOperators::new(&f.net, &state);
        let source_t = f.net.equipment(f.source).terminals[0];
        assert!(next_paths(&ops, &StepPath::start(&f.net, source_t)).is_empty());
    }
}
