use std::collections::{BTreeMap, BTreeSet, VecDeque};

use proptest::prelude::*;

use gridtrace::algorithms::{set_direction, set_phases, trace_reachable, TraceStart};
use gridtrace::network::{EquipmentClass, EquipmentId, Network, NetworkState, StateView, TerminalId};
use gridtrace::{FeederDirection, PhaseCode, SinglePhaseKind, TraceConfig};

fn direction() -> impl Strategy<Value = FeederDirection> {
    prop::sample::select(FeederDirection::ALL.to_vec())
}

fn phase_code() -> impl Strategy<Value = PhaseCode> {
    prop::collection::vec(prop::sample::select(SinglePhaseKind::ALL.to_vec()), 0..4).prop_map(PhaseCode::from_phases)
}

/// A random network of two-terminal junctions and breakers joined by
/// arbitrary terminal pairs, with one terminal of the first piece marked as
/// a feeder head.
#[derive(Debug, Clone)]
struct RandomNetwork {
    classes: Vec<bool>,
    edges: Vec<(usize, usize)>,
}

fn random_network() -> impl Strategy<Value = RandomNetwork> {
    (2_usize..10)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(any::<bool>(), n),
                prop::collection::vec((0..2 * n, 0..2 * n), 0..3 * n),
            )
        })
        .prop_map(|(classes, edges)| RandomNetwork { classes, edges })
}

impl RandomNetwork {
    fn build(&self) -> (Network, Vec<EquipmentId>) {
        let mut b = Network::builder();
        let ids: Vec<_> = self
            .classes
            .iter()
            .enumerate()
            .map(|(i, breaker)| {
                let class = if *breaker {
                    EquipmentClass::Breaker
                } else {
                    EquipmentClass::Junction
                };
                b.add_equipment(format!("eq-{i}"), class, 2).unwrap()
            })
            .collect();
        let terminal = |b: &gridtrace::NetworkBuilder, t: usize| b.terminal(ids[t / 2], (t % 2 + 1) as u32).unwrap();
        for &(x, y) in &self.edges {
            if x != y {
                let (tx, ty) = (terminal(&b, x), terminal(&b, y));
                b.connect(tx, ty).unwrap();
            }
        }
        let head = terminal(&b, 1);
        b.add_feeder_head(head).unwrap();
        (b.build(), ids)
    }

    /// Equipment connected to the first piece, ignoring switch state.
    fn component(&self) -> BTreeSet<usize> {
        let mut adjacent: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        // Terminals sharing a node are transitively connected.
        let mut parent: Vec<usize> = (0..2 * self.classes.len()).collect();
        fn find(parent: &mut [usize], x: usize) -> usize {
            let mut root = x;
            while parent[root] != root {
                root = parent[root];
            }
            parent[x] = root;
            root
        }
        for &(x, y) in &self.edges {
            let (rx, ry) = (find(&mut parent, x), find(&mut parent, y));
            parent[rx] = ry;
        }
        let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for t in 0..parent.len() {
            let root = find(&mut parent, t);
            by_root.entry(root).or_default().push(t / 2);
        }
        for members in by_root.values() {
            for &a in members {
                adjacent.entry(a).or_default().extend(members.iter().copied());
            }
        }

        let mut seen = BTreeSet::from([0]);
        let mut queue = VecDeque::from([0]);
        while let Some(eq) = queue.pop_front() {
            for &next in adjacent.get(&eq).into_iter().flatten() {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn complement_is_involutive(d in direction()) {
        prop_assert_eq!(d.complement().complement(), d);
    }

    #[test]
    fn plus_is_commutative_and_associative(a in direction(), b in direction(), c in direction()) {
        prop_assert_eq!(a.plus(b), b.plus(a));
        prop_assert_eq!(a.plus(b).plus(c), a.plus(b.plus(c)));
        prop_assert_eq!(a.plus(FeederDirection::None), a);
    }

    #[test]
    fn both_satisfies_every_directional_request(d in direction()) {
        let expected = !matches!(d, FeederDirection::None | FeederDirection::Connector);
        prop_assert_eq!(FeederDirection::Both.contains(d), expected);
    }

    #[test]
    fn phase_set_algebra(a in phase_code(), b in phase_code()) {
        prop_assert!(a.intersection(b).is_subset_of(a));
        prop_assert!(a.is_subset_of(a.union(b)));
        prop_assert!(a.difference(b).intersection(b).is_empty());
        prop_assert_eq!(a.to_string().parse::<PhaseCode>().unwrap(), a);
    }

    #[test]
    fn reachability_covers_exactly_the_component(net in random_network()) {
        let (network, ids) = net.build();
        let state = NetworkState::new();
        let result = trace_reachable(&network, &state, TraceStart::Equipment(ids[0]), &TraceConfig::default()).unwrap();

        let reached: BTreeSet<usize> = result.equipment.iter().map(|id| id.index()).collect();
        prop_assert_eq!(reached, net.component());
        // Each terminal is processed once when no context values are carried.
        prop_assert_eq!(result.stats.items_processed, result.terminals.len());
    }

    #[test]
    fn open_breakers_only_shrink_reach(net in random_network()) {
        let (network, ids) = net.build();
        let closed = NetworkState::new();
        let mut open = NetworkState::new();
        for (i, breaker) in net.classes.iter().enumerate() {
            if *breaker {
                open.set_switch_open(ids[i], true);
            }
        }
        let start = TraceStart::Equipment(ids[0]);
        let all = trace_reachable(&network, &closed, start, &TraceConfig::default()).unwrap();
        let some = trace_reachable(&network, &open, start, &TraceConfig::default()).unwrap();
        let all: BTreeSet<TerminalId> = all.terminals.into_iter().collect();
        prop_assert!(some.terminals.iter().all(|t| all.contains(t)));
    }

    #[test]
    fn set_direction_terminates_and_is_idempotent(net in random_network()) {
        let (network, _) = net.build();
        let mut state = NetworkState::new();
        let first = set_direction::run(&network, &mut state, StateView::Normal).unwrap();
        let snapshot: Vec<_> = first.keys().map(|t| state.view(StateView::Normal).direction(*t)).collect();

        let second = set_direction::run(&network, &mut state, StateView::Normal).unwrap();
        prop_assert_eq!(&first, &second);
        let again: Vec<_> = first.keys().map(|t| state.view(StateView::Normal).direction(*t)).collect();
        prop_assert_eq!(snapshot, again);
        prop_assert!(first.values().all(|d| *d != FeederDirection::None && *d != FeederDirection::Connector));
    }

    #[test]
    fn set_phases_without_sources_assigns_nothing(net in random_network()) {
        let (network, _) = net.build();
        let mut state = NetworkState::new();
        let assigned = set_phases::run(&network, &mut state, StateView::Normal).unwrap();
        prop_assert!(assigned.is_empty());
    }
}
