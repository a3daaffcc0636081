use std::sync::Arc;
use std::thread;
use std::time::Duration;

use gridtrace::algorithms::{trace_reachable, TraceStart};
use gridtrace::network::{EquipmentClass, EquipmentId, Network, NetworkState};
use gridtrace::{ExecutionError, SinglePhaseKind, StateView, TraceConfig, TraceError, TraceRuntime, TraceRuntimeConfig};

fn feeder(len: usize) -> (Network, Vec<EquipmentId>) {
    let mut b = Network::builder();
    let mut ids = vec![b.add_equipment("src", EquipmentClass::EnergySource, 1).unwrap()];
    for i in 0..len {
        let class = if i % 3 == 2 {
            EquipmentClass::Breaker
        } else {
            EquipmentClass::AcLineSegment
        };
        ids.push(b.add_equipment(format!("eq-{i}"), class, 2).unwrap());
    }
    b.chain(&ids).unwrap();
    (b.build(), ids)
}

#[test]
fn runtime_results_match_direct_traces() {
    let (net, ids) = feeder(30);
    let mut state = NetworkState::new();
    state.view_mut(StateView::Current).set_open(ids[9], true);
    let net = Arc::new(net);
    let state = Arc::new(state);

    let rt = TraceRuntime::start(Arc::clone(&net), Arc::clone(&state), &TraceRuntimeConfig::default()).unwrap();
    let configs = [
        TraceConfig::default(),
        TraceConfig::default().with_state_view(StateView::Current),
        TraceConfig::default().with_max_equipment_steps(4),
    ];

    let handles: Vec<_> = configs
        .iter()
        .flat_map(|config| {
            [ids[0], ids[15]].map(|eq| (config.clone(), rt.submit(TraceStart::Equipment(eq), config.clone()).unwrap()))
        })
        .collect();

    for (config, handle) in handles {
        let start = handle.start();
        let from_worker = handle.join_timeout(Duration::from_secs(5)).unwrap();
        let direct = trace_reachable(&net, &state, start, &config).unwrap();
        assert_eq!(from_worker, direct);
    }
    rt.shutdown();
}

#[test]
fn runtime_can_be_shared_between_threads() {
    let (net, ids) = feeder(12);
    let rt = Arc::new(
        TraceRuntime::start(
            Arc::new(net),
            Arc::new(NetworkState::new()),
            &TraceRuntimeConfig {
                workers: 4,
                queue_capacity: 64,
            },
        )
        .unwrap(),
    );

    let callers: Vec<_> = (0..4)
        .map(|_| {
            let rt = Arc::clone(&rt);
            let start = TraceStart::Equipment(ids[0]);
            thread::spawn(move || rt.trace(start, TraceConfig::default()).unwrap().equipment.len())
        })
        .collect();
    for caller in callers {
        assert_eq!(caller.join().unwrap(), ids.len());
    }
    assert_eq!(rt.network().equipment_count(), ids.len());
}

#[test]
fn trace_errors_are_returned_through_the_handle() {
    let (net, _) = feeder(2);
    let rt = TraceRuntime::start(Arc::new(net), Arc::new(NetworkState::new()), &TraceRuntimeConfig::default()).unwrap();

    let err = rt
        .trace(TraceStart::Equipment(EquipmentId::new(500)), TraceConfig::default())
        .unwrap_err();
    assert!(err.is_graph());
    assert!(!matches!(err, TraceError::Execution(ExecutionError::Disconnected)));
}

#[test]
fn runtime_config_is_validated_on_submit() {
    let (net, ids) = feeder(2);
    let rt = TraceRuntime::start(Arc::new(net), Arc::new(NetworkState::new()), &TraceRuntimeConfig::default()).unwrap();
    let config = TraceConfig::default().with_stop_at_open(false, Some(SinglePhaseKind::A));
    let err = rt.submit(TraceStart::Equipment(ids[0]), config).unwrap_err();
    assert!(err.is_validation());
}
