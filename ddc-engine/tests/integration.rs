//! Integration tests for the transaction engine and registry.
//!
//! All tests run against `FakeMonitor`, a transport double that speaks
//! real DDC/CI wire bytes: it decodes the frames the engine writes,
//! answers gets from an internal feature table, and applies sets to it.
//! Fault injection (timed-out reads, empty reads, corrupted replies) is
//! scripted per test.

use ddc_engine::{
    DdcError, DdcTransport, DisplayHandle, DisplayInfo, DisplayRegistry, EngineConfig,
    TransactionEngine,
};
use ddc_protocol::frame::{self, Request};
use ddc_protocol::{FeatureCode, FrameError, VcpValue};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeState {
    displays: Vec<DisplayInfo>,
    features: HashMap<(u32, u8), VcpValue>,
    pending: HashMap<u32, Vec<u8>>,
    scripted_reply: Option<Vec<u8>>,
    failing_reads: u32,
    empty_reads: u32,
    corrupt_replies: u32,
    discovery_unavailable: bool,
    list_calls: u32,
    writes: u32,
    reads: u32,
    ops: Vec<(u32, char)>,
}

struct FakeMonitor {
    state: Mutex<FakeState>,
}

impl FakeMonitor {
    fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
        }
    }

    fn add_display(&self, id: u32, name: &str) {
        self.state.lock().unwrap().displays.push(DisplayInfo {
            handle: DisplayHandle(id),
            name: name.to_string(),
        });
    }

    fn set_feature(&self, id: u32, code: FeatureCode, current: u16, maximum: u16) {
        self.state
            .lock()
            .unwrap()
            .features
            .insert((id, code.raw()), VcpValue::new(current, maximum));
    }

    fn feature(&self, id: u32, code: FeatureCode) -> Option<VcpValue> {
        self.state
            .lock()
            .unwrap()
            .features
            .get(&(id, code.raw()))
            .copied()
    }

    fn fail_reads(&self, n: u32) {
        self.state.lock().unwrap().failing_reads = n;
    }

    fn empty_reads(&self, n: u32) {
        self.state.lock().unwrap().empty_reads = n;
    }

    fn corrupt_replies(&self, n: u32) {
        self.state.lock().unwrap().corrupt_replies = n;
    }

    fn script_reply(&self, bytes: Vec<u8>) {
        self.state.lock().unwrap().scripted_reply = Some(bytes);
    }

    fn make_discovery_unavailable(&self) {
        self.state.lock().unwrap().discovery_unavailable = true;
    }

    fn writes(&self) -> u32 {
        self.state.lock().unwrap().writes
    }

    fn reads(&self) -> u32 {
        self.state.lock().unwrap().reads
    }

    fn list_calls(&self) -> u32 {
        self.state.lock().unwrap().list_calls
    }

    fn ops_for(&self, id: u32) -> Vec<char> {
        self.state
            .lock()
            .unwrap()
            .ops
            .iter()
            .filter(|(h, _)| *h == id)
            .map(|(_, op)| *op)
            .collect()
    }
}

impl DdcTransport for FakeMonitor {
    fn list_displays(&self) -> Result<Vec<DisplayInfo>, DdcError> {
        let mut state = self.state.lock().unwrap();
        if state.discovery_unavailable {
            return Err(DdcError::DiscoveryUnavailable("permission denied".into()));
        }
        state.list_calls += 1;
        Ok(state.displays.clone())
    }

    fn write(&self, handle: DisplayHandle, bytes: &[u8]) -> Result<(), DdcError> {
        let mut state = self.state.lock().unwrap();
        if !state.displays.iter().any(|d| d.handle == handle) {
            return Err(DdcError::InvalidHandle(handle));
        }
        state.writes += 1;
        state.ops.push((handle.0, 'w'));

        match frame::decode_request(bytes).expect("engine wrote an invalid frame") {
            Request::Get { feature } => {
                let reply = match state.features.get(&(handle.0, feature.raw())) {
                    Some(value) => frame::encode_get_reply(feature, *value),
                    None => frame::encode_unsupported_reply(feature),
                };
                state.pending.insert(handle.0, reply);
            }
            Request::Set { feature, value } => {
                let maximum = state
                    .features
                    .get(&(handle.0, feature.raw()))
                    .map(|v| v.maximum)
                    .unwrap_or(0);
                state
                    .features
                    .insert((handle.0, feature.raw()), VcpValue::new(value, maximum));
            }
        }
        Ok(())
    }

    fn read(&self, handle: DisplayHandle, len: usize) -> Result<Vec<u8>, DdcError> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        state.ops.push((handle.0, 'r'));

        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(DdcError::Transport(io::Error::from(io::ErrorKind::TimedOut)));
        }
        if state.empty_reads > 0 {
            state.empty_reads -= 1;
            return Ok(Vec::new());
        }
        if let Some(scripted) = state.scripted_reply.take() {
            return Ok(scripted);
        }

        let mut reply = state.pending.remove(&handle.0).unwrap_or_default();
        if state.corrupt_replies > 0 && reply.len() > 9 {
            state.corrupt_replies -= 1;
            reply[9] ^= 0xFF;
        }
        reply.truncate(len);
        Ok(reply)
    }
}

fn test_config() -> EngineConfig {
    EngineConfig {
        settle_delay_ms: 1,
        inter_command_delay_ms: 1,
        max_retries: 2,
        io_timeout_ms: 50,
    }
}

fn setup() -> (Arc<FakeMonitor>, TransactionEngine) {
    let fake = Arc::new(FakeMonitor::new());
    fake.add_display(1, "Dell U2412");
    fake.set_feature(1, FeatureCode::BRIGHTNESS, 50, 100);
    let engine = TransactionEngine::new(fake.clone(), test_config());
    (fake, engine)
}

#[tokio::test]
async fn get_reads_feature_value() {
    let (fake, engine) = setup();

    let value = engine
        .get(DisplayHandle(1), FeatureCode::BRIGHTNESS)
        .await
        .unwrap();

    assert_eq!(value, VcpValue::new(50, 100));
    assert_eq!(fake.writes(), 1);
    assert_eq!(fake.reads(), 1);
}

#[tokio::test]
async fn set_then_get_reflects_value() {
    let (fake, engine) = setup();

    engine
        .set(DisplayHandle(1), FeatureCode::BRIGHTNESS, 75)
        .await
        .unwrap();
    let value = engine
        .get(DisplayHandle(1), FeatureCode::BRIGHTNESS)
        .await
        .unwrap();

    assert_eq!(value.current, 75);
    assert_eq!(fake.feature(1, FeatureCode::BRIGHTNESS).unwrap().current, 75);
}

#[tokio::test]
async fn transport_fault_retried_within_bound() {
    let (fake, engine) = setup();
    fake.fail_reads(2);

    let value = engine
        .get(DisplayHandle(1), FeatureCode::BRIGHTNESS)
        .await
        .unwrap();

    assert_eq!(value, VcpValue::new(50, 100));
    // Two failed attempts plus the successful third
    assert_eq!(fake.reads(), 3);
    assert_eq!(fake.writes(), 3);
}

#[tokio::test]
async fn retries_exhausted_surfaces_transport_fault() {
    let (fake, engine) = setup();
    fake.fail_reads(3);

    let err = engine
        .get(DisplayHandle(1), FeatureCode::BRIGHTNESS)
        .await
        .unwrap_err();

    assert!(matches!(err, DdcError::Transport(_)));
    assert_eq!(fake.reads(), 3);
}

#[tokio::test]
async fn empty_read_is_retried() {
    let (fake, engine) = setup();
    fake.empty_reads(1);

    let value = engine
        .get(DisplayHandle(1), FeatureCode::BRIGHTNESS)
        .await
        .unwrap();

    assert_eq!(value, VcpValue::new(50, 100));
    assert_eq!(fake.reads(), 2);
}

#[tokio::test]
async fn checksum_mismatch_retried() {
    let (fake, engine) = setup();
    fake.corrupt_replies(1);

    let value = engine
        .get(DisplayHandle(1), FeatureCode::BRIGHTNESS)
        .await
        .unwrap();

    assert_eq!(value, VcpValue::new(50, 100));
    assert_eq!(fake.reads(), 2);
}

#[tokio::test]
async fn unsupported_feature_not_retried() {
    let (fake, engine) = setup();

    let err = engine
        .get(DisplayHandle(1), FeatureCode(0xE1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DdcError::Frame(FrameError::UnsupportedFeature(0xE1))
    ));
    assert_eq!(fake.reads(), 1);
    assert_eq!(fake.writes(), 1);
}

#[tokio::test]
async fn malformed_reply_not_retried() {
    let (fake, engine) = setup();

    // Structurally wrong opcode but a valid checksum: decodes as
    // malformed, not as line noise.
    let mut bad = frame::encode_get_reply(FeatureCode::BRIGHTNESS, VcpValue::new(50, 100));
    bad[2] = 0x07;
    let body_len = bad.len() - 1;
    bad[body_len] = frame::checksum(frame::REPLY_DESTINATION, &bad[..body_len]);
    fake.script_reply(bad);

    let err = engine
        .get(DisplayHandle(1), FeatureCode::BRIGHTNESS)
        .await
        .unwrap_err();

    assert!(matches!(err, DdcError::Frame(FrameError::MalformedReply(_))));
    assert_eq!(fake.reads(), 1);
}

#[tokio::test]
async fn invalid_handle_not_retried() {
    let (fake, engine) = setup();

    let err = engine
        .get(DisplayHandle(9), FeatureCode::BRIGHTNESS)
        .await
        .unwrap_err();

    assert!(matches!(err, DdcError::InvalidHandle(DisplayHandle(9))));
    assert_eq!(fake.reads(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_handle_transactions_never_interleave() {
    let (fake, engine) = setup();
    let engine = Arc::new(engine);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine
                .get(DisplayHandle(1), FeatureCode::BRIGHTNESS)
                .await
                .unwrap()
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // With no faults injected, a serialized bus shows strictly
    // alternating write/read pairs; any 'ww' or 'rr' run means two
    // transactions interleaved.
    let ops = fake.ops_for(1);
    assert_eq!(ops.len(), 16);
    for pair in ops.chunks(2) {
        assert_eq!(pair, &['w', 'r'][..]);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_handles_proceed_independently() {
    let (fake, engine) = setup();
    fake.add_display(2, "");
    fake.set_feature(2, FeatureCode::CONTRAST, 40, 100);
    let engine = Arc::new(engine);

    let a = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.get(DisplayHandle(1), FeatureCode::BRIGHTNESS).await })
    };
    let b = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.get(DisplayHandle(2), FeatureCode::CONTRAST).await })
    };

    assert_eq!(a.await.unwrap().unwrap(), VcpValue::new(50, 100));
    assert_eq!(b.await.unwrap().unwrap(), VcpValue::new(40, 100));
}

#[tokio::test]
async fn selector_feature_with_zero_maximum() {
    let (fake, engine) = setup();
    fake.set_feature(1, FeatureCode::INPUT_SELECT, 17, 0);

    let value = engine
        .get(DisplayHandle(1), FeatureCode::INPUT_SELECT)
        .await
        .unwrap();

    assert_eq!(value, VcpValue::new(17, 0));
}

#[test]
fn discovery_returns_fresh_snapshot() {
    let fake = Arc::new(FakeMonitor::new());
    fake.add_display(1, "Dell U2412");
    let registry = DisplayRegistry::new(fake.clone());

    let monitors = registry.discover().unwrap();
    assert_eq!(monitors.len(), 1);
    assert_eq!(monitors[0].name, "Dell U2412");

    // Hot-plug between calls shows up in the next snapshot
    fake.add_display(2, "");
    let monitors = registry.discover().unwrap();
    assert_eq!(monitors.len(), 2);
    assert_eq!(monitors[1].id, DisplayHandle(2));
    assert_eq!(monitors[1].name, "");
}

#[test]
fn discovery_unavailable_is_distinct_from_empty() {
    let fake = Arc::new(FakeMonitor::new());
    let registry = DisplayRegistry::new(fake.clone());

    // No displays: valid empty snapshot
    assert!(registry.discover().unwrap().is_empty());

    fake.make_discovery_unavailable();
    let err = registry.discover().unwrap_err();
    assert!(matches!(err, DdcError::DiscoveryUnavailable(_)));
}

#[test]
fn resolve_unknown_handle_without_bus_traffic() {
    let fake = Arc::new(FakeMonitor::new());
    fake.add_display(1, "Dell U2412");
    let registry = DisplayRegistry::new(fake.clone());

    registry.discover().unwrap();
    let err = registry.resolve(DisplayHandle(99)).unwrap_err();

    assert!(matches!(err, DdcError::InvalidHandle(DisplayHandle(99))));
    // Only the explicit discovery touched the transport; the failed
    // resolve generated no enumeration and no bus traffic.
    assert_eq!(fake.list_calls(), 1);
    assert_eq!(fake.writes(), 0);
    assert_eq!(fake.reads(), 0);
}

#[test]
fn resolve_before_discovery_enumerates_once() {
    let fake = Arc::new(FakeMonitor::new());
    fake.add_display(1, "Dell U2412");
    let registry = DisplayRegistry::new(fake.clone());

    assert_eq!(registry.resolve(DisplayHandle(1)).unwrap(), DisplayHandle(1));
    assert_eq!(fake.list_calls(), 1);
}
