use mbna::{ArbiterConfig, BeliefStatus, CyclePhase, Pipeline, ReasonCode, SensorFrame};

/// GPS and air data agree on a 10 m/s eastbound track for five seconds,
/// then the GPS fix is spoofed 300 m north.
const SPOOFED_TRACK: &str = r#"
{"timestamp": 0.0, "gps": {"position": [0.0, 0.0], "hdop": 1.0, "satellites": 9}, "air_data": {"velocity": [10.0, 0.0]}}
{"timestamp": 1.0, "gps": {"position": [10.0, 0.0], "hdop": 1.0, "satellites": 9}, "air_data": {"velocity": [10.0, 0.0]}}
{"timestamp": 2.0, "gps": {"position": [20.0, 0.0], "hdop": 1.0, "satellites": 9}, "air_data": {"velocity": [10.0, 0.0]}}
{"timestamp": 3.0, "gps": {"position": [30.0, 0.0], "satellites": 9}, "air_data": {"velocity": [10.0, 0.0]}}
{"timestamp": 4.0, "gps": {"position": [40.0, 0.0], "satellites": 9}, "air_data": {"velocity": [10.0, 0.0]}}
{"timestamp": 5.0, "gps": {"position": [50.0, 300.0], "satellites": 9}, "air_data": {"velocity": [10.0, 0.0]}}
"#;

fn frames() -> Vec<SensorFrame> {
    SPOOFED_TRACK
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn consistent_sources_select_gps_then_spoof_is_refused() {
    let mut pipeline = Pipeline::standard(ArbiterConfig::default()).unwrap();
    let frames = frames();
    let (clean, spoofed) = frames.split_at(5);

    for frame in clean {
        let report = pipeline.process(frame).unwrap();
        assert_eq!(report.phase, CyclePhase::Accepted, "t={}", frame.timestamp);
        assert_eq!(report.decision.usable_selection(), Some("gps"));
        assert_eq!(report.decision.statuses["dead_reckoning"], BeliefStatus::Trusted);
    }

    let report = pipeline.process(&spoofed[0]).unwrap();
    assert_eq!(report.phase, CyclePhase::Refused);
    assert!(report.decision.nav_unsafe);
    assert_eq!(report.decision.reason, ReasonCode::TrustBelowMinimum);
    assert!(report.innovations["gps"] > 20.0);
    assert!(report.scores["gps"].get("temporal_smoothness").unwrap() > 0.0);
    assert!(report.scores["gps"].get("cross_belief_coherence").unwrap() > 0.0);
}

#[test]
fn replay_is_deterministic() {
    let run = || {
        let mut pipeline = Pipeline::standard(ArbiterConfig::default()).unwrap();
        frames()
            .iter()
            .map(|f| pipeline.process(f).unwrap().decision)
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn reset_replays_identically() {
    let mut pipeline = Pipeline::standard(ArbiterConfig::default()).unwrap();
    let first: Vec<_> = frames().iter().map(|f| pipeline.process(f).unwrap().decision).collect();
    pipeline.reset();
    let second: Vec<_> = frames().iter().map(|f| pipeline.process(f).unwrap().decision).collect();
    assert_eq!(first, second);
}

#[test]
fn config_file_tunes_the_pipeline() {
    let cfg = ArbiterConfig::from_toml_str(
        r#"
        trust_min = 0.96
        innovation_threshold = 50.0
        "#,
    )
    .unwrap();
    let mut pipeline = Pipeline::standard(cfg).unwrap();
    let report = pipeline.process(&frames()[0]).unwrap();

    // 0.95 GPS confidence can never clear a 0.96 floor
    assert!(report.decision.nav_unsafe);
    assert_eq!(report.decision.selected.as_deref(), Some("gps"));
}

#[test]
fn dead_reckoning_advances_after_reset() {
    let dr_x = |pipeline: &mut Pipeline| {
        frames()[..5]
            .iter()
            .map(|f| {
                let report = pipeline.process(f).unwrap();
                let dr = report.beliefs.iter().find(|b| b.belief_id() == "dead_reckoning").unwrap();
                dr.position()[0]
            })
            .collect::<Vec<_>>()
    };
    let mut pipeline = Pipeline::standard(ArbiterConfig::default()).unwrap();
    let first = dr_x(&mut pipeline);
    pipeline.reset();
    let second = dr_x(&mut pipeline);

    assert_eq!(first, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
    assert_eq!(first, second);
}
