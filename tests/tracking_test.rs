use hvc_fusion::tracker::EstimationGate;
use hvc_fusion::{
    EstimatorKind, EstimatorState, ExecFlags, FrameResult, FrameResultBuilder, Stabilizer, Tier,
    TrackerAdapter, TrackerConfig,
};

fn body_frame(bodies: &[(i16, i16, i16, i16)]) -> FrameResult {
    bodies
        .iter()
        .fold(FrameResultBuilder::new().executed(ExecFlags::BODY), |b, &(x, y, s, c)| {
            b.body(x, y, s, c)
        })
        .build()
        .unwrap()
}

fn age_frame(age: i8, confidence: i32) -> FrameResult {
    FrameResultBuilder::new()
        .face(200, 150, 80, 900)
        .age(age, confidence)
        .gender(-128, 0)
        .build()
        .unwrap()
}

#[test]
fn test_basic_tracking() {
    let mut stabilizer = Stabilizer::new(TrackerConfig::default()).unwrap();

    // Frame 1: one confident body starts a confirmed track
    let frame = body_frame(&[(150, 150, 100, 900)]);
    let out1 = stabilizer.execute(frame.executed(), &frame).unwrap();
    assert_eq!(out1.body_count(), 1);
    let id1 = out1.bodies[0].track_id;

    // Frame 2: same body moved slightly, listed second
    let frame = body_frame(&[(600, 400, 100, 900), (155, 155, 100, 900)]);
    let out2 = stabilizer.execute(frame.executed(), &frame).unwrap();
    assert_eq!(out2.body_track_id(1), Some(id1));

    // Frame 3: low score, recovered by the second association
    let frame = body_frame(&[(160, 160, 100, 200)]);
    let out3 = stabilizer.execute(frame.executed(), &frame).unwrap();
    assert_eq!(out3.body_track_id(0), Some(id1));

    // Frame 4: body disappears
    let frame = body_frame(&[]);
    let out4 = stabilizer.execute(frame.executed(), &frame).unwrap();
    assert_eq!(out4.body_count(), 0);

    // Frame 5: body reappears within retry_count
    let frame = body_frame(&[(165, 165, 100, 900)]);
    let out5 = stabilizer.execute(frame.executed(), &frame).unwrap();
    assert_eq!(out5.body_count(), 1);
    assert_eq!(out5.bodies[0].track_id, id1);
}

#[test]
fn test_lost_beyond_retry_count_gets_new_id() {
    let config = TrackerConfig::default();
    let retry_count = config.retry_count;
    let mut stabilizer = Stabilizer::new(config).unwrap();

    let frame = body_frame(&[(150, 150, 100, 900)]);
    let first = stabilizer.execute(frame.executed(), &frame).unwrap().bodies[0].track_id;

    for _ in 0..=retry_count {
        let empty = body_frame(&[]);
        stabilizer.execute(empty.executed(), &empty).unwrap();
    }

    // New track needs a second frame to be confirmed
    let frame = body_frame(&[(150, 150, 100, 900)]);
    assert_eq!(stabilizer.execute(frame.executed(), &frame).unwrap().body_count(), 0);
    let out = stabilizer.execute(frame.executed(), &frame).unwrap();
    assert_eq!(out.body_count(), 1);
    assert_ne!(out.bodies[0].track_id, first);
}

#[test]
fn test_age_tier_progression() {
    let mut config = TrackerConfig::default();
    config.property = EstimationGate {
        frame_count: 3,
        ..EstimationGate::default()
    };
    let mut stabilizer = Stabilizer::new(config).unwrap();

    let mut tiers = Vec::new();
    for age in [30, 32, 31, 50] {
        let frame = age_frame(age, 500);
        let out = stabilizer.execute(frame.executed(), &frame).unwrap();
        assert_eq!(out.face_count(), 1);
        let face = &out.faces[0];
        // Sentinel gender never accumulates
        assert_eq!(face.estimator(EstimatorKind::Gender), Some(&EstimatorState::pending()));
        tiers.push(*face.estimator(EstimatorKind::Age).unwrap());
    }

    assert_eq!(tiers[0].tier, Tier::InProgress);
    assert_eq!(tiers[1].tier, Tier::InProgress);
    assert_eq!(tiers[2], EstimatorState::complete(31));
    // Complete stays put
    assert_eq!(tiers[3], EstimatorState::complete(31));
}

#[test]
fn test_low_confidence_age_stays_pending() {
    let mut stabilizer = Stabilizer::new(TrackerConfig::default()).unwrap();
    let frame = age_frame(30, 100);
    let out = stabilizer.execute(frame.executed(), &frame).unwrap();
    assert_eq!(out.faces[0].estimator(EstimatorKind::Age).unwrap().tier, Tier::Pending);
}

#[test]
fn test_turned_face_rejected_by_angle_gate() {
    let mut stabilizer = Stabilizer::new(TrackerConfig::default()).unwrap();
    let frame = FrameResultBuilder::new()
        .face(200, 150, 80, 900)
        .direction(45, 0, 0, 800)
        .age(30, 900)
        .build()
        .unwrap();
    let out = stabilizer.execute(frame.executed(), &frame).unwrap();
    assert_eq!(out.faces[0].estimator(EstimatorKind::Age).unwrap().tier, Tier::Pending);
}

#[test]
fn test_finalize_resets_ids() {
    let mut stabilizer = Stabilizer::new(TrackerConfig::default()).unwrap();
    let frame = body_frame(&[(150, 150, 100, 900), (500, 150, 100, 900)]);
    let out = stabilizer.execute(frame.executed(), &frame).unwrap();
    assert_eq!(out.body_count(), 2);

    stabilizer.finalize();

    let frame = body_frame(&[(500, 150, 100, 900)]);
    let out = stabilizer.execute(frame.executed(), &frame).unwrap();
    assert_eq!(out.bodies[0].track_id, 0);
}

#[test]
fn test_unstabilized_kinds_are_not_reported() {
    let mut config = TrackerConfig::default();
    config.functions = hvc_fusion::StabilizeFlags::BODY;
    let mut stabilizer = Stabilizer::new(config).unwrap();

    let frame = FrameResultBuilder::new()
        .body(150, 150, 100, 900)
        .face(300, 150, 80, 900)
        .build()
        .unwrap();
    let out = stabilizer.execute(frame.executed(), &frame).unwrap();
    assert_eq!(out.body_count(), 1);
    assert_eq!(out.face_count(), 0);
}
