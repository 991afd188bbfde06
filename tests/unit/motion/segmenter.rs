use super::*;
use crate::host::memory::MemoryHost;

const EPS: f64 = 1e-6;

fn seg(fps: f64) -> MotionSegmenter {
    MotionSegmenter::new(fps, &EngineSettings::default()).unwrap()
}

/// Piecewise-linear track through `(time, x, y)` points.
fn track(points: &[(f64, f64, f64)]) -> (Vec<f64>, impl FnMut(f64) -> KitResult<Vec2> + '_) {
    let times = points.iter().map(|p| p.0).collect();
    let sample = move |t: f64| -> KitResult<Vec2> {
        let idx = points.partition_point(|p| p.0 <= t);
        if idx == 0 {
            return Ok(Vec2::new(points[0].1, points[0].2));
        }
        if idx >= points.len() {
            let p = points[points.len() - 1];
            return Ok(Vec2::new(p.1, p.2));
        }
        let (a, b) = (points[idx - 1], points[idx]);
        let u = (t - a.0) / (b.0 - a.0);
        Ok(Vec2::new(a.1 + (b.1 - a.1) * u, a.2 + (b.2 - a.2) * u))
    };
    (times, sample)
}

#[test]
fn single_slide_is_one_transition() {
    let points = [(1.0, 0.0, 0.0), (1.5, -200.0, 0.0)];
    let (times, sample) = track(&points);
    let out = seg(30.0).segment(&times, sample).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].index, 1);
    assert!((out[0].start - 1.0).abs() < EPS);
    assert!((out[0].end - 1.5).abs() < EPS);
}

#[test]
fn pause_longer_than_gap_splits_transitions() {
    let points = [
        (0.0, 0.0, 0.0),
        (0.5, -200.0, 0.0),
        (2.0, -200.0, 0.0),
        (2.5, -200.0, 150.0),
    ];
    let (times, sample) = track(&points);
    let out = seg(30.0).segment(&times, sample).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!((out[0].index, out[1].index), (1, 2));
    assert!((out[0].start - 0.0).abs() < EPS);
    assert!((out[0].end - 0.5).abs() < EPS);
    assert!((out[1].start - 2.0).abs() < EPS);
    assert!((out[1].end - 2.5).abs() < EPS);
}

#[test]
fn short_pause_stays_in_one_transition() {
    // One frame of rest at 30 fps keeps the movement gap well under 0.1s.
    let points = [
        (0.0, 0.0, 0.0),
        (0.5, -100.0, 0.0),
        (0.5 + 1.0 / 30.0, -100.0, 0.0),
        (1.0, -200.0, 0.0),
    ];
    let (times, sample) = track(&points);
    let out = seg(30.0).segment(&times, sample).unwrap();
    assert_eq!(out.len(), 1);
}

#[test]
fn output_is_ordered_and_disjoint() {
    let points = [
        (0.0, 0.0, 0.0),
        (0.3, 10.0, 0.0),
        (0.9, 10.0, 0.0),
        (1.1, 30.0, 0.0),
        (1.5, 30.0, 0.0),
        (1.6, 30.0, 40.0),
    ];
    let (times, sample) = track(&points);
    let out = seg(24.0).segment(&times, sample).unwrap();
    assert_eq!(out.len(), 3);
    for (i, w) in out.windows(2).enumerate() {
        assert_eq!(w[0].index as usize, i + 1);
        assert!(w[0].start <= w[0].end);
        assert!(w[0].end <= w[1].start, "{:?} overlaps {:?}", w[0], w[1]);
    }
}

#[test]
fn low_frame_rates_never_overlap() {
    // At 5 fps every moving frame is a gap-sized step; neighbours may only abut.
    let points = [(0.0, 0.0, 0.0), (2.0, 400.0, 0.0)];
    let (times, sample) = track(&points);
    let out = seg(5.0).segment(&times, sample).unwrap();
    assert!(out.len() > 1);
    for w in out.windows(2) {
        assert!(w[0].end <= w[1].start + EPS);
    }
}

#[test]
fn segmentation_is_deterministic() {
    let points = [
        (0.0, 0.0, 0.0),
        (0.5, -200.0, 0.0),
        (3.0, -200.0, 0.0),
        (3.5, 0.0, 0.0),
    ];
    let (times, sample_a) = track(&points);
    let (_, sample_b) = track(&points);
    let a = seg(29.97).segment(&times, sample_a).unwrap();
    let b = seg(29.97).segment(&times, sample_b).unwrap();
    assert_eq!(a, b);
}

#[test]
fn still_track_falls_back_to_key_range() {
    let points = [(1.0, 5.0, 5.0), (2.0, 5.0, 5.0)];
    let (times, sample) = track(&points);
    let out = seg(30.0).segment(&times, sample).unwrap();
    assert_eq!(
        out,
        vec![Transition {
            index: 1,
            start: 1.0,
            end: 2.0
        }]
    );
}

#[test]
fn sub_tolerance_jitter_is_ignored() {
    let points = [(0.0, 0.0, 0.0), (1.0, 0.00005, 0.0)];
    let (times, sample) = track(&points);
    let out = seg(30.0).segment(&times, sample).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!((out[0].start, out[0].end), (0.0, 1.0));
}

#[test]
fn fewer_than_two_keys() {
    let s = seg(30.0);
    assert!(s.segment(&[], |_| Ok(Vec2::ZERO)).unwrap().is_empty());
    let one = s.segment(&[0.75], |_| Ok(Vec2::ZERO)).unwrap();
    assert_eq!(
        one,
        vec![Transition {
            index: 1,
            start: 0.75,
            end: 0.75
        }]
    );
}

#[test]
fn bounds_span_first_to_last_movement() {
    let points = [
        (0.0, 0.0, 0.0),
        (0.5, 0.0, 0.0),
        (1.0, 100.0, 0.0),
        (2.0, 100.0, 0.0),
        (2.5, 0.0, 0.0),
        (3.0, 0.0, 0.0),
    ];
    let (times, sample) = track(&points);
    let w = seg(30.0).bounds(&times, sample).unwrap().unwrap();
    assert!((w.start - 0.5).abs() < EPS);
    assert!((w.end - 2.5).abs() < EPS);
}

#[test]
fn rejects_bad_frame_rate() {
    assert!(MotionSegmenter::new(0.0, &EngineSettings::default()).is_err());
}

#[test]
fn segments_a_host_layer() {
    let mut host = MemoryHost::with_composition("Main", 30.0, 786, 600);
    let l = host.add_layer("ctl").unwrap();
    host.set_position_at(l, 0.0, Vec2::new(0.0, 0.0)).unwrap();
    host.set_position_at(l, 0.5, Vec2::new(-200.0, 0.0)).unwrap();
    let comp = host.active_composition().unwrap();
    let out = segment_layer(&host, l, &comp, &EngineSettings::default()).unwrap();
    assert_eq!(out.len(), 1);
    assert!((out[0].end - 0.5).abs() < EPS);
    assert!((out[0].midpoint() - 0.25).abs() < EPS);
}
