use super::*;

#[test]
fn window_contains_boundaries() {
    let w = TimeWindow::new(1.0, 1.5).unwrap();
    assert!(!w.contains(0.999));
    assert!(w.contains(1.0));
    assert!(w.contains(1.5));
    assert!(!w.contains(1.501));
    assert!(w.contains_with_tolerance(1.5009, 0.001));
}

#[test]
fn window_rejects_inverted_bounds() {
    assert!(TimeWindow::new(2.0, 1.0).is_err());
    assert!(TimeWindow::new(f64::NAN, 1.0).is_err());
}

#[test]
fn window_overlap_is_inclusive() {
    let a = TimeWindow::new(0.0, 0.5).unwrap();
    assert!(a.overlaps(TimeWindow::new(0.5, 1.0).unwrap()));
    assert!(a.overlaps(TimeWindow::new(-1.0, 2.0).unwrap()));
    assert!(TimeWindow::new(0.1, 0.2).unwrap().overlaps(a));
    assert!(!a.overlaps(TimeWindow::new(0.51, 1.0).unwrap()));
}

#[test]
fn direction_from_dominant_axis() {
    assert_eq!(Direction::from_delta(Vec2::new(-200.0, 0.0)), Direction::Left);
    assert_eq!(Direction::from_delta(Vec2::new(0.0, 150.0)), Direction::Down);
    assert_eq!(Direction::from_delta(Vec2::new(30.0, -10.0)), Direction::Right);
    assert_eq!(Direction::from_delta(Vec2::new(5.0, -10.0)), Direction::Up);
}

#[test]
fn direction_parses_case_insensitively() {
    assert_eq!("Left".parse::<Direction>().unwrap(), Direction::Left);
    assert_eq!(" down ".parse::<Direction>().unwrap(), Direction::Down);
    assert!("diagonal".parse::<Direction>().is_err());
}

#[test]
fn fade_kind_serde_names_match_caller_vocabulary() {
    assert_eq!(
        serde_json::to_string(&FadeKind::Exit).unwrap(),
        "\"fadeOut\""
    );
    let k: FadeKind = serde_json::from_str("\"fadeIn\"").unwrap();
    assert_eq!(k, FadeKind::Enter);
    assert_eq!(FadeKind::Exit.values(), (100.0, 0.0));
}

#[test]
fn ms_formatting_rounds() {
    assert_eq!(format_ms(0.25), "250ms");
    assert_eq!(format_ms(1.0 / 3.0), "333ms");
}
