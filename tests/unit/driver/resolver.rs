use super::*;
use crate::{
    driver::naming::link_formula,
    foundation::core::LabelColor,
    host::memory::MemoryHost,
};

const CTL: &str = "Slide and fade - Controller";

struct Fixture {
    host: MemoryHost,
    ctl: LayerId,
    layer: LayerId,
    settings: EngineSettings,
    log: DiagnosticLog,
}

fn fixture() -> Fixture {
    let mut host = MemoryHost::with_composition("Main", 30.0, 786, 600);
    let layer = host.add_layer("Title").unwrap();
    let ctl = host.add_layer(CTL).unwrap();
    host.select(layer, true).unwrap();
    Fixture {
        host,
        ctl,
        layer,
        settings: EngineSettings::default(),
        log: DiagnosticLog::new(),
    }
}

fn window(start: f64, end: f64) -> TimeWindow {
    TimeWindow::new(start, end).unwrap()
}

fn request<'a>(
    ctl: LayerId,
    selected: &'a [LayerId],
    kind: FadeKind,
    update: bool,
) -> DriverRequest<'a> {
    DriverRequest {
        controller: ctl,
        controller_name: CTL,
        transition: 1,
        kind,
        update,
        window: window(0.0, 0.5),
        fade: window(0.0, 0.25),
        selected,
    }
}

fn add_tagged(f: &mut Fixture, name: &str, kind: FadeKind, start: f64, end: f64) {
    f.host.add_driver(f.ctl, name).unwrap();
    let settings = f.settings.clone();
    write_fade_keys(
        &mut f.host,
        f.ctl,
        name,
        kind,
        window(start, end),
        &settings,
        &mut f.log,
    )
    .unwrap();
}

fn key(time: f64, value: f64) -> ScalarKey {
    ScalarKey {
        time,
        value,
        label: LabelColor::NONE,
    }
}

#[test]
fn creates_first_driver_with_next_opacity_number() {
    let mut f = fixture();
    let selected = [f.layer];
    let req = request(f.ctl, &selected, FadeKind::Exit, false);
    let res = resolve_driver(&mut f.host, &req, &f.settings, &mut f.log).unwrap();
    assert_eq!(res.driver, "Transition 1 - Opacity 1");
    assert_eq!(res.source, DriverSource::Created);
    assert!(res.write_keys);
    assert_eq!(f.host.drivers(f.ctl).unwrap(), ["Transition 1 - Opacity 1"]);
}

#[test]
fn layer_link_is_reused_across_kinds() {
    let mut f = fixture();
    add_tagged(&mut f, "Transition 1 - Opacity 1", FadeKind::Exit, 0.0, 0.25);
    f.host
        .set_opacity_formula(f.layer, &link_formula(CTL, "Transition 1 - Opacity 1"))
        .unwrap();

    let selected = [f.layer];
    let req = request(f.ctl, &selected, FadeKind::Enter, true);
    let res = resolve_driver(&mut f.host, &req, &f.settings, &mut f.log).unwrap();
    assert_eq!(res.source, DriverSource::LayerLink);
    assert_eq!(res.driver, "Transition 1 - Opacity 1");
    assert!(res.write_keys);
    assert_eq!(f.host.drivers(f.ctl).unwrap().len(), 1);
}

#[test]
fn layer_link_with_fade_present_skips_key_writes() {
    let mut f = fixture();
    add_tagged(&mut f, "Transition 1 - Opacity 1", FadeKind::Exit, 0.0, 0.25);
    f.host
        .set_opacity_formula(f.layer, &link_formula(CTL, "Transition 1 - Opacity 1"))
        .unwrap();

    let selected = [f.layer];
    let req = request(f.ctl, &selected, FadeKind::Exit, true);
    let res = resolve_driver(&mut f.host, &req, &f.settings, &mut f.log).unwrap();
    assert_eq!(res.source, DriverSource::LayerLink);
    assert!(!res.write_keys);
}

#[test]
fn requested_kind_link_wins_over_other_links() {
    let mut f = fixture();
    let other = f.host.add_layer("Subtitle").unwrap();
    f.host.select(other, true).unwrap();
    add_tagged(&mut f, "Transition 1 - Opacity 1", FadeKind::Exit, 0.0, 0.25);
    add_tagged(&mut f, "Transition 1 - Opacity 2", FadeKind::Enter, 0.0, 0.25);
    f.host
        .set_opacity_formula(f.layer, &link_formula(CTL, "Transition 1 - Opacity 1"))
        .unwrap();
    f.host
        .set_opacity_formula(other, &link_formula(CTL, "Transition 1 - Opacity 2"))
        .unwrap();

    let selected = [f.layer, other];
    let req = request(f.ctl, &selected, FadeKind::Enter, true);
    let res = resolve_driver(&mut f.host, &req, &f.settings, &mut f.log).unwrap();
    assert_eq!(res.driver, "Transition 1 - Opacity 2");
}

#[test]
fn key_tag_signal_only_runs_in_update_mode() {
    let mut f = fixture();
    add_tagged(&mut f, "Transition 1 - Opacity 1", FadeKind::Exit, 0.0, 0.25);
    let selected = [f.layer];

    let req = request(f.ctl, &selected, FadeKind::Exit, true);
    let res = resolve_driver(&mut f.host, &req, &f.settings, &mut f.log).unwrap();
    assert_eq!(res.source, DriverSource::KeyTag);
    assert_eq!(res.driver, "Transition 1 - Opacity 1");
    assert!(!res.write_keys);

    let req = request(f.ctl, &selected, FadeKind::Exit, false);
    let res = resolve_driver(&mut f.host, &req, &f.settings, &mut f.log).unwrap();
    assert_eq!(res.source, DriverSource::Created);
    assert_eq!(res.driver, "Transition 1 - Opacity 2");
}

#[test]
fn key_tag_signal_ignores_other_kind_and_other_windows() {
    let mut f = fixture();
    add_tagged(&mut f, "Transition 1 - Opacity 1", FadeKind::Enter, 0.0, 0.25);
    add_tagged(&mut f, "Transition 2 - Opacity 1", FadeKind::Exit, 3.0, 3.25);
    let selected = [f.layer];
    let req = request(f.ctl, &selected, FadeKind::Exit, true);
    let res = resolve_driver(&mut f.host, &req, &f.settings, &mut f.log).unwrap();
    assert_eq!(res.source, DriverSource::Created);
    assert_eq!(res.driver, "Transition 1 - Opacity 2");
}

#[test]
fn untagged_keys_fall_back_to_fade_shape() {
    let mut f = fixture();
    f.host.add_driver(f.ctl, "Transition 1 - Opacity 1").unwrap();
    f.host
        .set_driver_at(f.ctl, "Transition 1 - Opacity 1", 0.0, 0.0)
        .unwrap();
    f.host
        .set_driver_at(f.ctl, "Transition 1 - Opacity 1", 0.3, 100.0)
        .unwrap();
    let selected = [f.layer];
    let req = request(f.ctl, &selected, FadeKind::Enter, true);
    let res = resolve_driver(&mut f.host, &req, &f.settings, &mut f.log).unwrap();
    assert_eq!(res.source, DriverSource::KeyTag);
}

#[test]
fn label_detection_reads_leading_keys() {
    let settings = EngineSettings::default();
    let mut keys = vec![key(0.0, 100.0), key(0.2, 0.0)];
    assert_eq!(detect_kind_by_label(&keys, &settings), None);
    keys[1].label = LabelColor::GREEN;
    assert_eq!(detect_kind_by_label(&keys, &settings), Some(FadeKind::Exit));
    keys[0].label = LabelColor::PURPLE;
    assert_eq!(detect_kind_by_label(&keys, &settings), Some(FadeKind::Enter));
    assert_eq!(detect_kind_by_label(&keys[..1], &settings), None);
}

#[test]
fn fade_shapes() {
    assert_eq!(
        classify_fade_shape(&[key(0.0, 100.0), key(0.2, 0.0)]),
        Some(FadeKind::Exit)
    );
    assert_eq!(
        classify_fade_shape(&[key(0.0, 5.0), key(0.1, 50.0), key(0.2, 95.0)]),
        Some(FadeKind::Enter)
    );
    assert_eq!(classify_fade_shape(&[key(0.0, 50.0), key(0.2, 0.0)]), None);
    assert_eq!(classify_fade_shape(&[key(0.0, 100.0)]), None);
}

#[test]
fn fade_keys_are_tagged_with_kind_label() {
    let mut f = fixture();
    add_tagged(&mut f, "Transition 1 - Opacity 1", FadeKind::Enter, 0.1, 0.4);
    let keys = f
        .host
        .driver_keys(f.ctl, "Transition 1 - Opacity 1")
        .unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!((keys[0].value, keys[1].value), (0.0, 100.0));
    assert!(keys.iter().all(|k| k.label == LabelColor::PURPLE));
}

#[test]
fn link_to_missing_driver_fails_before_creating_one() {
    let mut f = fixture();
    add_tagged(&mut f, "Transition 1 - Opacity 1", FadeKind::Exit, 0.0, 0.25);
    f.host
        .set_opacity_formula(f.layer, &link_formula(CTL, "Transition 7 - Opacity 1"))
        .unwrap();

    let selected = [f.layer];
    let req = request(f.ctl, &selected, FadeKind::Exit, false);
    let err = resolve_driver(&mut f.host, &req, &f.settings, &mut f.log).unwrap_err();
    assert!(matches!(err, KitError::Host(_)), "{err}");
    assert!(err.to_string().contains("Transition 7 - Opacity 1"));
    assert_eq!(f.host.drivers(f.ctl).unwrap(), ["Transition 1 - Opacity 1"]);
}
