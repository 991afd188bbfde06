use super::*;

fn host_with_layers(names: &[&str]) -> (MemoryHost, Vec<LayerId>) {
    let mut host = MemoryHost::with_composition("Main", 30.0, 786, 600);
    let ids = names.iter().map(|n| host.add_layer(n).unwrap()).collect();
    (host, ids)
}

#[test]
fn create_layer_goes_on_top_and_moves() {
    let (mut host, ids) = host_with_layers(&["a", "b", "c"]);
    let ctl = host.create_layer("ctl").unwrap();
    assert_eq!(host.layer_index(ctl).unwrap(), 1);
    assert_eq!(host.layer_index(ids[0]).unwrap(), 2);

    host.move_before(ctl, ids[2]).unwrap();
    assert_eq!(host.layers().unwrap(), vec![ids[0], ids[1], ctl, ids[2]]);

    host.move_after(ctl, ids[2]).unwrap();
    assert_eq!(host.layers().unwrap(), vec![ids[0], ids[1], ids[2], ctl]);
}

#[test]
fn position_sampling_interpolates_and_holds() {
    let (mut host, ids) = host_with_layers(&["a"]);
    let l = ids[0];
    host.layer_mut(l).unwrap().position.value = Vec2::new(5.0, 5.0);
    assert_eq!(host.position_at(l, 3.0).unwrap(), Vec2::new(5.0, 5.0));

    host.set_position_at(l, 1.0, Vec2::new(0.0, 0.0)).unwrap();
    host.set_position_at(l, 2.0, Vec2::new(-100.0, 50.0)).unwrap();
    assert_eq!(host.position_at(l, 0.0).unwrap(), Vec2::new(0.0, 0.0));
    assert_eq!(host.position_at(l, 1.5).unwrap(), Vec2::new(-50.0, 25.0));
    assert_eq!(host.position_at(l, 9.0).unwrap(), Vec2::new(-100.0, 50.0));
}

#[test]
fn same_time_key_replaces_value_and_keeps_label() {
    let (mut host, ids) = host_with_layers(&["ctl"]);
    let l = ids[0];
    host.add_driver(l, "Transition 1 - Opacity 1").unwrap();
    let i = host
        .set_driver_at(l, "Transition 1 - Opacity 1", 0.5, 100.0)
        .unwrap();
    host.set_driver_label(l, "Transition 1 - Opacity 1", i, LabelColor::BLUE)
        .unwrap();
    let j = host
        .set_driver_at(l, "Transition 1 - Opacity 1", 0.5, 0.0)
        .unwrap();
    assert_eq!(i, j);

    let keys = host.driver_keys(l, "Transition 1 - Opacity 1").unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].value, 0.0);
    assert_eq!(keys[0].label, LabelColor::BLUE);
}

#[test]
fn driver_keys_stay_sorted() {
    let (mut host, ids) = host_with_layers(&["ctl"]);
    let l = ids[0];
    host.add_driver(l, "d").unwrap();
    host.set_driver_at(l, "d", 2.0, 1.0).unwrap();
    let i = host.set_driver_at(l, "d", 1.0, 2.0).unwrap();
    assert_eq!(i, 0);
    let times: Vec<f64> = host
        .driver_keys(l, "d")
        .unwrap()
        .iter()
        .map(|k| k.time)
        .collect();
    assert_eq!(times, vec![1.0, 2.0]);
}

#[test]
fn missing_driver_is_a_host_error() {
    let (mut host, ids) = host_with_layers(&["ctl"]);
    let err = host.set_driver_at(ids[0], "nope", 0.0, 1.0).unwrap_err();
    assert!(matches!(err, KitError::Host(_)));
}

#[test]
fn markers_replace_at_same_time() {
    let (mut host, ids) = host_with_layers(&["a"]);
    let l = ids[0];
    host.set_marker(
        l,
        Marker {
            time: 1.0,
            comment: "x".to_string(),
        },
    )
    .unwrap();
    host.set_marker(
        l,
        Marker {
            time: 1.0,
            comment: "y".to_string(),
        },
    )
    .unwrap();
    let markers = host.markers(l).unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].comment, "y");
}

#[test]
fn undo_groups_are_recorded_on_close() {
    let mut host = MemoryHost::with_composition("Main", 30.0, 786, 600);
    host.begin_undo_group("Add Exit Transition");
    assert!(host.undo_open());
    host.end_undo_group();
    assert!(!host.undo_open());
    assert_eq!(host.undo_groups, vec!["Add Exit Transition".to_string()]);
}

#[test]
fn scene_json_round_trips_and_validates() {
    let (mut host, ids) = host_with_layers(&["a"]);
    host.select(ids[0], true).unwrap();
    let json = host.to_json_string().unwrap();
    let back = MemoryHost::from_json_str(&json).unwrap();
    assert_eq!(back.selected_layers().unwrap(), vec![ids[0]]);

    let bad = r#"{ "composition": { "name": "x", "frame_rate": 0, "width": 10, "height": 10 } }"#;
    assert!(MemoryHost::from_json_str(bad).is_err());
}

#[test]
fn no_composition_means_no_time() {
    let host = MemoryHost::new();
    assert!(host.active_composition().is_none());
    assert!(host.current_time().is_err());
}
