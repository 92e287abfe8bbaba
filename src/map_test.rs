use super::*;
use crate::listeners::listener;
use std::sync::{Arc, Mutex};

fn view() -> MapView {
    MapView::new("test-key")
}

fn moved(zoom: f64, center: (f64, f64), ne: (f64, f64), sw: (f64, f64)) -> MapMoved {
    MapMoved { zoom, center: center.into(), bounds_ne: ne.into(), bounds_sw: sw.into() }
}

// =============================================================================
// STATE
// =============================================================================

#[test]
fn marker_membership_follows_add_and_remove() {
    let map = view();
    let marker = Marker::new("a", LatLon::new(1.0, 1.0));
    assert!(!map.has_marker(&marker));

    map.add_marker(marker.clone());
    assert!(map.has_marker(&marker));

    map.remove_marker(&marker);
    assert!(!map.has_marker(&marker));
}

#[test]
fn removing_absent_marker_is_noop() {
    let map = view();
    let kept = map.add_new_marker("kept", LatLon::new(0.0, 0.0), false, None);
    map.remove_marker(&Marker::new("stranger", LatLon::new(0.0, 0.0)));
    assert_eq!(map.markers().len(), 1);
    assert!(map.has_marker(&kept));
}

#[test]
fn adding_same_marker_twice_keeps_one() {
    let map = view();
    let marker = Marker::new("a", LatLon::new(1.0, 1.0));
    map.add_marker(marker.clone());
    map.add_marker(marker);
    assert_eq!(map.markers().len(), 1);
}

#[test]
fn clear_markers_empties_set() {
    let map = view();
    for i in 0..5_i32 {
        map.add_new_marker(format!("m{i}"), LatLon::new(f64::from(i), 0.0), true, None);
    }
    assert_eq!(map.markers().len(), 5);

    map.clear_markers();
    assert!(map.markers().is_empty());

    map.clear_markers();
    assert!(map.markers().is_empty());
}

#[test]
fn add_new_marker_stores_given_fields() {
    let map = view();
    let marker = map.add_new_marker("cafe", LatLon::new(60.0, 22.0), true, Some("http://icons/cafe.png".into()));
    let stored = map.marker(marker.id).expect("marker should be stored");
    assert_eq!(stored.caption, "cafe");
    assert!(stored.draggable);
    assert_eq!(stored.icon_url.as_deref(), Some("http://icons/cafe.png"));
}

#[test]
fn update_marker_replaces_only_members() {
    let map = view();
    let marker = map.add_new_marker("a", LatLon::new(1.0, 1.0), true, None);
    assert!(map.update_marker(marker.moved_to(LatLon::new(2.0, 2.0))));
    assert_eq!(map.marker(marker.id).unwrap().position, LatLon::new(2.0, 2.0));

    let stranger = Marker::new("b", LatLon::new(0.0, 0.0));
    assert!(!map.update_marker(stranger.clone()));
    assert!(!map.has_marker(&stranger));
}

#[test]
fn set_center_and_zoom_clear_client_flag() {
    let map = view();
    map.on_map_moved(moved(3.0, (1.0, 1.0), (2.0, 2.0), (0.0, 0.0)));
    assert!(map.is_location_from_client());

    map.set_center(LatLon::new(5.0, 6.0));
    assert!(!map.is_location_from_client());
    assert_eq!(map.center(), LatLon::new(5.0, 6.0));

    map.on_map_moved(moved(3.0, (1.0, 1.0), (2.0, 2.0), (0.0, 0.0)));
    map.set_zoom(12.0);
    assert!(!map.is_location_from_client());
    assert!((map.zoom() - 12.0).abs() < f64::EPSILON);
}

#[test]
fn constructors_apply_center_and_zoom() {
    let map = MapView::with_center_and_zoom(LatLon::new(60.45, 22.3), 10.0, "k");
    assert_eq!(map.center(), LatLon::new(60.45, 22.3));
    assert!((map.zoom() - 10.0).abs() < f64::EPSILON);
    assert_eq!(map.snapshot().state.api_key, "k");

    let map = MapView::with_center(LatLon::new(1.0, 2.0), "k");
    assert_eq!(map.center(), LatLon::new(1.0, 2.0));
    assert!((map.zoom() - crate::view::DEFAULT_ZOOM).abs() < f64::EPSILON);
}

#[test]
fn center_bound_limits_enable_flag_independently() {
    let map = view();
    assert!(!map.is_center_bound_limits_enabled());

    map.set_center_bound_limits(LatLon::new(10.0, 10.0), LatLon::new(-10.0, -10.0));
    assert!(map.is_center_bound_limits_enabled());
    assert!(!map.is_visible_area_bound_limits_enabled());
    assert_eq!(map.center_bound_limits().ne, LatLon::new(10.0, 10.0));

    map.set_visible_area_bound_limits(LatLon::new(5.0, 5.0), LatLon::new(-5.0, -5.0));
    map.set_center_bound_limits_enabled(false);
    assert!(!map.is_center_bound_limits_enabled());
    assert!(map.is_visible_area_bound_limits_enabled());
    assert_eq!(map.visible_area_bound_limits().sw, LatLon::new(-5.0, -5.0));
    // Disabling keeps the stored corners.
    assert_eq!(map.center_bound_limits().sw, LatLon::new(-10.0, -10.0));
}

#[test]
fn min_zoom_may_exceed_max_zoom() {
    let map = view();
    map.set_max_zoom(5.0);
    map.set_min_zoom(9.0);
    assert!((map.min_zoom() - 9.0).abs() < f64::EPSILON);
    assert!((map.max_zoom() - 5.0).abs() < f64::EPSILON);
}

#[test]
fn map_type_round_trips() {
    let map = view();
    for ty in [MapType::Hybrid, MapType::Roadmap, MapType::Satellite, MapType::Terrain] {
        map.set_map_type(ty);
        assert_eq!(map.map_type(), ty);
    }
}

#[test]
fn controls_are_idempotent_toggles() {
    let map = view();
    map.add_control(MapControl::OverView);
    map.add_control(MapControl::OverView);
    assert!(map.controls().contains(&MapControl::OverView));
    assert_eq!(map.controls().len(), 7);

    map.remove_control(MapControl::OverView);
    map.remove_control(MapControl::OverView);
    assert!(!map.controls().contains(&MapControl::OverView));

    map.set_controls([MapControl::Zoom].into_iter().collect());
    assert_eq!(map.controls().len(), 1);
}

#[test]
fn interaction_flags_round_trip() {
    let map = view();
    map.set_draggable(false);
    map.set_keyboard_shortcuts_enabled(false);
    map.set_scroll_wheel_enabled(false);
    assert!(!map.is_draggable());
    assert!(!map.are_keyboard_shortcuts_enabled());
    assert!(!map.is_scroll_wheel_enabled());
}

#[test]
fn polygons_and_polylines_have_set_semantics() {
    let map = view();
    let polygon = Polygon::new(vec![LatLon::new(0.0, 0.0), LatLon::new(1.0, 0.0), LatLon::new(1.0, 1.0)]);
    let line = Polyline::new(vec![LatLon::new(0.0, 0.0), LatLon::new(1.0, 1.0)]);
    map.add_polygon_overlay(polygon.clone());
    map.add_polygon_overlay(polygon.clone());
    map.add_polyline(line.clone());
    assert_eq!(map.polygons().len(), 1);
    assert_eq!(map.polylines().len(), 1);

    map.remove_polygon_overlay(&polygon);
    map.remove_polyline(&line);
    map.remove_polyline(&line);
    assert!(map.polygons().is_empty());
    assert!(map.polylines().is_empty());
}

#[test]
fn info_window_open_and_close() {
    let map = view();
    let window = InfoWindow::new("hello", LatLon::new(0.0, 0.0));
    assert!(!map.is_info_window_open(&window));
    map.open_info_window(window.clone());
    assert!(map.is_info_window_open(&window));
    map.close_info_window(&window);
    assert!(!map.is_info_window_open(&window));
    map.close_info_window(&window);
    assert!(map.info_windows().is_empty());
}

// =============================================================================
// EVENTS
// =============================================================================

#[test]
fn map_moved_updates_state_and_notifies_in_order() {
    let map = view();
    let log: Arc<Mutex<Vec<(&'static str, MapMoved)>>> = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second"] {
        let log = Arc::clone(&log);
        map.add_map_move_listener(listener(move |e: &MapMoved| log.lock().unwrap().push((tag, *e))));
    }

    let event = moved(7.5, (10.0, 20.0), (15.0, 25.0), (5.0, 15.0));
    map.on_map_moved(event);

    assert!((map.zoom() - 7.5).abs() < f64::EPSILON);
    assert_eq!(map.center(), LatLon::new(10.0, 20.0));
    let log = log.lock().unwrap();
    assert_eq!(*log, vec![("first", event), ("second", event)]);
    assert_eq!(log[0].1.bounds_ne, LatLon::new(15.0, 25.0));
    assert_eq!(log[0].1.bounds_sw, LatLon::new(5.0, 15.0));
}

#[test]
fn map_move_listeners_see_updated_state() {
    let map = Arc::new(view());
    let seen = Arc::new(Mutex::new(None));
    {
        let weak = Arc::downgrade(&map);
        let seen = Arc::clone(&seen);
        map.add_map_move_listener(listener(move |_: &MapMoved| {
            if let Some(map) = weak.upgrade() {
                *seen.lock().unwrap() = Some(map.zoom());
            }
        }));
    }
    map.on_map_moved(moved(4.0, (0.0, 0.0), (1.0, 1.0), (-1.0, -1.0)));
    assert_eq!(*seen.lock().unwrap(), Some(4.0));
}

#[test]
fn duplicate_listener_removed_once_still_fires_once() {
    let map = view();
    let count = Arc::new(Mutex::new(0));
    let handle = {
        let count = Arc::clone(&count);
        listener(move |_: &MarkerClicked| *count.lock().unwrap() += 1)
    };
    map.add_marker_click_listener(Arc::clone(&handle));
    map.add_marker_click_listener(Arc::clone(&handle));
    map.remove_marker_click_listener(&handle);

    let marker = map.add_new_marker("a", LatLon::new(0.0, 0.0), false, None);
    map.on_marker_clicked(&marker);
    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn marker_click_does_not_publish() {
    let map = view();
    let marker = map.add_new_marker("a", LatLon::new(0.0, 0.0), false, None);
    let before = map.snapshot().revision;
    map.on_marker_clicked(&marker);
    assert_eq!(map.snapshot().revision, before);
}

#[test]
fn marker_drag_is_pure_relay() {
    let map = view();
    let marker = map.add_new_marker("a", LatLon::new(1.0, 1.0), true, None);
    let got = Arc::new(Mutex::new(Vec::new()));
    {
        let got = Arc::clone(&got);
        map.add_marker_drag_listener(listener(move |e: &MarkerDragged| {
            got.lock().unwrap().push((e.marker.id, e.marker.position, e.new_position));
        }));
    }

    map.on_marker_dragged(&marker, LatLon::new(9.0, 9.0));

    assert_eq!(*got.lock().unwrap(), vec![(marker.id, LatLon::new(1.0, 1.0), LatLon::new(9.0, 9.0))]);
    assert_eq!(map.marker(marker.id).unwrap().position, LatLon::new(1.0, 1.0));
}

#[test]
fn drag_listener_can_persist_position() {
    let map = Arc::new(view());
    let marker = map.add_new_marker("a", LatLon::new(1.0, 1.0), true, None);
    {
        let weak = Arc::downgrade(&map);
        map.add_marker_drag_listener(listener(move |e: &MarkerDragged| {
            if let Some(map) = weak.upgrade() {
                map.update_marker(e.marker.moved_to(e.new_position));
            }
        }));
    }
    map.on_marker_dragged(&marker, LatLon::new(2.0, 3.0));
    assert_eq!(map.marker(marker.id).unwrap().position, LatLon::new(2.0, 3.0));
}

#[test]
fn info_window_still_open_during_close_listeners() {
    let map = Arc::new(view());
    let window = InfoWindow::new("hi", LatLon::new(0.0, 0.0));
    map.open_info_window(window.clone());

    let observed = Arc::new(Mutex::new(Vec::new()));
    for _ in 0..2 {
        let weak = Arc::downgrade(&map);
        let observed = Arc::clone(&observed);
        map.add_info_window_closed_listener(listener(move |e: &InfoWindowClosed| {
            if let Some(map) = weak.upgrade() {
                observed.lock().unwrap().push(map.is_info_window_open(&e.window));
            }
        }));
    }

    map.on_info_window_closed(&window);

    assert_eq!(*observed.lock().unwrap(), vec![true, true]);
    assert!(!map.is_info_window_open(&window));
}

#[test]
fn listener_removing_itself_still_sees_current_event() {
    let map = Arc::new(view());
    let calls = Arc::new(Mutex::new(0));
    let slot: Arc<Mutex<Option<Listener<MarkerClicked>>>> = Arc::new(Mutex::new(None));

    let handle = {
        let weak = Arc::downgrade(&map);
        let calls = Arc::clone(&calls);
        let slot = Arc::clone(&slot);
        listener(move |_: &MarkerClicked| {
            *calls.lock().unwrap() += 1;
            let me = slot.lock().unwrap().clone();
            if let (Some(map), Some(me)) = (weak.upgrade(), me) {
                map.remove_marker_click_listener(&me);
            }
        })
    };
    *slot.lock().unwrap() = Some(Arc::clone(&handle));
    map.add_marker_click_listener(handle);

    let marker = map.add_new_marker("a", LatLon::new(0.0, 0.0), false, None);
    map.on_marker_clicked(&marker);
    map.on_marker_clicked(&marker);
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn listener_added_during_dispatch_waits_for_next_event() {
    let map = Arc::new(view());
    let late_calls = Arc::new(Mutex::new(0));
    {
        let weak = Arc::downgrade(&map);
        let late_calls = Arc::clone(&late_calls);
        map.add_map_move_listener(listener(move |_: &MapMoved| {
            let late_calls = Arc::clone(&late_calls);
            if let Some(map) = weak.upgrade() {
                map.add_map_move_listener(listener(move |_: &MapMoved| *late_calls.lock().unwrap() += 1));
            }
        }));
    }

    map.on_map_moved(moved(1.0, (0.0, 0.0), (1.0, 1.0), (-1.0, -1.0)));
    assert_eq!(*late_calls.lock().unwrap(), 0);

    map.on_map_moved(moved(2.0, (0.0, 0.0), (1.0, 1.0), (-1.0, -1.0)));
    assert_eq!(*late_calls.lock().unwrap(), 1);
}

#[test]
fn handle_client_event_resolves_ids() {
    let map = view();
    let marker = map.add_new_marker("a", LatLon::new(0.0, 0.0), false, None);
    let clicked = Arc::new(Mutex::new(Vec::new()));
    {
        let clicked = Arc::clone(&clicked);
        map.add_marker_click_listener(listener(move |e: &MarkerClicked| clicked.lock().unwrap().push(e.marker.id)));
    }

    map.handle_client_event(ClientEvent::MarkerClicked { marker_id: marker.id })
        .unwrap();
    assert_eq!(*clicked.lock().unwrap(), vec![marker.id]);

    let missing = Uuid::new_v4();
    let err = map
        .handle_client_event(ClientEvent::MarkerClicked { marker_id: missing })
        .unwrap_err();
    assert!(matches!(err, MapError::UnknownMarker(id) if id == missing));
    assert_eq!(clicked.lock().unwrap().len(), 1);
}

#[test]
fn handle_client_event_unknown_window_errors() {
    let map = view();
    let err = map
        .handle_client_event(ClientEvent::InfoWindowClosed { window_id: Uuid::new_v4() })
        .unwrap_err();
    assert_eq!(crate::frame::ErrorCode::error_code(&err), "E_UNKNOWN_INFO_WINDOW");
}

// =============================================================================
// PUBLICATION
// =============================================================================

#[test]
fn every_mutation_publishes_newer_revision() {
    let map = view();
    let rx = map.subscribe();
    assert_eq!(rx.borrow().revision, 0);

    map.set_zoom(3.0);
    let first = rx.borrow().revision;
    map.add_control(MapControl::OverView);
    let second = rx.borrow().revision;
    assert!(first >= 1);
    assert!(second > first);
    assert!((rx.borrow().state.zoom - 3.0).abs() < f64::EPSILON);
}

#[test]
fn published_flag_tracks_origin_of_location() {
    let map = view();
    let rx = map.subscribe();

    map.on_map_moved(moved(6.0, (1.0, 2.0), (3.0, 4.0), (0.0, 0.0)));
    assert!(rx.borrow().state.location_from_client);

    map.set_center(LatLon::new(0.0, 0.0));
    assert!(!rx.borrow().state.location_from_client);
}

#[test]
fn info_window_close_event_publishes_removal() {
    let map = view();
    let window = InfoWindow::new("hi", LatLon::new(0.0, 0.0));
    map.open_info_window(window.clone());
    let rx = map.subscribe();

    map.handle_client_event(ClientEvent::InfoWindowClosed { window_id: window.id })
        .unwrap();
    assert!(rx.borrow().state.info_windows.is_empty());
}

#[tokio::test]
async fn subscriber_is_woken_by_mutation() {
    let map = view();
    let mut rx = map.subscribe();
    rx.borrow_and_update();

    map.set_map_type(MapType::Terrain);
    tokio::time::timeout(std::time::Duration::from_millis(200), rx.changed())
        .await
        .expect("change notification timed out")
        .expect("sender dropped");
    assert_eq!(rx.borrow().state.map_type, MapType::Terrain);
    assert_eq!(map.subscriber_count(), 1);
}
