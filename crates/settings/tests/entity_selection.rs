//! Entity catalog caching and the three selection write-back modes.

mod common;

use common::MockForm;
use hearth_key_path::get;
use hearth_settings::{Command, EntityBinding, EntityRecord, Session, WidgetKind};
use serde_json::json;

fn record(entity_id: &str, name: &str) -> EntityRecord {
    EntityRecord {
        entity_id: entity_id.to_string(),
        name: name.to_string(),
        domain: entity_id.split('.').next().unwrap_or("").to_string(),
        state: "on".to_string(),
    }
}

#[test]
fn concurrent_catalog_callers_share_one_fetch() {
    let mut session = Session::new(json!({}), json!({}), "presence");

    // Three pickers open before the catalog arrives; one request goes out.
    assert_eq!(session.ensure_catalog(), Some(Command::FetchCatalog));
    assert_eq!(session.ensure_catalog(), None);
    assert_eq!(session.ensure_catalog(), None);

    session.catalog_resolved(vec![
        record("light.kitchen", "Kitchen Ceiling"),
        record("light.study", "Study Lamp"),
    ]);
    assert_eq!(session.ensure_catalog(), None);
    assert_eq!(session.filter_entities("", &["light"]).len(), 2);
}

#[test]
fn failed_catalog_fetch_can_be_retried() {
    let mut session = Session::new(json!({}), json!({}), "presence");
    assert_eq!(session.ensure_catalog(), Some(Command::FetchCatalog));
    session.catalog_fetch_failed();
    assert_eq!(session.ensure_catalog(), Some(Command::FetchCatalog));
}

#[test]
fn duplicate_selection_on_one_path_keeps_one_entry() {
    let mut session = Session::new(json!({}), json!({}), "presence");
    let binding = EntityBinding::ListAppend {
        path: "presence.wake_lights".into(),
    };

    // Two list-bound widgets on the same path both add the same entity.
    session.select_entity(&binding, "light.kitchen");
    session.select_entity(&binding, "light.kitchen");

    assert_eq!(
        get(session.settings(), "presence.wake_lights"),
        Some(&json!(["light.kitchen"]))
    );
}

#[test]
fn scalar_selection_overwrites_bound_path() {
    let mut session = Session::new(
        json!({"speech": {"media_target": "media_player.old"}}),
        json!({}),
        "speech",
    );
    let binding = EntityBinding::Scalar {
        path: "speech.media_target".into(),
    };
    session.select_entity(&binding, "media_player.kitchen");
    assert_eq!(
        get(session.settings(), "speech.media_target"),
        Some(&json!("media_player.kitchen"))
    );
}

#[test]
fn room_selection_sets_one_map_entry() {
    let mut session = Session::new(
        json!({"presence": {"room_sensors": {"study": "binary_sensor.study_motion"}}}),
        json!({}),
        "presence",
    );
    let binding = EntityBinding::RoomMap {
        path: "presence.room_sensors".into(),
        room: "kitchen".into(),
    };
    session.select_entity(&binding, "binary_sensor.kitchen_motion");
    assert_eq!(
        get(session.settings(), "presence.room_sensors"),
        Some(&json!({
            "study": "binary_sensor.study_motion",
            "kitchen": "binary_sensor.kitchen_motion",
        }))
    );
}

#[test]
fn deselect_filters_the_id_out() {
    let mut session = Session::new(
        json!({"presence": {"wake_lights": ["light.kitchen", "light.study"]}}),
        json!({}),
        "presence",
    );
    session.deselect_entity("presence.wake_lights", "light.kitchen");
    assert_eq!(
        get(session.settings(), "presence.wake_lights"),
        Some(&json!(["light.study"]))
    );
}

#[test]
fn selection_survives_collection_as_tree_backed_state() {
    let mut session = Session::new(json!({}), json!({}), "presence");
    let binding = EntityBinding::ListAppend {
        path: "presence.wake_lights".into(),
    };
    session.select_entity(&binding, "light.kitchen");

    // The entity-list widget is tree-backed: collection on save re-reads the
    // canonical tree rather than the screen.
    let form = MockForm::new().field("presence.wake_lights", WidgetKind::EntityList);
    let Some(Command::BeginSave(request)) = session.debounce_elapsed(&form) else {
        panic!("debounce should begin a save");
    };
    assert_eq!(
        request.body["settings"]["presence"]["wake_lights"],
        json!(["light.kitchen"])
    );
}
