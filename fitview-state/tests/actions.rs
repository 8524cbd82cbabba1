//! AppActions against a scripted backend and the inline load path

use std::rc::Rc;

use fitview_state::testing::{
    BackendCall, ManualClock, RecordingNotifier, ScriptedBackend, WriteRecorder,
};
use fitview_state::{
    AppActions, AppConfig, LoadContext, LoadError, NotificationLevel, PathStore,
};
use fitview_state_core::{assert_not_written, assert_written, count_written};
use serde_json::json;

struct Fixture {
    actions: AppActions,
    recorder: WriteRecorder,
    notifier: Rc<RecordingNotifier>,
}

fn fixture(backend: Option<Rc<ScriptedBackend>>) -> Fixture {
    let store = PathStore::new();
    let recorder = WriteRecorder::install(&store);
    let notifier = Rc::new(RecordingNotifier::new());
    let mut actions = AppActions::new(
        store,
        notifier.clone(),
        Rc::new(ManualClock::new(1_700_000_000_000)),
        Rc::new(AppConfig::default()),
    );
    if let Some(backend) = backend {
        actions = actions.with_backend(backend);
    }
    Fixture {
        actions,
        recorder,
        notifier,
    }
}

#[test]
fn test_switch_tab_rejects_unknown_tab_without_writing() {
    let fx = fixture(None);
    assert!(!fx.actions.switch_tab("not-a-tab"));
    assert_not_written!(fx.recorder.writes(), "ui.activeTab");
    assert!(fx.notifier.is_empty());

    for tab in ["summary", "chart", "map", "table", "data", "zones", "laps", "settings"] {
        assert!(fx.actions.switch_tab(tab));
    }
    assert_eq!(count_written!(fx.recorder.writes(), "ui.activeTab"), 8);
}

#[tokio::test]
async fn test_load_file_delegates_to_backend() {
    let backend = Rc::new(ScriptedBackend::new());
    let fx = fixture(Some(backend.clone()));

    fx.actions
        .load_file(json!({"recordMesgs": []}), "/rides/morning.fit")
        .await
        .unwrap();

    assert_eq!(
        backend.call_names(),
        vec!["start_file_loading", "handle_file_loaded", "is_loading"]
    );
    assert_eq!(
        backend.calls()[1],
        BackendCall::HandleFileLoaded {
            data: json!({"recordMesgs": []}),
            context: LoadContext::for_path("/rides/morning.fit").with_source("AppActions.loadFile"),
        }
    );
    assert!(fx.recorder.is_empty());
    assert!(fx.notifier.is_empty());
}

#[tokio::test]
async fn test_load_file_without_backend_writes_inline() {
    let fx = fixture(None);

    fx.actions
        .load_file(json!({"recordMesgs": [{}]}), "ride.fit")
        .await
        .unwrap();

    assert_eq!(
        fx.recorder.paths(),
        vec![
            "isLoading",
            "globalData",
            "currentFile",
            "charts.isRendered",
            "map.isRendered",
            "tables.isRendered",
            "performance.lastLoadTime",
            "isLoading",
        ]
    );
    let writes = fx.recorder.writes();
    assert_written!(writes, "isLoading", json!(true));
    assert_written!(writes, "isLoading", json!(false));
    assert_written!(writes, "currentFile", json!("ride.fit"));
    assert_written!(writes, "performance.lastLoadTime", json!(1_700_000_000_000u64));
    assert_eq!(
        fx.notifier.messages(),
        vec![(
            "File loaded successfully".to_string(),
            NotificationLevel::Success
        )]
    );
    assert_eq!(
        fx.notifier.notifications()[0].duration,
        Some(std::time::Duration::from_millis(3000))
    );
}

#[tokio::test]
async fn test_load_file_propagates_backend_failure() {
    let backend = Rc::new(ScriptedBackend::new().fail_with(LoadError::Backend("disk gone".into())));
    let fx = fixture(Some(backend.clone()));

    let result = fx.actions.load_file(json!({}), "broken.fit").await;

    assert_eq!(result, Err(LoadError::Backend("disk gone".into())));
    assert_eq!(
        backend.call_names(),
        vec![
            "start_file_loading",
            "handle_file_loaded",
            "handle_file_loading_error"
        ]
    );
    assert!(fx.recorder.is_empty());
}

#[test]
fn test_clear_data_resets_then_delegates_then_notifies() {
    let backend = Rc::new(ScriptedBackend::new());
    let fx = fixture(Some(backend.clone()));
    fx.actions.store().set("globalData", json!({"recordMesgs": []}));
    fx.recorder.clear();

    fx.actions.clear_data();

    let writes = fx.recorder.writes();
    assert_written!(writes, "globalData", serde_json::Value::Null);
    assert_written!(writes, "tables.isRendered", json!(false));
    assert_eq!(writes.len(), 5);
    assert!(writes
        .iter()
        .all(|w| w.source.as_deref() == Some("AppActions.clearData")));
    assert_eq!(backend.calls(), vec![BackendCall::ClearFileState]);
    assert_eq!(fx.notifier.levels(), vec![NotificationLevel::Info]);
    assert_eq!(fx.actions.store().get_state("globalData"), Some(serde_json::Value::Null));
}
