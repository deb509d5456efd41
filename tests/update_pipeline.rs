//! End-to-end update pipeline scenarios over the wired engine.
//!
//! Covers the multi-component behaviors: dedup-and-replace across enqueues,
//! terminal-state redraw notifications, restart recovery from the durable
//! queue, reactive state observation, and update idempotence.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use chrono::NaiveDate;
use sill::clock::FixedClock;
use sill::fetch::{ContentFetcher, FetchError};
use sill::notify::ChannelNotifier;
use sill::widget::payload::{PARAM_BACKGROUND_URL, PARAM_PHOTO_PATHS, PARAM_QUOTES};
use sill::widget::types::CalendarStyle;
use sill::{
    AppWidgetState, EngineConfig, WidgetEngine, WidgetPayload, WidgetRecord, WidgetSize, WidgetType,
};
use std::collections::HashMap;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;

/// Scripted fetcher shared by the pipeline scenarios: pops one result per
/// call and counts calls.
struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<PathBuf, FetchError>>>,
    calls: Mutex<usize>,
}

impl ScriptedFetcher {
    fn new(script: Vec<Result<PathBuf, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ContentFetcher for ScriptedFetcher {
    async fn fetch(&self, _url: &str, _force: bool) -> Result<PathBuf, FetchError> {
        *self.calls.lock().unwrap() += 1;
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Transient("script exhausted".into())))
    }
}

fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.scheduler.workers = 2;
    config.scheduler.retry_delay_base_ms = 10;
    config
}

fn test_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()))
}

fn engine_with(
    fetcher: Arc<dyn ContentFetcher>,
) -> (WidgetEngine, mpsc::UnboundedReceiver<i64>) {
    let (notifier, redraws) = ChannelNotifier::new();
    let engine = WidgetEngine::open_in_memory(
        test_config(),
        fetcher,
        Arc::new(notifier),
        test_clock(),
    )
    .expect("open engine");
    (engine, redraws)
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

async fn next_redraw(redraws: &mut mpsc::UnboundedReceiver<i64>) -> i64 {
    tokio::time::timeout(Duration::from_secs(10), redraws.recv())
        .await
        .expect("redraw within timeout")
        .expect("notifier channel open")
}

#[tokio::test]
async fn replacing_a_queued_setup_runs_only_the_latest_intent() {
    let fetcher = ScriptedFetcher::new(vec![]);
    let (engine, mut redraws) = engine_with(fetcher.clone());

    // Both setups land while no worker is draining the queue: the second
    // replaces the first, which never runs.
    engine
        .scheduler()
        .enqueue_setup(
            7,
            WidgetType::Photo,
            WidgetSize::Small,
            params(&[(PARAM_PHOTO_PATHS, r#"["/a.jpg"]"#)]),
        )
        .expect("first setup");
    engine
        .scheduler()
        .enqueue_setup(
            7,
            WidgetType::Calendar(CalendarStyle::Type1),
            WidgetSize::Medium,
            params(&[]),
        )
        .expect("second setup");

    let handles = engine.start().expect("start");

    let redrawn = next_redraw(&mut redraws).await;
    assert_eq!(redrawn, 7);

    let record = engine.widgets().get(7).expect("get").expect("record");
    assert_eq!(record.kind, WidgetType::Calendar(CalendarStyle::Type1));
    assert_eq!(record.size, WidgetSize::Medium);
    assert!(
        matches!(record.payload, Some(WidgetPayload::Calendar { .. })),
        "the replaced photo setup must never have committed"
    );

    // Exactly one terminal state was reached — no second redraw arrives.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(redraws.try_recv().is_err());

    handles.abort_all();
}

#[tokio::test]
async fn empty_and_error_terminals_still_redraw() {
    let fetcher = ScriptedFetcher::new(vec![
        Err(FetchError::Transient("down".into())),
        Err(FetchError::Transient("down".into())),
        Err(FetchError::Transient("down".into())),
    ]);
    let (engine, mut redraws) = engine_with(fetcher.clone());
    let handles = engine.start().expect("start");

    // No prior payload: exhaustion degrades to Empty, and the UI still
    // hears about it so it can show the placeholder.
    engine
        .scheduler()
        .enqueue_setup(
            1,
            WidgetType::Weather(sill::widget::types::WeatherStyle::Type1),
            WidgetSize::Medium,
            params(&[(PARAM_BACKGROUND_URL, "https://example.com/sky.png")]),
        )
        .expect("enqueue");

    assert_eq!(next_redraw(&mut redraws).await, 1);
    assert_eq!(engine.states().get(1), AppWidgetState::Empty);
    assert_eq!(fetcher.calls(), 3);

    handles.abort_all();
}

#[tokio::test]
async fn pending_jobs_survive_a_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config();
    config.storage.data_dir = Some(dir.path().to_path_buf());

    // First process: seed a quote widget and enqueue an update, but crash
    // (drop) before any worker starts.
    {
        let (notifier, _redraws) = ChannelNotifier::new();
        let engine = WidgetEngine::open_with(
            config.clone(),
            ScriptedFetcher::new(vec![]),
            Arc::new(notifier),
            test_clock(),
        )
        .expect("open first engine");

        engine
            .widgets()
            .upsert(&WidgetRecord {
                widget_id: 5,
                kind: WidgetType::Quote,
                size: WidgetSize::Small,
                payload: Some(WidgetPayload::Quote {
                    quotes: vec!["a".into(), "b".into()],
                    current_index: 0,
                }),
                last_updated: 0,
            })
            .expect("seed");
        engine.scheduler().enqueue_update(5).expect("enqueue");
    }

    // Second process: recovery re-runs the persisted intent.
    let (notifier, mut redraws) = ChannelNotifier::new();
    let engine = WidgetEngine::open_with(
        config,
        ScriptedFetcher::new(vec![]),
        Arc::new(notifier),
        test_clock(),
    )
    .expect("open second engine");
    let handles = engine.start().expect("start");

    assert_eq!(next_redraw(&mut redraws).await, 5);
    let record = engine.widgets().get(5).expect("get").expect("record");
    match record.payload.expect("payload") {
        WidgetPayload::Quote { current_index, .. } => assert_eq!(current_index, 1),
        other => panic!("expected quote payload, got {other:?}"),
    }

    handles.abort_all();
}

#[tokio::test]
async fn observers_see_the_refresh_reach_success() {
    let fetcher = ScriptedFetcher::new(vec![Ok(PathBuf::from("/cache/bg.png"))]);
    let (engine, mut redraws) = engine_with(fetcher);
    let handles = engine.start().expect("start");

    let mut stream = engine.states().observe(9);

    engine
        .scheduler()
        .enqueue_setup(
            9,
            WidgetType::Calendar(CalendarStyle::Type5),
            WidgetSize::Large,
            params(&[(PARAM_BACKGROUND_URL, "https://example.com/bg.png")]),
        )
        .expect("enqueue");

    // The watch stream coalesces intermediate values; assert it converges
    // on Success and only ever yields pipeline states on the way there.
    let mut last = None;
    while let Ok(Some(state)) =
        tokio::time::timeout(Duration::from_secs(10), stream.next()).await
    {
        assert!(matches!(
            state,
            AppWidgetState::Init | AppWidgetState::Loading | AppWidgetState::Success { .. }
        ));
        let done = matches!(state, AppWidgetState::Success { .. });
        last = Some(state);
        if done {
            break;
        }
    }
    assert!(matches!(last, Some(AppWidgetState::Success { .. })));

    let _ = next_redraw(&mut redraws).await;
    handles.abort_all();
}

#[tokio::test]
async fn calendar_update_is_idempotent_within_a_day() {
    let fetcher = ScriptedFetcher::new(vec![]);
    let (engine, mut redraws) = engine_with(fetcher);
    let handles = engine.start().expect("start");

    engine
        .widgets()
        .upsert(&WidgetRecord {
            widget_id: 2,
            kind: WidgetType::Calendar(CalendarStyle::Type2),
            size: WidgetSize::Medium,
            payload: Some(WidgetPayload::Calendar {
                year: 2024,
                month: 3,
                today_day: Some(14),
                selected_day: Some(14),
                background_path: Some("/cache/bg.png".into()),
            }),
            last_updated: 0,
        })
        .expect("seed");

    engine.scheduler().enqueue_update(2).expect("first update");
    assert_eq!(next_redraw(&mut redraws).await, 2);
    let first = engine
        .widgets()
        .get(2)
        .expect("get")
        .expect("record")
        .payload
        .expect("payload")
        .encode();

    engine.scheduler().enqueue_update(2).expect("second update");
    assert_eq!(next_redraw(&mut redraws).await, 2);
    let second = engine
        .widgets()
        .get(2)
        .expect("get")
        .expect("record")
        .payload
        .expect("payload")
        .encode();

    // Same day, no date change: byte-identical payload both runs.
    assert_eq!(first, second);

    handles.abort_all();
}

#[tokio::test]
async fn quote_setup_then_rotation_cycles_quotes() {
    let fetcher = ScriptedFetcher::new(vec![]);
    let (engine, mut redraws) = engine_with(fetcher);
    let handles = engine.start().expect("start");

    engine
        .scheduler()
        .enqueue_setup(
            4,
            WidgetType::Quote,
            WidgetSize::Small,
            params(&[(PARAM_QUOTES, r#"["one","two","three"]"#)]),
        )
        .expect("setup");
    assert_eq!(next_redraw(&mut redraws).await, 4);

    for expected_index in [1, 2, 0] {
        engine.scheduler().enqueue_update(4).expect("rotate");
        assert_eq!(next_redraw(&mut redraws).await, 4);
        let record = engine.widgets().get(4).expect("get").expect("record");
        match record.payload.expect("payload") {
            WidgetPayload::Quote { current_index, .. } => {
                assert_eq!(current_index, expected_index);
            }
            other => panic!("expected quote payload, got {other:?}"),
        }
    }

    handles.abort_all();
}
