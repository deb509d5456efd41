//! End-to-end pipeline harness.
//!
//! Wires an in-memory engine, places a few demo widgets, runs their setup
//! refreshes and one rotation pass, and prints the resulting records and
//! states. Useful as a smoke check that the scheduler, stores, and payload
//! builders agree without needing a platform widget host or network access.
//!
//! Run with `RUST_LOG=debug` to watch the per-attempt state machine.

use async_trait::async_trait;
use sill::clock::SystemClock;
use sill::fetch::{ContentFetcher, FetchError};
use sill::notify::ChannelNotifier;
use sill::scheduler::RotationTicker;
use sill::widget::payload::{PARAM_BACKGROUND_URL, PARAM_PHOTO_PATHS, PARAM_QUOTES};
use sill::widget::types::{CalendarStyle, ClockFace};
use sill::{EngineConfig, WidgetEngine, WidgetSize, WidgetType};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Stand-in fetcher: pretends every URL is already cached locally.
struct StubFetcher;

#[async_trait]
impl ContentFetcher for StubFetcher {
    async fn fetch(&self, url: &str, _force: bool) -> Result<PathBuf, FetchError> {
        let name = url.rsplit('/').next().unwrap_or("asset");
        Ok(std::env::temp_dir().join(format!("sill-harness-{name}")))
    }
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = EngineConfig::default();
    config.scheduler.retry_delay_base_ms = 100;

    let (notifier, mut redraws) = ChannelNotifier::new();
    let engine = WidgetEngine::open_in_memory(
        config,
        Arc::new(StubFetcher),
        Arc::new(notifier),
        Arc::new(SystemClock),
    )?;
    let handles = engine.start()?;

    let scheduler = engine.scheduler();
    scheduler.enqueue_setup(
        1,
        WidgetType::Calendar(CalendarStyle::Type1),
        WidgetSize::Medium,
        params(&[(PARAM_BACKGROUND_URL, "https://example.com/bg.png")]),
    )?;
    scheduler.enqueue_setup(
        2,
        WidgetType::Photo,
        WidgetSize::Large,
        params(&[(PARAM_PHOTO_PATHS, r#"["/photos/a.jpg","/photos/b.jpg"]"#)]),
    )?;
    scheduler.enqueue_setup(
        3,
        WidgetType::Quote,
        WidgetSize::Small,
        params(&[(PARAM_QUOTES, r#"["Less, but better.","Make it run, then make it right."]"#)]),
    )?;
    scheduler.enqueue_setup(
        4,
        WidgetType::AnalogClock(ClockFace::Type2),
        WidgetSize::Small,
        params(&[(PARAM_BACKGROUND_URL, "https://example.com/face.png")]),
    )?;

    // Four setups, then one rotation pass over the photo/quote widgets.
    let mut seen = 0;
    while seen < 4 {
        match tokio::time::timeout(Duration::from_secs(10), redraws.recv()).await {
            Ok(Some(widget_id)) => {
                seen += 1;
                tracing::info!(widget_id, "redraw requested");
            }
            Ok(None) => anyhow::bail!("notifier channel closed early"),
            Err(_) => anyhow::bail!("timed out waiting for setup redraws"),
        }
    }

    let rotated = RotationTicker::new(scheduler.clone(), Duration::from_secs(900)).pass();
    for _ in 0..rotated {
        let _ = tokio::time::timeout(Duration::from_secs(10), redraws.recv()).await;
    }

    println!("widgets after setup + one rotation pass:");
    for record in engine.widgets().list_all()? {
        let state = engine.states().get(record.widget_id);
        println!(
            "  #{} {:<20} {:<6} state={:?}",
            record.widget_id,
            record.kind.to_string(),
            record.size.to_string(),
            state,
        );
        if let Some(payload) = record.payload {
            println!("      payload: {}", payload.encode());
        }
    }

    handles.abort_all();
    Ok(())
}
