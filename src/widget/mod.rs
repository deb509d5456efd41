//! Widget domain types: taxonomy, sizes, payloads, and the stored record.

pub mod payload;
pub mod types;

pub use payload::WidgetPayload;
pub use types::{CalendarStyle, ClockFace, WeatherStyle, WidgetCategory, WidgetSize, WidgetType};

use serde::{Deserialize, Serialize};

/// Durable record of one placed widget instance.
///
/// Created when the instance is placed, mutated only by the update
/// scheduler (single writer per id, enforced by job dedup), deleted when
/// the instance is removed from the home screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetRecord {
    /// Stable id for the widget instance's lifetime.
    pub widget_id: i64,
    /// Widget variant; drives payload shape and refresh behavior.
    pub kind: WidgetType,
    /// Home-screen slot size.
    pub size: WidgetSize,
    /// Current content, absent until the first successful refresh or when
    /// the stored blob is unreadable.
    pub payload: Option<WidgetPayload>,
    /// Epoch seconds of the last committed refresh.
    pub last_updated: i64,
}

impl WidgetRecord {
    /// A freshly placed, not-yet-refreshed record.
    #[must_use]
    pub fn placed(widget_id: i64, kind: WidgetType, size: WidgetSize) -> Self {
        Self {
            widget_id,
            kind,
            size,
            payload: None,
            last_updated: 0,
        }
    }
}
