//! Typed widget payloads behind the opaque storage blob.
//!
//! The stores treat payloads as opaque JSON text; this module is the single
//! place that knows the shape per widget category and how a payload evolves
//! on each refresh: calendars recompute their date fields, clocks carry the
//! downloaded face asset, photo and quote widgets advance a rotation index.
//!
//! A blob that fails to decode is treated as absent, never as an error
//! (stale rows from older releases must not wedge a widget).

use crate::clock::Clock;
use crate::widget::types::WidgetType;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Job parameter key: URL of the background/face asset to download.
pub const PARAM_BACKGROUND_URL: &str = "background_url";
/// Job parameter key: JSON array of local photo paths to rotate through.
pub const PARAM_PHOTO_PATHS: &str = "photo_paths";
/// Job parameter key: JSON array of quote strings to rotate through.
pub const PARAM_QUOTES: &str = "quotes";
/// Job parameter key: weather location label.
pub const PARAM_LOCATION: &str = "location";
/// Job parameter key: initially selected calendar day of month.
pub const PARAM_SELECTED_DAY: &str = "selected_day";

/// Content payload for one widget, serialized to the store's blob column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetPayload {
    Calendar {
        year: i32,
        month: u32,
        /// Today's day-of-month within `(year, month)`, if today falls there.
        today_day: Option<u32>,
        /// User-selected day, defaults to today at setup.
        selected_day: Option<u32>,
        #[serde(default)]
        background_path: Option<String>,
    },
    Clock {
        /// Local path of the downloaded face asset.
        #[serde(default)]
        face_asset_path: Option<String>,
    },
    Photo {
        photo_paths: Vec<String>,
        current_index: usize,
    },
    Quote {
        quotes: Vec<String>,
        current_index: usize,
    },
    Weather {
        #[serde(default)]
        background_path: Option<String>,
        #[serde(default)]
        location: Option<String>,
    },
}

impl WidgetPayload {
    /// Serialize to the opaque blob stored in the widgets table.
    #[must_use]
    pub fn encode(&self) -> String {
        // Payload variants contain only serde-friendly fields; encoding
        // cannot fail for any constructible value.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Decode a stored blob. Corrupt or unknown blobs read as `None`.
    #[must_use]
    pub fn decode(blob: &str) -> Option<WidgetPayload> {
        if blob.is_empty() {
            return None;
        }
        match serde_json::from_str(blob) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("ignoring malformed widget payload blob: {e}");
                None
            }
        }
    }
}

fn parse_string_list(params: &HashMap<String, String>, key: &str) -> Vec<String> {
    let Some(raw) = params.get(key) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) => list,
        Err(e) => {
            warn!(key, "ignoring malformed list parameter: {e}");
            Vec::new()
        }
    }
}

fn calendar_fields(clock: &dyn Clock, selected: Option<u32>) -> (i32, u32, Option<u32>, Option<u32>) {
    let today = clock.today();
    let (year, month, day) = (today.year(), today.month(), today.day());
    let selected_day = selected.filter(|d| *d >= 1 && *d <= crate::calendar::days_in_month(year, month));
    (year, month, Some(day), selected_day.or(Some(day)))
}

/// Build the initial payload for a `NewSetup` job.
///
/// `asset_path` is the locally cached path of the fetched background/face
/// asset, when the setup parameters carried a [`PARAM_BACKGROUND_URL`].
/// Returns `None` when the widget has nothing to show (unconfigured type,
/// empty rotation list) — the scheduler maps that to the `Empty` state.
#[must_use]
pub fn build_setup_payload(
    kind: WidgetType,
    params: &HashMap<String, String>,
    asset_path: Option<&str>,
    clock: &dyn Clock,
) -> Option<WidgetPayload> {
    match kind {
        WidgetType::None => None,
        WidgetType::Photo => {
            let photo_paths = parse_string_list(params, PARAM_PHOTO_PATHS);
            if photo_paths.is_empty() {
                return None;
            }
            Some(WidgetPayload::Photo {
                photo_paths,
                current_index: 0,
            })
        }
        WidgetType::Quote => {
            let quotes = parse_string_list(params, PARAM_QUOTES);
            if quotes.is_empty() {
                return None;
            }
            Some(WidgetPayload::Quote {
                quotes,
                current_index: 0,
            })
        }
        WidgetType::DigitalClock(_) | WidgetType::AnalogClock(_) => Some(WidgetPayload::Clock {
            face_asset_path: asset_path.map(str::to_owned),
        }),
        WidgetType::Calendar(_) => {
            let selected = params
                .get(PARAM_SELECTED_DAY)
                .and_then(|raw| raw.parse::<u32>().ok());
            let (year, month, today_day, selected_day) = calendar_fields(clock, selected);
            Some(WidgetPayload::Calendar {
                year,
                month,
                today_day,
                selected_day,
                background_path: asset_path.map(str::to_owned),
            })
        }
        WidgetType::Weather(_) => Some(WidgetPayload::Weather {
            background_path: asset_path.map(str::to_owned),
            location: params.get(PARAM_LOCATION).cloned(),
        }),
    }
}

/// Recompute the payload for an `UpdateOnly` job.
///
/// No network: date-dependent fields are recomputed and rotation indices
/// advance; everything else carries over from `prior`. Returns `None` when
/// there is no prior payload to update (the widget was never configured) or
/// the rotation list is empty.
#[must_use]
pub fn build_update_payload(
    kind: WidgetType,
    prior: Option<&WidgetPayload>,
    clock: &dyn Clock,
) -> Option<WidgetPayload> {
    match (kind, prior) {
        (WidgetType::Calendar(_), prior) => {
            // A calendar stays meaningful even without prior content: the
            // grid is derived from the date alone.
            let (selected, background_path) = match prior {
                Some(WidgetPayload::Calendar {
                    selected_day,
                    background_path,
                    ..
                }) => (*selected_day, background_path.clone()),
                _ => (None, None),
            };
            let (year, month, today_day, selected_day) = calendar_fields(clock, selected);
            Some(WidgetPayload::Calendar {
                year,
                month,
                today_day,
                selected_day,
                background_path,
            })
        }
        (WidgetType::Photo, Some(WidgetPayload::Photo { photo_paths, current_index })) => {
            if photo_paths.is_empty() {
                return None;
            }
            Some(WidgetPayload::Photo {
                photo_paths: photo_paths.clone(),
                current_index: (current_index + 1) % photo_paths.len(),
            })
        }
        (WidgetType::Quote, Some(WidgetPayload::Quote { quotes, current_index })) => {
            if quotes.is_empty() {
                return None;
            }
            Some(WidgetPayload::Quote {
                quotes: quotes.clone(),
                current_index: (current_index + 1) % quotes.len(),
            })
        }
        (WidgetType::DigitalClock(_) | WidgetType::AnalogClock(_), Some(prior)) => {
            Some(prior.clone())
        }
        (WidgetType::Weather(_), Some(prior)) => Some(prior.clone()),
        _ => None,
    }
}
