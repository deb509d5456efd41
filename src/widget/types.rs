//! Widget type taxonomy and size registry.
//!
//! [`WidgetType`] is the closed set of widget variants (content kind ×
//! style). Every variant has a unique string id; the mapping is total in
//! both directions, and unknown ids decode to [`WidgetType::None`] so stale
//! persisted rows never fail deserialization. Dispatch throughout the
//! engine pattern-matches on this enum.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Clock face style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockFace {
    Type1,
    Type2,
}

/// Calendar layout style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarStyle {
    Type1,
    Type2,
    Type3,
    Type4,
    Type5,
    Type6,
}

/// Weather layout style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherStyle {
    Type1,
    Type2,
    Type3,
    Type4,
}

/// Content category of a widget type, used for category-wide operations
/// such as "redraw all calendar widgets" after a system date change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetCategory {
    Photo,
    Quote,
    DigitalClock,
    AnalogClock,
    Calendar,
    Weather,
}

/// A widget variant.
///
/// Encoded on the wire and in storage as its string id (see [`Self::id`]);
/// unknown ids decode to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum WidgetType {
    /// Placeholder for an unconfigured widget or an unknown persisted id.
    #[default]
    None,
    Photo,
    Quote,
    DigitalClock(ClockFace),
    AnalogClock(ClockFace),
    Calendar(CalendarStyle),
    Weather(WeatherStyle),
}

impl WidgetType {
    /// Every widget type, `None` included. The id mapping is a bijection
    /// over this list.
    #[must_use]
    pub fn all() -> Vec<WidgetType> {
        use WidgetType::*;
        vec![
            None,
            Photo,
            Quote,
            DigitalClock(ClockFace::Type1),
            DigitalClock(ClockFace::Type2),
            AnalogClock(ClockFace::Type1),
            AnalogClock(ClockFace::Type2),
            Calendar(CalendarStyle::Type1),
            Calendar(CalendarStyle::Type2),
            Calendar(CalendarStyle::Type3),
            Calendar(CalendarStyle::Type4),
            Calendar(CalendarStyle::Type5),
            Calendar(CalendarStyle::Type6),
            Weather(WeatherStyle::Type1),
            Weather(WeatherStyle::Type2),
            Weather(WeatherStyle::Type3),
            Weather(WeatherStyle::Type4),
        ]
    }

    /// One representative per category for the widget picker, `None`
    /// excluded.
    #[must_use]
    pub fn picker_mains() -> Vec<WidgetType> {
        vec![
            WidgetType::Photo,
            WidgetType::Quote,
            WidgetType::DigitalClock(ClockFace::Type1),
            WidgetType::AnalogClock(ClockFace::Type1),
            WidgetType::Calendar(CalendarStyle::Type1),
            WidgetType::Weather(WeatherStyle::Type1),
        ]
    }

    /// Stable string id, unique per variant.
    #[must_use]
    pub fn id(self) -> &'static str {
        use WidgetType::*;
        match self {
            None => "none",
            Photo => "photo",
            Quote => "quote",
            DigitalClock(ClockFace::Type1) => "digital_clock_type1",
            DigitalClock(ClockFace::Type2) => "digital_clock_type2",
            AnalogClock(ClockFace::Type1) => "analog_clock_type1",
            AnalogClock(ClockFace::Type2) => "analog_clock_type2",
            Calendar(CalendarStyle::Type1) => "calendar_type1",
            Calendar(CalendarStyle::Type2) => "calendar_type2",
            Calendar(CalendarStyle::Type3) => "calendar_type3",
            Calendar(CalendarStyle::Type4) => "calendar_type4",
            Calendar(CalendarStyle::Type5) => "calendar_type5",
            Calendar(CalendarStyle::Type6) => "calendar_type6",
            Weather(WeatherStyle::Type1) => "weather_type1",
            Weather(WeatherStyle::Type2) => "weather_type2",
            Weather(WeatherStyle::Type3) => "weather_type3",
            Weather(WeatherStyle::Type4) => "weather_type4",
        }
    }

    /// Decode a string id. Never fails: unknown ids map to `None`.
    ///
    /// Legacy upper-case category names from early installs map to the
    /// category's canonical default variant.
    #[must_use]
    pub fn from_id(id: &str) -> WidgetType {
        for t in Self::all() {
            if t.id() == id {
                return t;
            }
        }
        match id {
            "PHOTO" => WidgetType::Photo,
            "QUOTE" => WidgetType::Quote,
            "CLOCK" => WidgetType::DigitalClock(ClockFace::Type1),
            "ANALOG_CLOCK" => WidgetType::AnalogClock(ClockFace::Type1),
            "CALENDAR" => WidgetType::Calendar(CalendarStyle::Type1),
            "WEATHER" => WidgetType::Weather(WeatherStyle::Type1),
            _ => WidgetType::None,
        }
    }

    /// Content category, or `None` for the unconfigured placeholder.
    #[must_use]
    pub fn category(self) -> Option<WidgetCategory> {
        match self {
            WidgetType::None => None,
            WidgetType::Photo => Some(WidgetCategory::Photo),
            WidgetType::Quote => Some(WidgetCategory::Quote),
            WidgetType::DigitalClock(_) => Some(WidgetCategory::DigitalClock),
            WidgetType::AnalogClock(_) => Some(WidgetCategory::AnalogClock),
            WidgetType::Calendar(_) => Some(WidgetCategory::Calendar),
            WidgetType::Weather(_) => Some(WidgetCategory::Weather),
        }
    }

    /// `true` for categories whose content rotates on a timer.
    #[must_use]
    pub fn rotates(self) -> bool {
        matches!(self, WidgetType::Photo | WidgetType::Quote)
    }
}

impl From<WidgetType> for String {
    fn from(t: WidgetType) -> String {
        t.id().to_owned()
    }
}

impl From<String> for WidgetType {
    fn from(id: String) -> WidgetType {
        WidgetType::from_id(&id)
    }
}

impl std::fmt::Display for WidgetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Home-screen slot size. Selects both layout and job parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl WidgetSize {
    /// Stable string id.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            WidgetSize::Small => "small",
            WidgetSize::Medium => "medium",
            WidgetSize::Large => "large",
        }
    }

    /// Parse a size string leniently.
    ///
    /// Unparseable values fall back to `Medium` with a logged warning
    /// rather than failing the job that carried them.
    #[must_use]
    pub fn parse_lenient(value: &str) -> WidgetSize {
        match value {
            "small" => WidgetSize::Small,
            "medium" => WidgetSize::Medium,
            "large" => WidgetSize::Large,
            other => {
                warn!(size = other, "unknown widget size, defaulting to medium");
                WidgetSize::Medium
            }
        }
    }
}

impl std::fmt::Display for WidgetSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
