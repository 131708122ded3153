use serde::{Deserialize, Serialize};

/// Semantic weather category derived from a raw weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCategory {
    Clear,
    Cloudy,
    Rain,
    Snow,
    Storm,
}

/// Backdrop shown before any lookup has succeeded.
pub const DEFAULT_BACKDROP: &str = "default";

impl WeatherCategory {
    /// Map a weather code onto a category.
    ///
    /// Ranges are half-open and checked in order, so every integer (negative
    /// ones included) lands somewhere.
    pub fn from_code(code: i32) -> Self {
        if code < 3 {
            Self::Clear
        } else if code < 50 {
            Self::Cloudy
        } else if code < 70 {
            Self::Rain
        } else if code < 90 {
            Self::Snow
        } else {
            Self::Storm
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Cloudy => "cloudy",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Storm => "storm",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Cloudy => "Cloudy",
            Self::Rain => "Rainy",
            Self::Snow => "Snowy",
            Self::Storm => "Stormy",
        }
    }

    /// Key of the icon the presentation layer draws next to the reading.
    pub fn glyph_key(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::Cloudy => "cloud",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Storm => "storm",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Clear => "☀️",
            Self::Cloudy => "☁️",
            Self::Rain => "🌧️",
            Self::Snow => "❄️",
            Self::Storm => "⛈️",
        }
    }

    /// Key of the background applied once a result for this category is shown.
    pub fn backdrop_key(&self) -> &'static str {
        match self {
            Self::Clear => "sunny",
            Self::Cloudy => "cloudy",
            Self::Rain => "rainy",
            Self::Snow => "snow",
            Self::Storm => "storm",
        }
    }
}

impl std::fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification of one weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub category: WeatherCategory,
    pub glyph_key: &'static str,
}

pub fn classify(code: i32) -> Condition {
    let category = WeatherCategory::from_code(code);
    Condition { category, glyph_key: category.glyph_key() }
}
