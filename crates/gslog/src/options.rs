//! Handler options

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::error::{LogError, Result};
use crate::level::Level;

/// Default `chrono` layout for entry times: `2024/06/11 10:00:00.000000`
pub const DEFAULT_TIME_LAYOUT: &str = "%Y/%m/%d %H:%M:%S%.6f";

/// Which parts of a text line are rendered
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextFlags(u8);

impl TextFlags {
    /// Entry time
    pub const TIME: TextFlags = TextFlags(1 << 0);
    /// `file:line` of the call site
    pub const FILE: TextFlags = TextFlags(1 << 1);
    /// Accepted for layout compatibility; Rust call sites carry no function name
    pub const FUNCTION: TextFlags = TextFlags(1 << 2);
    /// Level as `Info`
    pub const LEVEL: TextFlags = TextFlags(1 << 3);
    /// Level as `INFO`
    pub const LEVEL_UPPER: TextFlags = TextFlags(1 << 4);
    /// Level as `info`
    pub const LEVEL_LOWER: TextFlags = TextFlags(1 << 5);

    const ANY_LEVEL: TextFlags =
        TextFlags(Self::LEVEL.0 | Self::LEVEL_UPPER.0 | Self::LEVEL_LOWER.0);

    pub const fn empty() -> Self {
        TextFlags(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: TextFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: TextFlags) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether any level rendering is enabled
    pub const fn shows_level(self) -> bool {
        self.intersects(Self::ANY_LEVEL)
    }

    /// Level rendering; capitalised wins over upper, upper over lower
    pub fn level_str(self, level: Level) -> Option<&'static str> {
        if self.contains(Self::LEVEL) {
            Some(level.as_capital_str())
        } else if self.contains(Self::LEVEL_UPPER) {
            Some(level.as_upper_str())
        } else if self.contains(Self::LEVEL_LOWER) {
            Some(level.as_lower_str())
        } else {
            None
        }
    }
}

impl Default for TextFlags {
    fn default() -> Self {
        TextFlags::TIME | TextFlags::FILE | TextFlags::LEVEL
    }
}

impl BitOr for TextFlags {
    type Output = TextFlags;

    fn bitor(self, rhs: TextFlags) -> TextFlags {
        TextFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for TextFlags {
    fn bitor_assign(&mut self, rhs: TextFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for TextFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::TIME, "TIME"),
            (Self::FILE, "FILE"),
            (Self::FUNCTION, "FUNCTION"),
            (Self::LEVEL, "LEVEL"),
            (Self::LEVEL_UPPER, "LEVEL_UPPER"),
            (Self::LEVEL_LOWER, "LEVEL_LOWER"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "TextFlags({})", set.join(" | "))
    }
}

/// Text handler options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    /// Rendered as `<prefix> ` at the start of every line when non-empty
    pub prefix: String,
    pub flags: TextFlags,
}

/// Key names used by the JSON handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonKeys {
    pub time: String,
    pub source: String,
    pub level: String,
    pub message: String,
    pub fields: String,
}

impl Default for JsonKeys {
    fn default() -> Self {
        Self {
            time: "time".to_string(),
            source: "source".to_string(),
            level: "level".to_string(),
            message: "message".to_string(),
            fields: "fields".to_string(),
        }
    }
}

/// Options shared by every handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerOptions {
    /// Minimum level that is written
    pub level: Level,
    /// `chrono` format string for entry times
    pub time_layout: String,
    pub text: TextOptions,
    pub json: JsonKeys,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            level: Level::Info,
            time_layout: DEFAULT_TIME_LAYOUT.to_string(),
            text: TextOptions::default(),
            json: JsonKeys::default(),
        }
    }
}

impl HandlerOptions {
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_time_layout(mut self, layout: impl Into<String>) -> Self {
        self.time_layout = layout.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.text.prefix = prefix.into();
        self
    }

    pub fn with_text_flags(mut self, flags: TextFlags) -> Self {
        self.text.flags = flags;
        self
    }

    pub fn with_json_keys(mut self, keys: JsonKeys) -> Self {
        self.json = keys;
        self
    }

    /// Reject time layouts `chrono` cannot render
    pub fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.time_layout).any(|item| matches!(item, Item::Error)) {
            return Err(LogError::InvalidTimeLayout(self.time_layout.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        let flags = TextFlags::default();
        assert!(flags.contains(TextFlags::TIME));
        assert!(flags.contains(TextFlags::FILE));
        assert!(flags.contains(TextFlags::LEVEL));
        assert!(!flags.contains(TextFlags::FUNCTION));
        assert_eq!(format!("{flags:?}"), "TextFlags(TIME | FILE | LEVEL)");
    }

    #[test]
    fn test_level_rendering_precedence() {
        let flags = TextFlags::LEVEL_UPPER | TextFlags::LEVEL_LOWER;
        assert_eq!(flags.level_str(Level::Warn), Some("WARN"));
        assert_eq!(TextFlags::LEVEL_LOWER.level_str(Level::Warn), Some("warn"));
        assert_eq!(TextFlags::TIME.level_str(Level::Warn), None);
        assert!(!TextFlags::empty().shows_level());
    }

    #[test]
    fn test_validate_time_layout() {
        assert!(HandlerOptions::default().validate().is_ok());
        let bad = HandlerOptions::default().with_time_layout("%Y %Q");
        assert!(matches!(bad.validate(), Err(LogError::InvalidTimeLayout(_))));
    }

    #[test]
    fn test_options_serde() {
        let options = HandlerOptions::default()
            .with_level(Level::Debug)
            .with_prefix("api");
        let json = serde_json::to_string(&options).unwrap();
        let back: HandlerOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);

        let partial: HandlerOptions = serde_json::from_str(r#"{"level": "warn"}"#).unwrap();
        assert_eq!(partial.level, Level::Warn);
        assert_eq!(partial.time_layout, DEFAULT_TIME_LAYOUT);
    }
}
