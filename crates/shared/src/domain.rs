use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(DishId);
id_newtype!(ImageId);

/// Screen the ordering session is currently on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Capturing,
    Recognizing,
    Browsing,
    ReviewingOrder,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Capturing => "capturing",
            SessionState::Recognizing => "recognizing",
            SessionState::Browsing => "browsing",
            SessionState::ReviewingOrder => "reviewing_order",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Menu price exactly as printed, e.g. `"500"`, `"¥1,200"`, `"時価"` or `"-"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub String);

impl Price {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Whole currency units after stripping every non-digit character.
    ///
    /// Returns `None` for sentinels like `"時価"` or `"-"`, and for digit runs
    /// too large to fit in a `u64`.
    pub fn amount(&self) -> Option<u64> {
        let digits: String = self.0.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return None;
        }
        digits.parse::<u64>().ok()
    }

    pub fn is_market_price(&self) -> bool {
        self.amount().is_none()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.amount() {
            Some(_) if self.0.trim_start().starts_with(['¥', '￥']) => f.write_str(self.0.trim()),
            Some(_) => write!(f, "¥{}", self.0.trim()),
            None => f.write_str("時価"),
        }
    }
}

/// One recognized menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishRecord {
    pub id: DishId,
    pub original_name: String,
    pub translated_name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
