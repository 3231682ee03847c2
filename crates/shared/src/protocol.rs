use serde::{Deserialize, Serialize};

use crate::domain::{DishId, DishRecord, Price};

/// One encoded photo as sent to the recognition service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub media_type: String,
    pub data_b64: String,
}

/// Structured output the recognition model is instructed to return.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognizedMenu {
    #[serde(default)]
    pub items: Vec<RecognizedDish>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedDish {
    pub original_name: String,
    pub translated_name: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl RecognizedMenu {
    /// Assigns session-local ids in recognition order.
    pub fn into_dish_records(self) -> Vec<DishRecord> {
        self.items
            .into_iter()
            .enumerate()
            .map(|(index, item)| DishRecord {
                id: DishId(index as i64 + 1),
                original_name: item.original_name.trim().to_string(),
                translated_name: item.translated_name.trim().to_string(),
                price: Price::new(item.price.trim()),
                description: non_blank(item.description),
                category: non_blank(item.category),
            })
            .collect()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
