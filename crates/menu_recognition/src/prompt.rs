use serde_json::{json, Value};

/// Instruction appended after the image parts of a recognition request.
pub fn recognition_instruction(
    source_language: &str,
    target_language: &str,
    image_count: usize,
) -> String {
    let pages = if image_count > 1 {
        format!(
            "These {image_count} photos are pages of the same {source_language} restaurant menu. \
             If a dish appears on more than one photo, list it only once."
        )
    } else {
        format!("This photo is a {source_language} restaurant menu.")
    };

    format!(
        "{pages} The text may be handwritten. Read every dish and translate it precisely into \
         {target_language}. Return JSON with an `items` array; each item has: \
         `original_name` (exactly as written on the menu), \
         `translated_name` (in {target_language}), \
         `price` (the number as printed, or \"-\" when no price is shown or it is market price), \
         `description` (flavor or main ingredients in {target_language}, at most 10 characters), \
         `category` (the menu section heading, if any)."
    )
}

/// `responseSchema` for the generateContent call.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "items": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "original_name": { "type": "STRING" },
                        "translated_name": { "type": "STRING" },
                        "price": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "category": { "type": "STRING" }
                    },
                    "required": ["original_name", "translated_name", "price"]
                }
            }
        },
        "required": ["items"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_page_instruction_asks_for_merging() {
        let text = recognition_instruction("Japanese", "English", 3);
        assert!(text.contains("3 photos"));
        assert!(text.contains("only once"));
        assert!(!recognition_instruction("Japanese", "English", 1).contains("only once"));
    }

    #[test]
    fn schema_requires_name_and_price_fields() {
        let schema = response_schema();
        let required = &schema["properties"]["items"]["items"]["required"];
        assert_eq!(required, &json!(["original_name", "translated_name", "price"]));
    }
}
