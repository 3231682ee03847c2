//! Plain-text renderings of each session screen.

use std::fmt::Write as _;

use order_session::{OrderSession, SessionError};
use shared::{
    domain::SessionState,
    error::{ErrorKind, UserFacingError},
};

pub fn render(session: &OrderSession) -> String {
    let mut out = String::new();
    if let Some(error) = session.last_error() {
        out.push_str(&render_error(error));
    }
    match session.state() {
        SessionState::Capturing => out.push_str(&render_capture(session)),
        SessionState::Recognizing => out.push_str(&render_processing(session.images().len())),
        SessionState::Browsing => out.push_str(&render_menu(session)),
        SessionState::ReviewingOrder => out.push_str(&render_summary(session)),
    }
    out
}

pub fn render_error(error: &UserFacingError) -> String {
    let hint = match error.kind {
        ErrorKind::ConfigurationMissing => {
            "\n   Set GEMINI_API_KEY (or api_key in menu_lens.toml) and submit again."
        }
        ErrorKind::EmptyRecognition => "\n   Add a clearer photo, then `submit` again.",
        ErrorKind::Capture => "\n   Photos must be image files, e.g. JPEG, PNG or WebP.",
        _ => "",
    };
    format!("❌ {}{hint}\n\n", error.message)
}

/// A rejected command, shown without touching the session's own error banner.
pub fn render_session_error(error: &SessionError) -> String {
    render_error(&UserFacingError::new(error.kind(), error.to_string()))
}

pub fn render_capture(session: &OrderSession) -> String {
    let mut out = String::from("== Scan a menu ==\n");
    if session.images().is_empty() {
        out.push_str("No photos yet. `add <photo path>` to add a menu page.\n");
        return out;
    }
    for image in session.images() {
        let _ = writeln!(
            out,
            "  [{}] {} ({}, {} KB)",
            image.id,
            image.preview,
            image.payload.media_type,
            image.encoded_bytes.div_ceil(1024)
        );
    }
    let _ = writeln!(
        out,
        "{} page(s) ready. `submit` to translate, `remove <#>` to drop a page.",
        session.images().len()
    );
    out
}

pub fn render_processing(pages: usize) -> String {
    format!("Reading and translating {pages} menu page(s)...\n")
}

pub fn render_menu(session: &OrderSession) -> String {
    let mut out = format!("== Translated menu ({}) ==\n", session.dishes().len());
    let mut category: Option<&str> = None;
    for dish in session.dishes() {
        if dish.category.as_deref() != category {
            category = dish.category.as_deref();
            if let Some(heading) = category {
                let _ = writeln!(out, "-- {heading} --");
            }
        }
        let qty = session.cart().quantity(dish.id);
        let marker = if qty > 0 {
            format!(" x{qty}")
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "  [{}] {}  {}{marker}",
            dish.id, dish.translated_name, dish.price
        );
        let _ = writeln!(out, "       {}", dish.original_name);
        if let Some(description) = &dish.description {
            let _ = writeln!(out, "       {description}");
        }
    }
    let items = session.cart().total_items();
    if items > 0 {
        let _ = writeln!(out, "{items} item(s) selected. `checkout` to show staff.");
    }
    out
}

pub fn render_summary(session: &OrderSession) -> String {
    let summary = session.summary();
    let mut out = String::from("Please show this screen to the staff\n== 注文リスト (Order List) ==\n");
    for line in &summary.lines {
        let _ = writeln!(out, "  {}  x {}", line.dish.original_name, line.quantity);
        let _ = writeln!(out, "      {}", line.dish.translated_name);
    }
    let _ = writeln!(out, "合計金額 (参考)  {}", summary.total);
    out.push_str("`back` to edit the order, `reset` to start a new one.\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_session::CaptureOptions;

    #[test]
    fn capture_view_lists_pages() {
        let mut session = OrderSession::new(CaptureOptions { max_edge: 0 });
        session
            .add_image_bytes(vec![0; 2048], "image/heic", "page-1.heic")
            .expect("add");
        let view = render(&session);
        assert!(view.contains("[1] page-1.heic (image/heic, 2 KB)"));
        assert!(view.contains("1 page(s) ready"));
    }

    #[test]
    fn configuration_error_carries_remediation() {
        let view = render_error(&UserFacingError::new(
            ErrorKind::ConfigurationMissing,
            "recognition API key is not configured",
        ));
        assert!(view.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn failure_error_is_shown_unchanged() {
        let view = render_error(&UserFacingError::new(
            ErrorKind::RecognitionFailure,
            "503 UNAVAILABLE: The model is overloaded.",
        ));
        assert_eq!(view, "❌ 503 UNAVAILABLE: The model is overloaded.\n\n");
    }

    #[test]
    fn rejected_photo_gets_a_format_hint() {
        let mut session = OrderSession::default();
        let err = session
            .add_image_bytes(b"hello".to_vec(), "text/plain", "notes.txt")
            .expect_err("not an image");
        let view = render_session_error(&err);
        assert!(view.starts_with("❌ 'notes.txt' is not an image"));
        assert!(view.contains("JPEG, PNG or WebP"));
    }

    #[test]
    fn invalid_transition_has_no_hint() {
        let view = render_session_error(&SessionError::EmptyCart);
        assert_eq!(
            view,
            "❌ the order is empty; add at least one dish before checkout\n\n"
        );
    }
}
