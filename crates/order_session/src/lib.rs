//! Ordering session: captured photos, the recognized menu and the diner's cart.
//!
//! `OrderSession` is the only owner of that state. Every mutation is checked
//! against the current `SessionState`, and every recognition outcome (including
//! failures) is turned into a transition plus an optional user-facing error.

use std::{collections::HashSet, path::Path};

use menu_recognition::{MenuRecognitionClient, RecognitionError};
use shared::{
    domain::{DishId, DishRecord, ImageId, SessionState},
    error::{ErrorKind, UserFacingError},
    protocol::ImagePayload,
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub mod capture;
pub mod cart;
pub mod summary;

pub use capture::{CaptureError, CaptureOptions, CapturedImage, ImageCapture};
pub use cart::Cart;
pub use summary::{order_total, summarize, OrderLine, OrderSummary, OrderTotal};

pub const EMPTY_RECOGNITION_MESSAGE: &str =
    "No menu items could be recognized. Try retaking the photo with the whole menu in frame.";

pub const RECOGNITION_ABANDONED_MESSAGE: &str =
    "Recognition was interrupted before it finished. Submit the photos again.";

/// Answer to a "this clears your order" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

/// Rejected operations. The session is left exactly as it was.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },
    #[error("no menu photos captured yet")]
    NoImages,
    #[error("the order is empty; add at least one dish before checkout")]
    EmptyCart,
    #[error("unknown dish {0}")]
    UnknownDish(DishId),
    #[error("unknown image {0}")]
    UnknownImage(ImageId),
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Capture(_) => ErrorKind::Capture,
            _ => ErrorKind::InvalidTransition,
        }
    }
}

/// What a finished recognition call did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    /// Now browsing this many dishes.
    Recognized { dishes: usize },
    /// Back to capturing; the error is also kept in `last_error`.
    Failed(UserFacingError),
}

pub struct OrderSession {
    id: Uuid,
    state: SessionState,
    capture: ImageCapture,
    dishes: Vec<DishRecord>,
    cart: Cart,
    last_error: Option<UserFacingError>,
}

impl Default for OrderSession {
    fn default() -> Self {
        Self::new(CaptureOptions::default())
    }
}

impl OrderSession {
    pub fn new(options: CaptureOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Capturing,
            capture: ImageCapture::new(options),
            dishes: Vec::new(),
            cart: Cart::default(),
            last_error: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn dishes(&self) -> &[DishRecord] {
        &self.dishes
    }

    pub fn dish(&self, dish_id: DishId) -> Option<&DishRecord> {
        self.dishes.iter().find(|dish| dish.id == dish_id)
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn images(&self) -> &[CapturedImage] {
        self.capture.images()
    }

    pub fn last_error(&self) -> Option<&UserFacingError> {
        self.last_error.as_ref()
    }

    fn require(&self, expected: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }

    fn transition(&mut self, next: SessionState) {
        info!(
            session_id = %self.id,
            from = %self.state,
            to = %next,
            "session: state transition"
        );
        self.state = next;
    }

    pub fn add_image_file(&mut self, path: &Path) -> Result<ImageId, SessionError> {
        self.require(SessionState::Capturing, "add a photo")?;
        Ok(self.capture.add_file(path)?)
    }

    pub fn add_image_bytes(
        &mut self,
        bytes: Vec<u8>,
        media_type: &str,
        preview: impl Into<String>,
    ) -> Result<ImageId, SessionError> {
        self.require(SessionState::Capturing, "add a photo")?;
        Ok(self.capture.add_bytes(bytes, media_type, preview)?)
    }

    pub fn remove_image(&mut self, image_id: ImageId) -> Result<CapturedImage, SessionError> {
        self.require(SessionState::Capturing, "remove a photo")?;
        self.capture
            .remove(image_id)
            .ok_or(SessionError::UnknownImage(image_id))
    }

    /// Enters `Recognizing` and hands out the batch for the single recognition call.
    ///
    /// Pair with `complete_recognition` when the call runs outside the session,
    /// e.g. on a spawned task.
    pub fn begin_recognition(&mut self) -> Result<Vec<ImagePayload>, SessionError> {
        self.require(SessionState::Capturing, "submit photos")?;
        if self.capture.is_empty() {
            return Err(SessionError::NoImages);
        }
        self.last_error = None;
        self.transition(SessionState::Recognizing);
        Ok(self.capture.payloads())
    }

    pub fn complete_recognition(
        &mut self,
        result: Result<Vec<DishRecord>, RecognitionError>,
    ) -> Result<RecognitionOutcome, SessionError> {
        self.require(SessionState::Recognizing, "finish recognition")?;

        let dishes = match result {
            Ok(dishes) if dishes.is_empty() => {
                warn!(session_id = %self.id, "session: recognition returned no dishes");
                return Ok(self.fail_recognition(UserFacingError::new(
                    ErrorKind::EmptyRecognition,
                    EMPTY_RECOGNITION_MESSAGE,
                )));
            }
            Ok(dishes) => dishes,
            Err(err) => {
                warn!(session_id = %self.id, error = %err, "session: recognition failed");
                return Ok(self.fail_recognition(err.into()));
            }
        };

        self.dishes = with_unique_ids(dishes);
        self.cart.clear();
        self.transition(SessionState::Browsing);
        Ok(RecognitionOutcome::Recognized {
            dishes: self.dishes.len(),
        })
    }

    fn fail_recognition(&mut self, error: UserFacingError) -> RecognitionOutcome {
        self.last_error = Some(error.clone());
        self.transition(SessionState::Capturing);
        RecognitionOutcome::Failed(error)
    }

    /// Runs the whole recognition round trip with one call to `client`.
    ///
    /// Only precondition violations come back as `Err`; recognition problems
    /// are reported through the outcome and `last_error`. Dropping the future
    /// before it resolves (e.g. under `tokio::time::timeout`) puts the session
    /// back in `Capturing` with its photos.
    pub async fn submit_images<C>(
        &mut self,
        client: &C,
    ) -> Result<RecognitionOutcome, SessionError>
    where
        C: MenuRecognitionClient + ?Sized,
    {
        self.require(SessionState::Capturing, "submit photos")?;
        if self.capture.is_empty() {
            return Err(SessionError::NoImages);
        }
        if let Err(err) = client.check_ready() {
            warn!(session_id = %self.id, error = %err, "session: recognition client not ready");
            let error: UserFacingError = err.into();
            self.last_error = Some(error.clone());
            return Ok(RecognitionOutcome::Failed(error));
        }

        let images = self.begin_recognition()?;
        info!(session_id = %self.id, images = images.len(), "session: submitting photos");
        let guard = InFlightRecognition { session: self };
        let result = client.recognize(&images).await;
        let outcome = guard.session.complete_recognition(result);
        drop(guard);
        outcome
    }

    /// Applies `delta` to a dish's quantity; returns the new quantity.
    pub fn update_quantity(&mut self, dish_id: DishId, delta: i64) -> Result<u32, SessionError> {
        self.require(SessionState::Browsing, "change the order")?;
        if self.dish(dish_id).is_none() {
            return Err(SessionError::UnknownDish(dish_id));
        }
        Ok(self.cart.apply_delta(dish_id, delta))
    }

    pub fn checkout(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::Browsing, "check out")?;
        if self.cart.is_empty() {
            return Err(SessionError::EmptyCart);
        }
        self.transition(SessionState::ReviewingOrder);
        Ok(())
    }

    /// Leaves the order summary with the cart intact.
    pub fn return_to_menu(&mut self) -> Result<(), SessionError> {
        self.require(SessionState::ReviewingOrder, "return to the menu")?;
        self.transition(SessionState::Browsing);
        Ok(())
    }

    /// Discards photos, menu and cart. Returns whether the reset happened.
    pub fn start_over(&mut self, confirmation: Confirmation) -> Result<bool, SessionError> {
        if !matches!(
            self.state,
            SessionState::Browsing | SessionState::ReviewingOrder
        ) {
            return Err(SessionError::InvalidTransition {
                action: "start over",
                state: self.state,
            });
        }
        if confirmation == Confirmation::Declined {
            return Ok(false);
        }

        self.dishes.clear();
        self.cart.clear();
        self.capture.clear();
        self.last_error = None;
        self.transition(SessionState::Capturing);
        Ok(true)
    }

    /// Header back button: summary goes back to the menu, the menu back to capture.
    pub fn go_back(&mut self, confirmation: Confirmation) -> Result<SessionState, SessionError> {
        match self.state {
            SessionState::ReviewingOrder => self.return_to_menu()?,
            SessionState::Browsing => {
                self.start_over(confirmation)?;
            }
            state => {
                return Err(SessionError::InvalidTransition {
                    action: "go back",
                    state,
                })
            }
        }
        Ok(self.state)
    }

    pub fn summary(&self) -> OrderSummary {
        summarize(&self.dishes, &self.cart)
    }
}

/// Returns a session still waiting on a dropped recognition call to `Capturing`.
struct InFlightRecognition<'a> {
    session: &'a mut OrderSession,
}

impl Drop for InFlightRecognition<'_> {
    fn drop(&mut self) {
        if self.session.state == SessionState::Recognizing {
            warn!(session_id = %self.session.id, "session: recognition call abandoned");
            self.session.fail_recognition(UserFacingError::new(
                ErrorKind::RecognitionFailure,
                RECOGNITION_ABANDONED_MESSAGE,
            ));
        }
    }
}

/// Renumbers dishes if the recognizer handed out colliding ids.
fn with_unique_ids(mut dishes: Vec<DishRecord>) -> Vec<DishRecord> {
    let mut seen = HashSet::new();
    if dishes.iter().all(|dish| seen.insert(dish.id)) {
        return dishes;
    }
    warn!("session: recognizer returned duplicate dish ids; renumbering");
    for (index, dish) in dishes.iter_mut().enumerate() {
        dish.id = DishId(index as i64 + 1);
    }
    dishes
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
