//! crates/studybank_core/src/stores/items.rs
//!
//! Item-only actions on top of the generic paged store: optimistic image
//! rotation, the review flag, and answer submission.

use crate::domain::{Answer, AnswerReceipt, Id, Item, NewAnswer, RotateResponse, Rotation};
use crate::ports::PortResult;
use crate::stores::paged::ItemStore;
use tracing::{error, warn};

impl ItemStore {
    /// Rotates one image of the current item, optimistically.
    ///
    /// The new rotation is visible in `current()` before the request
    /// resolves. On success only `updated_at` is taken from the server; on
    /// failure the images are restored from a snapshot taken just before
    /// the optimistic write and the error is returned. Returns `Ok(None)`
    /// without issuing a request when no item is loaded.
    ///
    /// Only one rotation per item may be in flight: a second call replaces
    /// the snapshot, so an earlier call's rollback restores the later
    /// call's optimistic images.
    pub async fn rotate_image(
        &self,
        id: Id,
        image_index: usize,
        rotation: Rotation,
    ) -> PortResult<Option<RotateResponse>> {
        let snapshot = {
            let mut guard = self.state.write();
            let state = &mut *guard;
            let Some(current) = state.current.as_mut() else {
                return Ok(None);
            };

            let snapshot = current.images.clone();
            let mut images = snapshot.clone();
            match images.get_mut(image_index) {
                Some(image) => image.rotation = rotation,
                None => warn!(id, image_index, "Rotating an image index the current item does not have"),
            }
            current.images = images;
            state.error = None;
            snapshot
        };

        match self.api.rotate_image(id, image_index, rotation).await {
            Ok(response) => {
                let mut state = self.state.write();
                if let (Some(current), Some(updated_at)) =
                    (state.current.as_mut(), response.updated_at)
                {
                    current.updated_at = Some(updated_at);
                }
                Ok(Some(response))
            }
            Err(e) => {
                error!(id, image_index, "Rotate image error, reverting: {}", e);
                let mut state = self.state.write();
                if let Some(current) = state.current.as_mut() {
                    current.images = snapshot;
                }
                state.error = Some(e.user_message("Failed to rotate image"));
                Err(e)
            }
        }
    }

    /// Sets the independent review flag. The current item, if it is this
    /// one, takes the value the server reports.
    pub async fn toggle_review(&self, id: Id, needs_review: bool) -> PortResult<bool> {
        let _loading = self.loading.begin();
        self.clear_error();

        let response = self
            .api
            .set_review_flag(id, needs_review)
            .await
            .map_err(|e| self.fail(e, "Failed to update review flag"))?;
        let confirmed = response
            .get("needs_review")
            .and_then(|v| v.as_bool())
            .unwrap_or(needs_review);

        self.update_current(id, |item| item.needs_review = confirmed);
        Ok(confirmed)
    }

    /// Records an attempt. The server marks correct answers mastered and
    /// flags wrong ones for review; the current item mirrors that.
    pub async fn submit_answer(&self, id: Id, answer: &NewAnswer) -> PortResult<AnswerReceipt> {
        let _loading = self.loading.begin();
        self.clear_error();

        let receipt = self
            .api
            .submit_answer(id, answer)
            .await
            .map_err(|e| self.fail(e, "Failed to submit answer"))?;

        let is_correct = receipt.answer.is_correct;
        let status = receipt.item_status;
        self.update_current(id, |item| {
            item.status = status;
            item.needs_review = !is_correct;
            item.attempts += 1;
        });
        Ok(receipt)
    }

    pub async fn answer_history(&self, id: Id) -> PortResult<Vec<Answer>> {
        let _loading = self.loading.begin();
        self.clear_error();

        self.api
            .answer_history(id)
            .await
            .map_err(|e| self.fail(e, "Failed to fetch answer history"))
    }

    /// Random selection of items flagged for review.
    pub async fn review_session(
        &self,
        limit: Option<u32>,
        subject: Option<&str>,
    ) -> PortResult<Vec<Item>> {
        let _loading = self.loading.begin();
        self.clear_error();

        self.api
            .review_session(limit, subject)
            .await
            .map_err(|e| self.fail(e, "Failed to fetch review session"))
    }

    fn update_current(&self, id: Id, apply: impl FnOnce(&mut Item)) {
        let mut state = self.state.write();
        if let Some(current) = state.current.as_mut().filter(|item| item.id == id) {
            apply(current);
        }
    }
}
