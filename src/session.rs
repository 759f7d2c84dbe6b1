//! Observable edit session
//!
//! Wraps an [`ImageEditService`] with the status a front end binds to:
//! whether a call is running and the last error message. Every call still
//! returns its own `Result`; the shared state is only a projection of the
//! most recently started call, so an older response arriving late cannot
//! overwrite the status of a newer one.

use crate::ai::ImageEditService;
use crate::models::{ClientState, EditResult, GeneratedImage};
use crate::{Error, Result};
use image::DynamicImage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

pub struct EditSession {
    service: Arc<dyn ImageEditService>,
    state: watch::Sender<ClientState>,
    next_call: AtomicU64,
    latest_image: Mutex<Option<GeneratedImage>>,
}

impl EditSession {
    pub fn new(service: Arc<dyn ImageEditService>) -> Self {
        let (state, _) = watch::channel(ClientState::default());
        Self {
            service,
            state,
            next_call: AtomicU64::new(1),
            latest_image: Mutex::new(None),
        }
    }

    /// Receiver that yields every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ClientState {
        self.state.borrow().clone()
    }

    /// Most recent image produced by a current call on this session.
    pub fn latest_image(&self) -> Option<GeneratedImage> {
        self.latest_image
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub async fn edit_image(&self, image: &DynamicImage, prompt: &str) -> Result<GeneratedImage> {
        let call = self.begin();
        let result = self.service.edit_image(image, prompt).await;
        self.finish(call, result.as_ref().ok().cloned(), result.as_ref().err());
        result
    }

    pub async fn generate_text_and_image(
        &self,
        image: &DynamicImage,
        prompt: &str,
    ) -> Result<EditResult> {
        let call = self.begin();
        let result = self.service.generate_text_and_image(image, prompt).await;
        let produced = result.as_ref().ok().and_then(|r| r.image.clone());
        self.finish(call, produced, result.as_ref().err());
        result
    }

    /// Applies `prompt` to the latest result image.
    pub async fn edit_again(&self, prompt: &str) -> Result<GeneratedImage> {
        let call = self.begin();
        let source = self.latest_image();
        let result = match source {
            Some(source) => self.service.edit_image(&source.image, prompt).await,
            None => Err(Error::NothingToEdit),
        };
        self.finish(call, result.as_ref().ok().cloned(), result.as_ref().err());
        result
    }

    fn begin(&self) -> u64 {
        let call = self.next_call.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|state| {
            state.call = call;
            state.is_processing = true;
            state.last_error = None;
        });
        tracing::debug!("Edit call {} started", call);
        call
    }

    fn finish(&self, call: u64, produced: Option<GeneratedImage>, error: Option<&Error>) {
        let applied = self.state.send_if_modified(|state| {
            if state.call != call {
                return false;
            }
            state.is_processing = false;
            state.last_error = error.map(|e| e.to_string());
            if let Some(image) = produced {
                *self
                    .latest_image
                    .lock()
                    .unwrap_or_else(|e| e.into_inner()) = Some(image);
            }
            true
        });

        match (applied, error) {
            (false, _) => tracing::debug!("Edit call {} superseded; result not published", call),
            (true, Some(e)) => tracing::warn!("Edit call {} failed: {}", call, e),
            (true, None) => tracing::debug!("Edit call {} completed", call),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockImageEditClient;
    use crate::image::codec;
    use std::time::Duration;

    fn source() -> DynamicImage {
        DynamicImage::new_rgb8(2, 2)
    }

    fn session_with(mock: MockImageEditClient) -> EditSession {
        EditSession::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_initial_state() {
        let session = session_with(MockImageEditClient::new());
        assert_eq!(session.state(), ClientState::default());
        assert!(session.latest_image().is_none());
    }

    #[tokio::test]
    async fn test_success_clears_processing_and_error() {
        let session = session_with(MockImageEditClient::new());

        session.edit_image(&source(), "p").await.unwrap();

        let state = session.state();
        assert!(!state.is_processing);
        assert_eq!(state.last_error, None);
        assert_eq!(state.call, 1);
        assert!(session.latest_image().is_some());
    }

    #[tokio::test]
    async fn test_failure_records_message() {
        let session = session_with(MockImageEditClient::new().with_failure("rate limited"));

        let err = session.edit_image(&source(), "p").await.unwrap_err();

        let state = session.state();
        assert!(!state.is_processing);
        assert_eq!(state.last_error.as_deref(), Some("rate limited"));
        assert_eq!(err.to_string(), "rate limited");
    }

    #[tokio::test]
    async fn test_next_call_resets_error() {
        let session = session_with(MockImageEditClient::new().with_failure("boom"));

        assert!(session.edit_image(&source(), "p").await.is_err());
        session
            .generate_text_and_image(&source(), "p")
            .await
            .unwrap();

        let state = session.state();
        assert_eq!(state.last_error, None);
        assert_eq!(state.call, 2);
    }

    #[tokio::test]
    async fn test_processing_flag_observed_while_in_flight() {
        let session = Arc::new(session_with(
            MockImageEditClient::new().with_delay(Duration::from_millis(100)),
        ));
        let mut rx = session.subscribe();

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.edit_image(&source(), "p").await }
        });

        rx.wait_for(|state| state.is_processing).await.unwrap();
        rx.wait_for(|state| !state.is_processing).await.unwrap();
        task.await.unwrap().unwrap();
        assert!(!session.state().is_processing);
    }

    #[tokio::test]
    async fn test_stale_completion_does_not_overwrite_newer_call() {
        let first = codec::tests::png_bytes(2, 2);
        let second = codec::tests::png_bytes(3, 3);
        let mock = MockImageEditClient::new()
            .with_delay(Duration::from_millis(150))
            .with_failure("slow failure")
            .with_image_response(first)
            .with_image_response(second.clone());
        let session = session_with(mock);

        let src = source();
        let (slow, fast) = tokio::join!(session.edit_image(&src, "slow"), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            session.edit_image(&src, "fast").await
        });

        assert!(slow.is_err());
        assert_eq!(fast.unwrap().bytes, second);

        let state = session.state();
        assert_eq!(state.call, 2);
        assert!(!state.is_processing);
        assert_eq!(state.last_error, None);
        assert_eq!(session.latest_image().unwrap().bytes, second);
    }

    #[tokio::test]
    async fn test_edit_again_uses_latest_result() {
        let mock = MockImageEditClient::new();
        let handle = mock.clone();
        let session = session_with(mock);

        session.edit_image(&source(), "first").await.unwrap();
        session.edit_again("second").await.unwrap();

        assert_eq!(handle.prompts(), vec!["first", "second"]);
        assert_eq!(session.state().call, 2);
    }

    #[tokio::test]
    async fn test_edit_again_without_result() {
        let session = session_with(MockImageEditClient::new());

        let err = session.edit_again("p").await.unwrap_err();

        assert!(matches!(err, Error::NothingToEdit));
        assert_eq!(
            session.state().last_error.as_deref(),
            Some("No previous result to edit")
        );
    }

    #[tokio::test]
    async fn test_poisoned_image_slot_still_usable() {
        let session = Arc::new(session_with(MockImageEditClient::new()));

        let poisoner = session.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.latest_image.lock().unwrap();
            panic!("poison the image slot");
        })
        .join();
        assert!(session.latest_image.is_poisoned());

        session.edit_image(&source(), "p").await.unwrap();
        assert!(session.latest_image().is_some());
        session.edit_again("again").await.unwrap();
    }
}
