//! Application orchestration: load a photo, edit it, save the results.

use crate::ai::{GeminiImageEditClient, ImageEditService};
use crate::image::{ImageProcessor, ImageService, SavedImage};
use crate::models::{ClientState, Config, GeneratedImage};
use crate::session::EditSession;
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    /// Keep only the first image of the response.
    #[default]
    ImageOnly,
    /// Keep the model's commentary alongside the image.
    TextAndImage,
}

#[derive(Debug, Default)]
pub struct EditOutcome {
    /// Text returned by a [`EditMode::TextAndImage`] call.
    pub text: Option<String>,
    /// Saved images in the order they were produced.
    pub saved: Vec<SavedImage>,
}

/// Runs an edit and any follow-up edits, saving every resulting image.
pub struct App {
    session: EditSession,
    store: Box<dyn ImageService>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub editor: Arc<dyn ImageEditService>,
    pub store: Box<dyn ImageService>,
}

impl App {
    pub fn with_services(services: AppServices) -> Self {
        Self {
            session: EditSession::new(services.editor),
            store: services.store,
        }
    }

    pub fn new(config: &Config) -> Result<Self> {
        let editor = GeminiImageEditClient::from_config(config, reqwest::Client::new());
        info!("Edit provider: Gemini (model: {})", editor.model());

        let store = ImageProcessor::new(&config.output_dir)?;
        info!("Saving results to {}", store.output_dir().display());

        Ok(Self::with_services(AppServices {
            editor: Arc::new(editor),
            store: Box::new(store),
        }))
    }

    pub fn state(&self) -> ClientState {
        self.session.state()
    }

    pub async fn run(
        &self,
        input: &Path,
        prompt: &str,
        follow_ups: &[String],
        mode: EditMode,
    ) -> Result<EditOutcome> {
        let source = image::open(input)?;
        info!(
            "Loaded {} ({}x{})",
            input.display(),
            source.width(),
            source.height()
        );

        let mut outcome = EditOutcome::default();

        let first = match mode {
            EditMode::ImageOnly => Some(self.session.edit_image(&source, prompt).await?),
            EditMode::TextAndImage => {
                let result = self.session.generate_text_and_image(&source, prompt).await?;
                outcome.text = result.text;
                result.image
            }
        };

        match first {
            Some(image) => outcome.saved.push(self.save(&image, 0).await?),
            None => info!("Response carried no image"),
        }

        for (step, follow_up) in follow_ups.iter().enumerate() {
            info!("Editing again: {}", follow_up);
            let image = self.session.edit_again(follow_up).await?;
            outcome.saved.push(self.save(&image, step + 1).await?);
        }

        Ok(outcome)
    }

    async fn save(&self, image: &GeneratedImage, step: usize) -> Result<SavedImage> {
        let saved = self
            .store
            .save_image(image, &format!("geminate_{}", step))
            .await?;
        info!("Saved {}", saved.path.display());
        Ok(saved)
    }
}
