use anyhow::Result;
use clap::Parser;
use geminate::app::{App, EditMode};
use geminate::models::Config;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "geminate")]
#[command(about = "Edit a photo with a text prompt using Gemini")]
struct CliArgs {
    /// Photo to edit (any format the image crate can read).
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// What to change about the photo.
    #[arg(value_name = "PROMPT", value_parser = parse_prompt)]
    prompt: String,

    /// Further prompts applied one after another to the previous result.
    #[arg(long = "then", value_name = "PROMPT", value_parser = parse_prompt)]
    then: Vec<String>,

    /// Also print the text the model returns alongside the image.
    #[arg(long)]
    with_text: bool,

    /// Directory for saved results (overrides GEMINATE_OUTPUT_DIR).
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

fn parse_prompt(input: &str) -> std::result::Result<String, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Prompt must not be empty".to_string());
    }
    Ok(trimmed.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geminate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let mut config = Config::from_env()?;
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    let mode = if args.with_text {
        EditMode::TextAndImage
    } else {
        EditMode::ImageOnly
    };

    let app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    match app.run(&args.image, &args.prompt, &args.then, mode).await {
        Ok(outcome) => {
            if let Some(text) = outcome.text {
                println!("{}", text);
            }
            for saved in &outcome.saved {
                println!("{}", saved.path.display());
            }
            info!("Edit completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Edit failed: {}", e);
            std::process::exit(1);
        }
    }
}
