//! Command-line front end for the voice translator.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] (from `--config` or the platform settings file).
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the [`Translator`] and run the requested subcommand.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use voice_translator::{
    config::AppConfig,
    engine::{ConfiguredLoader, EngineStatus, WHISPER_DISABLED_HINT},
    language::DirectionResolver,
    pipeline::{PipelineRequest, PipelineResult, StageOutcome},
    Translator,
};

#[derive(Parser, Debug)]
#[command(name = "voice-translator", version, about = "French ↔ Mooré speech translation")]
struct Cli {
    /// Settings file to use instead of the platform default
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate text and speak the translation
    Text {
        /// Direction label, e.g. "French → Mooré" or "Mooré -> French"
        #[arg(short, long, default_value = "French → Mooré")]
        direction: String,

        /// Text to translate
        text: String,

        /// Write the synthesised speech to this WAV file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Transcribe a WAV recording, translate it and speak the translation
    Voice {
        /// Direction label, e.g. "French → Mooré" or "Mooré -> French"
        #[arg(short, long, default_value = "French → Mooré")]
        direction: String,

        /// Input WAV file
        input: PathBuf,

        /// Write the synthesised speech to this WAV file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show engine status; with --load, load every engine first
    Status {
        #[arg(long)]
        load: bool,
    },

    /// List the supported directions
    Directions,
}

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // 2. Configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        }),
    };

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4. Translator
    let translator = Translator::from_config(config);
    rt.block_on(run(cli.command, translator))
}

async fn run(command: Command, translator: Translator) -> Result<()> {
    match command {
        Command::Directions => {
            for label in DirectionResolver::labels() {
                println!("{label}");
            }
            Ok(())
        }

        Command::Status { load } => {
            let status = if load {
                translator.warm_up().await
            } else {
                translator.engine_status()
            };
            for (kind, state) in status {
                let state = match state {
                    EngineStatus::NotLoaded => "not loaded".to_string(),
                    EngineStatus::Ready => "ready".to_string(),
                    EngineStatus::Unavailable(reason) => format!("unavailable ({reason})"),
                };
                println!("{:<14} {state}", kind.label());
            }
            Ok(())
        }

        Command::Text {
            direction,
            text,
            out,
        } => {
            let direction = DirectionResolver::resolve(&direction)?;
            let result = translator.submit(PipelineRequest::text(direction, text)).await;
            report(&result, out.as_deref())
        }

        Command::Voice {
            direction,
            input,
            out,
        } => {
            let direction = DirectionResolver::resolve(&direction)?;
            if !ConfiguredLoader::transcription_enabled() {
                log::warn!("voice mode: {WHISPER_DISABLED_HINT}");
            }
            let audio = std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let result = translator.submit(PipelineRequest::voice(direction, audio)).await;
            report(&result, out.as_deref())
        }
    }
}

/// Print every stage outcome; write the speech to `out` when requested.
fn report(result: &PipelineResult, out: Option<&Path>) -> Result<()> {
    println!("{} ({}), {} ms", result.direction, result.mode, result.elapsed.as_millis());

    if let Some(transcription) = &result.transcription {
        println!("transcription: {}", describe(transcription, |t| format!("{t:?}")));
    }
    println!("translation:   {}", describe(&result.translation, |t| format!("{t:?}")));
    println!(
        "synthesis:     {}",
        describe(&result.synthesis, |s| match s.substituted_for {
            Some(lang) => format!("{} bytes, voice {:?} standing in for {lang}", s.audio.len(), s.voice_tag),
            None => format!("{} bytes, voice {:?}", s.audio.len(), s.voice_tag),
        })
    );

    if let Some((stage, e)) = result.failure() {
        bail!("{stage} stage failed: {e}");
    }

    if let (Some(path), Some(speech)) = (out, result.speech()) {
        std::fs::write(path, &speech.audio)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("speech written to {}", path.display());
    }
    Ok(())
}

fn describe<T>(outcome: &StageOutcome<T>, success: impl Fn(&T) -> String) -> String {
    match outcome {
        StageOutcome::Success(v) => success(v),
        StageOutcome::Failure(e) => format!("failed: {e}"),
        StageOutcome::NotAttempted => "not attempted".to_string(),
    }
}
