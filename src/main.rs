// Stationery Robot CLI
// Drops items onto the canvas, generates the sentence, narrates it

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use stationery_robot::clips::ClipLibrary;
use stationery_robot::commands;
use stationery_robot::settings::{AppSettings, NarrationMode};
use stationery_robot::speech;
use stationery_robot::state::AppState;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Chain per-word clips from the clip directory
    Clips,
    /// Speak the whole sentence with a system voice
    Tts,
}

impl From<Mode> for NarrationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Clips => NarrationMode::Clips,
            Mode::Tts => NarrationMode::Tts,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "stationery-robot", version, about = "Build and narrate the stationery robot sentence")]
struct Args {
    /// Directory of narration clips ("I use.mp3", "two.mp3", ...)
    #[arg(long)]
    clips: Option<PathBuf>,

    /// How to narrate the sentence
    #[arg(long, value_enum, default_value_t = Mode::Clips)]
    mode: Mode,

    /// Playback volume, 0.0 to 1.0
    #[arg(long)]
    volume: Option<f32>,

    /// Print the sentence without narrating it
    #[arg(long)]
    silent: bool,

    /// List the clips found in the clip directory and exit
    #[arg(long)]
    list_clips: bool,

    /// Dropped items as NAME=COUNT pairs (a bare NAME counts as one),
    /// e.g. pencil=2 book
    #[arg(value_name = "ITEM[=COUNT]")]
    items: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = AppSettings::default();
    settings.narration = args.mode.into();
    if let Some(dir) = args.clips {
        settings.clips_dir = Some(dir);
    }
    if let Some(volume) = args.volume {
        settings.volume = volume.clamp(0.0, 1.0);
    }

    let library = match settings.clips_dir.as_deref() {
        Some(dir) => ClipLibrary::open(dir)
            .with_context(|| format!("failed to index clips in {}", dir.display()))?,
        None => ClipLibrary::empty(),
    };

    if args.list_clips {
        for token in library.tokens() {
            println!("{}", token);
        }
        return Ok(());
    }

    let state = AppState::new(library, speech::create_best_tts(), settings);

    for entry in &args.items {
        let (name, count) = parse_item_arg(entry)?;
        for _ in 0..count {
            commands::drop_item(&state, name).map_err(anyhow::Error::msg)?;
        }
    }

    match commands::generate_sentence(&state).map_err(anyhow::Error::msg)? {
        Some(response) => {
            println!("{}", response.sentence);
            println!("{}", response.html);
            println!("clips: {}", response.audio_tokens.join(" | "));

            if !args.silent {
                let started = commands::speak(&state).await.map_err(anyhow::Error::msg)?;
                if started {
                    state.player.wait_until_idle(Duration::from_secs(60)).await;
                    while state.tts.is_speaking() {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                }
            }
        }
        None => println!("{}", commands::EMPTY_CANVAS_PROMPT),
    }

    Ok(())
}

/// Parse "pencil=2" (or a bare "pencil") into a name and count.
fn parse_item_arg(entry: &str) -> anyhow::Result<(&str, u32)> {
    let (name, count) = entry.split_once('=').unwrap_or((entry, "1"));
    let count: u32 = count
        .parse()
        .with_context(|| format!("bad count in \"{}\"", entry))?;
    Ok((name, count))
}
