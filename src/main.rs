// FACTSHORTS Main Entry Point

use factshorts_core::caption::{
    build_schedule, chunk, estimate_ms, CaptionSink, Synchronizer,
};
use factshorts_core::config::NarrationSettings;
use factshorts_core::facts::FactPool;
use factshorts_core::narration::{CommandTtsEngine, NarrationDriver, PacedEngine};
use factshorts_core::render::{cues_from_schedules, render, write_srt, RenderJob};
use factshorts_core::server::{start_server, ServiceState};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "factshorts-core")]
#[command(about = "Fact-narration shorts generator", long_about = None)]
struct Cli {
    /// Path to a JSON settings file overriding the defaults
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineKind {
    /// Silent engine pacing through the text at the estimated speed
    Paced,
    /// External TTS subprocess (espeak-ng by default)
    Tts,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw random facts from a pool and print them
    Facts {
        /// Pool name (random, science, history, weird)
        #[arg(short, long, default_value = "random")]
        pool: String,

        /// Number of facts to draw
        #[arg(short, long, default_value = "7")]
        count: usize,

        /// Custom pool file (JSON string array) instead of a built-in pool
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Narrate facts with synchronized captions on the console
    Narrate {
        /// Pool name to draw from
        #[arg(short, long, default_value = "random")]
        pool: String,

        /// Number of facts to narrate
        #[arg(short, long, default_value = "7")]
        count: usize,

        /// Narrate these texts instead of drawing from a pool
        #[arg(short, long)]
        text: Vec<String>,

        /// Speech engine to narrate with
        #[arg(long, value_enum, default_value = "paced")]
        engine: EngineKind,

        /// TTS command to invoke when --engine tts
        #[arg(long, default_value = "espeak-ng")]
        tts_command: String,

        /// Also write the caption track as SRT
        #[arg(long)]
        srt: Option<PathBuf>,
    },

    /// Generate an SRT caption track without narrating
    Srt {
        /// Pool name to draw from
        #[arg(short, long, default_value = "random")]
        pool: String,

        /// Number of facts
        #[arg(short, long, default_value = "7")]
        count: usize,

        /// Use these texts instead of drawing from a pool
        #[arg(short, long)]
        text: Vec<String>,

        /// Output SRT path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Compose a final MP4 from video, voice, optional music and captions
    Render {
        /// Background video path
        #[arg(long)]
        video: PathBuf,

        /// Voice track path
        #[arg(long)]
        voice: PathBuf,

        /// Optional background music path
        #[arg(long)]
        music: Option<PathBuf>,

        /// Optional SRT file to burn in
        #[arg(long)]
        srt: Option<PathBuf>,

        /// Output video path
        #[arg(short, long, default_value = "short.mp4")]
        output: PathBuf,
    },

    /// Start the HTTP render service
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Directory for rendered outputs and caption files
        #[arg(long, default_value = "outputs")]
        output_dir: PathBuf,
    },
}

/// Prints each caption chunk as the synchronizer releases it.
struct ConsoleSink;

impl CaptionSink for ConsoleSink {
    fn display(&self, text: &str) {
        println!(">> {}", text);
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<NarrationSettings> {
    match path {
        Some(p) => NarrationSettings::load(p),
        None => Ok(NarrationSettings::default()),
    }
}

fn gather_utterances(
    texts: &[String],
    pool: &str,
    count: usize,
) -> Vec<String> {
    if texts.is_empty() {
        FactPool::builtin(pool).draw_many(count)
    } else {
        texts.to_vec()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = load_settings(cli.settings.as_ref())?;
    settings.validate()?;

    match cli.command {
        Commands::Facts { pool, count, file } => {
            let mut pool = match file {
                Some(path) => FactPool::from_file(&path)?,
                None => FactPool::builtin(&pool),
            };
            for fact in pool.draw_many(count) {
                println!("{}", fact);
            }
        }

        Commands::Narrate {
            pool,
            count,
            text,
            engine,
            tts_command,
            srt,
        } => {
            let utterances = gather_utterances(&text, &pool, count);
            if utterances.is_empty() {
                warn!("[MAIN] Nothing to narrate.");
                return Ok(());
            }

            let sync = match engine {
                EngineKind::Paced => Synchronizer::new(
                    Arc::new(PacedEngine::new(settings.clone())),
                    settings.clone(),
                ),
                EngineKind::Tts => Synchronizer::new(
                    Arc::new(CommandTtsEngine::new(tts_command)),
                    settings.clone(),
                ),
            };
            let driver = NarrationDriver::new(Arc::new(sync));
            let cancel = driver.cancel_flag();

            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("[MAIN] Interrupt received, cancelling narration.");
                    cancel.cancel();
                }
            });

            let report = driver.narrate_all(&utterances, Arc::new(ConsoleSink)).await;
            info!(
                "[MAIN] Narration finished: {}/{} utterances{}",
                report.completed,
                utterances.len(),
                if report.cancelled { " (cancelled)" } else { "" }
            );

            if let Some(srt_path) = srt {
                let schedules: Vec<_> = utterances
                    .iter()
                    .map(|u| {
                        let chunks = chunk(u, settings.caption_words);
                        let total = estimate_ms(u, settings.tts_rate, &settings);
                        build_schedule(&chunks, total, &settings)
                    })
                    .collect();
                let cues = cues_from_schedules(&schedules, settings.inter_fact_gap_ms);
                write_srt(&srt_path, &cues).await?;
            }
        }

        Commands::Srt {
            pool,
            count,
            text,
            output,
        } => {
            let utterances = gather_utterances(&text, &pool, count);
            let schedules: Vec<_> = utterances
                .iter()
                .map(|u| {
                    let chunks = chunk(u, settings.caption_words);
                    let total = estimate_ms(u, settings.tts_rate, &settings);
                    build_schedule(&chunks, total, &settings)
                })
                .collect();
            let cues = cues_from_schedules(&schedules, settings.inter_fact_gap_ms);
            write_srt(&output, &cues).await?;
        }

        Commands::Render {
            video,
            voice,
            music,
            srt,
            output,
        } => {
            let job = RenderJob {
                video,
                voice,
                music,
                subtitles: srt,
                output,
            };
            let path = render(&job).await?;
            println!("{}", path.display());
        }

        Commands::Serve { port, output_dir } => {
            let state = Arc::new(ServiceState {
                settings,
                output_dir,
            });
            start_server(port, state).await;
        }
    }

    Ok(())
}
