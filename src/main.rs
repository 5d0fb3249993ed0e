use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use chordpro_scribe::ai::Mode;
use chordpro_scribe::config::Config;
use chordpro_scribe::error::Result;
use chordpro_scribe::models::{FeedbackEntry, SongResult};
use chordpro_scribe::services::{
    save_chordpro, share_url, Converter, HOME_RECENT_LIMIT, LIBRARY_RECENT_LIMIT,
};

#[derive(Parser)]
#[command(name = "chordpro", version, about = "YouTube link or song name to ChordPro chords")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transcribe a YouTube URL or song name
    Convert {
        input: String,
        /// Skip search grounding and reasoning for a faster answer
        #[arg(long, conflicts_with = "deep")]
        express: bool,
        /// Force search-grounded mode even if the config defaults to express
        #[arg(long)]
        deep: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Also write a .cho file into this directory
        #[arg(long, value_name = "DIR")]
        save: Option<PathBuf>,
    },
    /// Search cached songs by title or artist
    Search {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// List the most recent conversions
    Recent {
        #[arg(long)]
        limit: Option<usize>,
        /// Show the full library page instead of the short list
        #[arg(long)]
        library: bool,
    },
    /// Ask the AI to find matching YouTube videos
    Find {
        query: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Send or read feedback
    Feedback {
        #[command(subcommand)]
        action: FeedbackAction,
    },
}

#[derive(Subcommand)]
enum FeedbackAction {
    Submit {
        #[arg(long)]
        email: String,
        #[arg(long)]
        comment: String,
        /// 1 to 5 stars
        #[arg(long)]
        rating: Option<u8>,
        #[arg(long)]
        song_title: Option<String>,
        #[arg(long)]
        song_artist: Option<String>,
        #[arg(long)]
        query: Option<String>,
    },
    List,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let converter = Converter::from_config(&config).await?;

    let result = run(cli.command, &config, &converter).await;

    // Let background cache and log writes land before the runtime stops.
    converter.flush().await;
    result
}

async fn run(command: Command, config: &Config, converter: &Converter) -> Result<ExitCode> {
    match command {
        Command::Convert {
            input,
            express,
            deep,
            json,
            save,
        } => {
            let deep_mode = if express {
                false
            } else {
                deep || config.default_mode == Mode::Deep
            };

            let song = match converter.convert(&input, deep_mode).await {
                Ok(song) => song,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return Ok(ExitCode::FAILURE);
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&song)?);
            } else {
                print_song(&song);
            }

            if let Some(dir) = save {
                let path = save_chordpro(&song, &dir)?;
                eprintln!("Saved {}", path.display());
            }

            if let Some(base) = &config.share_base_url {
                eprintln!("Share: {}", share_url(base, &input)?);
            }
        }

        Command::Search { query, limit } => {
            let songs = converter.search_cache(&query, limit).await;
            print_list(&songs);
        }

        Command::Recent { limit, library } => {
            let default_limit = if library {
                LIBRARY_RECENT_LIMIT
            } else {
                HOME_RECENT_LIMIT
            };
            let songs = converter.list_recent(limit.unwrap_or(default_limit)).await;
            print_list(&songs);
        }

        Command::Find { query, limit } => {
            let hits = converter.search_external(&query, limit).await;
            if hits.is_empty() {
                println!("No videos found.");
            }
            for hit in hits {
                let duration = hit.duration.as_deref().unwrap_or("?");
                println!("{} - {} [{}]\n  {}", hit.title, hit.artist, duration, hit.url);
            }
        }

        Command::Feedback { action } => match action {
            FeedbackAction::Submit {
                email,
                comment,
                rating,
                song_title,
                song_artist,
                query,
            } => {
                let mut entry = FeedbackEntry::new(email, comment);
                if let Some(rating) = rating {
                    entry = entry.with_rating(rating);
                }
                if let Some(query) = query {
                    entry = entry.with_query(query);
                }
                entry.song_title = song_title;
                entry.song_artist = song_artist;

                if let Err(e) = converter.submit_feedback(entry).await {
                    eprintln!("Error: {}", e);
                    return Ok(ExitCode::FAILURE);
                }
                println!("Thanks for the feedback!");
            }
            FeedbackAction::List => {
                let feedbacks = converter.fetch_feedbacks().await;
                if feedbacks.is_empty() {
                    println!("No feedback received yet.");
                }
                for f in feedbacks {
                    let stars: String = (1..=5)
                        .map(|i| if f.rating.unwrap_or(0) >= i { '★' } else { '☆' })
                        .collect();
                    println!(
                        "{} {} ({})\n  Query: {}\n  {}",
                        stars,
                        f.song_title.as_deref().unwrap_or("Unknown Song"),
                        f.email,
                        f.input_query.as_deref().unwrap_or("-"),
                        f.comment
                    );
                }
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}

fn print_song(song: &SongResult) {
    let source = if song.is_from_cache { " (cached)" } else { "" };
    eprintln!("{} - {}{}", song.title, song.artist, source);
    if let Some(key) = &song.musical_key {
        eprintln!("Key: {}", key);
    }
    if let Some(date) = &song.release_date {
        eprintln!("Released: {}", date);
    }
    println!("{}", song.annotated_content);
    for url in &song.source_urls {
        eprintln!("Source: {}", url);
    }
}

fn print_list(songs: &[SongResult]) {
    if songs.is_empty() {
        println!("No songs found.");
    }
    for song in songs {
        let key = song.musical_key.as_deref().unwrap_or("-");
        println!("{} - {} (key {})", song.title, song.artist, key);
    }
}
