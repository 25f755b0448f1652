extern crate env_logger;
extern crate serde_json;
extern crate soundscrape;

pub mod options;

use clap::Parser;
use options::Cli;
use soundscrape::{
    format_song_list, ClassificationRecord, Classifier, Configuration, GeminiClient,
    ProfileTarget, Scraper, DEFAULT_GEMINI_MODEL,
};
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _ = dotenvy::dotenv();

    if cli.verbose {
        use env_logger::Env;
        let env = Env::default()
            .filter_or("RUST_LOG", "info")
            .write_style_or("RUST_LOG_STYLE", "always");

        env_logger::init_from_env(env);
    }

    let output_dir = output_dir(&cli.output);

    if let Err(e) = tokio::fs::create_dir_all(&output_dir).await {
        eprintln!("could not create {}: {}", output_dir.display(), e);
        std::process::exit(1);
    }

    let headless = !cli.headful
        && !matches!(
            std::env::var("HEADLESS").as_deref(),
            Ok("false") | Ok("0")
        );

    let mut config = Configuration::new();
    config
        .with_headless(headless)
        .with_diagnostics_dir(Some(&output_dir));

    if let Some(max_videos) = cli.max_videos {
        config.with_max_videos(max_videos);
    }
    if let Some(batch_size) = cli.batch_size {
        config.with_batch_size(batch_size);
    }

    let config = config.build();

    let raw_titles = if cli.process_only {
        load_raw_titles(&output_dir).await
    } else {
        let profile = match cli.profile.clone().or_else(|| std::env::var("PROFILE").ok()) {
            Some(profile) => profile,
            None => {
                eprintln!("no profile set: pass --profile <username> or set PROFILE in .env");
                std::process::exit(1);
            }
        };

        let target = match ProfileTarget::new(&profile) {
            Ok(target) => target,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        };

        scrape(&config, &target, &output_dir).await
    };

    if cli.scrape_only {
        println!("Skipping AI processing (--scrape-only flag set).");
        println!("To process later, run: soundscrape --process-only");
        return;
    }

    let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();

    if api_key.is_empty() {
        println!("Note: GEMINI_API_KEY not set. Skipping AI processing.");
        return;
    }

    if raw_titles.is_empty() {
        println!("No songs found to process.");
        return;
    }

    let records = classify(&config, &api_key, &raw_titles).await;
    let songs = format_song_list(&records, cli.include_originals);

    write_json(&output_dir.join("processed_songs.json"), &records).await;
    write_json(&output_dir.join("songs.json"), &songs).await;

    println!("{:=<50}", "");
    println!("SUMMARY");
    println!("{:=<50}", "");
    println!("Total unique audio titles scraped: {}", raw_titles.len());
    println!("Identified as real songs: {}", songs.iter().filter(|s| s.song.is_some()).count());
    println!("Files created in {}:", output_dir.display());
    println!("  - raw_songs.json: Raw TikTok audio titles");
    println!("  - processed_songs.json: Full AI analysis results");
    println!("  - songs.json: Clean list of real songs");
}

/// Prefer the container mount point when it exists.
fn output_dir(flag: &str) -> PathBuf {
    let container = Path::new("/app/output");
    if flag == "output" && container.is_dir() {
        container.to_path_buf()
    } else {
        PathBuf::from(flag)
    }
}

async fn scrape(config: &Configuration, target: &ProfileTarget, output_dir: &Path) -> Vec<String> {
    println!("Starting TikTok song scraper for user: {}", target.handle());

    let outcome = match Scraper::new(config.clone()).run(target).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("scrape failed: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Visited {} videos, found {} unique audio titles ({}).",
        outcome.videos_visited,
        outcome.titles.len(),
        outcome.status.message()
    );

    write_json(&output_dir.join("raw_songs.json"), &outcome.titles).await;

    outcome.titles
}

async fn load_raw_titles(output_dir: &Path) -> Vec<String> {
    let path = output_dir.join("raw_songs.json");

    let contents = match tokio::fs::read_to_string(&path).await {
        Ok(contents) => contents,
        Err(_) => {
            eprintln!("{} not found. Run the scraper first.", path.display());
            std::process::exit(1);
        }
    };

    match serde_json::from_str::<Vec<String>>(&contents) {
        Ok(titles) => {
            println!("Loaded {} titles from {}", titles.len(), path.display());
            titles
        }
        Err(e) => {
            eprintln!("{} is not a valid title list: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

async fn classify(
    config: &Configuration,
    api_key: &str,
    raw_titles: &[String],
) -> Vec<ClassificationRecord> {
    let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.into());
    let gemini = GeminiClient::new(api_key).with_model(&model);

    println!("Processing {} audio titles with {}...", raw_titles.len(), model);

    Classifier::from_config(&gemini, config).classify(raw_titles).await
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            if let Err(e) = tokio::fs::write(path, json).await {
                eprintln!("could not write {}: {}", path.display(), e);
            } else {
                println!("Saved {}", path.display());
            }
        }
        Err(e) => eprintln!("could not serialize {}: {}", path.display(), e),
    }
}
