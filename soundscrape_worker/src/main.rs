use serde::{Deserialize, Serialize};
use soundscrape::{
    format_song_list, Classifier, Configuration, FormattedSong, GeminiClient, ProfileTarget,
    ScrapeStatus, Scraper, DEFAULT_GEMINI_MODEL,
};
use std::convert::Infallible;
use tokio::sync::Semaphore;
use warp::http::StatusCode;
use warp::Filter;

#[macro_use]
extern crate lazy_static;

lazy_static! {
    /// gemini credentials shared by every request
    static ref GEMINI_API_KEY: String = std::env::var("GEMINI_API_KEY").unwrap_or_default();
    /// the gemini model to classify with
    static ref GEMINI_MODEL: String =
        std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.into());
    /// run chrome headless unless disabled
    static ref HEADLESS: bool = !matches!(
        std::env::var("HEADLESS").as_deref(),
        Ok("false") | Ok("0")
    );
    /// concurrent browser sessions allowed
    static ref SCRAPE_SLOTS: Semaphore = Semaphore::new(
        std::env::var("SCRAPE_SLOTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2)
    );
    /// origins allowed to call the worker from a browser
    static ref ALLOWED_ORIGINS: Vec<String> = {
        let mut origins = vec![
            "http://localhost:3000".to_string(),
            "http://localhost:5173".to_string(),
        ];
        if let Ok(frontend) = std::env::var("FRONTEND_URL") {
            if !frontend.is_empty() && !origins.contains(&frontend) {
                origins.push(frontend);
            }
        }
        origins
    };
}

#[derive(Debug, Deserialize)]
struct ScrapeRequest {
    username: String,
    #[serde(default = "default_process_with_ai")]
    process_with_ai: bool,
}

fn default_process_with_ai() -> bool {
    true
}

#[derive(Debug, Serialize)]
struct ScrapeResponse {
    username: String,
    total_videos_scraped: usize,
    total_unique_titles: usize,
    real_songs_identified: usize,
    raw_titles: Vec<String>,
    processed_songs: Option<Vec<FormattedSong>>,
    message: String,
}

#[derive(Debug, Serialize)]
struct Detail {
    detail: String,
}

fn reply(status: StatusCode, value: &impl Serialize) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(value), status)
}

async fn scrape_profile(request: ScrapeRequest) -> Result<impl warp::Reply, Infallible> {
    let target = match ProfileTarget::new(&request.username) {
        Ok(target) => target,
        Err(e) => {
            return Ok(reply(
                StatusCode::BAD_REQUEST,
                &Detail {
                    detail: e.to_string(),
                },
            ))
        }
    };

    // hold a slot for the whole browser session
    let _permit = match SCRAPE_SLOTS.acquire().await {
        Ok(permit) => permit,
        Err(_) => {
            return Ok(reply(
                StatusCode::SERVICE_UNAVAILABLE,
                &Detail {
                    detail: "worker is shutting down".into(),
                },
            ))
        }
    };

    let mut config = Configuration::new();
    config.with_headless(*HEADLESS);
    let config = config.build();

    let outcome = match Scraper::new(config.clone()).run(&target).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("@{}: {}", target.handle(), e);
            return Ok(reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                &Detail {
                    detail: format!("An error occurred while scraping: {}", e),
                },
            ));
        }
    };

    if outcome.titles.is_empty() {
        let message = match &outcome.status {
            ScrapeStatus::Faulted(msg) => format!("Scrape stopped early: {}", msg),
            _ => "No videos found or could not load the profile. The account may be private or blocked.".to_string(),
        };
        return Ok(reply(
            StatusCode::OK,
            &ScrapeResponse {
                username: target.handle().to_string(),
                total_videos_scraped: 0,
                total_unique_titles: 0,
                real_songs_identified: 0,
                raw_titles: Vec::new(),
                processed_songs: None,
                message,
            },
        ));
    }

    let processed_songs = if request.process_with_ai && !GEMINI_API_KEY.is_empty() {
        let gemini = GeminiClient::new(&GEMINI_API_KEY).with_model(&GEMINI_MODEL);
        let records = Classifier::from_config(&gemini, &config)
            .classify(&outcome.titles)
            .await;
        Some(format_song_list(&records, false))
    } else {
        None
    };

    let real_songs_identified = processed_songs.as_ref().map(|s| s.len()).unwrap_or(0);
    let message = match &processed_songs {
        Some(_) => format!(
            "Successfully scraped {} unique audio titles and identified {} real songs",
            outcome.titles.len(),
            real_songs_identified
        ),
        None => format!(
            "Successfully scraped {} unique audio titles",
            outcome.titles.len()
        ),
    };

    Ok(reply(
        StatusCode::OK,
        &ScrapeResponse {
            username: target.handle().to_string(),
            total_videos_scraped: outcome.videos_visited,
            total_unique_titles: outcome.titles.len(),
            real_songs_identified,
            raw_titles: outcome.titles,
            processed_songs,
            message,
        },
    ))
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    use env_logger::Env;
    env_logger::init_from_env(Env::default().filter_or("RUST_LOG", "info"));

    let cors = warp::cors()
        .allow_origins(ALLOWED_ORIGINS.iter().map(|s| s.as_str()))
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST"]);

    let root = warp::get().and(warp::path::end()).map(|| {
        warp::reply::json(&serde_json::json!({
            "status": "healthy",
            "service": "TikTok Song Scraper API",
            "version": "1.0.0"
        }))
    });

    let health = warp::get()
        .and(warp::path("health"))
        .and(warp::path::end())
        .map(|| warp::reply::json(&serde_json::json!({ "status": "healthy" })));

    let scrape = warp::post()
        .and(warp::path("scrape"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and_then(scrape_profile);

    let routes = root.or(health).or(scrape).with(cors);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("worker listening on 0.0.0.0:{}", port);

    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
}
