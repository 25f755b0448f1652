//! Scrape the audio titles from a TikTok profile and identify the real
//! songs behind them.
//!
//! The scraper drives a headless chrome instance through a profile's
//! video feed and collects the unique audio titles. The classifier then
//! runs the raw titles through Gemini in batches and yields one record
//! per title with the matched song, artist, and confidence.
//!
//! # How to use
//!
//! - **Scrape a profile** with [`Scraper::run`].
//! - **Classify titles** with [`Classifier::classify`] over a
//!   [`GeminiClient`].
//! - **Format a clean song list** with [`format_song_list`].
//!
//! # Basic usage
//!
//! ```no_run
//! use soundscrape::{Classifier, Configuration, GeminiClient, ProfileTarget, Scraper};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let target = ProfileTarget::new("some_profile")?;
//!     let scraper = Scraper::new(Configuration::default());
//!     let outcome = scraper.run(&target).await?;
//!
//!     let gemini = GeminiClient::new(&std::env::var("GEMINI_API_KEY")?);
//!     let records = Classifier::new(&gemini).classify(&outcome.titles).await;
//!     let songs = soundscrape::format_song_list(&records, false);
//!
//!     println!("{}", serde_json::to_string_pretty(&songs)?);
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod carousel;
pub mod classify;
pub mod configuration;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod format;
pub mod loader;
pub mod profile;
pub mod scrape;
pub mod wait;

pub use browser::{CdpSurface, ProfileSurface, Session};
pub use classify::gemini::{GeminiClient, DEFAULT_GEMINI_MODEL};
pub use classify::{ClassificationRecord, Classifier, TextModel};
pub use configuration::Configuration;
pub use error::{ScrapeError, ScrapeResult};
pub use format::{format_song_list, FormattedSong, SongKind};
pub use profile::ProfileTarget;
pub use scrape::{ScrapeOutcome, ScrapeStatus, Scraper, TitleSet};

#[doc(hidden)]
pub extern crate tokio;
