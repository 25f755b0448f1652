use clap::Parser;

/// program to scrape the audio titles from a TikTok profile and
/// identify the real songs with Gemini.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// The TikTok username to scrape. Falls back to the PROFILE env var.
    #[clap(short, long)]
    pub profile: Option<String>,
    /// Only scrape audio titles, skip AI processing.
    #[clap(long, conflicts_with = "process_only")]
    pub scrape_only: bool,
    /// Only process an existing raw_songs.json with AI.
    #[clap(long, conflicts_with = "scrape_only")]
    pub process_only: bool,
    /// Run chrome with a visible window.
    #[clap(long)]
    pub headful: bool,
    /// The max videos to visit on the profile.
    #[clap(long)]
    pub max_videos: Option<usize>,
    /// Titles sent to the model per request.
    #[clap(long)]
    pub batch_size: Option<usize>,
    /// Include user-original sounds in the clean song list.
    #[clap(long)]
    pub include_originals: bool,
    /// Directory for the output JSON files.
    #[clap(short, long, default_value = "output")]
    pub output: String,
    /// Print progress on standard output.
    #[clap(short, long)]
    pub verbose: bool,
}
