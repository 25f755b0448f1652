//! Clean song-list formatting of classification records.

use crate::classify::ClassificationRecord;
use serde::{Deserialize, Serialize};

/// How a matched song relates to its studio recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SongKind {
    Remix,
    Cover,
    Original,
    /// A user-created sound, not a released song.
    UserOriginal,
}

/// One entry in the clean song list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedSong {
    pub song: Option<String>,
    pub artist: Option<String>,
    #[serde(rename = "type")]
    pub kind: SongKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    pub tiktok_title: String,
}

/// Format one record. Non-songs yield an entry only when
/// `include_originals` is set.
pub fn format_record(record: &ClassificationRecord, include_originals: bool) -> Option<FormattedSong> {
    if record.is_real() {
        let kind = if record.is_remix == Some(true) {
            SongKind::Remix
        } else if record.is_cover == Some(true) {
            SongKind::Cover
        } else {
            SongKind::Original
        };

        Some(FormattedSong {
            song: record
                .song_name
                .clone()
                .or_else(|| Some(record.original_title.clone())),
            artist: record.artist.clone().or_else(|| Some("Unknown".into())),
            kind,
            confidence: record
                .confidence
                .clone()
                .or_else(|| Some("unknown".into())),
            tiktok_title: record.original_title.clone(),
        })
    } else if include_originals {
        Some(FormattedSong {
            song: None,
            artist: None,
            kind: SongKind::UserOriginal,
            confidence: None,
            tiktok_title: record.original_title.clone(),
        })
    } else {
        None
    }
}

/// Format all records into a clean song list.
pub fn format_song_list(
    records: &[ClassificationRecord],
    include_originals: bool,
) -> Vec<FormattedSong> {
    records
        .iter()
        .filter_map(|r| format_record(r, include_originals))
        .collect()
}
