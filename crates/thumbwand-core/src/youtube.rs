use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const VIDEO_ID_LEN: usize = 11;

fn video_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^.*((youtu.be/)|(v/)|(/u/(?-u:\w)/)|(embed/)|(watch\?))\??v?=?([^#&?]*).*")
            .expect("video id pattern is valid")
    })
}

/// Pulls the 11-character video id out of a short-link, embed or watch URL.
/// Length is counted in UTF-16 code units, as a browser would.
pub fn extract_video_id(url: &str) -> Option<String> {
    let captures = video_id_pattern().captures(url)?;
    let id = captures.get(7)?.as_str();
    (id.encode_utf16().count() == VIDEO_ID_LEN).then(|| id.to_string())
}

/// Thumbnail renditions served by img.youtube.com.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailQuality {
    #[default]
    MaxRes,
    Standard,
    High,
    Medium,
    Default,
}

impl ThumbnailQuality {
    pub fn file_stem(self) -> &'static str {
        match self {
            ThumbnailQuality::MaxRes => "maxresdefault",
            ThumbnailQuality::Standard => "sddefault",
            ThumbnailQuality::High => "hqdefault",
            ThumbnailQuality::Medium => "mqdefault",
            ThumbnailQuality::Default => "default",
        }
    }
}

pub fn thumbnail_url(video_id: &str, quality: ThumbnailQuality) -> String {
    format!("https://img.youtube.com/vi/{}/{}.jpg", video_id, quality.file_stem())
}
