//! Pure media extraction over a resolved status.
//!
//! No I/O happens here: the extractor only decides *which* variants are
//! worth downloading and what the destination file must be called. The
//! pipeline owns the download/upload legs.

use crate::twitter::types::Status;
use chrono::{DateTime, FixedOffset};
use url::Url;

/// Timestamp format used by the platform, e.g.
/// `Mon May 01 12:30:00 +0000 2023`.
pub const PLATFORM_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

pub fn parse_created_at(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw, PLATFORM_TIME_FORMAT).ok()
}

/// One MP4 rendition selected for re-hosting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCandidate {
    pub resolution: String,
    pub url: String,
    pub filename: String,
}

/// Collect the `video/mp4` variants of every video attachment on `status`,
/// paired with the deterministic destination filename
/// `{screen_name}_{YYYYMMDD}_{status_id}_{resolution}.mp4`.
///
/// Non-video media and non-MP4 variants are ignored. An unparsable
/// `created_at` makes the whole status yield nothing, since the filename
/// would not be derivable.
pub fn video_candidates(status: &Status) -> Vec<VideoCandidate> {
    let Some(entities) = &status.extended_entities else {
        return Vec::new();
    };
    let Some(day) = parse_created_at(&status.created_at)
        .map(|dt| dt.format("%Y%m%d").to_string())
    else {
        tracing::warn!(id = %status.id, created_at = %status.created_at, "unparsable created_at, skipping media");
        return Vec::new();
    };

    let mut out = Vec::new();
    for media in &entities.media {
        let Some(video) = &media.video_info else {
            continue;
        };
        for variant in &video.variants {
            if variant.content_type != "video/mp4" {
                continue;
            }
            let Some(resolution) = resolution_from_url(&variant.url) else {
                tracing::debug!(url = %variant.url, "variant URL without a resolution segment");
                continue;
            };
            let filename = format!(
                "{}_{}_{}_{}.mp4",
                status.user.screen_name, day, status.id, resolution
            );
            out.push(VideoCandidate {
                resolution,
                url: variant.url.clone(),
                filename,
            });
        }
    }
    out
}

/// The resolution is the second-to-last path segment of a variant URL
/// (`.../vid/720x1280/clip.mp4` -> `720x1280`); query strings are ignored.
pub fn resolution_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let segments: Vec<_> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    (segments.len() >= 2).then(|| segments[segments.len() - 2].to_string())
}
