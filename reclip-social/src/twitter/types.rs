use serde::{Deserialize, Serialize};

/// One status object as the v1.1 endpoints return it. Only the fields the
/// bot reads are modelled; unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    #[serde(rename = "id_str")]
    pub id: String,
    /// `full_text` in extended mode, `text` otherwise.
    #[serde(default, alias = "full_text")]
    pub text: Option<String>,
    /// Platform timestamp string, e.g. `Mon May 01 12:30:00 +0000 2023`.
    pub created_at: String,
    #[serde(default, rename = "in_reply_to_status_id_str")]
    pub in_reply_to_status_id: Option<String>,
    pub user: User,
    #[serde(default)]
    pub extended_entities: Option<ExtendedEntities>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub screen_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExtendedEntities {
    #[serde(default)]
    pub media: Vec<MediaEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaEntity {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Present only on video and animated-gif attachments.
    #[serde(default)]
    pub video_info: Option<VideoInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VideoInfo {
    #[serde(default)]
    pub duration_millis: Option<u64>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

/// One encoded rendition of a video attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub content_type: String,
    pub url: String,
    #[serde(default)]
    pub bitrate: Option<u64>,
}
