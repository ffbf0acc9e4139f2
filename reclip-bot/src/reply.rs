//! Reply text construction.

use crate::UploadedMedia;

/// Greeting, one `resolution: link` line per rendition, and the expiry
/// notice derived from the retention window.
pub fn format_reply(screen_name: &str, uploads: &[UploadedMedia], retention_mins: i64) -> String {
    let mut text = format!("Hi @{screen_name}! Here are the links to download the video.\n");
    for media in uploads {
        text.push_str(&media.resolution);
        text.push_str(": ");
        text.push_str(&media.link);
        text.push('\n');
    }
    text.push_str(&format!(
        "These files will be available for {}.\n",
        human_window(retention_mins)
    ));
    text
}

fn human_window(mins: i64) -> String {
    match mins {
        60 => "1 hour".to_string(),
        m if m % 60 == 0 && m > 0 => format!("{} hours", m / 60),
        m => format!("{m} minutes"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lists_every_rendition_with_the_expiry_notice() {
        let uploads = vec![
            UploadedMedia {
                resolution: "720x1280".into(),
                link: "https://dl.example/a".into(),
            },
            UploadedMedia {
                resolution: "480x640".into(),
                link: "https://dl.example/b".into(),
            },
        ];
        let text = format_reply("alice", &uploads, 60);
        assert_eq!(
            text,
            "Hi @alice! Here are the links to download the video.\n\
             720x1280: https://dl.example/a\n\
             480x640: https://dl.example/b\n\
             These files will be available for 1 hour.\n"
        );
    }

    #[test]
    fn non_hour_windows_are_spelled_in_minutes() {
        assert_eq!(human_window(90), "90 minutes");
        assert_eq!(human_window(120), "2 hours");
        assert_eq!(human_window(45), "45 minutes");
    }
}
