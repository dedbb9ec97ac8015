//! Submission snippet shown under the player.
//!
//! Uploaders paste it into the showcase list; id and dimensions are
//! pre-filled so they do not have to be looked up by hand.

use chrono::NaiveDate;

use crate::poster::PlaybackId;
use crate::session::VideoSize;

pub fn submission_date(date: NaiveDate) -> String {
    date.format("%m-%d-%Y").to_string()
}

pub fn showcase_snippet(id: &PlaybackId, size: Option<VideoSize>, date: NaiveDate) -> String {
    let (height, width) = match size {
        Some(s) => (s.height.to_string(), s.width.to_string()),
        None => (
            "Loading, please wait...".to_string(),
            "Loading please wait...".to_string(),
        ),
    };

    format!(
        r#"{{
	title: "<enter title>",
	type: "mux_video",
	muxId: "{id}",
	description: "Add a description here",
	height: {height},
	width: {width},
	submittedOn: new Date("{date}"),
	links: [
		{{
			type: "source_code",
			url: "<add github url or delete this object>",
		}},
		{{
			type: "video",
			url: "<add video link or delete this object>",
		}},
		{{
			type: "website",
			url: "<add product link or delete this object>",
		}},
		{{
			type: "tutorial",
			url: "<add link to tutorial or delete this object>",
		}},
	],
	author: {{
		"url": "<link your website or social media profile>",
		"name": "<Enter your name or organization>"
	}}
}},"#,
        id = id,
        height = height,
        width = width,
        date = submission_date(date),
    )
}
