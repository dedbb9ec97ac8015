//! Server-side HTML for a [`PageView`].
//!
//! The markup is intentionally plain: the player and report form are mounted
//! client-side into the `data-*` slots rendered here.

use std::fmt::Write;

use crate::page::{PageView, PlayerView};
use crate::session::SessionState;

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_html(view: &PageView) -> String {
    let mut out = String::with_capacity(4096);
    // fmt::Write into a String is infallible; results are ignored throughout.
    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html lang=\"en\">");
    let _ = writeln!(out, "<head>");
    let _ = writeln!(out, "<meta charset=\"utf-8\">");
    let _ = writeln!(out, "<title>{}</title>", escape(&view.meta_title));
    let _ = writeln!(
        out,
        "<meta property=\"og:title\" content=\"{}\">",
        escape(&view.meta_title)
    );
    if let Some(image) = &view.image {
        let _ = writeln!(
            out,
            "<meta property=\"og:image\" content=\"{}\">",
            escape(image)
        );
    }
    let _ = writeln!(out, "</head>");

    let layout = if view.centered { "dark centered" } else { "dark" };
    let _ = writeln!(
        out,
        "<body class=\"{}\" data-state=\"{}\">",
        layout, view.state
    );

    if let Some(banner) = &view.error_banner {
        let _ = writeln!(out, "<h1 class=\"error-message\">{}</h1>", escape(banner));
    }
    if let Some(text) = view.loading_text {
        let _ = writeln!(out, "<div class=\"fullpage-loader\">{}</div>", escape(text));
    }

    if view.state != SessionState::FallbackLoading {
        render_content(&mut out, view);
    }

    let _ = writeln!(out, "</body>");
    let _ = writeln!(out, "</html>");
    out
}

fn render_content(out: &mut String, view: &PageView) {
    let display = if view.content_visible { "flex" } else { "none" };
    let _ = writeln!(
        out,
        "<div class=\"wrapper\" style=\"display: {}\">",
        display
    );

    if let Some(player) = &view.player {
        render_player(out, player);
    }

    if let Some(snippet) = &view.snippet {
        let _ = writeln!(out, "<h2>Submit this video to the showcase</h2>");
        let _ = writeln!(out, "<pre>{}</pre>", escape(snippet));
    }

    if let Some(share) = &view.share_url {
        let label = if view.copied { "Copied!" } else { "Copy link" };
        let _ = writeln!(
            out,
            "<div class=\"share\"><input readonly value=\"{}\"><button data-event=\"copy_share_link\">{}</button></div>",
            escape(share),
            label
        );
    }

    let _ = writeln!(out, "<div class=\"actions\">");
    if let Some(label) = view.report_toggle {
        let _ = writeln!(
            out,
            "<a role=\"button\" tabindex=\"0\" class=\"report\" data-event=\"toggle_report\">{}</a>",
            escape(label)
        );
    }
    let _ = writeln!(out, "</div>");

    let _ = writeln!(out, "<div class=\"report-form\">");
    if let Some(form) = &view.report_form {
        let _ = writeln!(
            out,
            "<div data-report-form data-playback-id=\"{}\"></div>",
            escape(form.playback_id.as_str())
        );
    }
    let _ = writeln!(out, "</div>");
    let _ = writeln!(out, "</div>");
}

fn render_player(out: &mut String, player: &PlayerView) {
    let _ = writeln!(
        out,
        "<div data-player data-playback-id=\"{}\" data-poster=\"{}\" data-current-time=\"{}\"></div>",
        escape(player.playback_id.as_str()),
        escape(&player.poster),
        player.start_time.seconds()
    );
}
