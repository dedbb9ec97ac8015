/// Shown when an error has no usable message.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Human-facing text for an error banner.
pub fn present_error(message: Option<&str>) -> &str {
    match message {
        Some(msg) if !msg.trim().is_empty() => msg,
        _ => UNKNOWN_ERROR,
    }
}
