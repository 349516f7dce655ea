pub mod action;
pub mod list;
pub mod logs;
pub mod register;
pub mod status;

use indicatif::{ProgressBar, ProgressStyle};
use minehost_store::ServerId;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_DEGRADED: u8 = 2;
pub const EXIT_STORE_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_warn(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("! {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_status(status: &str) -> String {
    use console::Style;
    match status {
        "online" => Style::new().green().bold().apply_to(status).to_string(),
        "starting" | "creating" => Style::new().yellow().apply_to(status).to_string(),
        "offline" => Style::new().dim().apply_to(status).to_string(),
        other => other.to_owned(),
    }
}

pub fn colorize_kind(kind: &str) -> String {
    use console::Style;
    match kind {
        "ERROR" => Style::new().red().apply_to(kind).to_string(),
        other => other.to_owned(),
    }
}

pub fn parse_id(raw: &str) -> Result<ServerId, String> {
    ServerId::parse(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_pretty_serializes_object() {
        let val = serde_json::json!({"status": "online"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"status\""));
        assert!(result.contains("\"online\""));
    }

    #[test]
    fn colorize_status_keeps_text() {
        for status in ["online", "starting", "creating", "offline"] {
            assert!(colorize_status(status).contains(status));
        }
    }

    #[test]
    fn colorize_status_unknown() {
        assert_eq!(colorize_status("unknown"), "unknown");
    }

    #[test]
    fn colorize_kind_only_styles_errors() {
        assert!(colorize_kind("ERROR").contains("ERROR"));
        assert_eq!(colorize_kind("INFO"), "INFO");
    }

    #[test]
    fn parse_id_rejects_path_segments() {
        assert_eq!(parse_id("42").unwrap().as_str(), "42");
        assert!(parse_id("../etc").is_err());
        assert!(parse_id("").is_err());
    }

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_SUCCESS, EXIT_FAILURE);
        assert_ne!(EXIT_FAILURE, EXIT_DEGRADED);
        assert_ne!(EXIT_DEGRADED, EXIT_STORE_ERROR);
    }

    #[test]
    fn spinner_finishes_with_each_marker() {
        let finishers: [fn(&ProgressBar, &str); 3] = [spin_ok, spin_warn, spin_fail];
        for finish in finishers {
            let pb = spinner("working...");
            finish(&pb, "done");
            assert!(pb.is_finished());
        }
    }
}
