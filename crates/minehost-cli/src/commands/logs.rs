use super::{colorize_kind, json_pretty, parse_id, EXIT_SUCCESS};
use minehost_core::Manager;

pub fn run(manager: &Manager, server_id: &str, limit: usize, json: bool) -> Result<u8, String> {
    let id = parse_id(server_id)?;
    let entries = manager.logs(&id, limit).map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("no log entries for server {id}");
    } else {
        for entry in &entries {
            println!(
                "{}  {}  {}",
                entry.created_at,
                colorize_kind(&format!("{:<5}", entry.kind.to_string())),
                entry.message
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
