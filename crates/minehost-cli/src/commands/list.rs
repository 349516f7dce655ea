use super::{colorize_status, json_pretty, EXIT_SUCCESS};
use minehost_core::{LifecycleState, Manager};

pub fn run(manager: &Manager, owner: &str, json: bool) -> Result<u8, String> {
    let servers = manager.list(owner).map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&servers)?);
    } else if servers.is_empty() {
        println!("no servers registered for {owner}");
    } else {
        println!(
            "{:<6} {:<20} {:<8} {:<8} {:<6} STATUS",
            "ID", "NAME", "EDITION", "VERSION", "PORT"
        );
        for s in &servers {
            let status = colorize_status(LifecycleState::from(s.status).as_str());
            println!(
                "{:<6} {:<20} {:<8} {:<8} {:<6} {}",
                s.id.as_str(),
                s.name,
                s.edition.to_string(),
                s.version,
                s.port,
                status
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
