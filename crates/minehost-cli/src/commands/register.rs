use super::{json_pretty, EXIT_SUCCESS};
use minehost_core::Manager;
use minehost_store::NewServer;

pub fn run(manager: &Manager, new: &NewServer, json: bool) -> Result<u8, String> {
    let record = manager.register(new).map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&record)?);
    } else {
        println!(
            "registered server {} ({}, {} {}) on port {}, rcon {}",
            record.id, record.name, record.edition, record.version, record.port, record.rcon_port
        );
    }
    Ok(EXIT_SUCCESS)
}
