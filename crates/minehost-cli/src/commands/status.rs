use super::{colorize_status, json_pretty, parse_id, EXIT_DEGRADED, EXIT_SUCCESS};
use minehost_core::Manager;
use serde_json::json;

pub fn run(manager: &Manager, server_id: &str, json: bool) -> Result<u8, String> {
    let id = parse_id(server_id)?;
    let observed = manager.status(&id).map_err(|e| e.to_string())?;

    if json {
        let value = json!({
            "serverId": id.as_str(),
            "status": observed.status.as_str(),
            "containerId": observed.container_id,
            "runtimeStatus": observed.runtime_status,
            "simulation": observed.simulated,
        });
        println!("{}", json_pretty(&value)?);
    } else {
        let status = colorize_status(observed.status.as_str());
        match (&observed.container_id, &observed.runtime_status) {
            (Some(cid), Some(runtime)) => {
                println!("server {id}: {status} (container {cid}, {runtime})");
            }
            _ => println!("server {id}: {status} (last recorded, engine unreachable)"),
        }
    }

    Ok(if observed.simulated {
        EXIT_DEGRADED
    } else {
        EXIT_SUCCESS
    })
}
