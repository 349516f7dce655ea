use super::{
    json_pretty, parse_id, spin_fail, spin_ok, spin_warn, spinner, EXIT_DEGRADED, EXIT_SUCCESS,
};
use minehost_core::{Action, CreateOutcome, Manager, Outcome};
use serde_json::json;

pub fn run(manager: &Manager, server_id: &str, action: Action, json: bool) -> Result<u8, String> {
    let id = parse_id(server_id)?;
    let pb = (!json).then(|| spinner(&format!("{action} server {id}...")));

    let outcome = match manager.apply(&id, action) {
        Ok(o) => o,
        Err(e) => {
            if let Some(pb) = &pb {
                spin_fail(pb, &format!("{action} server {id} failed"));
            }
            return Err(e.to_string());
        }
    };
    let message = outcome.message();
    let code = if outcome.is_degraded() {
        EXIT_DEGRADED
    } else {
        EXIT_SUCCESS
    };

    if json {
        let value = match &outcome {
            Outcome::Created(CreateOutcome::Provisioned { container_id, port }) => json!({
                "serverId": id.as_str(),
                "action": action.as_str(),
                "status": "success",
                "containerId": container_id.short(),
                "port": port,
                "message": message,
            }),
            Outcome::Created(CreateOutcome::Degraded { error }) => json!({
                "serverId": id.as_str(),
                "action": action.as_str(),
                "error": error,
                "message": message,
                "simulation": true,
            }),
            Outcome::Applied(applied) => json!({
                "serverId": id.as_str(),
                "action": action.as_str(),
                "status": applied.status.as_str(),
                "message": message,
                "simulation": applied.simulated,
            }),
        };
        println!("{}", json_pretty(&value)?);
        return Ok(code);
    }

    if let Some(pb) = &pb {
        if outcome.is_degraded() {
            spin_warn(pb, &message);
        } else {
            spin_ok(pb, &message);
        }
    }
    match &outcome {
        Outcome::Created(CreateOutcome::Provisioned { container_id, port }) => {
            println!("container: {}", container_id.short());
            println!("port:      {port}");
        }
        Outcome::Created(CreateOutcome::Degraded { error }) => {
            eprintln!("engine: {error}");
        }
        Outcome::Applied(_) => {}
    }
    Ok(code)
}
