//! Interactive commands read from stdin.

use tracker_common::protocol::VehicleId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Subscribe the detail view to a vehicle.
    Join(VehicleId),
    /// Flip the remote power cut over HTTP.
    Shutdown(VehicleId),
    /// Flip audio transmission over HTTP.
    Audio(VehicleId),
    /// Print connection state.
    Status,
    /// Print the page.
    Show,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or_else(|| "empty command".to_string())?;
        let mut vehicle = || {
            parts
                .next()
                .and_then(VehicleId::parse)
                .ok_or_else(|| format!("`{verb}` needs a vehicle id"))
        };

        match verb {
            "join" => Ok(Command::Join(vehicle()?)),
            "shutdown" => Ok(Command::Shutdown(vehicle()?)),
            "audio" => Ok(Command::Audio(vehicle()?)),
            "status" => Ok(Command::Status),
            "show" => Ok(Command::Show),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!(
                "unknown command `{other}` (join|shutdown|audio <id>, status, show, quit)"
            )),
        }
    }
}
