// Access rule commands
//
// Print the generated rule program or evaluate a single request against it.

use anyhow::{Context, Result};
use clap::Subcommand;
use larder_policy::{evaluate, AccessRequest, RuleProgram};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

#[derive(Subcommand)]
pub enum PolicyCommand {
    /// Print the Datalog program the remote store evaluates
    Rules,

    /// Evaluate a JSON access request
    Check {
        /// Request file, `-` for stdin
        request: PathBuf,

        /// Evaluate with the Datalog program instead of the native engine
        #[arg(long)]
        datalog: bool,
    },
}

pub fn handle_policy_command(cmd: PolicyCommand) -> Result<()> {
    match cmd {
        PolicyCommand::Rules => {
            println!("{}", RuleProgram::generate().source());
        }
        PolicyCommand::Check { request, datalog } => {
            let text = read_request(&request)?;
            let request: AccessRequest =
                serde_json::from_str(&text).context("parsing access request")?;
            let decision = if datalog {
                RuleProgram::generate().evaluate(&request)?
            } else {
                evaluate(&request)
            };
            info!(operation = %request.operation, %decision, datalog, "Evaluated request");
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
    }
    Ok(())
}

fn read_request(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading request from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}
