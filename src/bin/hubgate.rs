use anyhow::Result;
use hubgate::cli::{actions, actions::Action, start};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse the CLI and set up logging/telemetry
    let action = start()?;

    // Handle the action
    match action {
        Action::Server { .. } => actions::server::handle(action).await?,
    }

    Ok(())
}
