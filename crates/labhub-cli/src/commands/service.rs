use anyhow::{Context, Result};
use labhub_storage::RESULTS_SERVICE_NAME;

use crate::cli::ServiceCommands;
use crate::context::Storage;
use crate::output::{print_field, print_success, print_warning};

pub async fn run(storage: &Storage, command: &ServiceCommands) -> Result<()> {
    if !storage.persistent {
        print_warning("No database configured, the service flag is not persisted");
    }
    let services = &storage.services;
    match command {
        ServiceCommands::Enable | ServiceCommands::Disable => {
            let active = matches!(command, ServiceCommands::Enable);
            services
                .set_active(RESULTS_SERVICE_NAME, active)
                .await
                .context("Failed to update background service")?;
            print_success(&format!(
                "{RESULTS_SERVICE_NAME} {}",
                if active { "enabled" } else { "disabled" }
            ));
        }
        ServiceCommands::Status => {
            let status = services
                .is_active(RESULTS_SERVICE_NAME)
                .await
                .context("Failed to read background service")?;
            let label = match status {
                Some(true) => "active",
                Some(false) => "inactive",
                None => "not registered",
            };
            print_field(RESULTS_SERVICE_NAME, label);
        }
    }
    Ok(())
}
