use anyhow::Result;
use scv_core::Config;

use super::{controller, settle};
use crate::cli::Reported;

pub async fn run(config: &Config) -> Result<()> {
    let controller = controller(config)?;
    let healthy = controller.check_api_health().await;
    settle(controller.notices(), Ok(()))?;

    if healthy {
        println!("API is reachable at {}", config.effective_api_base()?);
        Ok(())
    } else {
        Err(Reported.into())
    }
}
