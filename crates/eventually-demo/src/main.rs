mod config;
mod service;
mod session;

use anyhow::Result;
use config::Config;
use service::DemoService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Run one simulated agent turn and observe it
    let demo = DemoService::new(config);
    demo.run().await
}
