mod config;
mod docker;
mod error;
mod health;
mod ingress;
mod runtime;
mod state;
mod subscription;
mod types;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    runtime::boot::init_bootstrap_logging();

    let (state, config) = runtime::boot::boot().await?;
    runtime::serve::serve(state, config).await
}
