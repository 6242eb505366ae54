mod config;
mod error;
mod health;
mod ingress;
mod kpi_retriever;
mod parser;
mod policy;
mod reconcile;
mod role_runner;
mod runtime;
mod selector;
mod state;
mod types;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    runtime::boot::init_bootstrap_logging();

    let booted = runtime::boot::boot()?;
    runtime::serve::serve(booted).await
}
