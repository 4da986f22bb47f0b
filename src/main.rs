use anyhow::Result;
use clap::Parser;

use serenata::runtime::{self, Args};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    runtime::run(Args::parse()).await
}
