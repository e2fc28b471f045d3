use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    alertsmith_cli::main_entry().await
}
