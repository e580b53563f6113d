#[tokio::main]
async fn main() -> anyhow::Result<()> {
    core_proxy::gateway::run_cli().await
}
