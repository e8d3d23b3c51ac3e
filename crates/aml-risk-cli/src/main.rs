#[tokio::main]
async fn main() -> anyhow::Result<()> {
    aml_risk_cli::run().await
}
