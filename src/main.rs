#[tokio::main]
async fn main() -> anyhow::Result<()> {
    posify::bootstrapper::run().await
}
