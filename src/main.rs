#[tokio::main]
async fn main() -> anyhow::Result<()> {
    notes_client::run().await
}
