#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = sekolah_rust::run().await {
        eprintln!("sekolah-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
