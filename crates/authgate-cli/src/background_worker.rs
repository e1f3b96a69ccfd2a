/// Runtime the requests are driven on. Must be entered before calling into
/// [`authgate_client_core::Client`] as requests are spawned onto it.
pub fn create_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    use anyhow::Context as _;
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("unable to create runtime")
}
