use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber for tools that embed the plugin outside the
/// editor (the packaging pipeline, local harnesses). Inside the editor the
/// host owns the subscriber and telemetry export; the plugin itself only
/// emits `tracing` events.
///
/// `RUST_LOG` overrides `default_level`. Calling this twice is a no-op.
pub fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();

    Ok(())
}
