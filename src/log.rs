//! Unified logger setup for the CLI and the wasm module.

/// Initialize logging once per process.
///
/// Native builds go through `env_logger` (the `RUST_LOG` variable, when set,
/// overrides `debug_enabled`). Wasm builds log to the browser console.
pub fn init_logger(debug_enabled: bool) {
    #[cfg(target_arch = "wasm32")]
    init_wasm(debug_enabled);
    #[cfg(not(target_arch = "wasm32"))]
    init_native(debug_enabled);
}

#[cfg(target_arch = "wasm32")]
fn init_wasm(debug_enabled: bool) {
    let level = if debug_enabled { log::Level::Debug } else { log::Level::Info };

    if let Err(e) = console_log::init_with_level(level) {
        // Degrade gracefully: report once via the console and run unlogged.
        let msg = format!("failed to initialize console_log: {e}; logging unavailable");
        web_sys::console::error_1(&msg.into());
        return;
    }
    log::info!("WASM logger initialized at {level:?} level");
}

#[cfg(not(target_arch = "wasm32"))]
fn init_native(debug_enabled: bool) {
    use log::LevelFilter;

    let level = if debug_enabled { LevelFilter::Debug } else { LevelFilter::Info };

    let mut builder = env_logger::Builder::new();
    builder
        .filter(None, level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false);

    // RUST_LOG, when set explicitly, beats the debug flag.
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    builder.init();
    log::info!("native logger initialized at {level:?} level");
}
