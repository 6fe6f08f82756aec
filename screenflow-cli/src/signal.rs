use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Installs a Ctrl-C handler that raises the returned flag
pub fn setup_cancel_signal() -> Result<Arc<AtomicBool>> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);

    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        eprintln!("\nInterrupted, stopping after the current checkpoint...");
    })
    .context("Failed to install Ctrl-C handler")?;

    Ok(cancel)
}
