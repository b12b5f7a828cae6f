use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::ControlCommand;
use crate::gallery::Gallery;

/// Drain control commands strictly in submission order, one at a time.
///
/// Callers enqueue and return immediately; each command's effect lands here,
/// under the coordinator's exclusive lock. A failing command is logged and
/// the drain loop continues.
pub async fn run(
    mut rx: UnboundedReceiver<ControlCommand>,
    gallery: Arc<Mutex<Gallery>>,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting command worker");
                break;
            }

            maybe_cmd = rx.recv() => {
                let Some(cmd) = maybe_cmd else {
                    debug!("command channel closed; exiting command worker");
                    break;
                };
                debug!(command = ?cmd, "applying control command");
                let mut gallery = match gallery.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => {
                        warn!(command = ?cmd, "gallery lock poisoned; recovering");
                        poisoned.into_inner()
                    }
                };
                match cmd {
                    ControlCommand::Next => gallery.apply_next(),
                    ControlCommand::Previous => gallery.apply_previous(),
                }
            }
        }
    }
    Ok(())
}
