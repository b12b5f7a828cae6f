//! The facade transport front-ends call into.
//!
//! Every operation locks the coordinator, so all callers are fully
//! serialized; `next`/`previous` enqueue on the command channel instead and
//! return immediately.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::events::ControlCommand;
use crate::gallery::Gallery;
use crate::playback::PlaybackState;

#[derive(Clone)]
pub struct GalleryService {
    gallery: Arc<Mutex<Gallery>>,
    commands: UnboundedSender<ControlCommand>,
}

impl GalleryService {
    pub fn new(gallery: Arc<Mutex<Gallery>>, commands: UnboundedSender<ControlCommand>) -> Self {
        Self { gallery, commands }
    }

    fn lock(&self) -> MutexGuard<'_, Gallery> {
        self.gallery.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn upload(&self, name: &str, bytes: &[u8], client_id: Option<&str>) -> bool {
        self.lock().upload(name, bytes, client_id)
    }

    pub fn list_all(&self) -> Vec<String> {
        self.lock().list_all()
    }

    pub fn list_by_owner(&self, client_id: &str) -> Vec<String> {
        self.lock().list_by_owner(client_id)
    }

    pub fn read_if_owner(&self, client_id: &str, rel: &str) -> Option<Vec<u8>> {
        self.lock().read_if_owner(client_id, rel)
    }

    pub fn delete(&self, client_id: &str, rel: &str) -> bool {
        self.lock().delete(client_id, rel)
    }

    pub fn poll_display(&self) -> Option<Vec<u8>> {
        self.lock().poll_display()
    }

    pub fn poll_display_by_date(&self, date_text: &str) -> Option<Vec<u8>> {
        self.lock().poll_display_by_date(date_text)
    }

    pub fn verify_integrity(&self, name: &str, expected_hex: &str) -> bool {
        self.lock().verify_integrity(name, expected_hex)
    }

    /// Enqueue an advance signal; its effect lands on the command worker.
    pub fn next(&self) {
        if self.commands.send(ControlCommand::Next).is_err() {
            warn!("command worker unavailable; dropping next signal");
        }
    }

    /// Enqueue a rewind signal; its effect lands on the command worker.
    pub fn previous(&self) {
        if self.commands.send(ControlCommand::Previous).is_err() {
            warn!("command worker unavailable; dropping previous signal");
        }
    }

    pub fn set_paused(&self, paused: bool) {
        self.lock().set_paused(paused);
    }

    pub fn set_interval_millis(&self, ms: u64) {
        self.lock().set_interval_millis(ms);
    }

    pub fn set_forced_path(&self, rel: Option<&str>) {
        self.lock().set_forced_path(rel);
    }

    pub fn set_date_filter(&self, date_text: Option<&str>) {
        self.lock().set_date_filter(date_text);
    }

    pub fn date_filter(&self) -> Option<String> {
        self.lock().date_filter()
    }

    pub fn set_loop_video(&self, loop_video: bool) {
        self.lock().set_loop_video(loop_video);
    }

    pub fn set_video_paused(&self, video_paused: bool) {
        self.lock().set_video_paused(video_paused);
    }

    pub fn set_muted(&self, muted: bool) {
        self.lock().set_muted(muted);
    }

    pub fn playback_snapshot(&self) -> PlaybackState {
        self.lock().playback_snapshot()
    }
}
