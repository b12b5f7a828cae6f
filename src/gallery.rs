//! The gallery coordinator: upload ingestion, ordered inventory, owner-gated
//! access, and the display-scheduling state machine.
//!
//! Every operation runs under the caller's exclusive lock (see
//! `service::GalleryService`); nothing here is internally synchronized.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::config::PlaybackOptions;
use crate::error::Error;
use crate::index::{FileIndex, md5_hex};
use crate::naming;
use crate::playback::{MIN_INTERVAL_MILLIS, PlaybackState};
use crate::schedule::{self, Advance, Rotation, ValidatedRead};

/// Upload payload cap.
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

pub struct Gallery {
    index: FileIndex,
    queue: Vec<String>,
    rotation: Rotation,
    playback: PlaybackState,
    last_served: Option<String>,
    /// While the served item is a video, time-based rotation is suppressed
    /// until an explicit advance clears this.
    hold_for_video: bool,
    /// `None` means a switch is due immediately.
    last_switch_at: Option<Instant>,
}

impl Gallery {
    /// Open the media root, load the persisted tables, and seed the queue
    /// from the on-disk tree.
    pub fn open(root: impl Into<std::path::PathBuf>) -> Result<Self, Error> {
        let index = FileIndex::open(root)?;
        let queue = index.scan();
        info!(files = queue.len(), root = %index.root().display(), "loaded existing media into queue");
        Ok(Self {
            index,
            queue,
            rotation: Rotation::default(),
            playback: PlaybackState::default(),
            last_served: None,
            hold_for_video: false,
            last_switch_at: None,
        })
    }

    /// Apply configured playback defaults.
    pub fn apply_options(&mut self, options: &PlaybackOptions) {
        let millis = options.interval.as_millis().min(u128::from(u64::MAX)) as u64;
        if !self.playback.set_interval_millis(millis) {
            warn!(millis, "configured interval out of range; keeping default");
        }
        self.playback.loop_video = options.loop_video;
        self.playback.muted = options.muted;
    }

    // ---- ingestion ----

    /// Store an uploaded file. Returns `false` on any validation or IO
    /// failure, in which case no state was mutated.
    pub fn upload(&mut self, name: &str, bytes: &[u8], client_id: Option<&str>) -> bool {
        if bytes.is_empty() || bytes.len() > MAX_UPLOAD_BYTES {
            warn!(size = bytes.len(), "upload rejected: invalid size");
            return false;
        }
        let name = naming::sanitize_file_name(name);
        if !naming::has_allowed_extension(&name) {
            warn!(%name, "upload rejected: extension not allowed");
            return false;
        }

        let now = Local::now();
        let rel = format!(
            "{}/{}_{}",
            now.format("%Y/%m/%d"),
            now.format("%Y%m%d_%H%M%S"),
            name
        );
        if let Err(err) = self.index.write_media(&rel, bytes) {
            warn!(path = %rel, error = %err, "upload rejected: could not write file");
            return false;
        }

        let digest = md5_hex(bytes);
        info!(
            client = client_id.unwrap_or("-"),
            path = %rel,
            bytes = bytes.len(),
            md5 = %digest,
            "upload stored"
        );
        if !self.queue.contains(&rel) {
            self.queue.push(rel.clone());
            self.queue.sort();
        }
        if let Some(client) = client_id.map(str::trim).filter(|c| !c.is_empty()) {
            self.index.record_owner(&rel, client);
        }
        self.index.record_hash(&rel, &digest);
        true
    }

    // ---- listing and owner-gated access ----

    pub fn list_all(&self) -> Vec<String> {
        self.queue.clone()
    }

    pub fn list_by_owner(&self, client_id: &str) -> Vec<String> {
        if client_id.trim().is_empty() {
            return Vec::new();
        }
        self.queue
            .iter()
            .filter(|rel| self.index.owner_of(rel) == Some(client_id))
            .cloned()
            .collect()
    }

    /// Read a file's bytes if `client_id` is its recorded owner. Files
    /// without an owner entry are never readable through this path. A
    /// validation failure evicts the entry.
    pub fn read_if_owner(&mut self, client_id: &str, rel: &str) -> Option<Vec<u8>> {
        if client_id.trim().is_empty() || rel.trim().is_empty() {
            return None;
        }
        if self.index.owner_of(rel) != Some(client_id) {
            debug!(client = client_id, path = %rel, "read denied: not the owner");
            return None;
        }
        match self.index.read_validated(rel) {
            Some(bytes) => Some(bytes),
            None => {
                warn!(path = %rel, "evicting invalid file after owner read");
                self.evict(rel);
                None
            }
        }
    }

    /// Delete a file if `client_id` is its recorded owner.
    pub fn delete(&mut self, client_id: &str, rel: &str) -> bool {
        if client_id.trim().is_empty() || rel.trim().is_empty() {
            return false;
        }
        if self.index.owner_of(rel) != Some(client_id) {
            debug!(client = client_id, path = %rel, "delete denied: not the owner");
            return false;
        }
        let Some(idx) = self.queue.iter().position(|r| r == rel) else {
            return false;
        };
        if let Err(err) = self.index.delete_media(rel) {
            warn!(path = %rel, error = %err, "delete failed: could not remove file");
            return false;
        }
        self.queue.remove(idx);
        self.rotation.compensate_removal(idx, self.queue.len());
        self.index.remove_entry(rel);
        self.clear_refs(rel);
        info!(client = client_id, path = %rel, "file deleted");
        true
    }

    // ---- display scheduling ----

    /// Decide what the display should show next. `None` means "keep the
    /// current content": either nothing is available or a switch is not due.
    pub fn poll_display(&mut self) -> Option<Vec<u8>> {
        self.poll_display_at(Instant::now())
    }

    pub fn poll_display_at(&mut self, now: Instant) -> Option<Vec<u8>> {
        if self.queue.is_empty() {
            debug!("queue empty; nothing to display");
            return None;
        }
        if self.playback.paused {
            debug!("slideshow paused");
            return None;
        }

        // Tier 1: forced file, served regardless of timers and filters.
        if let Some(forced) = self.playback.forced_path.clone() {
            if !naming::is_displayable(&forced) {
                warn!(path = %forced, "forced file is not displayable; clearing");
                self.playback.forced_path = None;
            } else if let Some(bytes) = self.index.read_validated(&forced) {
                debug!(path = %forced, "serving forced file");
                self.hold_for_video = naming::is_video(&forced);
                self.last_served = Some(forced);
                self.last_switch_at = Some(now);
                return Some(bytes);
            } else {
                warn!(path = %forced, "forced file failed validation; clearing");
                self.playback.forced_path = None;
            }
        }

        let should_switch = !self.hold_for_video && self.switch_due(now);

        // Tier 2: date-scoped rotation while a global filter is active. A
        // miss never interrupts content that is already showing; before
        // anything was ever served it falls through to plain rotation.
        if let Some(prefix) = self.playback.date_filter_prefix.clone() {
            if should_switch || self.last_served.is_none() {
                if let Some(bytes) = self.rotate_by_prefix(&prefix) {
                    debug!(prefix = %prefix, "serving by date filter");
                    self.last_switch_at = Some(now);
                    return Some(bytes);
                }
            }
            if self.last_served.is_some() {
                return None;
            }
        }

        // Tier 3: plain rotation.
        if should_switch || self.last_served.is_none() {
            let advance = schedule::advance(&mut self.queue, &mut self.rotation, &mut self.index);
            if let Some((rel, bytes)) = self.finish_advance(advance) {
                debug!(path = %rel, "serving from rotation");
                self.last_switch_at = Some(now);
                return Some(bytes);
            }
        }

        if self.last_served.is_some() {
            // Not due yet; the caller keeps what it is showing.
            return None;
        }
        debug!("no valid file available");
        None
    }

    /// Rotate only through entries under the given date, with a dedicated
    /// cursor per prefix. Invalid input means "no filter" and yields `None`.
    pub fn poll_display_by_date(&mut self, date_text: &str) -> Option<Vec<u8>> {
        let prefix = naming::normalize_date_prefix(date_text)?;
        if self.queue.is_empty() {
            return None;
        }
        self.rotate_by_prefix(&prefix)
    }

    fn rotate_by_prefix(&mut self, prefix: &str) -> Option<Vec<u8>> {
        let advance =
            schedule::advance_by_date(&mut self.queue, &mut self.rotation, prefix, &mut self.index);
        self.finish_advance(advance).map(|(_, bytes)| bytes)
    }

    /// Apply an advance outcome: drop evicted entries from the tables,
    /// clear dangling references, and record serve-side state.
    fn finish_advance(&mut self, advance: Advance) -> Option<(String, Vec<u8>)> {
        for rel in &advance.evicted {
            warn!(path = %rel, "evicting invalid file from queue");
            self.index.remove_entry(rel);
            self.clear_refs(rel);
        }
        let (rel, bytes) = advance.served?;
        self.hold_for_video = naming::is_video(&rel);
        self.last_served = Some(rel.clone());
        Some((rel, bytes))
    }

    fn switch_due(&self, now: Instant) -> bool {
        match self.last_switch_at {
            None => true,
            Some(at) => {
                let interval = self.playback.interval_millis.max(MIN_INTERVAL_MILLIS);
                now.saturating_duration_since(at) >= Duration::from_millis(interval)
            }
        }
    }

    fn clear_refs(&mut self, rel: &str) {
        if self.playback.forced_path.as_deref() == Some(rel) {
            self.playback.forced_path = None;
        }
        if self.last_served.as_deref() == Some(rel) {
            self.last_served = None;
        }
    }

    fn evict(&mut self, rel: &str) {
        if let Some(idx) = self.queue.iter().position(|r| r == rel) {
            self.queue.remove(idx);
            self.rotation.compensate_removal(idx, self.queue.len());
        }
        self.index.remove_entry(rel);
        self.clear_refs(rel);
    }

    // ---- deferred control effects (run by the command worker) ----

    /// Clear the video hold and make a switch due on the next poll.
    pub fn apply_next(&mut self) {
        self.hold_for_video = false;
        self.last_switch_at = None;
    }

    /// Rewind the cursor so the next forward step lands on the prior item,
    /// then make a switch due on the next poll.
    pub fn apply_previous(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        self.rotation.rewind_two(self.queue.len());
        self.hold_for_video = false;
        self.last_switch_at = None;
    }

    // ---- control surface ----

    pub fn set_paused(&mut self, paused: bool) {
        self.playback.paused = paused;
        if !paused {
            // Allow an immediate switch after unpausing.
            self.last_switch_at = None;
        }
    }

    pub fn set_interval_millis(&mut self, ms: u64) {
        if !self.playback.set_interval_millis(ms) {
            debug!(ms, "interval out of range; keeping previous value");
        }
    }

    pub fn set_forced_path(&mut self, rel: Option<&str>) {
        self.playback.forced_path = rel
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from);
        self.last_switch_at = None;
        self.hold_for_video = false;
    }

    pub fn set_date_filter(&mut self, date_text: Option<&str>) {
        self.playback.date_filter_prefix = date_text.and_then(naming::normalize_date_prefix);
        debug!(prefix = self.playback.date_filter_prefix.as_deref(), "date filter set");
    }

    pub fn date_filter(&self) -> Option<String> {
        self.playback.date_filter_prefix.clone()
    }

    pub fn set_loop_video(&mut self, loop_video: bool) {
        self.playback.loop_video = loop_video;
    }

    pub fn set_video_paused(&mut self, video_paused: bool) {
        self.playback.video_paused = video_paused;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.playback.muted = muted;
    }

    /// Immutable snapshot of the playback configuration.
    pub fn playback_snapshot(&self) -> PlaybackState {
        self.playback.clone()
    }

    pub fn last_served(&self) -> Option<&str> {
        self.last_served.as_deref()
    }

    // ---- integrity verification ----

    /// Check a stored file against an expected MD5 hex digest. `name` is
    /// resolved as a queue-relative path first, then by basename anywhere
    /// in the media tree. Pure query; no state is mutated.
    pub fn verify_integrity(&self, name: &str, expected_hex: &str) -> bool {
        let expected = expected_hex.replace(' ', "").to_ascii_lowercase();
        if expected.is_empty() {
            return false;
        }
        let mut candidate = self.index.absolute(name);
        if !candidate.exists() {
            let base = Path::new(name).file_name().and_then(|n| n.to_str());
            match base.and_then(|n| self.index.find_by_file_name(n)) {
                Some(found) => candidate = found,
                None => return false,
            }
        }
        match fs::read(&candidate) {
            Ok(bytes) => md5_hex(&bytes) == expected,
            Err(err) => {
                warn!(path = %candidate.display(), error = %err, "integrity check failed to read file");
                false
            }
        }
    }
}
