use std::fs;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use photo_frame_gallery::events::ControlCommand;
use photo_frame_gallery::gallery::Gallery;
use photo_frame_gallery::service::GalleryService;
use photo_frame_gallery::tasks::commands;
use tempfile::tempdir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn seed(root: &std::path::Path, rel: &str, bytes: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached within deadline");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn next_signal_lands_on_the_worker() {
    let tmp = tempdir().unwrap();
    seed(tmp.path(), "2025/08/10/a.jpg", b"aaa");
    seed(tmp.path(), "2025/08/10/b.jpg", b"bbb");

    let gallery = Arc::new(Mutex::new(Gallery::open(tmp.path()).unwrap()));
    let (tx, rx) = mpsc::unbounded_channel::<ControlCommand>();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(commands::run(rx, gallery.clone(), cancel.clone()));

    let service = GalleryService::new(gallery.clone(), tx);
    let t0 = Instant::now();
    assert_eq!(service.poll_display().unwrap(), b"aaa");

    // Interval has not elapsed; only the worker-applied signal unblocks the
    // next switch.
    service.next();
    wait_until(|| gallery.lock().unwrap().poll_display_at(t0).is_some()).await;

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn command_bursts_do_not_kill_the_worker() {
    let tmp = tempdir().unwrap();
    seed(tmp.path(), "2025/08/10/a.jpg", b"aaa");

    let gallery = Arc::new(Mutex::new(Gallery::open(tmp.path()).unwrap()));
    let (tx, rx) = mpsc::unbounded_channel::<ControlCommand>();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(commands::run(rx, gallery.clone(), cancel.clone()));

    let service = GalleryService::new(gallery.clone(), tx.clone());
    for _ in 0..100 {
        service.next();
        service.previous();
    }

    // Drop every sender; the worker drains the backlog and exits cleanly.
    drop(service);
    drop(tx);
    handle.await.unwrap().unwrap();

    // All queued effects were applied without crashing the coordinator.
    assert!(gallery.lock().unwrap().poll_display().is_some());
}
