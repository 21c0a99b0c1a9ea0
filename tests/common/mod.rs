use std::path::PathBuf;

/// A fresh path in the temp dir, unique per process and call.
pub fn temp_path(name: &str) -> PathBuf {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!(
        "trivia_bot_{}_{}_{}.json",
        name,
        std::process::id(),
        id
    ));
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);
    path
}
