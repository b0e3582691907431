use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the exports directory: `<exe_dir>/exports/`
pub fn get_exports_dir() -> PathBuf {
    get_exe_dir().join("exports")
}

/// Returns the chart styling file: `<exe_dir>/chart_config.json`
pub fn get_chart_config_path() -> PathBuf {
    get_exe_dir().join("chart_config.json")
}

/// Returns the directory holding persisted league state for `namespace`.
/// Falls back to the executable directory when the platform has no local
/// data directory.
pub fn get_state_dir(namespace: &str) -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| get_exe_dir().clone())
        .join(namespace)
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(get_exports_dir())?;
    Ok(())
}
