//! Filesystem locations and the mpv binary lookup.
//!
//! The kiosk targets unix hosts: mpv is driven over a unix-domain socket.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

const APP_DIR: &str = "kiosk";

/// Set by `--system-deps`: skip the copy of mpv shipped beside the binary.
static PREFER_PATH_MPV: AtomicBool = AtomicBool::new(false);

pub fn set_use_system_deps(prefer_path: bool) {
    PREFER_PATH_MPV.store(prefer_path, Ordering::Relaxed);
}

fn prefer_path_mpv() -> bool {
    PREFER_PATH_MPV.load(Ordering::Relaxed)
}

pub fn mpv_socket_path() -> PathBuf {
    std::env::temp_dir().join("kiosk-mpv.sock")
}

pub fn mpv_socket_arg() -> String {
    format!("--input-ipc-server={}", mpv_socket_path().display())
}

/// Log files and the fallback content location. `KIOSK_DATA_DIR` overrides.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("KIOSK_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(APP_DIR)
}

/// Holds `config.toml`. `KIOSK_CONFIG_DIR` overrides.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("KIOSK_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn exe_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    exe.parent().map(|p| p.to_path_buf())
}

/// `content/` beside the executable when it holds a `content.json`
/// (packaged kiosk), otherwise `<data_dir>/content`.
pub fn bundled_content_dir() -> PathBuf {
    exe_dir()
        .map(|dir| dir.join("content"))
        .filter(|dir| dir.join("content.json").is_file())
        .unwrap_or_else(|| data_dir().join("content"))
}

/// mpv lookup order: `MPV_PATH`, then `mpv` or `external/mpv` beside the
/// executable (unless `--system-deps`), then `PATH`.
pub fn find_mpv_binary() -> Option<PathBuf> {
    if let Some(p) = std::env::var_os("MPV_PATH").map(PathBuf::from) {
        if p.is_file() {
            return Some(p);
        }
    }

    if !prefer_path_mpv() {
        let bundled = exe_dir().and_then(|dir| {
            [dir.join("mpv"), dir.join("external").join("mpv")]
                .into_iter()
                .find(|p| p.is_file())
        });
        if bundled.is_some() {
            return bundled;
        }
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join("mpv"))
        .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_arg_points_at_socket() {
        let arg = mpv_socket_arg();
        assert!(arg.starts_with("--input-ipc-server="));
        assert!(arg.ends_with("kiosk-mpv.sock"));
    }

    #[test]
    fn test_default_dirs_are_namespaced() {
        if std::env::var_os("KIOSK_DATA_DIR").is_none() {
            assert!(data_dir().ends_with(APP_DIR));
        }
        if std::env::var_os("KIOSK_CONFIG_DIR").is_none() {
            assert!(config_dir().ends_with(APP_DIR));
        }
    }
}
