//! Best-effort launch of the platform's default browser.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Open `path` with the default browser.
///
/// The opener runs in the background and is never waited on. Never fails:
/// an opener that cannot be started is logged and reported as `false`.
pub fn open_in_browser(path: &Path) -> bool {
    let target = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut command = opener_command(target.as_os_str());
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    match command.spawn() {
        Ok(child) => {
            debug!(path = %target.display(), pid = child.id(), "Launched browser opener");
            true
        }
        Err(e) => {
            warn!(
                path = %target.display(),
                opener = ?command.get_program(),
                error = %e,
                "Failed to launch browser"
            );
            false
        }
    }
}

fn opener_command(target: &OsStr) -> Command {
    if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(target);
        command
    } else if cfg!(windows) {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]).arg(target);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(target);
        command
    }
}
