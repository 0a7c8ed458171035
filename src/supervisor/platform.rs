//! OS-specific process handling

use std::io;
#[cfg(windows)]
use std::process::Stdio;
use std::process::{Child, Command};
#[cfg(unix)]
use tracing::debug;

/// Keep the child from opening a console window
#[cfg(windows)]
pub(crate) fn hide_console(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    use windows::Win32::System::Threading::CREATE_NO_WINDOW;

    command.creation_flags(CREATE_NO_WINDOW.0);
}

#[cfg(not(windows))]
pub(crate) fn hide_console(_command: &mut Command) {}

/// Ask the child to exit on its own
///
/// Windows: `taskkill` without `/F`, which posts WM_CLOSE to the child's
/// windows. A server launched with `CREATE_NO_WINDOW` has none, so the
/// request normally fails and the caller falls through to a forced kill.
#[cfg(windows)]
pub(crate) fn request_graceful_stop(child: &Child) -> io::Result<()> {
    let pid = child.id().to_string();

    let mut command = Command::new("taskkill");
    command.args(["/PID", &pid]);
    hide_console(&mut command);

    let status = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "taskkill for process {} failed ({})",
            pid, status
        )))
    }
}

/// Ask the child to exit on its own with SIGTERM
#[cfg(unix)]
pub(crate) fn request_graceful_stop(child: &Child) -> io::Result<()> {
    let pid = child.id() as libc::pid_t;
    debug!("Sending SIGTERM to process {}", pid);

    if unsafe { libc::kill(pid, libc::SIGTERM) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(any(windows, unix)))]
pub(crate) fn request_graceful_stop(_child: &Child) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "graceful termination not supported on this platform",
    ))
}
