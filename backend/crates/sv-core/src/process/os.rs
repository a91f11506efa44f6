//! Thin platform layer over signals and process images.
//!
//! Nothing outside `process` calls these directly.

use std::path::{Path, PathBuf};

/// Whether `pid` names a live process. Zombies count as gone: an adopted
/// server that exited is not our child and may linger until its parent reaps it.
pub fn is_alive(pid: u32) -> bool {
    sv_config::is_process_running(pid) && !is_zombie(pid)
}

#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    // Field 3 of /proc/<pid>/stat, after the parenthesized command name
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .and_then(|stat| {
            let (_, rest) = stat.rsplit_once(')')?;
            rest.trim_start().chars().next()
        })
        .is_some_and(|state| state == 'Z')
}

#[cfg(not(target_os = "linux"))]
fn is_zombie(_pid: u32) -> bool {
    false
}

/// Ask the process to exit. A process that is already gone is not an error.
#[cfg(unix)]
pub fn send_terminate(pid: u32) -> std::io::Result<()> {
    send_signal(pid, nix::sys::signal::Signal::SIGTERM)
}

/// Force the process to exit.
#[cfg(unix)]
pub fn send_kill(pid: u32) -> std::io::Result<()> {
    send_signal(pid, nix::sys::signal::Signal::SIGKILL)
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: nix::sys::signal::Signal) -> std::io::Result<()> {
    use nix::errno::Errno;
    use nix::unistd::Pid;

    let raw = i32::try_from(pid)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "PID out of range"))?;
    if raw <= 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "refusing to signal a process group",
        ));
    }

    match nix::sys::signal::kill(Pid::from_raw(raw), signal) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(std::io::Error::from(errno)),
    }
}

/// Windows has no graceful console signal for a detached server.
#[cfg(windows)]
pub fn send_terminate(pid: u32) -> std::io::Result<()> {
    terminate_process(pid)
}

#[cfg(windows)]
pub fn send_kill(pid: u32) -> std::io::Result<()> {
    terminate_process(pid)
}

#[cfg(windows)]
fn terminate_process(pid: u32) -> std::io::Result<()> {
    use windows_sys::Win32::Foundation::CloseHandle;
    use windows_sys::Win32::System::Threading::{OpenProcess, PROCESS_TERMINATE, TerminateProcess};

    // SAFETY: the handle is checked for null and closed before returning.
    unsafe {
        let handle = OpenProcess(PROCESS_TERMINATE, 0, pid);
        if handle.is_null() {
            if !is_alive(pid) {
                return Ok(());
            }
            return Err(std::io::Error::last_os_error());
        }

        let ok = TerminateProcess(handle, 1);
        let err = std::io::Error::last_os_error();
        CloseHandle(handle);

        if ok == 0 && is_alive(pid) {
            return Err(err);
        }
        Ok(())
    }
}

/// Resolved image of a running process.
#[cfg(target_os = "linux")]
pub fn executable_of(pid: u32) -> Option<PathBuf> {
    let link = std::fs::read_link(format!("/proc/{pid}/exe")).ok()?;

    // The kernel appends this marker when the binary was replaced on disk,
    // which happens after an in-place server update.
    let raw = link.to_string_lossy();
    let trimmed = raw.strip_suffix(" (deleted)").unwrap_or(&raw);
    Some(PathBuf::from(trimmed))
}

/// Resolved image of a running process.
#[cfg(not(target_os = "linux"))]
pub fn executable_of(pid: u32) -> Option<PathBuf> {
    use sysinfo::{Pid, System};

    let mut sys = System::new();
    let pid = Pid::from_u32(pid);
    if !sys.refresh_process(pid) {
        return None;
    }

    sys.process(pid)
        .and_then(|process| process.exe())
        .map(Path::to_path_buf)
}

/// True when `pid` runs the binary at `expected`.
pub fn image_matches(pid: u32, expected: &Path) -> bool {
    let Some(actual) = executable_of(pid) else {
        return false;
    };

    let actual = actual.canonicalize().unwrap_or(actual);
    let expected = expected
        .canonicalize()
        .unwrap_or_else(|_| expected.to_path_buf());
    actual == expected
}

/// Set the executable bits so a freshly unpacked server can start.
#[cfg(unix)]
pub fn ensure_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(path)?.permissions();
    let mode = permissions.mode();
    if mode & 0o111 != 0o111 {
        permissions.set_mode(mode | 0o111);
        std::fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn ensure_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
