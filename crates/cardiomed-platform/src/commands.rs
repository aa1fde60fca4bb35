use std::ffi::OsStr;
use std::process::Stdio;

use tokio::process::Command;

/// `CREATE_NO_WINDOW`
#[cfg(windows)]
const NO_CONSOLE_WINDOW: u32 = 0x0800_0000;

/// Async command for a console tool such as `mysqldump`.
///
/// Stdin is closed unless the caller pipes it, the child is killed when the
/// handle is dropped, and on Windows no console window is flashed.
#[must_use]
pub fn tool_command(program: impl AsRef<OsStr>) -> Command {
    let mut command = Command::new(program);
    command.stdin(Stdio::null()).kill_on_drop(true);
    #[cfg(windows)]
    command.creation_flags(NO_CONSOLE_WINDOW);
    command
}
