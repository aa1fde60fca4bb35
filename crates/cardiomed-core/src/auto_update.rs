//! Installing a published update: download with progress, SHA-256
//! verification, extraction and in-place replacement of the running app.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use cardiomed_platform::AppPaths;

use crate::update::AppUpdate;

/// Prefix of the per-install staging directories in the cache dir.
const STAGING_PREFIX: &str = "cardiomed-update-";

const BINARY_NAME: &str = "cardiomed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateProgress {
    Downloading { downloaded: u64, total: u64 },
    Extracting,
    Applying,
}

impl UpdateProgress {
    /// Download completion in percent, when the payload size is known.
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        let Self::Downloading { downloaded, total } = *self else {
            return None;
        };
        if total == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = downloaded as f64 / total as f64;
        Some((ratio * 100.0).min(100.0))
    }
}

/// What the caller has to do once an update went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    RestartRequired,
    ExitForInstaller,
}

#[derive(Debug, Error)]
pub enum AutoUpdateError {
    #[error("No update package is published for this platform (version {version})")]
    NoPayload { version: String },

    #[error("Version {version} has no published checksum, refusing to install it unverified")]
    Unverified { version: String },

    #[error("Checksum mismatch for {asset}, refusing to install it")]
    ChecksumMismatch { asset: String },

    #[error("Download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed with HTTP status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("Failed to {action} {}: {source}", .path.display())]
    Fs {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unreadable update archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Another update is already being installed")]
    InProgress,

    #[error("{0}")]
    Apply(String),

    #[error("Update task stopped unexpectedly: {0}")]
    Aborted(String),
}

/// Attach the action and path to a filesystem failure.
trait FsContext<T> {
    fn fs(self, action: &'static str, path: &Path) -> Result<T, AutoUpdateError>;
}

impl<T> FsContext<T> for io::Result<T> {
    fn fs(self, action: &'static str, path: &Path) -> Result<T, AutoUpdateError> {
        self.map_err(|source| AutoUpdateError::Fs {
            action,
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Held while an update is being downloaded and applied so that two
/// processes never replace the binary at the same time.
pub struct InstallLock {
    file: File,
}

impl InstallLock {
    /// Take the exclusive update lock.
    ///
    /// # Errors
    /// Returns [`AutoUpdateError::InProgress`] when another process holds the
    /// lock, or an I/O error when the lock file cannot be opened.
    pub fn acquire(paths: &AppPaths) -> Result<Self, AutoUpdateError> {
        let path = paths.update_lock_file();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).fs("create", parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .fs("open", &path)?;
        if file.try_lock_exclusive().is_err() {
            return Err(AutoUpdateError::InProgress);
        }
        debug!("Took update lock {}", path.display());
        Ok(Self { file })
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    /// Zip with the new binary or app bundle.
    Archive,
    /// Windows installer package handed to `msiexec`.
    Installer,
}

impl Payload {
    fn from_file_name(name: &str) -> Self {
        let is_msi = Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("msi"));
        if is_msi { Self::Installer } else { Self::Archive }
    }
}

/// Download, verify and apply a packaged CardioMed update.
///
/// # Errors
/// Returns an error when the update has no verified payload for this platform,
/// another install is running, or downloading, extracting or applying fails.
pub async fn download_and_apply(
    client: &reqwest::Client,
    paths: &AppPaths,
    update: &AppUpdate,
    progress: mpsc::Sender<UpdateProgress>,
) -> Result<ApplyResult, AutoUpdateError> {
    let Some(url) = update.download_url.as_deref() else {
        return Err(AutoUpdateError::NoPayload {
            version: update.latest_version.clone(),
        });
    };
    let Some(expected) = update.download_sha256.as_deref() else {
        return Err(AutoUpdateError::Unverified {
            version: update.latest_version.clone(),
        });
    };

    let _lock = InstallLock::acquire(paths)?;

    std::fs::create_dir_all(&paths.cache_dir).fs("create", &paths.cache_dir)?;
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(&paths.cache_dir)
        .fs("create staging directory in", &paths.cache_dir)?;

    let asset = payload_file_name(url);
    let download = staging.path().join(&asset);

    info!("Downloading update {} from {url}", update.latest_version);
    let actual = fetch(client, url, update.download_size, &download, &progress).await?;
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        warn!("Update {asset} hashed to {actual}, manifest says {expected}");
        return Err(AutoUpdateError::ChecksumMismatch { asset });
    }
    info!("Update checksum verified for {asset}");

    match Payload::from_file_name(&asset) {
        Payload::Installer => {
            let _ = progress.send(UpdateProgress::Applying).await;
            // msiexec keeps reading the package after this process exits.
            let _ = staging.keep();
            launch_installer(&download)
        }
        Payload::Archive => {
            let _ = progress.send(UpdateProgress::Extracting).await;
            let unpacked = staging.path().join("unpacked");
            let files = unpack(&download, &unpacked)?;
            debug!("Unpacked {files} files into {}", unpacked.display());

            let _ = progress.send(UpdateProgress::Applying).await;
            install_unpacked(&unpacked)
        }
    }
}

/// Last path segment of the download URL, without query or fragment.
fn payload_file_name(url: &str) -> String {
    const FALLBACK: &str = "update-download";

    let path = url.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() && !name.contains("..") && !name.contains('\\') => {
            name.to_string()
        }
        _ => FALLBACK.to_string(),
    }
}

/// Stream `url` into `dest`, reporting progress, and return the payload's
/// lowercase hex SHA-256.
async fn fetch(
    client: &reqwest::Client,
    url: &str,
    size_hint: Option<u64>,
    dest: &Path,
    progress: &mpsc::Sender<UpdateProgress>,
) -> Result<String, AutoUpdateError> {
    use futures_util::StreamExt;

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AutoUpdateError::HttpStatus(status));
    }

    let total = response.content_length().or(size_hint).unwrap_or(0);
    let mut file = tokio::fs::File::create(dest).await.fs("create", dest)?;
    let mut hasher = Sha256::new();
    let mut downloaded = 0_u64;

    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        hasher.update(&chunk);
        file.write_all(&chunk).await.fs("write", dest)?;
        downloaded += chunk.len() as u64;
        let _ = progress
            .send(UpdateProgress::Downloading { downloaded, total })
            .await;
    }
    file.flush().await.fs("flush", dest)?;

    info!("Downloaded {downloaded} bytes to {}", dest.display());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Expand a zip archive into `dest` and return the number of files written.
/// Entries whose path would leave `dest` are skipped.
fn unpack(archive_path: &Path, dest: &Path) -> Result<usize, AutoUpdateError> {
    let file = File::open(archive_path).fs("open", archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    std::fs::create_dir_all(dest).fs("create", dest)?;

    let mut written = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping archive entry outside the destination: {}", entry.name());
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target).fs("create", &target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).fs("create", parent)?;
        }
        let mut out = File::create(&target).fs("create", &target)?;
        io::copy(&mut entry, &mut out).fs("extract", &target)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&target, std::fs::Permissions::from_mode(mode));
        }
        written += 1;
    }
    Ok(written)
}

/// The packaged binary sits either at the archive root or in a single
/// top-level folder.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn locate_binary(unpacked: &Path, name: &str) -> Option<PathBuf> {
    let at_root = unpacked.join(name);
    if at_root.is_file() {
        return Some(at_root);
    }
    std::fs::read_dir(unpacked)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path().join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(target_os = "linux")]
fn install_unpacked(unpacked: &Path) -> Result<ApplyResult, AutoUpdateError> {
    let replacement = locate_binary(unpacked, BINARY_NAME).ok_or_else(|| {
        AutoUpdateError::Apply(format!("The update archive contains no '{BINARY_NAME}' binary"))
    })?;
    let current = std::env::current_exe().fs("locate", Path::new(BINARY_NAME))?;

    match self_replace::self_replace(&replacement) {
        Ok(()) => {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&current, std::fs::Permissions::from_mode(0o755));
            info!("Replaced {} in place", current.display());
            Ok(ApplyResult::RestartRequired)
        }
        Err(error) if error.kind() == io::ErrorKind::PermissionDenied => {
            info!("{} is not writable, asking pkexec", current.display());
            install_elevated(&replacement, &current)
        }
        Err(error) => Err(error).fs("replace", &current),
    }
}

#[cfg(target_os = "linux")]
fn install_elevated(replacement: &Path, target: &Path) -> Result<ApplyResult, AutoUpdateError> {
    let status = std::process::Command::new("pkexec")
        .arg("install")
        .args(["-m", "755", "--"])
        .arg(replacement)
        .arg(target)
        .status()
        .fs("run pkexec for", target)?;

    if status.success() {
        info!("Replaced {} with elevated rights", target.display());
        Ok(ApplyResult::RestartRequired)
    } else {
        Err(AutoUpdateError::Apply(format!(
            "Could not replace {target} with elevated rights. Install the update manually:\n  \
             sudo install -m 755 {replacement} {target}",
            target = target.display(),
            replacement = replacement.display()
        )))
    }
}

#[cfg(target_os = "macos")]
fn install_unpacked(unpacked: &Path) -> Result<ApplyResult, AutoUpdateError> {
    let fresh = std::fs::read_dir(unpacked)
        .fs("read", unpacked)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| path.is_dir() && path.extension().is_some_and(|ext| ext == "app"))
        .ok_or_else(|| AutoUpdateError::Apply("The update archive contains no .app bundle".into()))?;
    let installed = running_bundle()?;
    let previous = installed.with_extension("app.old");

    if previous.exists() {
        std::fs::remove_dir_all(&previous).fs("remove", &previous)?;
    }
    std::fs::rename(&installed, &previous).fs("move aside", &installed)?;

    if let Err(error) = move_tree(&fresh, &installed) {
        warn!("Bundle swap failed, putting the previous bundle back: {error}");
        let _ = std::fs::remove_dir_all(&installed);
        let _ = std::fs::rename(&previous, &installed);
        return Err(error);
    }

    // Downloaded bundles carry the quarantine flag.
    let _ = std::process::Command::new("xattr")
        .arg("-cr")
        .arg(&installed)
        .output();

    info!("Installed new bundle at {}", installed.display());
    Ok(ApplyResult::RestartRequired)
}

#[cfg(target_os = "macos")]
fn running_bundle() -> Result<PathBuf, AutoUpdateError> {
    let exe = std::env::current_exe().fs("locate", Path::new(BINARY_NAME))?;
    exe.ancestors()
        .find(|path| path.extension().is_some_and(|ext| ext == "app"))
        .map(Path::to_path_buf)
        .ok_or_else(|| AutoUpdateError::Apply("CardioMed is not running from an .app bundle".into()))
}

/// Rename when possible, otherwise copy across filesystems.
#[cfg(target_os = "macos")]
fn move_tree(from: &Path, to: &Path) -> Result<(), AutoUpdateError> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    copy_tree(from, to)?;
    std::fs::remove_dir_all(from).fs("remove", from)
}

#[cfg(target_os = "macos")]
fn copy_tree(from: &Path, to: &Path) -> Result<(), AutoUpdateError> {
    std::fs::create_dir_all(to).fs("create", to)?;
    for entry in std::fs::read_dir(from).fs("read", from)? {
        let entry = entry.fs("read", from)?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        let file_type = entry.file_type().fs("inspect", &source)?;
        if file_type.is_symlink() {
            let link = std::fs::read_link(&source).fs("read link", &source)?;
            std::os::unix::fs::symlink(link, &target).fs("link", &target)?;
        } else if file_type.is_dir() {
            copy_tree(&source, &target)?;
        } else {
            std::fs::copy(&source, &target).fs("copy", &source)?;
        }
    }
    Ok(())
}

#[cfg(target_os = "windows")]
fn install_unpacked(_unpacked: &Path) -> Result<ApplyResult, AutoUpdateError> {
    Err(AutoUpdateError::Apply(
        "Windows updates are published as .msi installers".to_string(),
    ))
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn install_unpacked(_unpacked: &Path) -> Result<ApplyResult, AutoUpdateError> {
    Err(AutoUpdateError::Apply(
        "Automatic updates are not supported on this platform".to_string(),
    ))
}

#[cfg(target_os = "windows")]
fn launch_installer(package: &Path) -> Result<ApplyResult, AutoUpdateError> {
    info!("Starting installer {}", package.display());
    std::process::Command::new("msiexec")
        .arg("/i")
        .arg(package)
        .arg("/passive")
        .spawn()
        .fs("start msiexec for", package)?;
    Ok(ApplyResult::ExitForInstaller)
}

#[cfg(not(target_os = "windows"))]
fn launch_installer(_package: &Path) -> Result<ApplyResult, AutoUpdateError> {
    Err(AutoUpdateError::Apply(
        "MSI installers can only be used on Windows".to_string(),
    ))
}

/// Remove leftovers of earlier installs: staging directories in the cache
/// and, on macOS, the previous app bundle.
pub fn cleanup_old_app_bundle(paths: &AppPaths) {
    #[cfg(target_os = "macos")]
    if let Ok(bundle) = running_bundle() {
        let previous = bundle.with_extension("app.old");
        if previous.is_dir() {
            info!("Removing previous app bundle {}", previous.display());
            let _ = std::fs::remove_dir_all(&previous);
        }
    }

    let Ok(entries) = std::fs::read_dir(&paths.cache_dir) else {
        return;
    };
    for entry in entries.filter_map(Result::ok) {
        let is_staging = entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX);
        if is_staging && entry.path().is_dir() {
            debug!("Removing stale update staging dir {}", entry.path().display());
            let _ = std::fs::remove_dir_all(entry.path());
        }
    }
}

/// Reopen the application bundle.
///
/// # Errors
/// Returns an error when the running bundle cannot be located or reopened.
#[cfg(target_os = "macos")]
pub fn restart_app() -> Result<(), AutoUpdateError> {
    let bundle = running_bundle()?;
    std::process::Command::new("open")
        .arg("-n")
        .arg(&bundle)
        .spawn()
        .fs("reopen", &bundle)?;
    Ok(())
}

/// Start a fresh copy of the installed executable.
///
/// # Errors
/// Returns an error when the executable cannot be located or started.
#[cfg(not(target_os = "macos"))]
pub fn restart_app() -> Result<(), AutoUpdateError> {
    let exe = installed_exe()?;
    info!("Restarting {}", exe.display());
    std::process::Command::new(&exe).spawn().fs("start", &exe)?;
    Ok(())
}

/// After `self_replace`, `/proc/self/exe` still names the old inode and
/// carries a " (deleted)" suffix.
#[cfg(not(target_os = "macos"))]
fn installed_exe() -> Result<PathBuf, AutoUpdateError> {
    let exe = std::env::current_exe().fs("locate", Path::new(BINARY_NAME))?;
    Ok(exe
        .to_str()
        .and_then(|path| path.strip_suffix(" (deleted)"))
        .map_or(exe.clone(), PathBuf::from))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    const PAYLOAD: &[u8] = b"cardiomed-payload";
    const PAYLOAD_SHA256: &str = "183958475032dec8ff69ed2ec5a6f1d20d2ce841a5f17c0fb8cc021269cef9f5";

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).expect("zip file should be created");
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
        for (name, contents) in entries {
            if name.ends_with('/') {
                writer
                    .add_directory(*name, options)
                    .expect("directory entry should be written");
            } else {
                writer
                    .start_file(*name, options)
                    .expect("file entry should be started");
                writer.write_all(contents).expect("file entry should be written");
            }
        }
        writer.finish().expect("zip archive should be finalized");
    }

    /// Serve `body` once over HTTP and return the URL of `file_name`.
    async fn serve_payload(file_name: &str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("listener should have an address");
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("client should connect");
            let mut request = Vec::new();
            let mut chunk = [0_u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = socket.read(&mut chunk).await.expect("request should be readable");
                if read == 0 {
                    return;
                }
                request.extend_from_slice(&chunk[..read]);
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                body.len()
            );
            socket
                .write_all(head.as_bytes())
                .await
                .expect("headers should be written");
            socket.write_all(body).await.expect("body should be written");
        });
        format!("http://{addr}/releases/{file_name}")
    }

    fn update_for(url: Option<String>, sha256: Option<&str>) -> AppUpdate {
        AppUpdate {
            current_version: "1.0.0".to_string(),
            latest_version: "1.4.0".to_string(),
            release_notes: None,
            priority: false,
            pub_date: None,
            download_url: url,
            download_size: None,
            download_sha256: sha256.map(str::to_string),
        }
    }

    #[test]
    fn unpack_expands_nested_folders() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let archive = temp.path().join("update.zip");
        write_zip(
            &archive,
            &[
                ("cardiomed-1.4.0/", b""),
                ("cardiomed-1.4.0/cardiomed", b"binary-content"),
                ("cardiomed-1.4.0/README", b"notes"),
            ],
        );

        let dest = temp.path().join("unpacked");
        let files = unpack(&archive, &dest).expect("archive should unpack");

        assert_eq!(files, 2);
        let binary = locate_binary(&dest, "cardiomed").expect("nested binary should be found");
        assert!(binary.ends_with("cardiomed-1.4.0/cardiomed"));
        assert_eq!(
            std::fs::read(binary).expect("binary should be readable"),
            b"binary-content"
        );
    }

    #[test]
    fn unpack_skips_entries_leaving_the_destination() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let archive = temp.path().join("unsafe.zip");
        write_zip(&archive, &[("../outside.txt", b"escape"), ("inside.txt", b"ok")]);

        let dest = temp.path().join("unpacked");
        let files = unpack(&archive, &dest).expect("unpacking should not fail");

        assert_eq!(files, 1);
        assert!(dest.join("inside.txt").is_file());
        assert!(!temp.path().join("outside.txt").exists());
    }

    #[test]
    fn locate_binary_returns_none_when_missing() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        std::fs::create_dir_all(temp.path().join("docs")).expect("docs dir should be created");

        assert!(locate_binary(temp.path(), "cardiomed").is_none());
    }

    #[test]
    fn payload_file_name_strips_query_and_traversal() {
        assert_eq!(
            payload_file_name("https://updates.example.com/v1/cardiomed-linux.zip?token=abc"),
            "cardiomed-linux.zip"
        );
        assert_eq!(payload_file_name("https://updates.example.com/.."), "update-download");
        assert_eq!(payload_file_name("https://updates.example.com/"), "update-download");
    }

    #[test]
    fn payload_kind_follows_extension() {
        assert_eq!(Payload::from_file_name("CardioMed-1.4.0.MSI"), Payload::Installer);
        assert_eq!(Payload::from_file_name("cardiomed-linux.zip"), Payload::Archive);
    }

    #[test]
    fn progress_percent_requires_known_total() {
        let half = UpdateProgress::Downloading {
            downloaded: 512,
            total: 1024,
        };
        let unknown = UpdateProgress::Downloading {
            downloaded: 512,
            total: 0,
        };

        assert_eq!(half.percent(), Some(50.0));
        assert_eq!(unknown.percent(), None);
        assert_eq!(UpdateProgress::Applying.percent(), None);
    }

    #[test]
    fn install_lock_is_exclusive() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let paths = AppPaths::under(temp.path());

        let first = InstallLock::acquire(&paths).expect("first lock should succeed");
        assert!(matches!(
            InstallLock::acquire(&paths),
            Err(AutoUpdateError::InProgress)
        ));

        drop(first);
        InstallLock::acquire(&paths).expect("lock should be free again");
    }

    #[test]
    fn cleanup_removes_only_staging_dirs() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let paths = AppPaths::under(temp.path());
        let stale = paths.cache_dir.join(format!("{STAGING_PREFIX}abc123"));
        let unrelated = paths.cache_dir.join("thumbnails");
        std::fs::create_dir_all(&stale).expect("stale dir should be created");
        std::fs::create_dir_all(&unrelated).expect("unrelated dir should be created");

        cleanup_old_app_bundle(&paths);

        assert!(!stale.exists());
        assert!(unrelated.is_dir());
    }

    #[tokio::test]
    async fn refuses_update_without_checksum() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let paths = AppPaths::under(temp.path());
        let (tx, _rx) = mpsc::channel(8);
        let update = update_for(Some("http://127.0.0.1:9/cardiomed.zip".to_string()), None);

        let result = download_and_apply(&reqwest::Client::new(), &paths, &update, tx).await;

        assert!(matches!(result, Err(AutoUpdateError::Unverified { .. })));
    }

    #[tokio::test]
    async fn rejects_payload_with_wrong_checksum() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let paths = AppPaths::under(temp.path());
        let url = serve_payload("cardiomed-linux.zip", PAYLOAD).await;
        let (tx, mut rx) = mpsc::channel(64);
        let update = update_for(Some(url), Some("0".repeat(64).as_str()));

        let result = download_and_apply(&reqwest::Client::new(), &paths, &update, tx).await;

        assert!(matches!(
            result,
            Err(AutoUpdateError::ChecksumMismatch { ref asset }) if asset == "cardiomed-linux.zip"
        ));
        let mut last = None;
        while let Some(progress) = rx.recv().await {
            last = Some(progress);
        }
        assert_eq!(
            last,
            Some(UpdateProgress::Downloading {
                downloaded: PAYLOAD.len() as u64,
                total: PAYLOAD.len() as u64,
            })
        );
    }

    #[cfg(not(target_os = "windows"))]
    #[tokio::test]
    async fn verified_installer_is_rejected_off_windows() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let paths = AppPaths::under(temp.path());
        let url = serve_payload("CardioMed-1.4.0.msi", PAYLOAD).await;
        let (tx, _rx) = mpsc::channel(64);
        let update = update_for(Some(url), Some(PAYLOAD_SHA256.to_uppercase().as_str()));

        let result = download_and_apply(&reqwest::Client::new(), &paths, &update, tx).await;

        assert!(matches!(
            result,
            Err(AutoUpdateError::Apply(ref message)) if message.contains("only be used on Windows")
        ));
    }
}
