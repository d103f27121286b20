// ── Remote directory preparation ─────────────────────────────────────────────
//
// Walks a target path one segment at a time with relative `cd`, creating
// each missing segment with a relative `mkdir`. On success the channel's
// working directory is the target.

use crate::sftp::error::{SftpError, SftpResult};
use crate::sftp::events::{TransferEvent, TransferObserver};
use crate::sftp::transport::SftpChannel;

/// Split a slash- or backslash-delimited path into its non-empty segments.
pub fn path_segments(directory: &str) -> Vec<String> {
    directory
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove a leading remote-home prefix, on a segment boundary only.
pub fn strip_home(directory: &str, home: &str) -> String {
    let home = home.trim_end_matches('/');
    if home.is_empty() {
        return directory.to_string();
    }
    match directory.strip_prefix(home) {
        Some("") => String::new(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => directory.to_string(),
    }
}

/// Make `directory` the channel's working directory, creating missing
/// segments root-to-leaf. Empty, `/` and all-separator inputs are no-ops.
pub fn prepare_directory<C: SftpChannel + ?Sized>(
    channel: &mut C,
    directory: &str,
    strip_home_prefix: bool,
    observer: &dyn TransferObserver,
) -> SftpResult<()> {
    let normalized = directory.replace('\\', "/");
    if path_segments(&normalized).is_empty() {
        return Ok(());
    }

    let relative = if strip_home_prefix {
        let home = channel.home()?;
        strip_home(&normalized, &home)
    } else {
        normalized
    };

    for segment in path_segments(&relative) {
        observer.on_event(&TransferEvent::ChangeDirectory {
            segment: segment.clone(),
        });
        if let Err(cd_err) = channel.cd(&segment) {
            observer.on_event(&TransferEvent::DirectoryMissing {
                segment: segment.clone(),
                reason: cd_err.message,
            });

            channel.mkdir(&segment).map_err(|e| {
                SftpError::path(format!(
                    "Cannot create remote directory '{}' of '{}': {}",
                    segment, directory, e.message
                ))
                .with_path(directory)
            })?;
            observer.on_event(&TransferEvent::DirectoryCreated {
                segment: segment.clone(),
            });

            channel.cd(&segment).map_err(|e| {
                SftpError::path(format!(
                    "Cannot enter remote directory '{}' of '{}': {}",
                    segment, directory, e.message
                ))
                .with_path(directory)
            })?;
        }
    }

    Ok(())
}
