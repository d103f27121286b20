//! # artifact-sftp
//!
//! Blocking SFTP client for build and deployment pipelines:
//!   • `put_file` – upload one file, creating missing remote directories
//!   • `put_matching` – upload every local file matching a `*` pattern
//!   • `get_file` – download one remote file into a local directory
//!   • `get_from_dir` – download every file of a remote directory
//!   • `remove` – delete a remote file
//!
//! Every operation opens its own connection and closes it before returning.
//!
//! ```no_run
//! use artifact_sftp::{SftpClient, SftpConfig};
//!
//! let config = SftpConfig::new("build.example.org", "ci").with_password("secret");
//! let client = SftpClient::new(config);
//! client.put_file("target/app.jar", "releases/1.4.0/app.jar")?;
//! # Ok::<(), artifact_sftp::SftpError>(())
//! ```

pub mod sftp;

pub use sftp::*;
