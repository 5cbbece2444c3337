use std::path::Path;

use crate::error::ExecutionError;

/// Archive formats that can be unpacked after a transfer, keyed by suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decompression {
    TarGz,
    Tar,
    Gzip,
    Zip,
}

impl Decompression {
    /// `.tar.gz` is checked before `.gz`.
    pub fn from_path(path: &str) -> Result<Self, ExecutionError> {
        if path.ends_with(".tar.gz") {
            Ok(Decompression::TarGz)
        } else if path.ends_with(".tar") {
            Ok(Decompression::Tar)
        } else if path.ends_with(".gz") {
            Ok(Decompression::Gzip)
        } else if path.ends_with(".zip") {
            Ok(Decompression::Zip)
        } else {
            Err(ExecutionError::Unsupported(format!(
                "unsupported file extension for {}",
                path
            )))
        }
    }

    /// Executable that must exist on the remote.
    pub fn tool(&self) -> &'static str {
        match self {
            Decompression::TarGz | Decompression::Tar => "tar",
            Decompression::Gzip => "gunzip",
            Decompression::Zip => "unzip",
        }
    }

    fn invocation(&self) -> &'static str {
        match self {
            Decompression::TarGz => "tar -xzf",
            Decompression::Tar => "tar -xf",
            Decompression::Gzip => "gunzip -df",
            Decompression::Zip => "unzip",
        }
    }

    pub fn command(&self, path: &str) -> String {
        format!("cd {} && {} {}", parent_dir(path), self.invocation(), file_name(path))
    }
}

/// Shell command that unpacks `path` in its own directory.
pub fn decompress_command(path: &str) -> Result<String, ExecutionError> {
    Ok(Decompression::from_path(path)?.command(path))
}

/// Directory part of a remote path: `/` for root entries, `.` for bare names.
pub fn parent_dir(path: &str) -> String {
    match Path::new(path).parent() {
        Some(p) if p.as_os_str().is_empty() => ".".to_string(),
        Some(p) => p.to_string_lossy().into_owned(),
        None if path.starts_with('/') => "/".to_string(),
        None => ".".to_string(),
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
