//! File-serving policy: resolves request paths against the root directory
//! and turns the outcome into HTTP responses.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use axum::Json;
use axum::body::Body;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use tracing::warn;

use crate::assets;
use crate::fmt;

/// Files larger than this are streamed instead of buffered whole.
pub const FILE_STREAM_THRESHOLD: u64 = 100 * 1024 * 1024;

const STREAM_BUF_SIZE: usize = 1 << 18;

/// How a file's bytes are delivered.
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Read fully into memory and written as one buffer.
    Buffered,
    /// Read lazily as the client drains the body.
    Streamed,
}

impl Delivery {
    /// Buffered at or below the threshold, streamed strictly above it.
    pub fn for_len(len: u64) -> Self {
        if len > FILE_STREAM_THRESHOLD {
            Self::Streamed
        } else {
            Self::Buffered
        }
    }
}

/// One directory child, captured at enumeration time.
#[derive(Debug)]
pub struct EntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

/// The filesystem resolution of a request path under the root.
#[derive(Debug)]
pub enum Resolved {
    NotFound,
    File {
        path: PathBuf,
    },
    Directory {
        path: PathBuf,
        entries: Vec<EntryInfo>,
    },
    /// The directory exists but cannot be enumerated.
    Forbidden,
}

/// Maps `rel_path` onto the filesystem under `root`.
///
/// Traversal out of the root is refused before touching the filesystem: a
/// `..` segment resolves as `NotFound`. Only direct children are listed
/// for directories, directories first and then by name, so the index is
/// stable across filesystems.
pub async fn resolve(root: &Path, rel_path: &str) -> Resolved {
    let Some(target) = join_under(root, rel_path) else {
        return Resolved::NotFound;
    };
    let Ok(meta) = tokio::fs::metadata(&target).await else {
        return Resolved::NotFound;
    };

    if meta.is_file() {
        return Resolved::File { path: target };
    }
    match list_dir(&target).await {
        Ok(entries) => Resolved::Directory { path: target, entries },
        Err(err) => {
            warn!("cannot list {}: {err}", target.display());
            Resolved::Forbidden
        }
    }
}

/// Joins `rel_path` under `root`, dropping `.` and empty segments and
/// refusing `..`.
fn join_under(root: &Path, rel_path: &str) -> Option<PathBuf> {
    let mut target = root.to_path_buf();
    for segment in fmt::segments(rel_path) {
        match segment {
            "." => {}
            ".." => return None,
            _ => target.push(segment),
        }
    }
    Some(target)
}

async fn list_dir(path: &Path) -> io::Result<Vec<EntryInfo>> {
    let mut reader = tokio::fs::read_dir(path).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        entries.push(EntryInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: meta.is_dir(),
            len: meta.len(),
            modified: meta.modified().ok(),
        });
    }
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

/// Serves `path` as a file body, MIME guessed from the extension.
///
/// A file that cannot be opened at serve time renders the not-found body;
/// the client cannot tell a permission race from absence.
pub async fn respond_file(path: &Path) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    let (mut file, len) = match open_with_len(path).await {
        Ok(pair) => pair,
        Err(err) => {
            warn!("cannot open {}: {err}", path.display());
            return not_found();
        }
    };

    match Delivery::for_len(len) {
        Delivery::Buffered => {
            let mut buf = Vec::with_capacity(len as usize);
            if let Err(err) = file.read_to_end(&mut buf).await {
                warn!("cannot read {}: {err}", path.display());
                return not_found();
            }
            ([(header::CONTENT_TYPE, mime.to_string())], buf).into_response()
        }
        Delivery::Streamed => {
            let body = Body::from_stream(ReaderStream::with_capacity(file, STREAM_BUF_SIZE));
            (
                [
                    (header::CONTENT_TYPE, mime.to_string()),
                    (header::CONTENT_LENGTH, len.to_string()),
                ],
                body,
            )
                .into_response()
        }
    }
}

async fn open_with_len(path: &Path) -> io::Result<(tokio::fs::File, u64)> {
    let file = tokio::fs::File::open(path).await?;
    let len = file.metadata().await?.len();
    Ok((file, len))
}

/// Renders the directory index for `request_path`, the decoded request
/// path relative to the root.
pub fn respond_dir(request_path: &str, entries: &[EntryInfo]) -> Response {
    Html(index_html(request_path, entries)).into_response()
}

fn index_html(request_path: &str, entries: &[EntryInfo]) -> String {
    let segments = fmt::segments(request_path);

    // The parent link is omitted at the root itself.
    let parent = if segments.is_empty() {
        String::new()
    } else {
        let parent_path = segments[..segments.len() - 1].join("/");
        item_html("icon-arrow-up", "Parent Directory", &parent_path, "", "")
    };

    let base = if segments.is_empty() {
        String::new()
    } else {
        segments.join("/") + "/"
    };
    let list: String = entries
        .iter()
        .map(|entry| {
            let (icon, name, size) = if entry.is_dir {
                ("icon-folder-close", format!("{}/", entry.name), String::new())
            } else {
                ("icon-file", entry.name.clone(), fmt::human_size(entry.len))
            };
            let modified = entry.modified.map(fmt::format_mtime).unwrap_or_default();
            item_html(icon, &name, &format!("{base}{name}"), &size, &modified)
        })
        .collect();

    fmt::fill(
        assets::template("index-template.html"),
        &[
            ("server-version", env!("CARGO_PKG_VERSION")),
            ("Parent Directory", &parent),
            ("file-list", &list),
        ],
    )
}

fn item_html(icon: &str, display_name: &str, href: &str, size: &str, modified: &str) -> String {
    fmt::fill(
        assets::template("file-list-item-template.html"),
        &[
            ("item-icon", icon),
            ("display-name", display_name),
            ("href", href),
            ("file-size", size),
            ("last-modified", modified),
        ],
    )
}

/// Serves an embedded asset's bytes with its guessed MIME type.
pub fn respond_asset(virtual_path: &str, bytes: &'static [u8]) -> Response {
    let mime = mime_guess::from_path(virtual_path).first_or_octet_stream();
    ([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response()
}

#[derive(Serialize)]
struct ErrorBody {
    message: &'static str,
}

fn error_json(status: StatusCode, message: &'static str) -> Response {
    (status, Json(ErrorBody { message })).into_response()
}

/// `404` with the structured body shared by every unresolvable path.
pub fn not_found() -> Response {
    error_json(StatusCode::NOT_FOUND, "Directory or file not found")
}

/// `403` for a directory that exists but cannot be entered.
pub fn forbidden() -> Response {
    error_json(StatusCode::FORBIDDEN, "Directory access denied")
}
