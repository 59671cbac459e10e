use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use std::fmt;
use std::path::Path;

/// Leaf name recorded for the filesystem root, which has no name of its own.
pub const ROOT_LEAF: &str = "/";

/// Classification state of a file record.
///
/// `Blessed` and `Cursed` are operator-asserted and sticky: automatic
/// reclassification must never replace them. The four machine-derived
/// statuses are recomputed freely on every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Unknown,
    Good,
    Nuke,
    Check,
    NotSure,
    Blessed,
    Cursed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Unknown => "unknown",
            Status::Good => "good",
            Status::Nuke => "nuke",
            Status::Check => "check",
            Status::NotSure => "not_sure",
            Status::Blessed => "blessed",
            Status::Cursed => "cursed",
        }
    }

    /// Strict round-trip of `as_str`. Unrecognized text is an error, never
    /// a silent fallback.
    pub fn parse(text: &str) -> Option<Status> {
        match text {
            "unknown" => Some(Status::Unknown),
            "good" => Some(Status::Good),
            "nuke" => Some(Status::Nuke),
            "check" => Some(Status::Check),
            "not_sure" => Some(Status::NotSure),
            "blessed" => Some(Status::Blessed),
            "cursed" => Some(Status::Cursed),
            _ => None,
        }
    }

    pub fn is_authoritative(&self) -> bool {
        matches!(self, Status::Blessed | Status::Cursed)
    }

    pub fn is_machine_derived(&self) -> bool {
        matches!(
            self,
            Status::Good | Status::Nuke | Status::Check | Status::NotSure
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Status::parse(text).ok_or_else(|| {
            FromSqlError::Other(format!("unrecognized status '{}'", text).into())
        })
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

/// A file known to the catalog, keyed by absolute path.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: i64,
    pub abs_path: String,
    pub leaf_name: String,
    pub parent_dir: String,
    pub file_size: i64,
    pub fingerprint: Option<String>,
    pub status: Status,
    pub score: Option<i64>,
}

/// A directory known to the catalog. Passive inventory, no classification.
#[derive(Debug, Clone)]
pub struct DirRecord {
    pub id: i64,
    pub abs_path: String,
    pub leaf_name: String,
    pub parent_dir: String,
}

impl DirRecord {
    pub fn from_abs_path(abs_path: &str) -> DirRecord {
        let (parent_dir, leaf_name) = split_abs_path(abs_path);
        DirRecord {
            id: 0,
            abs_path: abs_path.to_string(),
            leaf_name,
            parent_dir,
        }
    }
}

/// Decompose an absolute path into (parent directory, leaf name).
/// The root has no leaf name; it gets the `"/"` sentinel and is its own parent.
pub fn split_abs_path(abs_path: &str) -> (String, String) {
    let path = Path::new(abs_path);
    let parent = path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| abs_path.to_string());
    let leaf = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ROOT_LEAF.to_string());
    (parent, leaf)
}
