//! Canonical JSON and golden-file comparisons.
//!
//! Object keys are sorted at every depth so two equal values always produce
//! the same text. A golden file that does not exist yet is recorded from the
//! current run; `CUBEWORLD_UPDATE_SNAPSHOTS=1` re-records existing ones.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Environment variable that enables snapshot updates.
pub const UPDATE_SNAPSHOTS_ENV: &str = "CUBEWORLD_UPDATE_SNAPSHOTS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnapshotMode {
    Verify,
    Record,
}

impl SnapshotMode {
    fn for_path(path: &Path) -> Self {
        let forced = std::env::var(UPDATE_SNAPSHOTS_ENV)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        if forced || !path.exists() {
            Self::Record
        } else {
            Self::Verify
        }
    }
}

/// Compare `value` with the golden file at `path`, recording it when absent.
pub fn assert_json_snapshot<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let actual = canonical_json(value)?;

    match SnapshotMode::for_path(path) {
        SnapshotMode::Record => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }
            fs::write(path, &actual).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "snapshot recorded");
            Ok(())
        }
        SnapshotMode::Verify => {
            let golden =
                fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            match first_difference(&golden, &actual) {
                None => Ok(()),
                Some(line) => bail!(
                    "{} differs from this run at line {line} (set {UPDATE_SNAPSHOTS_ENV}=1 to re-record)",
                    path.display()
                ),
            }
        }
    }
}

/// Fail unless both values have the same canonical JSON form.
///
/// Determinism checks run a scenario twice and compare the two results.
pub fn assert_same_json<A: Serialize, B: Serialize>(left: &A, right: &B) -> Result<()> {
    let left = canonical_json(left)?;
    let right = canonical_json(right)?;
    match first_difference(&left, &right) {
        None => Ok(()),
        Some(line) => bail!("JSON values diverge at line {line}"),
    }
}

/// Pretty JSON, keys sorted, trailing newline.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value).context("value is not representable as JSON")?;
    let mut text = serde_json::to_string_pretty(&sorted(value))?;
    text.push('\n');
    Ok(text)
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sorted(v))).collect();
            Value::Object(ordered.into_iter().collect::<Map<_, _>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        scalar => scalar,
    }
}

/// 1-based line of the first mismatch, or `None` when the texts are equal.
fn first_difference(a: &str, b: &str) -> Option<usize> {
    if a == b {
        return None;
    }
    let common = a
        .lines()
        .zip(b.lines())
        .take_while(|(x, y)| x == y)
        .count();
    Some(common + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_keys_come_out_sorted() {
        let text = canonical_json(&json!({ "b": 1, "a": { "z": 0, "y": [ { "d": 1, "c": 2 } ] } }))
            .unwrap();
        let at = |key: &str| text.find(key).unwrap();
        assert!(at("\"a\"") < at("\"b\""));
        assert!(at("\"y\"") < at("\"z\""));
        assert!(at("\"c\"") < at("\"d\""));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn same_json_ignores_key_order() {
        assert!(assert_same_json(&json!({ "x": 1, "y": 2 }), &json!({ "y": 2, "x": 1 })).is_ok());
        assert!(assert_same_json(&json!([1, 2]), &json!([1, 3])).is_err());
    }

    #[test]
    fn difference_reports_first_bad_line() {
        assert_eq!(first_difference("a\nb\nc", "a\nb\nc"), None);
        assert_eq!(first_difference("a\nb\nc", "a\nx\nc"), Some(2));
        assert_eq!(first_difference("a\nb", "a\nb\nc"), Some(3));
    }

    #[test]
    fn golden_file_recorded_then_verified() {
        let path = std::env::temp_dir()
            .join(format!("cubeworld-snap-{}", std::process::id()))
            .join("golden.json");
        let _ = fs::remove_file(&path);
        assert_json_snapshot(&path, &json!({ "live": 3 })).unwrap();
        assert!(path.exists());
        assert_json_snapshot(&path, &json!({ "live": 3 })).unwrap();
        if std::env::var(UPDATE_SNAPSHOTS_ENV).is_err() {
            assert!(assert_json_snapshot(&path, &json!({ "live": 4 })).is_err());
        }
    }
}
