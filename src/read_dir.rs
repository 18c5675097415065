use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub type Entries = BTreeSet<Entry>;

/// A round export found below an input directory; ordered by path.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Entry {
    pub path: PathBuf,
    pub len: u64,
}

pub fn read_dir(path: &Path) -> Result<Entries> {
    let mut set = BTreeSet::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_file() && is_round_export(entry.path()) {
            set.insert(Entry {
                path: entry.into_path(),
                len: metadata.len(),
            });
        }
    }
    Ok(set)
}

fn is_round_export(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.ends_with(".json") || name.ends_with(".json.gz"))
}

#[cfg(test)]
#[test]
fn test_read_dir() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("mirage");
    std::fs::create_dir(&nested).unwrap();
    std::fs::write(dir.path().join("b.json"), "[]").unwrap();
    std::fs::write(dir.path().join("a.json.gz"), "").unwrap();
    std::fs::write(nested.join("c.json"), "[]").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "").unwrap();
    std::fs::write(dir.path().join("collected.xes"), "").unwrap();

    let entries = read_dir(dir.path()).unwrap();
    let names: Vec<_> = entries
        .iter()
        .map(|e| e.path.strip_prefix(dir.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        names,
        vec![
            PathBuf::from("a.json.gz"),
            PathBuf::from("b.json"),
            PathBuf::from("mirage").join("c.json"),
        ]
    );
    assert_eq!(entries.iter().find(|e| e.path.ends_with("b.json")).unwrap().len, 2);
}
