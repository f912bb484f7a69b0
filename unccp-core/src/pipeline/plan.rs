use crate::error::{Result, UnccpError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const BYTECODE_EXTS: [&str; 3] = ["pyj", "pyc", "pyo"];

/// Maps an archive-internal path to its place under `client_code/`.
///
/// `pkg/sub/mod.pyj` becomes `pkg/sub/mod.py`; names without a bytecode
/// extension get `.py` appended. Paths that could escape the output root are
/// rejected.
pub fn output_rel_path(name: &str) -> Result<PathBuf> {
    let unsafe_path = || UnccpError::UnsafePath(name.to_string());
    if name.starts_with('/') || name.contains('\\') {
        return Err(unsafe_path());
    }
    let mut parts: Vec<&str> = Vec::new();
    for seg in name.split('/') {
        match seg {
            "" | "." => continue,
            ".." => return Err(unsafe_path()),
            s if s.contains(':') => return Err(unsafe_path()),
            s => parts.push(s),
        }
    }
    let Some(last) = parts.pop() else {
        return Err(unsafe_path());
    };

    let file = match last.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && BYTECODE_EXTS.contains(&ext.to_ascii_lowercase().as_str()) =>
        {
            format!("{stem}.py")
        }
        _ => format!("{last}.py"),
    };

    let mut out: PathBuf = parts.into_iter().collect();
    out.push(file);
    Ok(out)
}

#[derive(Clone, Debug)]
enum Slot {
    Ready(PathBuf),
    Unsafe,
    Collision { path: PathBuf, other: String },
}

/// Claimed files and the directories they imply, keyed case-folded so that
/// case-insensitive filesystems see the same conflicts.
#[derive(Default)]
struct Claims<'a> {
    files: HashMap<String, &'a str>,
    dirs: HashMap<String, &'a str>,
}

impl<'a> Claims<'a> {
    /// Claims `rel` for `name`, or returns the entry already holding it (as a
    /// file, as a directory, or as a file where a parent directory is needed).
    fn claim(&mut self, rel: &Path, name: &'a str) -> Option<&'a str> {
        let parts: Vec<String> = rel
            .iter()
            .map(|c| c.to_string_lossy().to_lowercase())
            .collect();
        let key = parts.join("/");
        if let Some(other) = self.files.get(&key).or_else(|| self.dirs.get(&key)) {
            return Some(*other);
        }
        let ancestors: Vec<String> = (1..parts.len()).map(|n| parts[..n].join("/")).collect();
        if let Some(other) = ancestors.iter().find_map(|a| self.files.get(a)) {
            return Some(*other);
        }
        for a in ancestors {
            self.dirs.entry(a).or_insert(name);
        }
        self.files.insert(key, name);
        None
    }
}

/// Output paths for every entry, decided before any worker starts.
///
/// The first entry (in archive order) to claim an output path keeps it;
/// later claimants are turned into collisions, so written files map back to
/// exactly one entry.
#[derive(Clone, Debug, Default)]
pub struct OutputPlan {
    slots: HashMap<usize, Slot>,
}

impl OutputPlan {
    pub fn build(names: &[(usize, String)]) -> Self {
        let mut claims = Claims::default();
        let mut slots = HashMap::with_capacity(names.len());
        for (index, name) in names {
            let slot = match output_rel_path(name) {
                Err(_) => Slot::Unsafe,
                Ok(rel) => match claims.claim(&rel, name) {
                    Some(other) => Slot::Collision {
                        path: rel,
                        other: other.to_string(),
                    },
                    None => Slot::Ready(rel),
                },
            };
            slots.insert(*index, slot);
        }
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Output path for the entry at `index`; entries missing from the plan are
    /// mapped on the spot.
    pub fn output_for(&self, index: usize, name: &str) -> Result<PathBuf> {
        match self.slots.get(&index) {
            Some(Slot::Ready(p)) => Ok(p.clone()),
            Some(Slot::Unsafe) => Err(UnccpError::UnsafePath(name.to_string())),
            Some(Slot::Collision { path, other }) => Err(UnccpError::OutputCollision {
                path: path.display().to_string(),
                other: other.clone(),
            }),
            None => output_rel_path(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn mirrors_hierarchy_and_swaps_extension() {
        assert_eq!(
            output_rel_path("carbon/common/lib/foo.pyj").unwrap(),
            PathBuf::from("carbon/common/lib/foo.py")
        );
        assert_eq!(output_rel_path("a.PYC").unwrap(), PathBuf::from("a.py"));
        assert_eq!(output_rel_path("pkg/README").unwrap(), PathBuf::from("pkg/README.py"));
        assert_eq!(output_rel_path("x.py").unwrap(), PathBuf::from("x.py.py"));
        assert_eq!(output_rel_path(".pyj").unwrap(), PathBuf::from(".pyj.py"));
        assert_eq!(output_rel_path("./a//b.pyj").unwrap(), PathBuf::from("a/b.py"));
    }

    #[test]
    fn rejects_escaping_paths() {
        for bad in ["../x.pyj", "a/../../x.pyj", "/etc/passwd", "a\\b.pyj", "C:/x.pyj", "", "./."] {
            assert!(
                matches!(output_rel_path(bad), Err(UnccpError::UnsafePath(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn later_claimant_collides() {
        let names = vec![
            (0, "pkg/a.pyj".to_string()),
            (1, "pkg/a.pyc".to_string()),
            (2, "pkg/b.pyj".to_string()),
            (3, "../evil.pyj".to_string()),
        ];
        let plan = OutputPlan::build(&names);
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.output_for(0, "pkg/a.pyj").unwrap(), PathBuf::from("pkg/a.py"));
        match plan.output_for(1, "pkg/a.pyc") {
            Err(UnccpError::OutputCollision { other, .. }) => assert_eq!(other, "pkg/a.pyj"),
            other => panic!("expected collision, got {other:?}"),
        }
        assert!(plan.output_for(2, "pkg/b.pyj").is_ok());
        assert!(matches!(plan.output_for(3, "../evil.pyj"), Err(UnccpError::UnsafePath(_))));
    }

    #[test]
    fn file_and_directory_on_same_path_collide() {
        let names = vec![(0, "a.py/b.pyj".to_string()), (1, "a".to_string())];
        let plan = OutputPlan::build(&names);
        assert_eq!(plan.output_for(0, "a.py/b.pyj").unwrap(), PathBuf::from("a.py/b.py"));
        match plan.output_for(1, "a") {
            Err(UnccpError::OutputCollision { other, .. }) => assert_eq!(other, "a.py/b.pyj"),
            other => panic!("expected collision, got {other:?}"),
        }

        // file first, then an entry that needs it as a directory
        let names = vec![(0, "a".to_string()), (1, "a.py/b.pyj".to_string())];
        let plan = OutputPlan::build(&names);
        assert!(plan.output_for(0, "a").is_ok());
        match plan.output_for(1, "a.py/b.pyj") {
            Err(UnccpError::OutputCollision { other, .. }) => assert_eq!(other, "a"),
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn paths_differing_only_in_case_collide() {
        let names = vec![
            (0, "Pkg/A.pyj".to_string()),
            (1, "pkg/a.pyj".to_string()),
            (2, "PKG/other.pyj".to_string()),
        ];
        let plan = OutputPlan::build(&names);
        assert_eq!(plan.output_for(0, "Pkg/A.pyj").unwrap(), PathBuf::from("Pkg/A.py"));
        match plan.output_for(1, "pkg/a.pyj") {
            Err(UnccpError::OutputCollision { other, .. }) => assert_eq!(other, "Pkg/A.pyj"),
            other => panic!("expected collision, got {other:?}"),
        }
        // sharing a directory under different case is not a conflict
        assert!(plan.output_for(2, "PKG/other.pyj").is_ok());
    }

    #[test]
    fn ready_paths_are_injective() {
        let names: Vec<(usize, String)> = ["a.pyj", "a", "a.pyo", "b/a.pyj", "b/./a.pyj", "c.pyj"]
            .iter()
            .enumerate()
            .map(|(i, n)| (i, n.to_string()))
            .collect();
        let plan = OutputPlan::build(&names);
        let ready: Vec<PathBuf> = names
            .iter()
            .filter_map(|(i, n)| plan.output_for(*i, n).ok())
            .collect();
        let unique: HashSet<_> = ready.iter().collect();
        assert_eq!(ready.len(), unique.len());
        assert_eq!(ready.len(), 3);
    }
}
