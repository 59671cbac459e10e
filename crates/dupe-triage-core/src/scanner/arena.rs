use crate::storage::models::DirRecord;
use std::collections::HashMap;

/// Directory records for one walk, indexed by path and referenced by id.
///
/// Built once per pass from the walk output; nothing rebuilds parent chains
/// per file.
#[derive(Debug, Default)]
pub struct DirArena {
    index: HashMap<String, usize>,
    records: Vec<DirRecord>,
}

impl DirArena {
    /// Build from directory paths. Input order does not matter; ids are
    /// assigned in sorted-path order and duplicates collapse.
    pub fn from_paths<I>(paths: I) -> DirArena
    where
        I: IntoIterator<Item = String>,
    {
        let mut sorted: Vec<String> = paths.into_iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut arena = DirArena::default();
        for abs_path in sorted {
            let id = arena.records.len();
            arena.index.insert(abs_path.clone(), id);
            arena.records.push(DirRecord::from_abs_path(&abs_path));
        }
        arena
    }

    pub fn id_of(&self, abs_path: &str) -> Option<usize> {
        self.index.get(abs_path).copied()
    }

    pub fn get(&self, id: usize) -> Option<&DirRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> &[DirRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_dedups_and_orders() {
        let arena = DirArena::from_paths(vec![
            "/r/b".to_string(),
            "/r/a".to_string(),
            "/r/b".to_string(),
        ]);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.id_of("/r/a"), Some(0));
        assert_eq!(arena.id_of("/r/b"), Some(1));
        assert_eq!(arena.id_of("/r/c"), None);

        let record = arena.get(0).unwrap();
        assert_eq!(record.leaf_name, "a");
        assert_eq!(record.parent_dir, "/r");
    }
}
