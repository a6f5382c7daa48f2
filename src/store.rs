use crate::dataset::{
    builtin_sentence_sets, builtin_task_sets, Preferences, SentenceSet, TaskSet,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// JSON-file store for datasets, task sets, and preferences.
///
/// Load order per collection: stored file if it parses, else the built-in
/// data bundled into the binary. Saving always writes pretty JSON so the
/// operator can edit the files by hand.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn sentence_sets_path(&self) -> PathBuf {
        self.dir.join("sentence_sets.json")
    }

    fn task_sets_path(&self) -> PathBuf {
        self.dir.join("task_sets.json")
    }

    fn preferences_path(&self) -> PathBuf {
        self.dir.join("preferences.json")
    }

    pub fn load_sentence_sets(&self) -> Vec<SentenceSet> {
        match read_json::<Vec<SentenceSet>>(&self.sentence_sets_path()) {
            Some(sets) if !sets.is_empty() => sets,
            _ => builtin_sentence_sets(),
        }
    }

    pub fn load_task_sets(&self) -> Vec<TaskSet> {
        match read_json::<Vec<TaskSet>>(&self.task_sets_path()) {
            Some(sets) if !sets.is_empty() => sets,
            _ => builtin_task_sets(),
        }
    }

    pub fn load_preferences(&self) -> Preferences {
        read_json(&self.preferences_path()).unwrap_or_default()
    }

    pub fn save_sentence_sets(&self, sets: &[SentenceSet]) -> io::Result<()> {
        write_json(&self.sentence_sets_path(), sets)
    }

    pub fn save_task_sets(&self, sets: &[TaskSet]) -> io::Result<()> {
        write_json(&self.task_sets_path(), sets)
    }

    pub fn save_preferences(&self, prefs: &Preferences) -> io::Result<()> {
        write_json(&self.preferences_path(), prefs)
    }

    /// Replace the stored sentence sets with the contents of an external
    /// JSON file. Rejects files that are not a non-empty array of sets.
    pub fn import_sentence_sets(&self, path: &Path) -> io::Result<Vec<SentenceSet>> {
        let sets: Vec<SentenceSet> = read_json_strict(path)?;
        if sets.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "import file contains no sentence sets",
            ));
        }
        self.save_sentence_sets(&sets)?;
        Ok(sets)
    }

    pub fn import_task_sets(&self, path: &Path) -> io::Result<Vec<TaskSet>> {
        let sets: Vec<TaskSet> = read_json_strict(path)?;
        if sets.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "import file contains no task sets",
            ));
        }
        self.save_task_sets(&sets)?;
        Ok(sets)
    }

    pub fn export_sentence_sets(&self, path: &Path) -> io::Result<()> {
        write_json(path, &self.load_sentence_sets())
    }

    pub fn export_task_sets(&self, path: &Path) -> io::Result<()> {
        write_json(path, &self.load_task_sets())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn read_json_strict<T: serde::de::DeserializeOwned>(path: &Path) -> io::Result<T> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(value)?;
    fs::write(path, data)
}
