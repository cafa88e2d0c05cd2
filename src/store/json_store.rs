use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};

use crate::config::Config;
use crate::store::schema::{EXPORT_VERSION, ExportData, QueueData, SessionData, SolveData};

const SOLVES_FILE: &str = "all_data.json";
const SESSION_FILE: &str = "current_puzzle.json";
const QUEUES_FILE: &str = "scramble_queues.json";

/// One JSON file per logical store key. Cheap to clone; every component
/// that persists (queue supply, solve history, the app itself) gets its
/// own handle at construction.
#[derive(Clone)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cubedr");
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn exists(&self, name: &str) -> bool {
        self.file_path(name).exists()
    }

    /// Missing or unparseable files yield the default: a corrupt store is
    /// treated as absent, never as fatal.
    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
                Err(_) => T::default(),
            }
        } else {
            T::default()
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// True until the first bootstrap persists a queue map. The splash
    /// path keys off this.
    pub fn has_queue_data(&self) -> bool {
        self.exists(QUEUES_FILE)
    }

    pub fn load_solves(&self) -> SolveData {
        self.load(SOLVES_FILE)
    }

    pub fn save_solves(&self, data: &SolveData) -> Result<()> {
        self.save(SOLVES_FILE, data)
    }

    pub fn load_session(&self) -> SessionData {
        self.load(SESSION_FILE)
    }

    pub fn save_session(&self, data: &SessionData) -> Result<()> {
        self.save(SESSION_FILE, data)
    }

    pub fn load_queues(&self) -> QueueData {
        self.load(QUEUES_FILE)
    }

    pub fn save_queues(&self, data: &QueueData) -> Result<()> {
        self.save(QUEUES_FILE, data)
    }

    /// Bundle all persisted data + config into an ExportData struct.
    pub fn export_all(&self, config: &Config) -> ExportData {
        ExportData {
            cubedr_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            config: config.clone(),
            solves: self.load_solves(),
            session: self.load_session(),
            queues: self.load_queues(),
        }
    }

    /// Transactional import: two-phase commit with best-effort .bak rollback.
    ///
    /// Stage phase: write all data to .tmp files; on any failure clean up
    /// and bail. Commit phase: rename original to .bak, then .tmp to final,
    /// restoring .bak files if a rename fails. After success the .bak files
    /// are deleted.
    pub fn import_all(&self, data: &ExportData) -> Result<()> {
        if data.cubedr_export_version != EXPORT_VERSION {
            bail!(
                "Unsupported export version: {} (expected {})",
                data.cubedr_export_version,
                EXPORT_VERSION
            );
        }

        let files: Vec<(&str, String)> = vec![
            (SOLVES_FILE, serde_json::to_string_pretty(&data.solves)?),
            (SESSION_FILE, serde_json::to_string_pretty(&data.session)?),
            (QUEUES_FILE, serde_json::to_string_pretty(&data.queues)?),
        ];

        let mut staged: Vec<PathBuf> = Vec::new();
        for (name, json) in &files {
            let tmp_path = self.file_path(name).with_extension("json.tmp");
            match (|| -> Result<()> {
                let mut file = fs::File::create(&tmp_path)?;
                file.write_all(json.as_bytes())?;
                file.sync_all()?;
                Ok(())
            })() {
                Ok(()) => staged.push(tmp_path),
                Err(e) => {
                    for tmp in &staged {
                        let _ = fs::remove_file(tmp);
                    }
                    bail!("Import failed during staging: {e}");
                }
            }
        }

        // Track (final_path, bak_path, had_original) so rollback can also
        // restore absence.
        let mut committed: Vec<(PathBuf, PathBuf, bool)> = Vec::new();
        for (i, (name, _)) in files.iter().enumerate() {
            let final_path = self.file_path(name);
            let bak_path = self.file_path(name).with_extension("json.bak");
            let tmp_path = &staged[i];
            let had_original = final_path.exists();

            if had_original && let Err(e) = fs::rename(&final_path, &bak_path) {
                Self::rollback(&committed);
                for tmp in &staged {
                    let _ = fs::remove_file(tmp);
                }
                bail!("Import failed during commit (backup): {e}");
            }

            if let Err(e) = fs::rename(tmp_path, &final_path) {
                if had_original && bak_path.exists() {
                    let _ = fs::rename(&bak_path, &final_path);
                } else {
                    let _ = fs::remove_file(&final_path);
                }
                Self::rollback(&committed);
                for tmp in &staged[i + 1..] {
                    let _ = fs::remove_file(tmp);
                }
                bail!("Import failed during commit (rename): {e}");
            }

            committed.push((final_path, bak_path, had_original));
        }

        for (_, bak_path, had_original) in &committed {
            if *had_original {
                let _ = fs::remove_file(bak_path);
            }
        }

        Ok(())
    }

    fn rollback(committed: &[(PathBuf, PathBuf, bool)]) {
        for (final_path, bak_path, had_original) in committed {
            if *had_original {
                let _ = fs::rename(bak_path, final_path);
            } else {
                let _ = fs::remove_file(final_path);
            }
        }
    }

    /// Check for leftover .bak files from an interrupted import.
    /// Returns true if recovery files were found (and cleaned up).
    pub fn check_interrupted_import(&self) -> bool {
        let mut found = false;
        for name in [SOLVES_FILE, SESSION_FILE, QUEUES_FILE] {
            let bak_path = self.file_path(name).with_extension("json.bak");
            if bak_path.exists() {
                found = true;
                let _ = fs::remove_file(&bak_path);
            }
        }
        found
    }
}
