use std::{
    fs,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::{Context, Error};
use registry::StudentDirectory;
use tracing::info;

use super::{config::Config, store::Store};

pub struct State {
    pub config: Config,
    pub directory: StudentDirectory,
    pub students_csv: String,
    store: Mutex<Store>,
}

impl State {
    pub fn new(config: Config) -> Result<Arc<Self>, Error> {
        let students_csv = fs::read_to_string(&config.students_path).with_context(|| {
            format!(
                "Failed to read student records from {}",
                config.students_path.display()
            )
        })?;

        Ok(Self::with_directory(config, students_csv))
    }

    pub fn with_directory(config: Config, students_csv: String) -> Arc<Self> {
        let directory = StudentDirectory::from_csv(&students_csv);
        info!("Loaded {} student records", directory.len());

        Arc::new(Self {
            config,
            directory,
            students_csv,
            store: Mutex::new(Store::default()),
        })
    }

    /// Handlers never hold this across an await.
    pub fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
