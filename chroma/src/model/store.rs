use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Error;

use super::{Channel, FittedPair, ModelSink, PersistError};

/// Writes fitted models as JSON files under one directory.
///
/// Single-setting artifacts are `u_{base}` / `v_{base}`; grid artifacts are
/// `u_svr{i}.model` / `v_svr{i}.model`.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
    resume: bool,
}

impl ModelStore {
    /// Open `dir`, creating it if needed. Failure here is fatal for the run.
    pub fn create(dir: &Path) -> Result<Self, PersistError> {
        std::fs::create_dir_all(dir).map_err(|source| PersistError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            resume: false,
        })
    }

    /// Skip grid settings whose two artifacts already exist.
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn single_path(&self, channel: Channel, base: &str) -> PathBuf {
        self.dir.join(format!("{}_{}", channel.prefix(), base))
    }

    pub fn grid_path(&self, channel: Channel, index: usize) -> PathBuf {
        self.dir.join(format!("{}_svr{}.model", channel.prefix(), index))
    }

    pub fn save_single<M: Serialize>(&self, base: &str, pair: &FittedPair<M>) -> Result<(), PersistError> {
        save(&self.single_path(Channel::U, base), &pair.u)?;
        save(&self.single_path(Channel::V, base), &pair.v)
    }

    pub fn save_grid<M: Serialize>(&self, index: usize, pair: &FittedPair<M>) -> Result<(), PersistError> {
        save(&self.grid_path(Channel::U, index), &pair.u)?;
        save(&self.grid_path(Channel::V, index), &pair.v)
    }
}

impl<M: Serialize> ModelSink<M> for ModelStore {
    fn should_skip(&self, index: usize) -> bool {
        self.resume
            && self.grid_path(Channel::U, index).is_file()
            && self.grid_path(Channel::V, index).is_file()
    }

    fn accept(&mut self, index: usize, pair: FittedPair<M>) -> Result<(), Error> {
        self.save_grid(index, &pair)?;
        tracing::info!(
            index,
            c = pair.params.c,
            epsilon = pair.params.epsilon,
            dir = %self.dir.display(),
            "Saved model pair"
        );
        Ok(())
    }
}

fn save<M: Serialize>(path: &Path, model: &M) -> Result<(), PersistError> {
    let bytes = serde_json::to_vec(model).map_err(|source| PersistError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    common::write_atomic(path, |w| w.write_all(&bytes)).map_err(|source| PersistError::Write {
        path: path.to_path_buf(),
        source,
    })
}
