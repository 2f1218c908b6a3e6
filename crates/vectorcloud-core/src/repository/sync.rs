use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use crate::kernel::constants;
use crate::repository::error::RepositoryError;
use crate::repository::git::GitBackend;
use crate::storage::error::StorageSystemError;
use crate::storage::provider::StorageProvider;
use crate::storage::records::{NewRepository, RecordStore, Repository, RepositoryId};
use crate::utils::fs::check_single_component;

/// Name of the checkout directory for `url`.
///
/// The last path segment with a trailing `.git` removed; scp-style
/// `host:path` URLs are split on the colon as well.
pub fn derive_repository_name(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let segment = trimmed.rsplit(['/', ':']).next()?;
    let name = segment.strip_suffix(constants::REPOSITORY_URL_SUFFIX).unwrap_or(segment);
    check_single_component(name).ok()?;
    Some(name.to_string())
}

/// Result of pulling one repository during an update
#[derive(Debug)]
pub struct SyncOutcome {
    pub repository: Repository,
    pub result: Result<(), RepositoryError>,
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Clones, pulls and removes tracked repositories.
#[derive(Debug, Clone)]
pub struct RepositorySync {
    records: Arc<dyn RecordStore>,
    checkouts: Arc<dyn StorageProvider>,
    git: Arc<dyn GitBackend>,
}

impl RepositorySync {
    pub fn new(records: Arc<dyn RecordStore>, checkouts: Arc<dyn StorageProvider>, git: Arc<dyn GitBackend>) -> Self {
        Self { records, checkouts, git }
    }

    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    /// Clone `url` into a fresh checkout and track it
    pub async fn add(&self, url: &str, auto_update: bool) -> Result<Repository, RepositoryError> {
        let name = derive_repository_name(url).ok_or_else(|| RepositoryError::InvalidUrl(url.to_string()))?;
        let relative = Path::new(&name);
        if self.checkouts.exists(relative) {
            return Err(RepositoryError::CheckoutExists {
                url: url.to_string(),
                path: self.checkouts.path_of(relative),
            });
        }
        self.checkouts.create_dir_all(Path::new(""))?;

        let local_path = self.checkouts.path_of(relative);
        log::info!("Cloning {} into {}", url, local_path.display());
        self.git
            .clone_repository(url, &local_path)
            .await
            .map_err(|source| RepositoryError::Clone { url: url.to_string(), source })?;

        let repository = self.records.insert_repository(NewRepository {
            url: url.to_string(),
            name,
            local_path,
            auto_update,
        })?;
        log::info!("Tracking repository '{}' as #{}", repository.name, repository.id);
        Ok(repository)
    }

    /// Delete the checkout and the record.
    ///
    /// A checkout that is already gone is logged and the record still removed.
    /// Any other failure to delete the tree keeps the record.
    pub async fn remove(&self, repository: &Repository) -> Result<(), RepositoryError> {
        match tokio::fs::remove_dir_all(&repository.local_path).await {
            Ok(()) => log::info!("Removed checkout {}", repository.local_path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Checkout of '{}' was already gone: {}", repository.name, repository.local_path.display());
            }
            Err(e) => {
                return Err(StorageSystemError::io(e, "remove_checkout", repository.local_path.clone()).into());
            }
        }
        self.records.delete_repository(repository.id)?;
        Ok(())
    }

    /// Pull one repository
    pub async fn update_one(&self, repository: &Repository) -> Result<(), RepositoryError> {
        if !repository.local_path.is_dir() {
            return Err(RepositoryError::NotFound(format!(
                "checkout of '{}' at {}",
                repository.name,
                repository.local_path.display()
            )));
        }
        log::info!("Pulling repository '{}'", repository.name);
        self.git
            .pull(&repository.local_path)
            .await
            .map_err(|source| RepositoryError::Sync { repository: repository.name.clone(), source })
    }

    /// Pull `repository`, or every tracked repository when `None`.
    ///
    /// One outcome per repository, in record order. A failed pull never stops
    /// the others; only failing to read the records is an error.
    pub async fn update(&self, repository: Option<&Repository>) -> Result<Vec<SyncOutcome>, RepositoryError> {
        let targets = match repository {
            Some(repository) => vec![repository.clone()],
            None => self.records.repositories()?,
        };
        let mut outcomes = Vec::with_capacity(targets.len());
        for repository in targets {
            let result = self.update_one(&repository).await;
            if let Err(e) = &result {
                log::error!("{}", e);
            }
            outcomes.push(SyncOutcome { repository, result });
        }
        Ok(outcomes)
    }

    /// Look a repository up by id
    pub fn find(&self, id: RepositoryId) -> Result<Repository, RepositoryError> {
        self.records.repository(id)?.ok_or_else(|| RepositoryError::NotFound(format!("#{}", id)))
    }

    /// Look a repository up by id or by name
    pub fn find_by_key(&self, key: &str) -> Result<Repository, RepositoryError> {
        if let Ok(id) = key.parse::<RepositoryId>() {
            return self.find(id);
        }
        self.records
            .repositories()?
            .into_iter()
            .find(|r| r.name == key)
            .ok_or_else(|| RepositoryError::NotFound(key.to_string()))
    }

    pub fn set_auto_update(&self, repository: &Repository, auto_update: bool) -> Result<Repository, RepositoryError> {
        Ok(self.records.set_auto_update(repository.id, auto_update)?)
    }
}
