//! Installation credentials plus key bag over one backend.

use sealink_core::Environment;
use tracing::{debug, info, warn};

use crate::{Credentials, DurableStore, KeyBag, StoreConfig, StoreError, buffer_json};

/// Loaded authentication state for one installation.
///
/// Holds the in-memory [`Credentials`] and a [`KeyBag`] over the same
/// backend. Credential changes are only persisted by
/// [`CredentialStore::save_credentials`].
pub struct CredentialStore<S> {
    store: S,
    config: StoreConfig,
    credentials: Credentials,
    keys: KeyBag<S>,
    fresh: bool,
}

impl<S: DurableStore> CredentialStore<S> {
    /// Load the installation's credentials, creating fresh ones if none are
    /// stored.
    ///
    /// A missing, unreadable or unparseable credentials blob yields new
    /// credentials from `env`. Nothing is written; call
    /// [`CredentialStore::save_credentials`] to persist them.
    pub async fn load<E: Environment>(store: S, config: StoreConfig, env: &E) -> Self {
        let key = config.creds_key();

        let stored = match store.get(&key).await {
            Ok(Some(bytes)) => match buffer_json::from_slice::<Credentials>(&bytes) {
                Ok(credentials) => Some(credentials),
                Err(e) => {
                    warn!(%key, error = %e, "credentials unparseable, initializing fresh");
                    None
                },
            },
            Ok(None) => None,
            Err(e) => {
                warn!(%key, error = %e, "credentials read failed, initializing fresh");
                None
            },
        };

        let (credentials, fresh) = match stored {
            Some(credentials) => {
                debug!(installation = config.installation_name(), "credentials loaded");
                (credentials, false)
            },
            None => {
                info!(installation = config.installation_name(), "initializing new credentials");
                (Credentials::initialize(env), true)
            },
        };

        let keys = KeyBag::new(store.clone(), config.clone());
        Self { store, config, credentials, keys, fresh }
    }

    /// Current credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Mutable credentials. Changes stay in memory until saved.
    pub fn credentials_mut(&mut self) -> &mut Credentials {
        &mut self.credentials
    }

    /// Persist the current credentials under `{installation}_creds`.
    pub async fn save_credentials(&self) -> Result<(), StoreError> {
        let blob = buffer_json::to_vec(&self.credentials)?;
        self.store.set(&self.config.creds_key(), &blob).await?;

        debug!(installation = self.config.installation_name(), "credentials saved");
        Ok(())
    }

    /// The installation's key bag.
    pub fn keys(&self) -> &KeyBag<S> {
        &self.keys
    }

    /// Store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether the credentials were created by this load rather than read.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }
}
