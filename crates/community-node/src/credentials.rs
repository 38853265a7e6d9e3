//! Store bootstrap.
//!
//! Resolves the configured backend into a shared [`DocumentStore`] handle.
//! Missing or unreadable credentials abort startup before the listener binds.

use anyhow::{bail, Context};
use community_store::firestore::{FirestoreStore, ServiceAccountKey};
use community_store::{DocumentStore, MemoryStore};
use std::sync::Arc;

use crate::config::{NodeConfig, StoreBackend};

/// Loads the service-account key from `FIREBASE_KEY` (base64) or, failing
/// that, from the credentials file.
pub fn load_service_account(config: &NodeConfig) -> anyhow::Result<ServiceAccountKey> {
    if let Some(encoded) = &config.firebase_key {
        return ServiceAccountKey::from_base64(encoded)
            .context("FIREBASE_KEY is not a base64-encoded service-account key");
    }

    if let Some(path) = &config.credentials_file {
        return ServiceAccountKey::from_file(path)
            .with_context(|| format!("failed to load credentials from {}", path.display()));
    }

    bail!("no Firestore credentials: set FIREBASE_KEY or FIREBASE_KEY_PATH")
}

/// Builds the document store selected by the configuration.
pub fn connect_store(config: &NodeConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Firestore => Ok(Arc::new(connect_firestore(config)?)),
    }
}

fn connect_firestore(config: &NodeConfig) -> anyhow::Result<FirestoreStore> {
    if let Some(host) = &config.emulator_host {
        let project_id = match (&config.project_id, load_service_account(config)) {
            (Some(project_id), _) => project_id.clone(),
            (None, Ok(key)) => key.project_id,
            (None, Err(_)) => bail!("the emulator needs FIRESTORE_PROJECT_ID or a credential"),
        };

        let store = FirestoreStore::emulator(host, project_id).context("invalid emulator host")?;
        tracing::info!(host = %host, project_id = %store.project_id(), "Connected to Firestore emulator");
        return Ok(store);
    }

    let mut key = load_service_account(config)?;
    if let Some(project_id) = &config.project_id {
        key.project_id = project_id.clone();
    }

    let client_email = key.client_email.clone();
    let store = FirestoreStore::new(key).context("failed to initialise Firestore client")?;
    tracing::info!(
        project_id = %store.project_id(),
        client_email = %client_email,
        "Connected to Firestore"
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> NodeConfig {
        let mut argv = vec!["community-node"];
        argv.extend_from_slice(args);
        let mut config = NodeConfig::try_parse_from(argv).unwrap();
        if !args.contains(&"--firebase-key") {
            config.firebase_key = None;
        }
        if !args.contains(&"--credentials-file") {
            config.credentials_file = None;
        }
        if !args.contains(&"--emulator-host") {
            config.emulator_host = None;
        }
        if !args.contains(&"--project-id") {
            config.project_id = None;
        }
        config
    }

    #[test]
    fn test_missing_credentials_fail_fast() {
        let err = load_service_account(&config(&[])).unwrap_err();
        assert!(err.to_string().contains("FIREBASE_KEY"));
        assert!(connect_store(&config(&["--store", "firestore"])).is_err());
    }

    #[test]
    fn test_garbage_key_is_rejected() {
        assert!(load_service_account(&config(&["--firebase-key", "%%%"])).is_err());
    }

    #[test]
    fn test_memory_backend_needs_no_credentials() {
        assert!(connect_store(&config(&["--store", "memory"])).is_ok());
    }

    #[test]
    fn test_emulator_with_project_override() {
        let config = config(&[
            "--store",
            "firestore",
            "--emulator-host",
            "localhost:8080",
            "--project-id",
            "demo",
        ]);
        assert!(connect_store(&config).is_ok());
        assert_eq!(connect_firestore(&config).unwrap().project_id(), "demo");
    }
}
