//! Application state: store backend, identity provider, and the services built on them.
//!
//! This module owns:
//!   - the content store (memory or REST, chosen by `[store] backend`)
//!   - the identity provider matching that backend
//!   - the submission evaluator (with its configured oracle)
//!   - the progress aggregator and the catalog
//!
//! If the REST backend is selected without a URL we fall back to the memory
//! backend so the service still starts.

use std::{collections::HashMap, sync::Arc};
use tracing::{error, info, instrument, warn};

use crate::auth::{IdentityProvider, MemoryIdentity, RestIdentity};
use crate::catalog::Catalog;
use crate::config::{AppConfig, StoreBackend};
use crate::evaluation::{oracle_by_name, Oracle, SubmissionEvaluator, TrivialOracle};
use crate::progress::ProgressAggregator;
use crate::seeds::{seed_challenges, seed_definitions};
use crate::store::{memory::MemoryStore, rest::RestStore, ContentStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub evaluator: SubmissionEvaluator,
    pub progress: ProgressAggregator,
    pub catalog: Catalog,
}

impl AppState {
    /// Build state from resolved config: pick backends, seed content, choose the oracle.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(cfg: &AppConfig) -> Self {
        let rest = match cfg.store.backend {
            StoreBackend::Rest => {
                let pair = RestStore::from_cfg(&cfg.store).zip(RestIdentity::from_cfg(&cfg.store));
                if pair.is_none() {
                    error!(target: "code_practice", "REST backend selected but store.url is missing; using memory backend");
                }
                pair
            }
            StoreBackend::Memory => None,
        };

        let (store, identity): (Arc<dyn ContentStore>, Arc<dyn IdentityProvider>) = match rest {
            Some((store, idp)) => {
                info!(target: "code_practice", base_url = %store.base_url, "Using REST content store");
                (Arc::new(store), Arc::new(idp))
            }
            None => {
                let mut challenges = cfg.challenges.clone();
                challenges.extend(seed_challenges());
                let mut definitions = cfg.definitions.clone();
                definitions.extend(seed_definitions());
                log_inventory(&challenges);
                (
                    Arc::new(MemoryStore::with_content(challenges, definitions)),
                    Arc::new(MemoryIdentity::new()),
                )
            }
        };

        let oracle = oracle_by_name(&cfg.evaluation.oracle).unwrap_or_else(|| {
            warn!(target: "submission", oracle = %cfg.evaluation.oracle, "Unknown oracle; using trivial");
            Arc::new(TrivialOracle) as Arc<dyn Oracle>
        });

        Self::with_parts(store, identity, oracle)
    }

    /// Assemble services over an already-built store and identity provider.
    pub fn with_parts(
        store: Arc<dyn ContentStore>,
        identity: Arc<dyn IdentityProvider>,
        oracle: Arc<dyn Oracle>,
    ) -> Self {
        let evaluator = SubmissionEvaluator::new(store.clone(), oracle);
        info!(target: "code_practice", backend = store.backend(), oracle = evaluator.oracle_name(), "Content store ready");
        Self {
            evaluator,
            progress: ProgressAggregator::new(store.clone()),
            catalog: Catalog::new(store.clone()),
            store,
            identity,
        }
    }
}

/// Startup summary of the seeded bank by language/difficulty.
fn log_inventory(challenges: &[crate::domain::Challenge]) {
    let mut counts: HashMap<(String, &'static str), usize> = HashMap::new();
    for ch in challenges {
        *counts.entry((ch.language.clone(), ch.difficulty.as_str())).or_insert(0) += 1;
    }
    for ((language, difficulty), n) in counts {
        info!(target: "code_practice", %language, %difficulty, count = n, "Startup challenge inventory");
    }
}
