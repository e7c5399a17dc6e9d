// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use rand::Rng as _;
use tracing::{info, warn};

use super::{Error, Worker, metrics};
use crate::api::NodeApi;
use crate::market::QueryResponseStatus;
use crate::utils::rand::forest_rng;

impl<A: NodeApi> Worker<A> {
    /// Drives retrieval of inventory pieces that are not stored locally yet.
    ///
    /// A failed retrieval query only bumps the record's try count. Any other
    /// node failure aborts the tick.
    pub(super) async fn retrieve_chain_data(&mut self) -> Result<(), Error> {
        for key in self.retrievals.keys() {
            let Some(root) = self
                .pieces
                .get(&key)
                .and_then(|entry| entry.data_ref())
                .map(|data_ref| data_ref.root_cid)
            else {
                // the piece left the inventory, nothing to wait for
                self.retrievals.remove(&key);
                continue;
            };
            if self
                .api
                .client_has_local(&root)
                .await
                .map_err(Error::Transport)?
            {
                self.retrievals.remove(&key);
            }
        }
        if self.retrievals.len() > self.config.retrieve_parallel_num {
            info!("wait for retrieval: {}", self.retrievals.len());
            return Ok(());
        }

        for key in self.pieces.keys() {
            let Some((index, root, provider, tries)) = self.pieces.get(&key).and_then(|entry| {
                let candidates = entry.retrievable();
                if candidates.is_empty() {
                    return None;
                }
                let index = candidates[forest_rng().gen_range(0..candidates.len())];
                let record = &entry.records()[index];
                Some((index, *record.root(), *record.provider(), record.try_count))
            }) else {
                continue;
            };

            if self
                .api
                .client_has_local(&root)
                .await
                .map_err(Error::Transport)?
            {
                self.retrievals.remove(&key);
                continue;
            }
            if self.retrievals.contains(&key) {
                continue;
            }

            match self.api.client_query(&root, &provider).await {
                Ok(resp) => {
                    info!(
                        "client retrieve miner: {provider}, data: {root}, try: {tries}, status: {}",
                        resp.status
                    );
                    if resp.status == QueryResponseStatus::Success {
                        self.retrievals.remove(&key);
                    } else {
                        self.retrievals.insert(key, resp);
                    }
                }
                Err(e) => {
                    metrics::RETRIEVAL_QUERY_FAILURE_TOTAL.inc();
                    let Some(record) = self
                        .pieces
                        .get_mut(&key)
                        .and_then(|entry| entry.records_mut().get_mut(index))
                    else {
                        continue;
                    };
                    record.try_count += 1;
                    let tries = record.try_count;
                    warn!("failed to retrieve miner: {provider}, data: {root}, try: {tries}, err: {e:#}");
                    if tries > self.config.retrieve_try_count_max {
                        warn!(
                            "provider {provider} exceeded {} retrieval attempts for {root}",
                            self.config.retrieve_try_count_max
                        );
                    }
                    continue;
                }
            }

            if self.retrievals.len() > self.config.retrieve_parallel_num {
                info!("wait for retrieval: {}", self.retrievals.len());
                break;
            }
        }
        Ok(())
    }
}
