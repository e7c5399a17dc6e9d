// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use tracing::{debug, error, info};

use super::{Error, Worker, metrics};
use crate::api::NodeApi;
use crate::market::{DataRef, StartDealParams, StorageDealStatus, TransferType};

impl<A: NodeApi> Worker<A> {
    /// Publishes a storage deal against the local miner for every inventory
    /// piece that has arrived locally, and retires pieces whose deal became
    /// active.
    pub(super) async fn deal_chain_data(&mut self) -> Result<(), Error> {
        for key in self.deals.keys() {
            if !self.pieces.contains(&key) {
                // the piece left the inventory, stop following its deal
                self.deals.remove(&key);
                continue;
            }
            let Some(proposal) = self.deals.get(&key).copied() else {
                continue;
            };
            let deal = self
                .api
                .client_get_deal_info(&proposal)
                .await
                .map_err(Error::Transport)?;
            if deal.state == StorageDealStatus::Active {
                info!("piece {key} replicated by deal {proposal}");
                self.pieces.remove(&key);
                self.deals.remove(&key);
            } else if deal.state.is_terminal_failure() {
                info!(
                    "deal {proposal} for piece {key} ended in state {}: {}",
                    deal.state, deal.message
                );
                self.deals.remove(&key);
            }
        }
        if self.deals.len() > self.config.deal_parallel_num {
            info!("wait for deal: {}", self.deals.len());
            return Ok(());
        }
        if self.pieces.is_empty() {
            return Ok(());
        }

        let mut miner_checked = false;
        for key in self.pieces.keys() {
            let Some(data_ref) = self
                .pieces
                .get(&key)
                .and_then(|entry| entry.data_ref())
                .cloned()
            else {
                continue;
            };

            // not here yet, go to the next one
            if !self
                .api
                .client_has_local(&data_ref.root_cid)
                .await
                .map_err(Error::Transport)?
            {
                continue;
            }
            if self.deals.contains(&key) {
                continue;
            }

            let offer = self
                .api
                .client_miner_query_offer(&self.miner, &data_ref.root_cid)
                .await
                .map_err(Error::Transport)?;
            if offer.is_available() {
                debug!(
                    "miner {} already serves {}, dropping piece {key}",
                    self.miner, data_ref.root_cid
                );
                self.pieces.remove(&key);
                continue;
            }

            if !miner_checked {
                let info = self
                    .api
                    .state_miner_info(&self.miner)
                    .await
                    .map_err(Error::Transport)?;
                if !info.is_initialized() {
                    return Err(Error::MinerNotInitialized);
                }
                miner_checked = true;
            }

            let params = StartDealParams {
                data: DataRef {
                    transfer_type: TransferType::GraphSync,
                    root: data_ref.root_cid,
                    piece_cid: None,
                    piece_size: 0,
                    expert: data_ref.expert,
                },
                wallet: None,
                miner: self.miner,
                fast_retrieval: true,
                verified_deal: false,
            };
            let proposal = match self.api.client_start_deal(&params).await {
                Ok(proposal) => proposal,
                Err(e) => {
                    error!("failed to start deal for piece {key}: {e:#}");
                    continue;
                }
            };
            info!("start deal with miner: {} piece: {key} deal: {proposal}", self.miner);
            metrics::DEALS_STARTED_TOTAL.inc();
            self.deals.insert(key, proposal);

            if self.deals.len() > self.config.deal_parallel_num {
                info!("wait for deal: {}", self.deals.len());
                break;
            }
        }
        Ok(())
    }
}
