// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::inventory::{DealRecord, PieceEntry};
use super::{Error, Worker};
use crate::api::NodeApi;
use crate::blocks::{Tipset, TipsetKey};
use crate::market::DealInfo;
use crate::message::ApiMessage;
use crate::miner::ProveCommitSectorParams;
use crate::shim::{address::Address, deal::DealID, message::miner_methods};

impl<A: NodeApi> Worker<A> {
    /// Indexes every epoch in `[check_height, head)`, folding the deals of
    /// sectors proved by other miners into the piece inventory.
    ///
    /// On error the cursor stays at the first epoch that was not fully
    /// processed, so the next call resumes there.
    pub(super) async fn check_chain_data(&mut self, stop: &CancellationToken) -> Result<(), Error> {
        let head = self.api.chain_head().await.map_err(Error::ChainQuery)?;
        let local_deals = self
            .api
            .client_list_deals()
            .await
            .map_err(Error::ChainQuery)?;

        while self.check_height < head.epoch() {
            if stop.is_cancelled() {
                break;
            }
            let tipset = self
                .api
                .chain_get_tipset_by_height(self.check_height)
                .await
                .map_err(Error::ChainQuery)?;
            if tipset.epoch() != self.check_height {
                // null round
                self.check_height += 1;
                continue;
            }
            self.index_tipset(&tipset, &local_deals).await?;
            self.check_height = tipset.epoch() + 1;
        }
        Ok(())
    }

    async fn index_tipset(&mut self, tipset: &Tipset, local_deals: &[DealInfo]) -> Result<(), Error> {
        let Some(block) = tipset.first_block() else {
            return Ok(());
        };
        let messages = self
            .api
            .chain_get_parent_messages(block)
            .await
            .map_err(Error::ChainQuery)?;
        let ptsk = tipset.parents();
        for msg in messages
            .iter()
            .filter(|m| m.message.method_num() == miner_methods::PROVE_COMMIT_SECTOR)
        {
            self.index_prove_commit(msg, ptsk, local_deals).await?;
        }
        Ok(())
    }

    async fn index_prove_commit(
        &mut self,
        msg: &ApiMessage,
        ptsk: &TipsetKey,
        local_deals: &[DealInfo],
    ) -> Result<(), Error> {
        let epoch = self.check_height;
        let params: ProveCommitSectorParams = match msg.message.params().deserialize() {
            Ok(params) => params,
            Err(e) => {
                warn!(
                    "failed to decode prove-commit {} in parent tipset {ptsk} of height {epoch}: {e}",
                    msg.cid
                );
                return Ok(());
            }
        };
        let miner = msg.message.to();
        let Some(deal_ids) = self.sector_deal_ids(&miner, &params, ptsk).await? else {
            warn!(
                "no pre-commit or sector info for sector {} of miner {miner} in parent tipset {ptsk} of height {epoch}",
                params.sector_number
            );
            return Ok(());
        };

        for deal_id in deal_ids {
            let deal = self
                .api
                .state_market_storage_deal(deal_id, ptsk)
                .await
                .map_err(Error::ChainQuery)?;
            if self.is_miner_dealed(&deal.proposal.provider, &deal.proposal.piece_cid, local_deals) {
                debug!(
                    "ignore miner dealed piece {}, deal id {deal_id}, parent tipset {ptsk} of height {epoch}",
                    deal.proposal.piece_cid
                );
                continue;
            }
            let piece_cid = deal.proposal.piece_cid;
            let record = DealRecord::new(deal_id, deal);
            match self.pieces.get_mut(&piece_cid) {
                Some(entry) => {
                    if !entry.add(record) {
                        debug!("miner {miner} stored duplicate deal {deal_id} at height {epoch}");
                    }
                }
                None => {
                    self.pieces.insert(piece_cid, PieceEntry::new(record));
                }
            }
        }
        Ok(())
    }

    /// Deal IDs of a proved sector. The pre-commit is consulted first; once it
    /// has been cleaned up the sector info carries the same IDs.
    async fn sector_deal_ids(
        &self,
        miner: &Address,
        params: &ProveCommitSectorParams,
        ptsk: &TipsetKey,
    ) -> Result<Option<Vec<DealID>>, Error> {
        let sector = params.sector_number;
        if let Some(pci) = self
            .api
            .state_sector_precommit_info(miner, sector, ptsk)
            .await
            .map_err(Error::ChainQuery)?
        {
            return Ok(Some(pci.info.deal_ids));
        }
        let sci = self
            .api
            .state_sector_get_info(miner, sector, ptsk)
            .await
            .map_err(Error::ChainQuery)?;
        Ok(sci.map(|sci| sci.deal_ids))
    }

    /// A piece needs no replication if the deal is with the local miner, or
    /// if the local node already has a client deal for it that may still
    /// succeed.
    fn is_miner_dealed(&self, provider: &Address, piece_cid: &Cid, local_deals: &[DealInfo]) -> bool {
        if *provider == self.miner {
            return true;
        }
        local_deals
            .iter()
            .any(|d| d.piece_cid == *piece_cid && !d.state.is_terminal_failure())
    }
}
