// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use super::fvm_shared_latest::MethodNum;

/// Method numbers of the built-in storage miner actor that the replicator
/// needs to recognise.
pub mod miner_methods {
    use super::MethodNum;

    pub const PROVE_COMMIT_SECTOR: MethodNum = 7;
}
