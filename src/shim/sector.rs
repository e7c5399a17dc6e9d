// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub type SectorNumber = super::fvm_shared_latest::sector::SectorNumber;
