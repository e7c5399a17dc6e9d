// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::Cid;
use fvm_ipld_encoding::RawBytes;

use crate::shim::{address::Address, message::MethodNum};

/// The subset of an unsigned chain message that the replicator inspects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub from: Address,
    pub to: Address,
    pub sequence: u64,
    pub method_num: MethodNum,
    pub params: RawBytes,
}

impl Message {
    /// Returns the destination address of the message.
    pub fn to(&self) -> Address {
        self.to
    }

    /// Returns the method number to be called.
    pub fn method_num(&self) -> MethodNum {
        self.method_num
    }

    /// Returns the encoded parameters for the method call.
    pub fn params(&self) -> &RawBytes {
        &self.params
    }
}

/// A message paired with its CID, as returned by `ChainGetParentMessages`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiMessage {
    pub cid: Cid,
    pub message: Message,
}
