// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Serialize};

use crate::identity::ConnectionInfo;

/// A chain-registered participant: a miner or a validator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub uid: u64,
    pub ss58_address: String,
    pub connection: ConnectionInfo,
    pub incentive: Option<u64>,
    pub dividends: Option<u64>,
}

impl ModuleInfo {
    pub fn new(uid: u64, ss58_address: impl Into<String>, connection: ConnectionInfo) -> Self {
        Self {
            uid,
            ss58_address: ss58_address.into(),
            connection,
            incentive: None,
            dividends: None,
        }
    }

    pub fn with_rewards(mut self, incentive: u64, dividends: u64) -> Self {
        self.incentive = Some(incentive);
        self.dividends = Some(dividends);
        self
    }

    pub fn role(&self) -> Role {
        classify_role(self.incentive, self.dividends)
    }
}

/// The two roles a module can hold in the subnet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Miner,
    Validator,
}

/// A single, replaceable predicate so the chain can later publish roles
/// directly without touching any caller (see open question in SPEC_FULL §9).
///
/// A module is a miner when incentive and dividends are both zero (freshly
/// registered, reward-less) or when incentive dominates dividends; it is a
/// validator otherwise (dividend-dominant).
pub fn classify_role(incentive: Option<u64>, dividends: Option<u64>) -> Role {
    let incentive = incentive.unwrap_or(0);
    let dividends = dividends.unwrap_or(0);
    if (incentive == 0 && dividends == 0) || incentive > dividends {
        Role::Miner
    } else {
        Role::Validator
    }
}
