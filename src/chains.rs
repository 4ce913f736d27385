//! Chain-target registry: which batch-airdrop contract serves which chain.
//!
//! A plain mapping built by the application bootstrap and handed to the
//! workflow. Looked up once per submission; a missing entry is a terminal
//! configuration error for that attempt.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// Local devnet (anvil/hardhat) chain id and the deployment address used by
/// the end-to-end harness.
const LOCAL_CHAIN_ID: u64 = 31337;
const LOCAL_TARGET: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainTargets {
    #[serde(default)]
    targets: HashMap<u64, Address>,
}

impl ChainTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, chain_id: u64, target: Address) -> Self {
        self.targets.insert(chain_id, target);
        self
    }

    /// Contract address for the given chain, or `None` when no deployment is
    /// configured there.
    pub fn get(&self, chain_id: u64) -> Option<Address> {
        self.targets.get(&chain_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Built-in defaults: only the local devnet. Production deployments are
    /// operator data and come in through the config file.
    pub fn well_known() -> Self {
        let target: Address = LOCAL_TARGET.parse().expect("local devnet target address");
        Self::new().with_target(LOCAL_CHAIN_ID, target)
    }

    /// Load the registry from a JSON file, writing the defaults out first if
    /// the file does not exist yet.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = fs::read_to_string(path).context("read chain-target config")?;
            let targets: ChainTargets =
                serde_json::from_str(&content).context("parse chain-target config")?;
            Ok(targets)
        } else {
            let targets = Self::well_known();
            targets.save(path)?;
            Ok(targets)
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("serialize chain-target config")?;
        fs::write(path, content).context("write chain-target config")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_hits_and_misses() {
        let target = Address::repeat_byte(0xfe);
        let targets = ChainTargets::new().with_target(1, target);
        assert_eq!(targets.get(1), Some(target));
        assert_eq!(targets.get(11155111), None);
    }

    #[test]
    fn well_known_covers_local_devnet() {
        let targets = ChainTargets::well_known();
        assert!(targets.get(LOCAL_CHAIN_ID).is_some());
    }

    #[test]
    fn load_or_create_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chains.json");

        let created = ChainTargets::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(
            created.get(LOCAL_CHAIN_ID),
            ChainTargets::well_known().get(LOCAL_CHAIN_ID)
        );

        let custom = ChainTargets::new().with_target(7, Address::repeat_byte(0x07));
        custom.save(&path).unwrap();
        let reloaded = ChainTargets::load_or_create(&path).unwrap();
        assert_eq!(reloaded.get(7), Some(Address::repeat_byte(0x07)));
        assert_eq!(reloaded.get(LOCAL_CHAIN_ID), None);
    }
}
