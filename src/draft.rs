//! Draft persistence: the three raw input fields survive restarts.
//!
//! Two-phase by construction: a [`DraftStore`] only exists once the backing
//! store has opened successfully, so a write can never race an uninitialized
//! storage layer. Callers render a placeholder until `open` returns.

use std::path::Path;

use anyhow::{Context, Result};

const TREE: &str = "draft";
const KEY_TOKEN_ADDRESS: &str = "tokenAddress";
const KEY_RECIPIENTS: &str = "recipients";
const KEY_AMOUNTS: &str = "amounts";

/// The three raw text fields exactly as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub token_address: String,
    pub recipients: String,
    pub amounts: String,
}

pub struct DraftStore {
    _db: sled::Db,
    tree: sled::Tree,
}

impl DraftStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path).context("open draft database")?;
        let tree = db.open_tree(TREE).context("open draft tree")?;
        Ok(Self { _db: db, tree })
    }

    /// Read the saved draft. Absent keys default to empty strings; there is
    /// no versioning or migration.
    pub fn load(&self) -> Result<Draft> {
        Ok(Draft {
            token_address: self.read(KEY_TOKEN_ADDRESS)?,
            recipients: self.read(KEY_RECIPIENTS)?,
            amounts: self.read(KEY_AMOUNTS)?,
        })
    }

    pub fn set_token_address(&self, value: &str) -> Result<()> {
        self.write(KEY_TOKEN_ADDRESS, value)
    }

    pub fn set_recipients(&self, value: &str) -> Result<()> {
        self.write(KEY_RECIPIENTS, value)
    }

    pub fn set_amounts(&self, value: &str) -> Result<()> {
        self.write(KEY_AMOUNTS, value)
    }

    pub fn save(&self, draft: &Draft) -> Result<()> {
        self.set_token_address(&draft.token_address)?;
        self.set_recipients(&draft.recipients)?;
        self.set_amounts(&draft.amounts)?;
        Ok(())
    }

    /// Explicitly clear all three fields. The draft otherwise lives as long
    /// as the data directory does.
    pub fn clear(&self) -> Result<()> {
        for key in [KEY_TOKEN_ADDRESS, KEY_RECIPIENTS, KEY_AMOUNTS] {
            self.tree.remove(key).context("clear draft key")?;
        }
        self.tree.flush().context("flush draft tree")?;
        Ok(())
    }

    fn read(&self, key: &str) -> Result<String> {
        match self.tree.get(key).context("read draft key")? {
            Some(v) => Ok(String::from_utf8_lossy(&v).into_owned()),
            None => Ok(String::new()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.tree
            .insert(key, value.as_bytes())
            .context("write draft key")?;
        self.tree.flush().context("flush draft tree")?;
        Ok(())
    }
}
