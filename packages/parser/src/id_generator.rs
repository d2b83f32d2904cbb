use crate::ast::StableId;
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

const DEFAULT_SEED: &str = "n";

/// Derive an id seed from a session name using CRC32
pub fn session_seed(name: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    format!("{:x}-", hasher.finalize())
}

/// Sequential id generator for the blocks of one document
///
/// Ids are `<seed><counter>`; the counter only moves forward, so an id is
/// never issued twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::from_seed(DEFAULT_SEED)
    }

    pub fn for_session(name: &str) -> Self {
        Self::from_seed(session_seed(name))
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> StableId {
        self.count += 1;
        StableId::new(format!("{}{}", self.seed, self.count))
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Number of ids issued so far
    pub fn issued_count(&self) -> u64 {
        self.count
    }

    /// Whether `id` was produced by this generator
    pub fn issued(&self, id: &StableId) -> bool {
        let Some(counter) = id.as_str().strip_prefix(self.seed.as_str()) else {
            return false;
        };
        match counter.parse::<u64>() {
            Ok(n) => n >= 1 && n <= self.count && n.to_string() == counter,
            Err(_) => false,
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
