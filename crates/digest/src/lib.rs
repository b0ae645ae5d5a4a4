pub mod vault;

pub use vault::{build_digest, DigestSummary, VaultPaths};
