// Live-entity table and the indices derived from it

mod handles;
mod histogram;
mod identity;
mod table;

pub use handles::HandleTable;
pub use histogram::{ClassCount, ClassHistogram};
pub use identity::IdentityIndex;
pub use table::{EntityLookup, EntityTable};

#[cfg(test)]
mod tests;
