pub mod models;
pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{
    ChatStore, CommunityStore, MatchStore, NotificationStore, ProfileStore, ReputationStore,
    Storage, StorageTx, TeamStore,
};
