//! The single local user profile: three plain-string records,
//! last-write-wins.

use crate::store::{keys, Store, StoreError};

pub const DEFAULT_NAME: &str = "User";
pub const DEFAULT_BIO: &str = "Meme lover!";
pub const DEFAULT_AVATAR: &str = "/default-avatar.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub bio: String,
    /// Data URI once the user picks an avatar; the bundled default path
    /// otherwise.
    pub avatar_url: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            bio: DEFAULT_BIO.to_string(),
            avatar_url: DEFAULT_AVATAR.to_string(),
        }
    }
}

/// Loads and saves the profile record. Fields are stored as plain strings
/// (not JSON-wrapped), matching the original record shapes.
#[derive(Clone)]
pub struct ProfileRecord {
    store: Store,
}

impl ProfileRecord {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Load the profile, substituting defaults for unset fields.
    pub async fn load(&self) -> Result<Profile, StoreError> {
        Ok(Profile {
            name: self
                .store
                .get_string_or(keys::PROFILE_NAME, DEFAULT_NAME)
                .await?,
            bio: self
                .store
                .get_string_or(keys::PROFILE_BIO, DEFAULT_BIO)
                .await?,
            avatar_url: self
                .store
                .get_string_or(keys::PROFILE_PIC, DEFAULT_AVATAR)
                .await?,
        })
    }

    /// Persist all three fields, overwriting whatever was there.
    pub async fn save(&self, profile: &Profile) -> Result<(), StoreError> {
        self.store.set_raw(keys::PROFILE_NAME, &profile.name).await?;
        self.store.set_raw(keys::PROFILE_BIO, &profile.bio).await?;
        self.store
            .set_raw(keys::PROFILE_PIC, &profile.avatar_url)
            .await?;
        Ok(())
    }

    /// Replace just the avatar (the picker writes it independently of the
    /// name/bio form).
    pub async fn set_avatar(&self, data_uri: &str) -> Result<(), StoreError> {
        self.store.set_raw(keys::PROFILE_PIC, data_uri).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Profile, ProfileRecord, DEFAULT_AVATAR, DEFAULT_BIO, DEFAULT_NAME};
    use crate::store::{MemoryStore, Store};

    fn test_record() -> ProfileRecord {
        ProfileRecord::new(Store::new(Arc::new(MemoryStore::default())))
    }

    #[tokio::test]
    async fn test_load_defaults() {
        let record = test_record();
        let profile = record.load().await.unwrap();
        assert_eq!(profile.name, DEFAULT_NAME);
        assert_eq!(profile.bio, DEFAULT_BIO);
        assert_eq!(profile.avatar_url, DEFAULT_AVATAR);
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let record = test_record();
        let profile = Profile {
            name: "Alex".to_string(),
            bio: "Chief meme officer".to_string(),
            avatar_url: "data:image/png;base64,AAA".to_string(),
        };
        record.save(&profile).await.unwrap();
        assert_eq!(record.load().await.unwrap(), profile);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let record = test_record();
        let mut profile = Profile::default();
        profile.name = "First".to_string();
        record.save(&profile).await.unwrap();
        profile.name = "Second".to_string();
        record.save(&profile).await.unwrap();

        assert_eq!(record.load().await.unwrap().name, "Second");
    }

    #[tokio::test]
    async fn test_set_avatar_leaves_other_fields() {
        let record = test_record();
        let profile = Profile {
            name: "Alex".to_string(),
            ..Profile::default()
        };
        record.save(&profile).await.unwrap();
        record.set_avatar("data:image/png;base64,BBB").await.unwrap();

        let loaded = record.load().await.unwrap();
        assert_eq!(loaded.name, "Alex");
        assert_eq!(loaded.avatar_url, "data:image/png;base64,BBB");
    }
}
