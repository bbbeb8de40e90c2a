use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ClientError;

pub const RECENT_SEARCH_CAP: usize = 5;

const KEY_PROFILE_IMAGE_URL: &str = "profile_image_url";
const KEY_RECENT_SEARCHES: &str = "recent_searches";
const KEY_SAVED_LOCATIONS: &str = "saved_locations";
const KEY_SELECTED_LOCATION: &str = "selected_location";

/// A user-defined location kept on the device only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub id: String,
    pub label: String,
    pub address: String,
}

/// Typed key-value repository over the device-local store. Values are
/// plain JSON blobs, not versioned; business logic stays out of here and
/// the store is injected where needed.
#[derive(Clone)]
pub struct LocalStore {
    conn: Arc<Mutex<Connection>>,
}

impl LocalStore {
    pub fn open(path: &str) -> Result<Self, ClientError> {
        let conn = super::open_db(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ClientError> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn
            .query_row("SELECT value FROM prefs WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ClientError> {
        let json = serde_json::to_string(value)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO prefs (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, json],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), ClientError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM prefs WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Profile image ──

    pub fn profile_image_url(&self) -> Result<Option<String>, ClientError> {
        self.get(KEY_PROFILE_IMAGE_URL)
    }

    pub fn set_profile_image_url(&self, url: &str) -> Result<(), ClientError> {
        self.set(KEY_PROFILE_IMAGE_URL, &url)
    }

    // ── Recent searches ──

    pub fn recent_searches(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.get(KEY_RECENT_SEARCHES)?.unwrap_or_default())
    }

    /// Record a search term: deduplicated, most recent first, capped at
    /// [`RECENT_SEARCH_CAP`]. Blank terms are dropped.
    pub fn push_recent_search(&self, term: &str) -> Result<(), ClientError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(());
        }
        let mut searches = self.recent_searches()?;
        searches.retain(|s| !s.eq_ignore_ascii_case(term));
        searches.insert(0, term.to_string());
        searches.truncate(RECENT_SEARCH_CAP);
        self.set(KEY_RECENT_SEARCHES, &searches)
    }

    // ── Saved locations ──

    pub fn saved_locations(&self) -> Result<Vec<SavedLocation>, ClientError> {
        Ok(self.get(KEY_SAVED_LOCATIONS)?.unwrap_or_default())
    }

    pub fn save_location(&self, label: &str, address: &str) -> Result<SavedLocation, ClientError> {
        let location = SavedLocation {
            id: Uuid::new_v4().to_string(),
            label: label.to_string(),
            address: address.to_string(),
        };
        let mut locations = self.saved_locations()?;
        locations.push(location.clone());
        self.set(KEY_SAVED_LOCATIONS, &locations)?;
        Ok(location)
    }

    pub fn remove_location(&self, id: &str) -> Result<(), ClientError> {
        let mut locations = self.saved_locations()?;
        locations.retain(|l| l.id != id);
        self.set(KEY_SAVED_LOCATIONS, &locations)
    }

    // ── Selected location ──

    pub fn selected_location(&self) -> Result<Option<String>, ClientError> {
        self.get(KEY_SELECTED_LOCATION)
    }

    pub fn set_selected_location(&self, location: &str) -> Result<(), ClientError> {
        self.set(KEY_SELECTED_LOCATION, &location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> LocalStore {
        LocalStore::open(":memory:").unwrap()
    }

    #[test]
    fn test_get_set_round_trip() {
        let store = store();
        assert_eq!(store.get::<String>("missing").unwrap(), None);

        store.set("greeting", &"hello").unwrap();
        assert_eq!(
            store.get::<String>("greeting").unwrap(),
            Some("hello".to_string())
        );

        store.set("greeting", &"updated").unwrap();
        assert_eq!(
            store.get::<String>("greeting").unwrap(),
            Some("updated".to_string())
        );

        store.remove("greeting").unwrap();
        assert_eq!(store.get::<String>("greeting").unwrap(), None);
    }

    #[test]
    fn test_recent_searches_dedupe_and_cap() {
        let store = store();
        for term in ["plumber", "electrician", "cleaner", "painter", "carpenter"] {
            store.push_recent_search(term).unwrap();
        }
        // Repeat moves to the front without duplicating.
        store.push_recent_search("Plumber").unwrap();
        assert_eq!(
            store.recent_searches().unwrap(),
            vec!["Plumber", "carpenter", "painter", "cleaner", "electrician"]
        );

        // A sixth distinct term evicts the oldest.
        store.push_recent_search("gardener").unwrap();
        let searches = store.recent_searches().unwrap();
        assert_eq!(searches.len(), RECENT_SEARCH_CAP);
        assert_eq!(searches[0], "gardener");
        assert!(!searches.contains(&"electrician".to_string()));
    }

    #[test]
    fn test_blank_search_terms_are_dropped() {
        let store = store();
        store.push_recent_search("   ").unwrap();
        assert!(store.recent_searches().unwrap().is_empty());
    }

    #[test]
    fn test_saved_locations_round_trip() {
        let store = store();
        let home = store.save_location("Home", "12 Oak Lane, Bengaluru").unwrap();
        store.save_location("Work", "MG Road, Bengaluru").unwrap();

        assert_eq!(store.saved_locations().unwrap().len(), 2);

        store.remove_location(&home.id).unwrap();
        let remaining = store.saved_locations().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].label, "Work");
    }

    #[test]
    fn test_selected_location_preference() {
        let store = store();
        assert_eq!(store.selected_location().unwrap(), None);
        store.set_selected_location("Bengaluru").unwrap();
        assert_eq!(
            store.selected_location().unwrap(),
            Some("Bengaluru".to_string())
        );
    }

    #[test]
    fn test_profile_image_cache() {
        let store = store();
        store
            .set_profile_image_url("https://cdn.example.com/u/42.jpg")
            .unwrap();
        assert_eq!(
            store.profile_image_url().unwrap(),
            Some("https://cdn.example.com/u/42.jpg".to_string())
        );
    }
}
