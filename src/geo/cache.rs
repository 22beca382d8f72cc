use super::Coordinate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct CacheEntry {
    coordinate: Coordinate,
    inserted_at: Instant,
    expires_at: Instant,
}

/// Bounded, expiring geocode cache shared between refresh cycles.
///
/// Keys are `municipio-uf`, lower-cased. Cloning shares the same storage.
#[derive(Clone)]
pub struct GeocodeCache {
    capacity: usize,
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl GeocodeCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn key(municipality: &str, state: &str) -> String {
        format!("{}-{}", municipality.trim(), state.trim()).to_lowercase()
    }

    pub async fn get(&self, municipality: &str, state: &str) -> Option<Coordinate> {
        let key = Self::key(municipality, state);
        let entries = self.entries.read().await;
        entries
            .get(&key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.coordinate)
    }

    pub async fn insert(&self, municipality: &str, state: &str, coordinate: Coordinate) {
        if self.capacity == 0 {
            return;
        }

        let key = Self::key(municipality, state);
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            entries.retain(|_, entry| entry.expires_at > now);

            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                coordinate,
                inserted_at: now,
                expires_at: now + self.ttl,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64) -> Coordinate {
        Coordinate::new(lat, -47.0).unwrap()
    }

    #[tokio::test]
    async fn keys_are_case_insensitive() {
        let cache = GeocodeCache::new(4, Duration::from_secs(60));
        cache.insert("Campinas", "SP", coord(-22.9)).await;
        assert_eq!(cache.get("CAMPINAS", "sp").await, Some(coord(-22.9)));
        assert_eq!(GeocodeCache::key(" Campinas ", "SP"), "campinas-sp");
    }

    #[tokio::test]
    async fn oldest_entry_is_evicted_at_capacity() {
        let cache = GeocodeCache::new(2, Duration::from_secs(60));
        cache.insert("a", "SP", coord(-1.0)).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.insert("b", "SP", coord(-2.0)).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.insert("c", "SP", coord(-3.0)).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("a", "SP").await.is_none());
        assert!(cache.get("c", "SP").await.is_some());
    }

    #[tokio::test]
    async fn expired_entries_are_not_served() {
        let cache = GeocodeCache::new(4, Duration::from_millis(1));
        cache.insert("Recife", "PE", coord(-8.0)).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cache.get("Recife", "PE").await.is_none());
    }

    #[tokio::test]
    async fn zero_capacity_disables_caching() {
        let cache = GeocodeCache::new(0, Duration::from_secs(60));
        cache.insert("Recife", "PE", coord(-8.0)).await;
        assert_eq!(cache.len().await, 0);
    }
}
