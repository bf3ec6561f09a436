use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 缓存策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// None 为永不过期
    pub ttl: Option<Duration>,
    /// 过期后保留条目, 远端失败时可回退使用
    pub serve_expired: bool,
}

impl CachePolicy {
    /// 参考数据 (门店/日期/商品): 过期后仍可作为失败回退
    pub fn reference(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            serve_expired: true,
        }
    }

    /// 明细数据: 过期即淘汰
    pub fn records(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            serve_expired: false,
        }
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    stored_at: Instant,
    policy: CachePolicy,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.policy
            .ttl
            .map_or(true, |ttl| self.stored_at.elapsed() < ttl)
    }

    fn is_retained(&self) -> bool {
        self.policy.serve_expired || self.is_fresh()
    }
}

/// 缓存查询结果
#[derive(Debug)]
pub enum Lookup<T> {
    Fresh(Arc<T>),
    /// 已过期但保留的条目, 只在远端失败时使用
    Expired(Arc<T>),
    Miss,
}

/// 请求缓存: 以请求标识 (接口 + 参数) 为键。
///
/// 写入时淘汰所有已过期且不保留的条目, 明细查询的不同参数组合不会无限累积。
#[derive(Default)]
pub struct RequestCache {
    entries: DashMap<String, CacheEntry>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup<T: Send + Sync + 'static>(&self, key: &str) -> Lookup<T> {
        let hit = {
            let Some(entry) = self.entries.get(key) else {
                return Lookup::Miss;
            };
            (entry.value.clone(), entry.is_fresh(), entry.is_retained())
        };

        match hit {
            (value, true, _) => value.downcast::<T>().map_or(Lookup::Miss, Lookup::Fresh),
            (value, false, true) => value.downcast::<T>().map_or(Lookup::Miss, Lookup::Expired),
            (_, false, false) => {
                self.entries.remove(key);
                Lookup::Miss
            }
        }
    }

    /// 只返回未过期的条目
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        match self.lookup::<T>(key) {
            Lookup::Fresh(value) => Some(value),
            Lookup::Expired(_) | Lookup::Miss => None,
        }
    }

    pub fn insert<T: Send + Sync + 'static>(&self, key: String, value: Arc<T>, policy: CachePolicy) {
        self.entries.retain(|_, entry| entry.is_retained());
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
                policy,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_downcasts() {
        let cache = RequestCache::new();
        cache.insert("branches".to_string(), Arc::new(vec![1, 2, 3]), CachePolicy::reference(None));
        let hit = cache.get::<Vec<i32>>("branches").unwrap();
        assert_eq!(*hit, vec![1, 2, 3]);
        assert!(cache.get::<Vec<String>>("branches").is_none());
        assert!(cache.get::<Vec<i32>>("missing").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entries_are_evicted() {
        let cache = RequestCache::new();
        cache.insert("sales".to_string(), Arc::new(1u8), CachePolicy::records(Some(Duration::ZERO)));
        assert!(cache.get::<u8>("sales").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn distinct_record_keys_do_not_accumulate() {
        let cache = RequestCache::new();
        let policy = CachePolicy::records(Some(Duration::ZERO));
        for i in 0..1000 {
            cache.insert(format!("sales?datefrom={i}"), Arc::new(vec![i]), policy);
        }
        assert!(cache.len() <= 1);

        cache.insert("branches".to_string(), Arc::new(vec![1]), CachePolicy::reference(None));
        cache.insert("sales?datefrom=x".to_string(), Arc::new(vec![0]), policy);
        assert!(cache.get::<Vec<i32>>("branches").is_some());
        assert!(cache.len() <= 2);
    }

    #[test]
    fn expired_reference_data_is_kept_for_fallback() {
        let cache = RequestCache::new();
        let policy = CachePolicy::reference(Some(Duration::ZERO));
        cache.insert("branches".to_string(), Arc::new(vec![7]), policy);
        cache.insert("sale_dates".to_string(), Arc::new(vec![8]), policy);

        assert!(cache.get::<Vec<i32>>("branches").is_none());
        match cache.lookup::<Vec<i32>>("branches") {
            Lookup::Expired(value) => assert_eq!(*value, vec![7]),
            other => panic!("expected expired entry, got {:?}", other),
        }
        assert_eq!(cache.len(), 2);
    }
}
