use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 一次取数请求的凭证: 会话 + 过滤条件标识 + 代次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    session: String,
    key: String,
    generation: u64,
}

impl Ticket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// 最近一次成功提交的明细, meta 记录这批明细对应的取数范围
#[derive(Debug)]
pub struct Committed<T, M = ()> {
    pub key: String,
    pub records: Arc<Vec<T>>,
    pub meta: M,
}

impl<T, M: Clone> Clone for Committed<T, M> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            records: self.records.clone(),
            meta: self.meta.clone(),
        }
    }
}

struct Slot<T, M> {
    active: Ticket,
    committed: Option<Committed<T, M>>,
}

/// 每个会话的视图状态。
///
/// 只有仍是当前活动凭证的响应才能提交, 被新过滤条件取代的旧响应直接丢弃;
/// 取数失败时可读取最近一次提交的数据继续展示。
pub struct SnapshotStore<T, M = ()> {
    slots: DashMap<String, Slot<T, M>>,
    generation: AtomicU64,
}

impl<T, M> Default for SnapshotStore<T, M> {
    fn default() -> Self {
        Self {
            slots: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }
}

impl<T, M: Clone> SnapshotStore<T, M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记新的活动过滤条件, 之前未完成的请求全部失效
    pub fn begin(&self, session: &str, key: &str) -> Ticket {
        let ticket = Ticket {
            session: session.to_string(),
            key: key.to_string(),
            generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
        };

        self.slots
            .entry(session.to_string())
            .and_modify(|slot| slot.active = ticket.clone())
            .or_insert_with(|| Slot {
                active: ticket.clone(),
                committed: None,
            });
        ticket
    }

    /// 提交明细; 凭证已被取代时返回 false 且不覆盖状态
    pub fn commit(&self, ticket: &Ticket, records: Arc<Vec<T>>, meta: M) -> bool {
        let Some(mut slot) = self.slots.get_mut(&ticket.session) else {
            return false;
        };
        if slot.active != *ticket {
            return false;
        }
        slot.committed = Some(Committed {
            key: ticket.key.clone(),
            records,
            meta,
        });
        true
    }

    pub fn last_committed(&self, session: &str) -> Option<Committed<T, M>> {
        self.slots.get(session).and_then(|slot| slot.committed.clone())
    }

    pub fn clear(&self, session: &str) {
        self.slots.remove(session);
    }
}
