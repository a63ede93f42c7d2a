use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use fifo_core::WorkItem;

use crate::backlog::Backlog;

/// 一次出队的结果，标明工作项来自重试队列还是新数据
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Retry(WorkItem),
    Fresh(WorkItem),
}

impl Admission {
    pub fn into_item(self) -> WorkItem {
        match self {
            Admission::Retry(item) | Admission::Fresh(item) => item,
        }
    }

    pub fn is_retry(&self) -> bool {
        matches!(self, Admission::Retry(_))
    }
}

#[derive(Debug, Default)]
struct Queues {
    fresh: VecDeque<WorkItem>,
    retries: VecDeque<WorkItem>,
}

/// 单个周期的工作来源：剩余的待处理数据加上重试队列
///
/// `pop` 总是先取重试队列的队首，重试队列为空时才取新数据的队首。
#[derive(Debug, Default)]
pub struct WorkSource {
    queues: Mutex<Queues>,
}

impl WorkSource {
    /// 用待处理列表的副本初始化，重试计数归零
    pub fn from_backlog(backlog: &Backlog) -> Self {
        let fresh = backlog
            .items()
            .iter()
            .cloned()
            .map(|mut item| {
                item.retry_count = 0;
                item
            })
            .collect();

        Self {
            queues: Mutex::new(Queues {
                fresh,
                retries: VecDeque::new(),
            }),
        }
    }

    pub fn pop(&self) -> Option<Admission> {
        let mut queues = self.lock();
        if let Some(item) = queues.retries.pop_front() {
            return Some(Admission::Retry(item));
        }
        queues.fresh.pop_front().map(Admission::Fresh)
    }

    /// 追加到重试队列尾部
    pub fn requeue(&self, item: WorkItem) {
        self.lock().retries.push_back(item);
    }

    pub fn remaining_fresh(&self) -> usize {
        self.lock().fresh.len()
    }

    pub fn pending_retries(&self) -> usize {
        self.lock().retries.len()
    }

    pub fn is_drained(&self) -> bool {
        let queues = self.lock();
        queues.fresh.is_empty() && queues.retries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Queues> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
