//! 本次会话已出过的题目
//!
//! 集合用于去重判断，队列保留出题顺序以便取最近的若干条作为提示。

use std::collections::{HashSet, VecDeque};

/// 已出题目记录
#[derive(Debug, Clone, Default)]
pub struct QuestionHistory {
    seen: HashSet<String>,
    order: VecDeque<String>,
    capacity: Option<usize>,
}

impl QuestionHistory {
    /// 不限容量
    pub fn new() -> Self {
        Self::default()
    }

    /// 限制容量，超出时淘汰最早的记录；容量不会小于 `min_keep`
    pub fn with_capacity(capacity: usize, min_keep: usize) -> Self {
        Self {
            capacity: Some(capacity.max(min_keep).max(1)),
            ..Self::default()
        }
    }

    pub fn contains(&self, text: &str) -> bool {
        self.seen.contains(text)
    }

    /// 记录题目，已存在时返回 false
    pub fn insert(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.seen.contains(&text) {
            return false;
        }
        if let Some(capacity) = self.capacity {
            while self.order.len() >= capacity {
                match self.order.pop_front() {
                    Some(oldest) => {
                        self.seen.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
        self.seen.insert(text.clone());
        self.order.push_back(text);
        true
    }

    /// 最近的 n 条记录（按出题先后排列）
    pub fn recent(&self, n: usize) -> Vec<String> {
        let skip = self.order.len().saturating_sub(n);
        self.order.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
        self.order.clear();
    }
}
