//! 레코드 버퍼링 -- journal 읽기와 배치 전송 사이의 인메모리 큐
//!
//! [`RecordBuffer`]는 정규화된 레코드를 수신 순서대로 보관하고,
//! 배치 크기 또는 시간 간격에 따라 업로더로 넘깁니다.
//!
//! # 오버플로우 정책
//! 버퍼가 가득 찬 경우:
//! - [`DropPolicy::Oldest`](crate::config::DropPolicy::Oldest): 가장 오래된 레코드를 드롭
//! - [`DropPolicy::Newest`](crate::config::DropPolicy::Newest): 새 레코드를 거부

use std::collections::VecDeque;

use journalship_core::types::Record;

use crate::config::DropPolicy;

/// 인메모리 레코드 버퍼
pub struct RecordBuffer {
    records: VecDeque<Record>,
    capacity: usize,
    drop_policy: DropPolicy,
    /// 드롭된 레코드 수
    dropped_count: u64,
}

impl RecordBuffer {
    /// 새 버퍼를 생성합니다.
    pub fn new(capacity: usize, drop_policy: DropPolicy) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(10_000)),
            capacity,
            drop_policy,
            dropped_count: 0,
        }
    }

    /// 레코드를 버퍼에 추가합니다.
    ///
    /// 버퍼가 가득 차서 레코드가 버려졌으면 `true`를 반환합니다.
    pub fn push(&mut self, record: Record) -> bool {
        if self.records.len() < self.capacity {
            self.records.push_back(record);
            return false;
        }

        self.dropped_count += 1;
        match self.drop_policy {
            DropPolicy::Oldest => {
                self.records.pop_front();
                self.records.push_back(record);
                tracing::warn!(
                    dropped = self.dropped_count,
                    capacity = self.capacity,
                    "record buffer full, dropped oldest record"
                );
            }
            DropPolicy::Newest => {
                tracing::warn!(
                    dropped = self.dropped_count,
                    capacity = self.capacity,
                    "record buffer full, rejected new record"
                );
            }
        }
        true
    }

    /// 앞에서부터 최대 `batch_size`개의 레코드를 꺼냅니다.
    pub fn drain_batch(&mut self, batch_size: usize) -> Vec<Record> {
        let count = batch_size.min(self.records.len());
        self.records.drain(..count).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 버퍼 사용률 (0.0~1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(u32::try_from(self.records.len()).unwrap_or(u32::MAX))
            / f64::from(u32::try_from(self.capacity).unwrap_or(u32::MAX))
    }

    /// 버퍼에 `batch_size`개 이상 쌓였는지 확인합니다.
    pub fn should_flush(&self, batch_size: usize) -> bool {
        self.records.len() >= batch_size
    }
}
