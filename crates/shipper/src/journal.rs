//! journal 리더 추상화
//!
//! 정규화기와 파이프라인은 [`JournalSource`] trait을 통해서만 journal에 접근합니다.
//! journal을 열고, 설정하고, 닫는 일은 이 크레이트의 책임이 아닙니다.
//!
//! # 커서 모델
//! ```text
//!   next() ──► Advanced     : 다음 엔트리로 이동, get_entry()로 조회 가능
//!          ──► NoNewEntry   : 아직 새 엔트리 없음, wait() 후 재시도
//!          ──► Err(..)      : 이동 실패, 잠시 후 재시도
//! ```

use std::future::Future;
use std::time::Duration;

use journalship_core::types::JournalEntry;

use crate::error::ShipperError;

/// `next()` 호출 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// 다음 엔트리로 이동했음
    Advanced,
    /// 아직 새 엔트리가 없음
    NoNewEntry,
}

/// 순서가 보장된 journal 엔트리 공급자
///
/// 구현체는 현재 엔트리 조회, 다음 엔트리로 이동, 새 데이터 대기를 제공합니다.
pub trait JournalSource: Send {
    /// 현재 엔트리의 필드와 수신 시각을 반환합니다.
    fn get_entry(&mut self) -> impl Future<Output = Result<JournalEntry, ShipperError>> + Send;

    /// 다음 엔트리로 이동합니다.
    fn next(&mut self) -> impl Future<Output = Result<Advance, ShipperError>> + Send;

    /// 새 데이터가 들어오거나 `timeout`이 지날 때까지 대기합니다.
    fn wait(&mut self, timeout: Duration) -> impl Future<Output = ()> + Send;
}

/// 테스트용 Mock journal
///
/// 엔트리 목록을 순서대로 돌려주며, `next()` 결과를 스크립트로 끼워 넣거나
/// `wait()` 중에 새 엔트리가 도착하는 상황을 흉내 낼 수 있습니다.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockJournal {
    /// 현재까지 도착한 엔트리
    entries: Vec<JournalEntry>,
    /// 현재 위치 (아직 이동 전이면 None)
    position: Option<usize>,
    /// 엔트리 이동보다 먼저 소비되는 `next()` 결과
    scripted: std::collections::VecDeque<MockStep>,
    /// `wait()`가 호출될 때마다 하나씩 도착하는 엔트리
    arrivals: std::collections::VecDeque<JournalEntry>,
    /// `wait()` 호출 기록
    pub waits: Vec<Duration>,
    /// `next()` 호출 횟수
    pub next_calls: usize,
}

/// Mock journal의 `next()` 스크립트 단계
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStep {
    /// `NoNewEntry` 반환
    NoNewEntry,
    /// 에러 반환
    Error,
}

#[cfg(test)]
impl MockJournal {
    /// 엔트리 목록으로 mock journal을 생성합니다. 위치는 첫 엔트리 이전입니다.
    pub fn new(entries: Vec<JournalEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// `next()` 결과를 스크립트에 추가합니다.
    pub fn with_steps(mut self, steps: impl IntoIterator<Item = MockStep>) -> Self {
        self.scripted.extend(steps);
        self
    }

    /// `wait()` 중에 도착할 엔트리를 추가합니다.
    pub fn with_arrivals(mut self, arrivals: impl IntoIterator<Item = JournalEntry>) -> Self {
        self.arrivals.extend(arrivals);
        self
    }
}

#[cfg(test)]
impl JournalSource for MockJournal {
    async fn get_entry(&mut self) -> Result<JournalEntry, ShipperError> {
        self.position
            .and_then(|idx| self.entries.get(idx))
            .cloned()
            .ok_or_else(|| ShipperError::Journal("no current entry".to_owned()))
    }

    async fn next(&mut self) -> Result<Advance, ShipperError> {
        self.next_calls += 1;
        match self.scripted.pop_front() {
            Some(MockStep::NoNewEntry) => return Ok(Advance::NoNewEntry),
            Some(MockStep::Error) => {
                return Err(ShipperError::Journal("mock advance failure".to_owned()));
            }
            None => {}
        }

        let next = self.position.map_or(0, |idx| idx + 1);
        if next < self.entries.len() {
            self.position = Some(next);
            Ok(Advance::Advanced)
        } else {
            Ok(Advance::NoNewEntry)
        }
    }

    async fn wait(&mut self, timeout: Duration) {
        self.waits.push(timeout);
        tokio::time::sleep(timeout).await;
        if let Some(entry) = self.arrivals.pop_front() {
            self.entries.push(entry);
        }
    }
}
