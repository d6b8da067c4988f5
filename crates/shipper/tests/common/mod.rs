//! 통합 테스트 공용 fake 구현체
//!
//! - [`ScriptedJournal`]: 미리 정한 엔트리를 순서대로 돌려주는 journal
//! - [`FakeLogService`]: 시퀀스 토큰 규칙을 흉내 내는 원격 로그 서비스

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use journalship_core::JournalEntry;
use journalship_shipper::{
    Advance, DeliveryFault, DescribeLogStreamsRequest, InputLogEvent, JournalSource,
    LogStreamClient, LogStreamDescriptor, PutLogEventsOutput, PutLogEventsRequest, ShipperError,
};

/// 현재 시각으로 엔트리를 만듭니다.
pub fn entry(message: &str) -> JournalEntry {
    let now = chrono::Utc::now().timestamp_micros();
    JournalEntry::new(u64::try_from(now).unwrap_or_default()).with_field("MESSAGE", message)
}

/// 미리 정한 엔트리를 순서대로 돌려주는 journal
#[derive(Debug, Default)]
pub struct ScriptedJournal {
    entries: Vec<JournalEntry>,
    position: Option<usize>,
}

impl ScriptedJournal {
    pub fn new(entries: Vec<JournalEntry>) -> Self {
        Self {
            entries,
            position: None,
        }
    }
}

impl JournalSource for ScriptedJournal {
    async fn get_entry(&mut self) -> Result<JournalEntry, ShipperError> {
        self.position
            .and_then(|idx| self.entries.get(idx))
            .cloned()
            .ok_or_else(|| ShipperError::Journal("cursor not positioned".to_owned()))
    }

    async fn next(&mut self) -> Result<Advance, ShipperError> {
        let next = self.position.map_or(0, |idx| idx + 1);
        if next < self.entries.len() {
            self.position = Some(next);
            Ok(Advance::Advanced)
        } else {
            Ok(Advance::NoNewEntry)
        }
    }

    async fn wait(&mut self, timeout: Duration) {
        tokio::time::sleep(timeout).await;
    }
}

#[derive(Debug, Default)]
struct StreamState {
    accepted: u64,
    expected_token: Option<String>,
    events: Vec<InputLogEvent>,
}

#[derive(Debug, Default)]
struct ServiceState {
    streams: HashMap<(String, String), StreamState>,
    injected: VecDeque<DeliveryFault>,
    calls: Vec<&'static str>,
}

/// 시퀀스 토큰 규칙을 흉내 내는 원격 로그 서비스
///
/// - 없는 스트림으로 전송 → `StreamNotFound`
/// - 기대 토큰과 다른 토큰 → `InvalidSequenceToken`
/// - 수락할 때마다 `tok-<n>` 토큰 발급
///
/// clone은 같은 상태를 공유합니다.
#[derive(Debug, Clone, Default)]
pub struct FakeLogService {
    state: Arc<Mutex<ServiceState>>,
}

impl FakeLogService {
    pub fn new() -> Self {
        Self::default()
    }

    /// `accepted`개의 배치를 이미 받은 스트림을 만듭니다.
    pub fn with_stream(self, group: &str, stream: &str, accepted: u64) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.streams.insert(
                (group.to_owned(), stream.to_owned()),
                StreamState {
                    accepted,
                    expected_token: (accepted > 0).then(|| format!("tok-{accepted}")),
                    events: Vec::new(),
                },
            );
        }
        self
    }

    /// 다음 `put_log_events` 호출에 장애를 주입합니다.
    pub fn inject(&self, fault: DeliveryFault) {
        self.state.lock().unwrap().injected.push_back(fault);
    }

    pub fn events(&self, group: &str, stream: &str) -> Vec<InputLogEvent> {
        self.state
            .lock()
            .unwrap()
            .streams
            .get(&(group.to_owned(), stream.to_owned()))
            .map(|s| s.events.clone())
            .unwrap_or_default()
    }

    pub fn expected_token(&self, group: &str, stream: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .streams
            .get(&(group.to_owned(), stream.to_owned()))
            .and_then(|s| s.expected_token.clone())
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl LogStreamClient for FakeLogService {
    async fn put_log_events(
        &self,
        request: PutLogEventsRequest,
    ) -> Result<PutLogEventsOutput, DeliveryFault> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("put");
        if let Some(fault) = state.injected.pop_front() {
            return Err(fault);
        }

        let key = (request.log_group_name, request.log_stream_name);
        let stream = state
            .streams
            .get_mut(&key)
            .ok_or(DeliveryFault::StreamNotFound)?;
        if request.sequence_token != stream.expected_token {
            return Err(DeliveryFault::InvalidSequenceToken);
        }

        stream.accepted += 1;
        stream.events.extend(request.log_events);
        let token = format!("tok-{}", stream.accepted);
        stream.expected_token = Some(token.clone());
        Ok(PutLogEventsOutput {
            next_sequence_token: Some(token),
        })
    }

    async fn create_log_stream(
        &self,
        log_group_name: &str,
        log_stream_name: &str,
    ) -> Result<(), DeliveryFault> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("create");
        let key = (log_group_name.to_owned(), log_stream_name.to_owned());
        if state.streams.contains_key(&key) {
            return Err(DeliveryFault::Other("stream already exists".to_owned()));
        }
        state.streams.insert(key, StreamState::default());
        Ok(())
    }

    async fn describe_log_streams(
        &self,
        request: DescribeLogStreamsRequest,
    ) -> Result<Vec<LogStreamDescriptor>, DeliveryFault> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("describe");
        let mut found: Vec<LogStreamDescriptor> = state
            .streams
            .iter()
            .filter(|((group, stream), _)| {
                *group == request.log_group_name
                    && stream.starts_with(&request.log_stream_name_prefix)
            })
            .map(|((_, stream), s)| LogStreamDescriptor {
                log_stream_name: stream.clone(),
                upload_sequence_token: s.expected_token.clone(),
            })
            .collect();
        found.sort_by(|a, b| a.log_stream_name.cmp(&b.log_stream_name));
        if request.descending {
            found.reverse();
        }
        found.truncate(usize::try_from(request.limit).unwrap_or(usize::MAX));
        Ok(found)
    }
}
