//! 원격 로그 스트림 서비스 클라이언트 추상화
//!
//! [`LogStreamClient`] trait은 시퀀스 토큰 기반 append-only 로그 스트림
//! (CloudWatch Logs 계열)과의 통신을 추상화합니다.
//! 자격 증명 획득과 실제 HTTP 호출은 구현체의 책임입니다.
//!
//! 서비스가 보고하는 장애는 닫힌 집합 [`DeliveryFault`]로 분류되며,
//! 업로더는 이를 빠짐없이 match하여 복구 여부를 결정합니다.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// 원격 서비스가 보고하는 전송 장애
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryFault {
    /// 대상 스트림이 존재하지 않음
    #[error("log stream does not exist")]
    StreamNotFound,

    /// 동일한 배치가 이미 수락됨
    #[error("batch was already accepted")]
    DataAlreadyAccepted,

    /// 제시한 시퀀스 토큰이 스트림의 현재 토큰과 다름
    #[error("sequence token does not match the stream")]
    InvalidSequenceToken,

    /// 그 밖의 모든 장애 (네트워크, 권한, 한도 초과 등)
    #[error("{0}")]
    Other(String),
}

impl DeliveryFault {
    /// 메트릭 레이블 값
    pub fn label(&self) -> &'static str {
        match self {
            Self::StreamNotFound => "stream_not_found",
            Self::DataAlreadyAccepted => "already_accepted",
            Self::InvalidSequenceToken => "invalid_sequence_token",
            Self::Other(_) => "other",
        }
    }
}

/// 전송 단위 로그 이벤트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputLogEvent {
    /// 인코딩된 메시지 본문
    pub message: String,
    /// 이벤트 시각 (Unix epoch 기준 밀리초)
    pub timestamp: i64,
}

/// 이벤트 배치 전송 요청
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutLogEventsRequest {
    pub log_group_name: String,
    pub log_stream_name: String,
    /// 순서가 보장된 이벤트 목록
    pub log_events: Vec<InputLogEvent>,
    /// 새 스트림이면 None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_token: Option<String>,
}

/// 이벤트 배치 전송 응답
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutLogEventsOutput {
    /// 다음 전송에 사용할 시퀀스 토큰
    pub next_sequence_token: Option<String>,
}

/// 스트림 조회 요청
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeLogStreamsRequest {
    pub log_group_name: String,
    pub log_stream_name_prefix: String,
    /// true면 최신 스트림부터
    pub descending: bool,
    pub limit: u32,
}

impl DescribeLogStreamsRequest {
    /// 이름이 `stream`으로 시작하는 스트림 중 첫 번째 하나를 조회하는 요청
    pub fn head_of(group: &str, stream: &str) -> Self {
        Self {
            log_group_name: group.to_owned(),
            log_stream_name_prefix: stream.to_owned(),
            descending: true,
            limit: 1,
        }
    }
}

/// 스트림 조회 결과 항목
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStreamDescriptor {
    pub log_stream_name: String,
    /// 스트림이 현재 기대하는 시퀀스 토큰
    pub upload_sequence_token: Option<String>,
}

/// 원격 로그 스트림 서비스 클라이언트
///
/// 테스트에서는 Mock 구현체를 사용할 수 있습니다.
pub trait LogStreamClient: Send + Sync {
    /// 이벤트 배치를 하나의 순서 있는 단위로 전송합니다.
    fn put_log_events(
        &self,
        request: PutLogEventsRequest,
    ) -> impl Future<Output = Result<PutLogEventsOutput, DeliveryFault>> + Send;

    /// 로그 스트림을 생성합니다.
    fn create_log_stream(
        &self,
        log_group_name: &str,
        log_stream_name: &str,
    ) -> impl Future<Output = Result<(), DeliveryFault>> + Send;

    /// 조건에 맞는 로그 스트림 목록을 조회합니다.
    fn describe_log_streams(
        &self,
        request: DescribeLogStreamsRequest,
    ) -> impl Future<Output = Result<Vec<LogStreamDescriptor>, DeliveryFault>> + Send;
}

/// Mock 클라이언트가 기록한 호출
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Put(PutLogEventsRequest),
    Create { group: String, stream: String },
    Describe(DescribeLogStreamsRequest),
}

#[cfg(test)]
type Script<T> = std::sync::Mutex<std::collections::VecDeque<Result<T, DeliveryFault>>>;

/// 테스트용 Mock 로그 스트림 클라이언트
///
/// 각 API의 응답을 순서대로 스크립트하고, 모든 호출을 기록합니다.
/// 스크립트가 비어 있으면 `put`은 `"next-<n>"` 토큰, `create`는 성공,
/// `describe`는 빈 목록을 반환합니다.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockLogStreamClient {
    put_responses: Script<PutLogEventsOutput>,
    create_responses: Script<()>,
    describe_responses: Script<Vec<LogStreamDescriptor>>,
    calls: std::sync::Mutex<Vec<MockCall>>,
}

#[cfg(test)]
impl MockLogStreamClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 다음 `put_log_events` 응답을 추가합니다.
    pub fn with_put(self, response: Result<Option<&str>, DeliveryFault>) -> Self {
        let response = response.map(|token| PutLogEventsOutput {
            next_sequence_token: token.map(str::to_owned),
        });
        self.put_responses.lock().unwrap().push_back(response);
        self
    }

    /// 다음 `create_log_stream` 응답을 추가합니다.
    pub fn with_create(self, response: Result<(), DeliveryFault>) -> Self {
        self.create_responses.lock().unwrap().push_back(response);
        self
    }

    /// 다음 `describe_log_streams` 응답을 추가합니다.
    pub fn with_describe(self, response: Result<Vec<LogStreamDescriptor>, DeliveryFault>) -> Self {
        self.describe_responses.lock().unwrap().push_back(response);
        self
    }

    /// 기록된 호출 목록
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// 기록된 `put_log_events` 요청 목록
    pub fn puts(&self) -> Vec<PutLogEventsRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Put(req) => Some(req),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl LogStreamClient for MockLogStreamClient {
    async fn put_log_events(
        &self,
        request: PutLogEventsRequest,
    ) -> Result<PutLogEventsOutput, DeliveryFault> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(MockCall::Put(request));
        let n = calls.len();
        drop(calls);
        self.put_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(PutLogEventsOutput {
                    next_sequence_token: Some(format!("next-{n}")),
                })
            })
    }

    async fn create_log_stream(
        &self,
        log_group_name: &str,
        log_stream_name: &str,
    ) -> Result<(), DeliveryFault> {
        self.calls.lock().unwrap().push(MockCall::Create {
            group: log_group_name.to_owned(),
            stream: log_stream_name.to_owned(),
        });
        self.create_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn describe_log_streams(
        &self,
        request: DescribeLogStreamsRequest,
    ) -> Result<Vec<LogStreamDescriptor>, DeliveryFault> {
        self.calls.lock().unwrap().push(MockCall::Describe(request));
        self.describe_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
