//! 배치 업로더 -- 레코드 배치를 시퀀스 토큰 기반 로그 스트림으로 전송합니다.
//!
//! # 처리 단계
//! 1. 24시간보다 오래된 레코드 제외
//! 2. 인코딩 (raw 모드: 메시지 그대로, 구조화 모드: 들여쓰기 JSON)
//! 3. 보유한 시퀀스 토큰과 함께 하나의 배치로 전송
//! 4. 장애 복구 (최대 한 번의 보정 호출 + 한 번의 재시도)
//!
//! # 장애 처리
//! | 장애 | 처리 |
//! |------|------|
//! | `StreamNotFound` | 스트림 생성 후 토큰 없이 재전송 |
//! | `DataAlreadyAccepted` | 성공으로 간주, 토큰 변경 없음 |
//! | `InvalidSequenceToken` | 스트림 조회로 토큰 재동기화 후 재전송 |
//! | `Other` | 에러 반환 |
//!
//! 재시도에 쓰는 토큰은 로컬에서만 사용하고, 전송이 성공했을 때만
//! 세션 토큰을 갱신합니다.

use chrono::{DateTime, TimeDelta, Utc};
use journalship_core::metrics as m;
use journalship_core::types::Record;

use crate::error::ShipperError;
use crate::stream::{
    DeliveryFault, DescribeLogStreamsRequest, InputLogEvent, LogStreamClient,
    PutLogEventsOutput, PutLogEventsRequest,
};

/// 이 시간보다 오래된 레코드는 전송하지 않습니다.
pub const STALE_AFTER_HOURS: i64 = 24;

/// 배치 전송 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 스트림이 배치를 수락함
    Delivered {
        /// 전송된 이벤트 수 (오래된 레코드 제외)
        events: usize,
        /// 새 시퀀스 토큰
        next_token: Option<String>,
    },
    /// 같은 배치가 이미 수락되어 있었음. 토큰은 그대로입니다.
    AlreadyAccepted { events: usize },
    /// 모든 레코드가 오래되어 원격 호출을 하지 않음
    NothingToSend,
}

impl DeliveryOutcome {
    /// 스트림에 기록된 것으로 간주되는 이벤트 수
    pub fn events(&self) -> usize {
        match self {
            Self::Delivered { events, .. } | Self::AlreadyAccepted { events } => *events,
            Self::NothingToSend => 0,
        }
    }

    /// 영속화할 새 시퀀스 토큰
    pub fn into_next_token(self) -> Option<String> {
        match self {
            Self::Delivered { next_token, .. } => next_token,
            Self::AlreadyAccepted { .. } | Self::NothingToSend => None,
        }
    }
}

/// 하나의 로그 스트림에 대한 배치 업로더
///
/// 시퀀스 토큰(커서)을 단독으로 소유하며, `&mut self`로만 갱신합니다.
pub struct BatchUploader<C> {
    client: C,
    log_group: String,
    log_stream: String,
    raw_message: bool,
    sequence_token: Option<String>,
}

impl<C: LogStreamClient> BatchUploader<C> {
    /// 새 업로더를 생성합니다. 시퀀스 토큰은 비어 있습니다.
    pub fn new(
        client: C,
        log_group: impl Into<String>,
        log_stream: impl Into<String>,
        raw_message: bool,
    ) -> Self {
        Self {
            client,
            log_group: log_group.into(),
            log_stream: log_stream.into(),
            raw_message,
            sequence_token: None,
        }
    }

    /// 이전 실행에서 저장한 시퀀스 토큰으로 시작합니다.
    pub fn with_sequence_token(mut self, token: Option<String>) -> Self {
        self.sequence_token = token;
        self
    }

    /// 현재 시퀀스 토큰
    pub fn sequence_token(&self) -> Option<&str> {
        self.sequence_token.as_deref()
    }

    /// 내부 클라이언트 참조
    #[cfg(test)]
    pub(crate) fn client(&self) -> &C {
        &self.client
    }

    /// 레코드 배치를 전송하고, 영속화할 새 시퀀스 토큰을 반환합니다.
    ///
    /// 이미 수락된 배치이거나 전송할 레코드가 없으면 `Ok(None)`입니다.
    pub async fn deliver_batch(
        &mut self,
        records: &[Record],
    ) -> Result<Option<String>, ShipperError> {
        Ok(self.deliver(records).await?.into_next_token())
    }

    /// 레코드 배치를 전송하고, 실제로 전송된 이벤트 수를 포함한 결과를 반환합니다.
    pub async fn deliver(&mut self, records: &[Record]) -> Result<DeliveryOutcome, ShipperError> {
        self.deliver_at(records, Utc::now()).await
    }

    /// `now`를 기준 시각으로 배치를 전송합니다.
    async fn deliver_at(
        &mut self,
        records: &[Record],
        now: DateTime<Utc>,
    ) -> Result<DeliveryOutcome, ShipperError> {
        let log_events = self.encode_batch(records, now)?;
        if log_events.is_empty() {
            tracing::debug!(
                records = records.len(),
                "no deliverable records in batch, skipping"
            );
            return Ok(DeliveryOutcome::NothingToSend);
        }

        let events = log_events.len();
        let request = PutLogEventsRequest {
            log_group_name: self.log_group.clone(),
            log_stream_name: self.log_stream.clone(),
            log_events,
            sequence_token: self.sequence_token.clone(),
        };

        let output = match self.client.put_log_events(request.clone()).await {
            Ok(output) => output,
            Err(fault) => {
                let label = fault.label();
                metrics::counter!(m::UPLOADER_DELIVERY_FAULTS_TOTAL, m::LABEL_FAULT => label)
                    .increment(1);
                match self.reconcile(fault, request).await? {
                    Some(output) => output,
                    None => return Ok(DeliveryOutcome::AlreadyAccepted { events }),
                }
            }
        };

        self.sequence_token = output.next_sequence_token.clone();
        metrics::counter!(m::UPLOADER_BATCHES_DELIVERED_TOTAL).increment(1);
        metrics::counter!(m::UPLOADER_EVENTS_DELIVERED_TOTAL).increment(events as u64);
        tracing::debug!(
            events,
            stream = %self.log_stream,
            "batch delivered"
        );

        Ok(DeliveryOutcome::Delivered {
            events,
            next_token: output.next_sequence_token,
        })
    }

    /// 장애를 복구합니다. 이미 수락된 배치면 `None`을 반환합니다.
    async fn reconcile(
        &self,
        fault: DeliveryFault,
        mut request: PutLogEventsRequest,
    ) -> Result<Option<PutLogEventsOutput>, ShipperError> {
        match fault {
            DeliveryFault::DataAlreadyAccepted => {
                tracing::info!(
                    stream = %self.log_stream,
                    "batch already accepted, keeping current sequence token"
                );
                Ok(None)
            }
            DeliveryFault::StreamNotFound => {
                tracing::warn!(
                    group = %self.log_group,
                    stream = %self.log_stream,
                    "log stream not found, creating it"
                );
                self.client
                    .create_log_stream(&self.log_group, &self.log_stream)
                    .await
                    .map_err(|fault| ShipperError::CreateStream {
                        stream: self.log_stream.clone(),
                        fault,
                    })?;

                request.sequence_token = None;
                let output = self
                    .client
                    .put_log_events(request)
                    .await
                    .map_err(ShipperError::PutEvents)?;
                Ok(Some(output))
            }
            DeliveryFault::InvalidSequenceToken => {
                tracing::warn!(
                    stream = %self.log_stream,
                    "sequence token out of sync, fetching current token"
                );
                request.sequence_token = self.fetch_sequence_token().await?;
                let output = self
                    .client
                    .put_log_events(request)
                    .await
                    .map_err(ShipperError::PutEvents)?;
                Ok(Some(output))
            }
            DeliveryFault::Other(_) => Err(ShipperError::PutEvents(fault)),
        }
    }

    /// 스트림이 현재 기대하는 시퀀스 토큰을 조회합니다.
    async fn fetch_sequence_token(&self) -> Result<Option<String>, ShipperError> {
        let streams = self
            .client
            .describe_log_streams(DescribeLogStreamsRequest::head_of(
                &self.log_group,
                &self.log_stream,
            ))
            .await
            .map_err(|fault| ShipperError::SequenceToken(fault.to_string()))?;

        let head = streams.into_iter().next().ok_or_else(|| {
            ShipperError::SequenceToken(format!("no log stream matches '{}'", self.log_stream))
        })?;
        Ok(head.upload_sequence_token)
    }

    /// 기준 시각에서 오래된 레코드를 제외하고 배치를 인코딩합니다.
    fn encode_batch(
        &self,
        records: &[Record],
        now: DateTime<Utc>,
    ) -> Result<Vec<InputLogEvent>, ShipperError> {
        let cutoff = (now - TimeDelta::hours(STALE_AFTER_HOURS)).timestamp_micros();

        let mut events = Vec::with_capacity(records.len());
        let mut stale = 0usize;
        for record in records {
            if record.received_at_micros < cutoff {
                stale += 1;
                continue;
            }
            events.push(self.encode(record)?);
        }

        if stale > 0 {
            metrics::counter!(m::UPLOADER_RECORDS_STALE_TOTAL).increment(stale as u64);
            tracing::debug!(stale, "skipped records older than 24 hours");
        }
        Ok(events)
    }

    /// 레코드 하나를 전송 이벤트로 인코딩합니다.
    pub fn encode(&self, record: &Record) -> Result<InputLogEvent, ShipperError> {
        let message = if self.raw_message {
            record.message.clone()
        } else {
            serde_json::to_string_pretty(record)?
        };
        Ok(InputLogEvent {
            message,
            timestamp: record.received_at_micros / 1000,
        })
    }
}
