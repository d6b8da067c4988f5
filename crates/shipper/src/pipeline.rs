//! 파이프라인 오케스트레이션 -- journal 읽기부터 배치 전송까지의 전체 흐름을 관리합니다.
//!
//! # 내부 아키텍처
//! ```text
//! JournalSource -> RecordNormalizer -> RecordBuffer -> BatchUploader -> LogStreamClient
//!                                                          |
//!                                                          v
//!                                                     CursorStore
//! ```
//!
//! 프로세스당 하나의 파이프라인이 하나의 스트림으로 전송합니다.
//! 실패한 배치는 다음 플러시에서 먼저 재시도되며, 연속 실패가
//! `max_batch_retries`에 도달하면 버려집니다.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use journalship_core::metrics as m;
use journalship_core::types::Record;

use crate::buffer::RecordBuffer;
use crate::config::PipelineConfig;
use crate::error::ShipperError;
use crate::journal::{Advance, JournalSource};
use crate::normalizer::RecordNormalizer;
use crate::state::CursorStore;
use crate::stream::LogStreamClient;
use crate::uploader::BatchUploader;

/// 전송에 실패해 재시도를 기다리는 배치
#[derive(Debug)]
struct PendingBatch {
    records: Vec<Record>,
    /// 연속 실패 횟수
    failures: u32,
}

/// journal → 로그 스트림 전송 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use journalship_shipper::{ShipperPipelineBuilder, CursorStore};
///
/// let mut pipeline = ShipperPipelineBuilder::new(journal, client)
///     .config(config)
///     .cursor_store(CursorStore::new("/var/lib/journalship/state"))
///     .build()
///     .await?;
///
/// pipeline.run(cancel_token).await;
/// ```
pub struct ShipperPipeline<J, C> {
    config: PipelineConfig,
    journal: J,
    normalizer: RecordNormalizer,
    uploader: BatchUploader<C>,
    buffer: RecordBuffer,
    cursor_store: CursorStore,
    pending: Option<PendingBatch>,
    last_flush: Instant,
    shipped_count: u64,
    failed_batch_count: u64,
    dropped_count: u64,
    journal_error_count: u64,
}

impl<J: JournalSource, C: LogStreamClient> ShipperPipeline<J, C> {
    /// 취소될 때까지 journal을 읽고 전송합니다.
    ///
    /// 취소되면 남은 레코드를 한 번 더 전송한 뒤 반환합니다.
    pub async fn run(&mut self, cancel: CancellationToken) {
        tracing::info!(
            group = %self.config.log_group,
            stream = %self.config.log_stream,
            batch_size = self.config.batch_size,
            "starting shipper pipeline"
        );

        let poll_wait = Duration::from_millis(self.config.poll_wait_ms);

        loop {
            let advance = tokio::select! {
                _ = cancel.cancelled() => break,
                advance = self.journal.next() => advance,
            };

            match advance {
                Ok(Advance::Advanced) => {
                    match self.normalizer.normalize(&mut self.journal).await {
                        Ok(record) => self.enqueue(record),
                        Err(e) => self.record_journal_error(&e),
                    }
                    let batch_ready =
                        self.pending.is_none() && self.buffer.should_flush(self.config.batch_size);
                    if batch_ready || self.flush_due() {
                        self.flush_logged().await;
                    }
                }
                Ok(Advance::NoNewEntry) => {
                    if self.flush_due() {
                        self.flush_logged().await;
                        continue;
                    }
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        () = self.journal.wait(poll_wait) => {}
                    }
                }
                Err(e) => {
                    self.record_journal_error(&e);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        () = tokio::time::sleep(poll_wait) => {}
                    }
                }
            }
        }

        self.shutdown_flush().await;
        tracing::info!(
            shipped = self.shipped_count,
            failed_batches = self.failed_batch_count,
            dropped = self.dropped_count,
            "shipper pipeline stopped"
        );
    }

    /// 배치 하나를 전송합니다.
    ///
    /// 재시도 대기 중인 배치가 있으면 그것을, 없으면 버퍼 앞쪽
    /// `batch_size`개를 보냅니다. 스트림에 기록된 이벤트 수를 반환하며,
    /// 24시간 필터로 제외된 레코드는 세지 않습니다.
    pub async fn flush(&mut self) -> Result<usize, ShipperError> {
        self.last_flush = Instant::now();

        let mut batch = match self.pending.take() {
            Some(batch) => batch,
            None => PendingBatch {
                records: self.buffer.drain_batch(self.config.batch_size),
                failures: 0,
            },
        };
        self.report_buffer();

        if batch.records.is_empty() {
            return Ok(0);
        }

        match self.uploader.deliver(&batch.records).await {
            Ok(outcome) => {
                let events = outcome.events();
                if let Some(token) = outcome.into_next_token() {
                    // 저장 실패 시 재시작 후 토큰 재동기화로 복구됨
                    if let Err(e) = self.cursor_store.save(&token).await {
                        tracing::warn!(error = %e, "failed to persist sequence token");
                    }
                }
                self.shipped_count += events as u64;
                Ok(events)
            }
            Err(e) => {
                batch.failures += 1;
                self.failed_batch_count += 1;
                metrics::counter!(m::PIPELINE_BATCHES_FAILED_TOTAL).increment(1);

                if batch.failures >= self.config.max_batch_retries {
                    let count = batch.records.len();
                    self.dropped_count += count as u64;
                    metrics::counter!(m::PIPELINE_RECORDS_DROPPED_TOTAL).increment(count as u64);
                    tracing::error!(
                        error = %e,
                        records = count,
                        failures = batch.failures,
                        "giving up on batch after repeated delivery failures"
                    );
                } else {
                    self.pending = Some(batch);
                }
                Err(e)
            }
        }
    }

    /// 재시도 대기 중인 배치와 버퍼의 레코드를 모두 한 번씩 전송합니다.
    async fn shutdown_flush(&mut self) {
        while self.pending.is_some() || !self.buffer.is_empty() {
            if let Err(e) = self.flush().await {
                let unsent = self.buffer.len()
                    + self.pending.as_ref().map_or(0, |batch| batch.records.len());
                tracing::warn!(
                    error = %e,
                    unsent,
                    "final flush failed, remaining records were not delivered"
                );
                break;
            }
        }
    }

    async fn flush_logged(&mut self) {
        if let Err(e) = self.flush().await {
            tracing::warn!(error = %e, "batch delivery failed");
        }
    }

    fn enqueue(&mut self, record: Record) {
        if self.buffer.push(record) {
            self.dropped_count += 1;
            metrics::counter!(m::PIPELINE_RECORDS_DROPPED_TOTAL).increment(1);
        }
        self.report_buffer();
    }

    fn report_buffer(&self) {
        metrics::gauge!(m::PIPELINE_BUFFER_SIZE).set(self.buffer.len() as f64);
        metrics::gauge!(m::PIPELINE_BUFFER_UTILIZATION).set(self.buffer.utilization());
    }

    fn record_journal_error(&mut self, err: &ShipperError) {
        self.journal_error_count += 1;
        metrics::counter!(m::PIPELINE_JOURNAL_ERRORS_TOTAL).increment(1);
        tracing::warn!(error = %err, "failed to read journal");
    }

    fn flush_due(&self) -> bool {
        let has_records = self.pending.is_some() || !self.buffer.is_empty();
        has_records
            && self.last_flush.elapsed() >= Duration::from_secs(self.config.flush_interval_secs)
    }
}

impl<J, C> ShipperPipeline<J, C> {
    /// 전송에 성공한 레코드 수
    pub fn shipped_count(&self) -> u64 {
        self.shipped_count
    }

    /// 전송에 실패한 배치 시도 수
    pub fn failed_batch_count(&self) -> u64 {
        self.failed_batch_count
    }

    /// 버퍼 초과 또는 재시도 한도 초과로 버린 레코드 수
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    pub fn journal_error_count(&self) -> u64 {
        self.journal_error_count
    }

    /// 버퍼에 쌓인 레코드 수
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// 재시도 대기 중인 레코드 수
    pub fn pending_len(&self) -> usize {
        self.pending.as_ref().map_or(0, |batch| batch.records.len())
    }

    pub fn uploader(&self) -> &BatchUploader<C> {
        &self.uploader
    }
}

/// 파이프라인 빌더
pub struct ShipperPipelineBuilder<J, C> {
    journal: J,
    client: C,
    config: PipelineConfig,
    cursor_store: Option<CursorStore>,
}

impl<J: JournalSource, C: LogStreamClient> ShipperPipelineBuilder<J, C> {
    /// journal 리더와 로그 스트림 클라이언트로 빌더를 생성합니다.
    pub fn new(journal: J, client: C) -> Self {
        Self {
            journal,
            client,
            config: PipelineConfig::default(),
            cursor_store: None,
        }
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 시퀀스 토큰 저장소를 설정합니다.
    ///
    /// 설정하지 않으면 `state_file` 경로의 저장소를 사용합니다.
    pub fn cursor_store(mut self, store: CursorStore) -> Self {
        self.cursor_store = Some(store);
        self
    }

    /// 설정을 검증하고, 저장된 토큰을 읽어 파이프라인을 생성합니다.
    pub async fn build(self) -> Result<ShipperPipeline<J, C>, ShipperError> {
        self.config.validate()?;

        let cursor_store = self
            .cursor_store
            .unwrap_or_else(|| CursorStore::new(&self.config.state_file));
        let token = cursor_store.load().await?;
        if let Some(token) = token.as_deref() {
            tracing::info!(token, "resuming from saved sequence token");
        }

        let uploader = BatchUploader::new(
            self.client,
            self.config.log_group.clone(),
            self.config.log_stream.clone(),
            self.config.raw_message,
        )
        .with_sequence_token(token);

        Ok(ShipperPipeline {
            normalizer: RecordNormalizer::new(self.config.instance_id.clone()),
            buffer: RecordBuffer::new(self.config.buffer_capacity, self.config.drop_policy),
            uploader,
            journal: self.journal,
            cursor_store,
            config: self.config,
            pending: None,
            last_flush: Instant::now(),
            shipped_count: 0,
            failed_batch_count: 0,
            dropped_count: 0,
            journal_error_count: 0,
        })
    }
}
