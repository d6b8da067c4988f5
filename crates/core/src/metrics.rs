//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `journalship_`
//! - 모듈명: `normalizer_`, `uploader_`, `pipeline_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(journalship_core::metrics::NORMALIZER_RECORDS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 전송 장애 종류 레이블 키 (stream_not_found, already_accepted, invalid_sequence_token, other)
pub const LABEL_FAULT: &str = "fault";

// ─── Normalizer 메트릭 ─────────────────────────────────────────────

/// Normalizer: 정규화된 레코드 수 (counter)
pub const NORMALIZER_RECORDS_TOTAL: &str = "journalship_normalizer_records_total";

/// Normalizer: 재조립에 사용된 조각 수 (counter)
pub const NORMALIZER_FRAGMENTS_JOINED_TOTAL: &str = "journalship_normalizer_fragments_joined_total";

// ─── Uploader 메트릭 ───────────────────────────────────────────────

/// Uploader: 24시간 초과로 제외된 레코드 수 (counter)
pub const UPLOADER_RECORDS_STALE_TOTAL: &str = "journalship_uploader_records_stale_total";

/// Uploader: 전송 완료된 배치 수 (counter)
pub const UPLOADER_BATCHES_DELIVERED_TOTAL: &str = "journalship_uploader_batches_delivered_total";

/// Uploader: 전송 완료된 이벤트 수 (counter)
pub const UPLOADER_EVENTS_DELIVERED_TOTAL: &str = "journalship_uploader_events_delivered_total";

/// Uploader: 원격 서비스가 보고한 장애 수 (counter, label: fault)
pub const UPLOADER_DELIVERY_FAULTS_TOTAL: &str = "journalship_uploader_delivery_faults_total";

// ─── Pipeline 메트릭 ───────────────────────────────────────────────

/// Pipeline: 버퍼 내 레코드 수 (gauge)
pub const PIPELINE_BUFFER_SIZE: &str = "journalship_pipeline_buffer_size";

/// Pipeline: 버퍼 사용률 0.0~1.0 (gauge)
pub const PIPELINE_BUFFER_UTILIZATION: &str = "journalship_pipeline_buffer_utilization";

/// Pipeline: 전송 실패한 배치 수 (counter)
pub const PIPELINE_BATCHES_FAILED_TOTAL: &str = "journalship_pipeline_batches_failed_total";

/// Pipeline: 버퍼 초과 또는 재시도 한도 초과로 버린 레코드 수 (counter)
pub const PIPELINE_RECORDS_DROPPED_TOTAL: &str = "journalship_pipeline_records_dropped_total";

/// Pipeline: journal 읽기 에러 수 (counter)
pub const PIPELINE_JOURNAL_ERRORS_TOTAL: &str = "journalship_pipeline_journal_errors_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    // Normalizer
    describe_counter!(
        NORMALIZER_RECORDS_TOTAL,
        "Total number of journal entries normalized into records"
    );
    describe_counter!(
        NORMALIZER_FRAGMENTS_JOINED_TOTAL,
        "Total number of continuation entries appended to fragmented messages"
    );

    // Uploader
    describe_counter!(
        UPLOADER_RECORDS_STALE_TOTAL,
        "Total number of records skipped because they were older than 24 hours"
    );
    describe_counter!(
        UPLOADER_BATCHES_DELIVERED_TOTAL,
        "Total number of batches accepted by the log stream"
    );
    describe_counter!(
        UPLOADER_EVENTS_DELIVERED_TOTAL,
        "Total number of log events accepted by the log stream"
    );
    describe_counter!(
        UPLOADER_DELIVERY_FAULTS_TOTAL,
        "Delivery faults reported by the log stream service, by fault kind"
    );

    // Pipeline
    describe_gauge!(
        PIPELINE_BUFFER_SIZE,
        "Current number of records waiting in the delivery buffer"
    );
    describe_gauge!(
        PIPELINE_BUFFER_UTILIZATION,
        "Fraction of the delivery buffer capacity in use"
    );
    describe_counter!(
        PIPELINE_BATCHES_FAILED_TOTAL,
        "Total number of batch delivery attempts that failed"
    );
    describe_counter!(
        PIPELINE_RECORDS_DROPPED_TOTAL,
        "Total number of records dropped before delivery"
    );
    describe_counter!(
        PIPELINE_JOURNAL_ERRORS_TOTAL,
        "Total number of journal read failures"
    );
}
