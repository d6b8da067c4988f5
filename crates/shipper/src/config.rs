//! 전송 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`JournalshipConfig`]에서 파생되며,
//! 파이프라인 내부에서만 쓰는 확장 설정을 포함합니다.
//!
//! # 사용 예시
//! ```ignore
//! use journalship_core::config::JournalshipConfig;
//! use journalship_shipper::config::PipelineConfig;
//!
//! let core_config = JournalshipConfig::default();
//! let config = PipelineConfig::from_core(&core_config);
//! ```

use serde::{Deserialize, Serialize};

use journalship_core::config::{
    JournalshipConfig, MAX_EVENTS_PER_BATCH, validate_log_group_name, validate_log_stream_name,
};

use crate::error::ShipperError;

/// 버퍼 오버플로우 시 드롭 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropPolicy {
    /// 가장 오래된 레코드를 드롭 (기본값)
    #[default]
    Oldest,
    /// 새 레코드를 거부
    Newest,
}

/// 전송 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 레코드에 기록할 인스턴스 식별자
    pub instance_id: String,
    pub log_group: String,
    pub log_stream: String,
    /// 메시지 본문만 전송할지 여부
    pub raw_message: bool,
    /// 배치 크기 (이 개수만큼 모이면 전송)
    pub batch_size: usize,
    /// 배치 전송 간격 (초)
    pub flush_interval_secs: u64,
    /// 인메모리 버퍼 최대 용량
    pub buffer_capacity: usize,
    /// 시퀀스 토큰 저장 파일 경로
    pub state_file: String,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 버퍼 오버플로우 드롭 정책
    pub drop_policy: DropPolicy,
    /// 배치를 버리기 전까지 연속 전송 실패 허용 횟수
    pub max_batch_retries: u32,
    /// 새 엔트리가 없을 때 journal 대기 시간 (밀리초)
    pub poll_wait_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_core(&JournalshipConfig::default())
    }
}

impl PipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &JournalshipConfig) -> Self {
        Self {
            instance_id: core.general.instance_id.clone(),
            log_group: core.shipper.log_group.clone(),
            log_stream: core.shipper.log_stream.clone(),
            raw_message: core.shipper.raw_message,
            batch_size: core.shipper.batch_size,
            flush_interval_secs: core.shipper.flush_interval_secs,
            buffer_capacity: core.shipper.buffer_capacity,
            state_file: core.general.state_file.clone(),
            drop_policy: DropPolicy::Oldest,
            max_batch_retries: 5,
            poll_wait_ms: 1000,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ShipperError> {
        const MAX_FLUSH_INTERVAL_SECS: u64 = 3600;
        const MAX_POLL_WAIT_MS: u64 = 60_000;

        validate_log_group_name(&self.log_group)
            .map_err(|e| config_error("log_group", e.to_string()))?;
        validate_log_stream_name(&self.log_stream)
            .map_err(|e| config_error("log_stream", e.to_string()))?;

        if self.batch_size == 0 || self.batch_size > MAX_EVENTS_PER_BATCH {
            return Err(config_error(
                "batch_size",
                format!("must be 1-{MAX_EVENTS_PER_BATCH}"),
            ));
        }

        if self.flush_interval_secs == 0 || self.flush_interval_secs > MAX_FLUSH_INTERVAL_SECS {
            return Err(config_error(
                "flush_interval_secs",
                format!("must be 1-{MAX_FLUSH_INTERVAL_SECS}"),
            ));
        }

        if self.buffer_capacity < self.batch_size {
            return Err(config_error(
                "buffer_capacity",
                format!("must be at least batch_size ({})", self.batch_size),
            ));
        }

        if self.max_batch_retries == 0 {
            return Err(config_error(
                "max_batch_retries",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.poll_wait_ms == 0 || self.poll_wait_ms > MAX_POLL_WAIT_MS {
            return Err(config_error(
                "poll_wait_ms",
                format!("must be 1-{MAX_POLL_WAIT_MS}"),
            ));
        }

        Ok(())
    }
}

fn config_error(field: &str, reason: String) -> ShipperError {
    ShipperError::Config {
        field: field.to_owned(),
        reason,
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_id(mut self, id: impl Into<String>) -> Self {
        self.config.instance_id = id.into();
        self
    }

    pub fn log_group(mut self, group: impl Into<String>) -> Self {
        self.config.log_group = group.into();
        self
    }

    pub fn log_stream(mut self, stream: impl Into<String>) -> Self {
        self.config.log_stream = stream.into();
        self
    }

    pub fn raw_message(mut self, raw: bool) -> Self {
        self.config.raw_message = raw;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn flush_interval_secs(mut self, secs: u64) -> Self {
        self.config.flush_interval_secs = secs;
        self
    }

    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity;
        self
    }

    pub fn state_file(mut self, path: impl Into<String>) -> Self {
        self.config.state_file = path.into();
        self
    }

    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.config.drop_policy = policy;
        self
    }

    pub fn max_batch_retries(mut self, retries: u32) -> Self {
        self.config.max_batch_retries = retries;
        self
    }

    pub fn poll_wait_ms(mut self, ms: u64) -> Self {
        self.config.poll_wait_ms = ms;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, ShipperError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
