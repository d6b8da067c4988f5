//! 설정 관리 — journalship.toml 파싱 및 런타임 설정
//!
//! [`JournalshipConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`JOURNALSHIP_SHIPPER_LOG_STREAM=web-01` 형식)
//! 2. 설정 파일 (`journalship.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), journalship_core::error::JournalshipError> {
//! use journalship_core::config::JournalshipConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = JournalshipConfig::load("journalship.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = JournalshipConfig::parse("[shipper]\nlog_group = \"prod\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, JournalshipError};

/// 원격 서비스가 한 번의 호출로 받는 최대 이벤트 수
pub const MAX_EVENTS_PER_BATCH: usize = 10_000;

/// 로그 그룹/스트림 이름 최대 길이
pub const MAX_NAME_LEN: usize = 512;

/// journalship 통합 설정
///
/// `journalship.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalshipConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 전송 설정
    #[serde(default)]
    pub shipper: ShipperConfig,
}

impl JournalshipConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, JournalshipError> {
        let mut config = Self::read_file(path.as_ref()).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, JournalshipError> {
        let config = Self::read_file(path.as_ref()).await?;
        config.validate()?;
        Ok(config)
    }

    async fn read_file(path: &Path) -> Result<Self, JournalshipError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                JournalshipError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                JournalshipError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, JournalshipError> {
        toml::from_str(toml_str).map_err(|e| {
            JournalshipError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `JOURNALSHIP_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "JOURNALSHIP_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "JOURNALSHIP_GENERAL_LOG_FORMAT");
        override_string(
            &mut self.general.instance_id,
            "JOURNALSHIP_GENERAL_INSTANCE_ID",
        );
        override_string(&mut self.general.state_file, "JOURNALSHIP_GENERAL_STATE_FILE");

        // Shipper
        override_string(&mut self.shipper.log_group, "JOURNALSHIP_SHIPPER_LOG_GROUP");
        override_string(&mut self.shipper.log_stream, "JOURNALSHIP_SHIPPER_LOG_STREAM");
        override_bool(
            &mut self.shipper.raw_message,
            "JOURNALSHIP_SHIPPER_RAW_MESSAGE",
        );
        override_usize(
            &mut self.shipper.batch_size,
            "JOURNALSHIP_SHIPPER_BATCH_SIZE",
        );
        override_u64(
            &mut self.shipper.flush_interval_secs,
            "JOURNALSHIP_SHIPPER_FLUSH_INTERVAL_SECS",
        );
        override_usize(
            &mut self.shipper.buffer_capacity,
            "JOURNALSHIP_SHIPPER_BUFFER_CAPACITY",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), JournalshipError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.general.state_file.is_empty() {
            return Err(invalid("general.state_file", "must not be empty".to_owned()));
        }

        validate_log_group_name(&self.shipper.log_group)?;
        validate_log_stream_name(&self.shipper.log_stream)?;

        if self.shipper.batch_size == 0 || self.shipper.batch_size > MAX_EVENTS_PER_BATCH {
            return Err(invalid(
                "shipper.batch_size",
                format!("must be 1-{MAX_EVENTS_PER_BATCH}"),
            ));
        }

        if self.shipper.flush_interval_secs == 0 || self.shipper.flush_interval_secs > 3600 {
            return Err(invalid(
                "shipper.flush_interval_secs",
                "must be 1-3600".to_owned(),
            ));
        }

        if self.shipper.buffer_capacity < self.shipper.batch_size {
            return Err(invalid(
                "shipper.buffer_capacity",
                format!(
                    "must be at least batch_size ({})",
                    self.shipper.batch_size
                ),
            ));
        }

        Ok(())
    }
}

/// 일반 설정
///
/// `log_level`과 `log_format`은 subscriber를 설치하는 호스트 프로세스용
/// 값입니다. 라이브러리는 검증만 하고 tracing 이벤트만 발생시킵니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 호스트 프로세스의 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 호스트 프로세스의 로그 형식 (json, pretty)
    pub log_format: String,
    /// 레코드에 기록할 인스턴스 식별자 (비어 있으면 생략)
    pub instance_id: String,
    /// 시퀀스 토큰 저장 파일 경로
    pub state_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            instance_id: String::new(),
            state_file: "/var/lib/journalship/state".to_owned(),
        }
    }
}

/// 전송 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipperConfig {
    /// 대상 로그 그룹 이름
    pub log_group: String,
    /// 대상 로그 스트림 이름
    pub log_stream: String,
    /// `true`면 메시지 본문만 전송, `false`면 레코드 전체를 JSON으로 전송
    pub raw_message: bool,
    /// 배치 크기 (이 개수만큼 모이면 전송)
    pub batch_size: usize,
    /// 배치 전송 간격 (초)
    pub flush_interval_secs: u64,
    /// 인메모리 버퍼 최대 용량
    pub buffer_capacity: usize,
}

impl Default for ShipperConfig {
    fn default() -> Self {
        Self {
            log_group: "journal".to_owned(),
            log_stream: "default".to_owned(),
            raw_message: false,
            batch_size: 100,
            flush_interval_secs: 5,
            buffer_capacity: 10_000,
        }
    }
}

/// 로그 그룹 이름을 검증합니다.
///
/// 1-512자, `[A-Za-z0-9._/#-]`만 허용합니다.
pub fn validate_log_group_name(name: &str) -> Result<(), JournalshipError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(invalid(
            "shipper.log_group",
            format!("length must be 1-{MAX_NAME_LEN}"),
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '#' | '-')))
    {
        return Err(invalid(
            "shipper.log_group",
            format!("contains invalid character '{c}'"),
        ));
    }
    Ok(())
}

/// 로그 스트림 이름을 검증합니다.
///
/// 1-512자, `:`와 `*`는 허용하지 않습니다.
pub fn validate_log_stream_name(name: &str) -> Result<(), JournalshipError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(invalid(
            "shipper.log_stream",
            format!("length must be 1-{MAX_NAME_LEN}"),
        ));
    }
    if let Some(c) = name.chars().find(|c| matches!(c, ':' | '*')) {
        return Err(invalid(
            "shipper.log_stream",
            format!("contains invalid character '{c}'"),
        ));
    }
    Ok(())
}

fn invalid(field: &str, reason: String) -> JournalshipError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
