//! 에러 타입 — 도메인별 에러 정의

/// journalship 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum JournalshipError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 배치 전송 실패
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// journal 읽기 실패
    #[error("journal read failed: {0}")]
    Journal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_top_level() {
        let err: JournalshipError = ConfigError::InvalidValue {
            field: "shipper.log_group".to_owned(),
            reason: "must not be empty".to_owned(),
        }
        .into();
        assert!(matches!(err, JournalshipError::Config(_)));
        assert!(err.to_string().contains("shipper.log_group"));
    }

    #[test]
    fn pipeline_error_display() {
        let err = PipelineError::Delivery("stream not found".to_owned());
        assert_eq!(err.to_string(), "delivery failed: stream not found");
    }
}
