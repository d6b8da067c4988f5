//! 전송 파이프라인 에러 타입
//!
//! [`ShipperError`]는 정규화, 전송, 상태 저장 과정에서 발생하는 모든 에러를 표현합니다.
//! `From<ShipperError> for JournalshipError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use journalship_core::error::{JournalshipError, PipelineError};

use crate::stream::DeliveryFault;

/// 전송 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ShipperError {
    /// journal 읽기 실패 (엔트리 조회, 커서 이동)
    #[error("journal error: {0}")]
    Journal(String),

    /// 로그 이벤트 전송 실패
    #[error("failed to put events: {0}")]
    PutEvents(DeliveryFault),

    /// 로그 스트림 생성 실패
    #[error("failed to create stream '{stream}': {fault}")]
    CreateStream {
        /// 생성하려던 스트림 이름
        stream: String,
        /// 원격 서비스 장애
        fault: DeliveryFault,
    },

    /// 시퀀스 토큰 재동기화 실패
    #[error("failed to get next sequence token: {0}")]
    SequenceToken(String),

    /// 레코드 직렬화 실패
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    /// 커서 상태 파일 에러
    #[error("state error: {path}: {reason}")]
    State {
        /// 상태 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ShipperError> for JournalshipError {
    fn from(err: ShipperError) -> Self {
        match err {
            ShipperError::Journal(reason) => {
                JournalshipError::Pipeline(PipelineError::Journal(reason))
            }
            ShipperError::Config { .. } | ShipperError::State { .. } => {
                JournalshipError::Pipeline(PipelineError::InitFailed(err.to_string()))
            }
            ShipperError::Io(e) => JournalshipError::Io(e),
            other => JournalshipError::Pipeline(PipelineError::Delivery(other.to_string())),
        }
    }
}
