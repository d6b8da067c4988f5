//! journalship 공통 타입, 에러, 설정, 메트릭 이름
//!
//! # 모듈 구성
//!
//! - [`types`]: journal 원시 엔트리와 정규화된 레코드
//! - [`config`]: `journalship.toml` 설정
//! - [`error`]: 도메인 에러 타입
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, JournalshipError, PipelineError};

// 설정
pub use config::{GeneralConfig, JournalshipConfig, ShipperConfig};

// 도메인 타입
pub use types::{JournalEntry, Priority, Record, RecordKernel, RecordSyslog};
