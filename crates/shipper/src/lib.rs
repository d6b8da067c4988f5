#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`journal`]: journal 리더 추상화 ([`JournalSource`])
//! - [`normalizer`]: 원시 엔트리 → [`Record`](journalship_core::Record) 정규화 및 메시지 재조립
//! - [`stream`]: 원격 로그 스트림 클라이언트 추상화 ([`LogStreamClient`])
//! - [`uploader`]: 시퀀스 토큰 기반 배치 전송 및 장애 복구
//! - [`buffer`]: 인메모리 레코드 버퍼
//! - [`state`]: 시퀀스 토큰 영속화
//! - [`pipeline`]: 전체 흐름 오케스트레이션
//! - [`config`]: 파이프라인 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! JournalSource -> RecordNormalizer -> RecordBuffer -> BatchUploader -> LogStreamClient
//!                   (재조립)                            (장애 복구)          |
//!                                                           |           CursorStore
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod journal;
pub mod normalizer;
pub mod pipeline;
pub mod state;
pub mod stream;
pub mod uploader;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{ShipperPipeline, ShipperPipelineBuilder};

// 설정
pub use config::{DropPolicy, PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::ShipperError;

// journal
pub use journal::{Advance, JournalSource};

// 정규화
pub use normalizer::RecordNormalizer;

// 원격 스트림
pub use stream::{
    DeliveryFault, DescribeLogStreamsRequest, InputLogEvent, LogStreamClient,
    LogStreamDescriptor, PutLogEventsOutput, PutLogEventsRequest,
};

// 업로더
pub use uploader::{BatchUploader, DeliveryOutcome};

// 버퍼
pub use buffer::RecordBuffer;

// 상태
pub use state::CursorStore;
