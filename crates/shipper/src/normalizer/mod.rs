//! 레코드 정규화 -- journal 원시 엔트리를 [`Record`]로 변환합니다.
//!
//! # 처리 단계
//! 1. 현재 엔트리 조회 (실패 시 즉시 에러 반환)
//! 2. 수신 시각 복사
//! 3. 필드 테이블([`fields`])에 따라 필드 채우기
//! 4. 조각난 메시지 재조립
//!
//! # 메시지 재조립
//! journal은 긴 JSON 메시지를 여러 엔트리로 나눠 기록할 수 있습니다.
//! 메시지가 `{"`로 시작하고 `}`로 끝나지 않으면 다음 엔트리의 `MESSAGE`를
//! 구분자 없이 이어 붙입니다. 최대 [`MAX_FRAGMENTS`]개까지 붙이며,
//! 끝내 닫히지 않은 메시지도 정상 데이터로 취급합니다.

pub mod fields;

use std::time::Duration;

use journalship_core::metrics as m;
use journalship_core::types::{JournalEntry, Record};

use crate::error::ShipperError;
use crate::journal::{Advance, JournalSource};

/// 하나의 레코드에 이어 붙일 수 있는 최대 조각 수
pub const MAX_FRAGMENTS: usize = 10;

/// 재조립 중 허용하는 최대 대기 횟수
pub const MAX_REASSEMBLY_WAITS: usize = 10;

/// 재조립 중 새 엔트리를 기다리는 시간
pub const REASSEMBLY_WAIT: Duration = Duration::from_secs(2);

/// journal 엔트리 정규화기
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer {
    instance_id: String,
}

impl RecordNormalizer {
    /// 레코드에 기록할 인스턴스 식별자로 정규화기를 생성합니다.
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
        }
    }

    /// 엔트리 하나를 레코드로 변환합니다. 재조립은 하지 않습니다.
    pub fn record_from_entry(&self, entry: &JournalEntry) -> Record {
        let mut record = Record {
            instance_id: self.instance_id.clone(),
            received_at_micros: i64::try_from(entry.realtime_timestamp).unwrap_or(i64::MAX),
            ..Record::default()
        };
        fields::populate(&mut record, entry);
        record.priority = fields::decode_priority(entry);
        record
    }

    /// journal의 현재 엔트리를 정규화합니다.
    ///
    /// 메시지가 조각나 있으면 `source`를 앞으로 이동시키며 이어지는 엔트리를
    /// 소비합니다. 반환 시 `source`는 마지막으로 소비한 엔트리에 위치합니다.
    pub async fn normalize<S: JournalSource>(
        &self,
        source: &mut S,
    ) -> Result<Record, ShipperError> {
        let entry = source.get_entry().await?;
        let mut record = self.record_from_entry(&entry);

        let joined = reassemble(source, &mut record.message).await;
        if joined > 0 {
            metrics::counter!(m::NORMALIZER_FRAGMENTS_JOINED_TOTAL).increment(joined as u64);
            tracing::debug!(
                fragments = joined,
                len = record.message.len(),
                "joined fragmented message"
            );
        }

        metrics::counter!(m::NORMALIZER_RECORDS_TOTAL).increment(1);
        Ok(record)
    }
}

/// 메시지가 닫히지 않은 JSON 객체로 보이는지 확인합니다.
pub fn looks_fragmented(message: &str) -> bool {
    message.starts_with("{\"") && !message.ends_with('}')
}

/// 조각난 메시지에 이어지는 엔트리를 붙이고, 붙인 조각 수를 반환합니다.
async fn reassemble<S: JournalSource>(source: &mut S, message: &mut String) -> usize {
    let mut fragments = 0;
    let mut waits = 0;

    while looks_fragmented(message) && fragments < MAX_FRAGMENTS {
        match source.next().await {
            Ok(Advance::Advanced) => {}
            Ok(Advance::NoNewEntry) => {
                if waits >= MAX_REASSEMBLY_WAITS {
                    tracing::warn!(
                        fragments,
                        waits,
                        "no continuation entry arrived, emitting partial message"
                    );
                    break;
                }
                waits += 1;
                source.wait(REASSEMBLY_WAIT).await;
                continue;
            }
            Err(e) => {
                if waits >= MAX_REASSEMBLY_WAITS {
                    tracing::warn!(
                        error = %e,
                        fragments,
                        "journal kept failing while joining message, emitting partial message"
                    );
                    break;
                }
                waits += 1;
                tracing::warn!(
                    error = %e,
                    "failed to advance journal while joining message, retrying"
                );
                tokio::time::sleep(REASSEMBLY_WAIT).await;
                continue;
            }
        }

        match source.get_entry().await {
            Ok(entry) => {
                message.push_str(entry.field(fields::FIELD_MESSAGE).unwrap_or_default());
                fragments += 1;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fragments,
                    "failed to read continuation entry, emitting partial message"
                );
                break;
            }
        }
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{MockJournal, MockStep};
    use journalship_core::types::Priority;

    fn entry(ts: u64, msg: &str) -> JournalEntry {
        JournalEntry::new(ts).with_field(fields::FIELD_MESSAGE, msg)
    }

    async fn positioned(mut journal: MockJournal) -> MockJournal {
        assert_eq!(journal.next().await.unwrap(), Advance::Advanced);
        journal
    }

    #[test]
    fn fragment_detection() {
        assert!(looks_fragmented(r#"{"a":1"#));
        assert!(!looks_fragmented(r#"{"a":1}"#));
        assert!(!looks_fragmented("plain text"));
        assert!(!looks_fragmented("{ not json"));
        assert!(!looks_fragmented(""));
    }

    #[test]
    fn record_from_entry_maps_all_fields() {
        let entry = JournalEntry::new(1_700_000_000_123_456)
            .with_field("_COMM", "sshd")
            .with_field("PRIORITY", "3")
            .with_field("MESSAGE", "auth failed")
            .with_field("MESSAGE_ID", "abc")
            .with_field("SYSLOG_FACILITY", "4")
            .with_field("SYSLOG_IDENTIFIER", "sshd")
            .with_field("SYSLOG_PID", "812")
            .with_field("_KERNEL_DEVICE", "b8:0")
            .with_field("_KERNEL_SUBSYSTEM", "block")
            .with_field("_UDEV_SYSNAME", "sda")
            .with_field("_UDEV_DEVNODE", "/dev/sda");

        let record = RecordNormalizer::new("i-0abc").record_from_entry(&entry);
        assert_eq!(record.instance_id, "i-0abc");
        assert_eq!(record.received_at_micros, 1_700_000_000_123_456);
        assert_eq!(record.command, "sshd");
        assert_eq!(record.priority, Some(Priority::Error));
        assert_eq!(record.message, "auth failed");
        assert_eq!(record.message_id, "abc");
        assert_eq!(record.syslog.facility, 4);
        assert_eq!(record.syslog.identifier, "sshd");
        assert_eq!(record.syslog.pid, 812);
        assert_eq!(record.kernel.device, "b8:0");
        assert_eq!(record.kernel.subsystem, "block");
        assert_eq!(record.kernel.sys_name, "sda");
        assert_eq!(record.kernel.dev_node, "/dev/sda");
    }

    #[test]
    fn record_from_entry_absent_fields_are_zero() {
        let record = RecordNormalizer::default().record_from_entry(&JournalEntry::new(5));
        assert_eq!(
            record,
            Record {
                received_at_micros: 5,
                ..Record::default()
            }
        );
    }

    #[tokio::test]
    async fn normalize_fetch_failure_propagates() {
        let mut journal = MockJournal::new(vec![entry(1, "x")]);
        let result = RecordNormalizer::default().normalize(&mut journal).await;
        assert!(matches!(result, Err(ShipperError::Journal(_))));
    }

    #[tokio::test]
    async fn normalize_single_entry_does_not_advance() {
        let mut journal =
            positioned(MockJournal::new(vec![entry(1, "hello"), entry(2, "next")])).await;
        let record = RecordNormalizer::default()
            .normalize(&mut journal)
            .await
            .unwrap();
        assert_eq!(record.message, "hello");
        assert_eq!(journal.next_calls, 1);
    }

    #[tokio::test]
    async fn normalize_joins_one_continuation() {
        let mut journal = positioned(MockJournal::new(vec![
            entry(1, r#"{"a":1"#),
            entry(2, r#","b":2}"#),
        ]))
        .await;
        let record = RecordNormalizer::default()
            .normalize(&mut journal)
            .await
            .unwrap();
        assert_eq!(record.message, r#"{"a":1,"b":2}"#);
        // 수신 시각은 첫 엔트리 기준
        assert_eq!(record.received_at_micros, 1);
        assert_eq!(journal.next_calls, 2);
    }

    #[tokio::test]
    async fn normalize_stops_after_max_fragments() {
        let mut entries = vec![entry(0, r#"{"k":"#)];
        entries.extend((1..=15).map(|i| entry(i, "x")));
        let mut journal = positioned(MockJournal::new(entries)).await;

        let record = RecordNormalizer::default()
            .normalize(&mut journal)
            .await
            .unwrap();
        assert_eq!(record.message, format!(r#"{{"k":{}"#, "x".repeat(MAX_FRAGMENTS)));
        assert_eq!(journal.next_calls, 1 + MAX_FRAGMENTS);
    }

    #[tokio::test(start_paused = true)]
    async fn normalize_waits_for_continuation() {
        let journal = MockJournal::new(vec![entry(1, r#"{"a":"#)])
            .with_arrivals([entry(2, r#""b"}"#)]);
        let mut journal = positioned(journal).await;

        let record = RecordNormalizer::default()
            .normalize(&mut journal)
            .await
            .unwrap();
        assert_eq!(record.message, r#"{"a":"b"}"#);
        assert_eq!(journal.waits, vec![REASSEMBLY_WAIT]);
    }

    #[tokio::test(start_paused = true)]
    async fn normalize_retries_after_advance_error() {
        let journal = MockJournal::new(vec![entry(1, r#"{"a":"#), entry(2, "1}")]);
        let mut journal = positioned(journal).await.with_steps([MockStep::Error]);

        let started = tokio::time::Instant::now();
        let record = RecordNormalizer::default()
            .normalize(&mut journal)
            .await
            .unwrap();
        assert_eq!(record.message, r#"{"a":1}"#);
        assert!(started.elapsed() >= REASSEMBLY_WAIT);
    }

    #[tokio::test(start_paused = true)]
    async fn normalize_gives_up_after_max_waits() {
        let mut journal = positioned(MockJournal::new(vec![entry(1, r#"{"never":"#)])).await;

        let record = RecordNormalizer::default()
            .normalize(&mut journal)
            .await
            .unwrap();
        assert_eq!(record.message, r#"{"never":"#);
        assert_eq!(journal.waits.len(), MAX_REASSEMBLY_WAITS);
    }

    #[tokio::test(start_paused = true)]
    async fn normalize_plain_message_never_waits() {
        let mut journal = positioned(MockJournal::new(vec![entry(1, "{ unbalanced")])).await;
        let record = RecordNormalizer::default()
            .normalize(&mut journal)
            .await
            .unwrap();
        assert_eq!(record.message, "{ unbalanced");
        assert!(journal.waits.is_empty());
    }
}
