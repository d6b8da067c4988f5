//! 도메인 타입 — journal 엔트리와 정규화된 레코드
//!
//! [`JournalEntry`]는 외부 journal 리더가 생성하는 원시 엔트리이고,
//! [`Record`]는 정규화 단계가 만들어 내는 강타입 레코드입니다.
//! 업로더는 [`Record`]만 다룹니다.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// journal 원시 엔트리
///
/// 필드명 → 문자열 값 매핑과 수신 시각(마이크로초)으로 구성됩니다.
/// 생성 이후 변경되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalEntry {
    /// journal 필드 (예: `MESSAGE`, `PRIORITY`, `_COMM`)
    pub fields: HashMap<String, String>,
    /// 수신 시각 (Unix epoch 기준 마이크로초)
    pub realtime_timestamp: u64,
}

impl JournalEntry {
    /// 수신 시각으로 빈 엔트리를 생성합니다.
    pub fn new(realtime_timestamp: u64) -> Self {
        Self {
            fields: HashMap::new(),
            realtime_timestamp,
        }
    }

    /// 필드를 추가합니다.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// 필드 값을 조회합니다.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// syslog 심각도
///
/// journal의 `PRIORITY` 필드 값(0~7)에 대응합니다.
/// 직렬화 시 숫자가 아닌 고정 레이블(`EMERG`, `CRITICAL` 등)을 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// 시스템 사용 불가
    #[serde(rename = "EMERG")]
    Emergency,
    /// 즉시 조치 필요
    #[serde(rename = "ALERT")]
    Alert,
    /// 치명적 상황
    #[serde(rename = "CRITICAL")]
    Critical,
    /// 에러
    #[serde(rename = "ERROR")]
    Error,
    /// 경고
    #[serde(rename = "WARNING")]
    Warning,
    /// 정상이지만 주목할 상황
    #[serde(rename = "NOTICE")]
    Notice,
    /// 정보성
    #[serde(rename = "INFO")]
    Info,
    /// 디버그
    #[serde(rename = "DEBUG")]
    Debug,
}

impl Priority {
    /// 모든 심각도 (긴급도 내림차순)
    pub const ALL: [Priority; 8] = [
        Self::Emergency,
        Self::Alert,
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Info,
        Self::Debug,
    ];

    /// syslog 숫자 레벨에서 심각도를 얻습니다.
    ///
    /// 0~7 범위 밖이면 `None`을 반환합니다.
    pub fn from_level(level: i64) -> Option<Self> {
        usize::try_from(level)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// syslog 숫자 레벨을 반환합니다.
    pub fn level(self) -> u8 {
        self as u8
    }

    /// 직렬화 레이블을 반환합니다.
    pub fn label(self) -> &'static str {
        match self {
            Self::Emergency => "EMERG",
            Self::Alert => "ALERT",
            Self::Critical => "CRITICAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Notice => "NOTICE",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 정규화된 로그 레코드
///
/// 정규화가 끝난 뒤에는 변경하지 않습니다 (메시지 재조립도 생성 과정에서 끝납니다).
/// 값이 없는 필드는 타입의 zero value를 가지며, JSON 직렬화 시 선택 필드는 생략됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    /// 레코드를 생성한 인스턴스 식별자
    #[serde(rename = "instanceId", skip_serializing_if = "String::is_empty")]
    pub instance_id: String,
    /// journal 수신 시각 (마이크로초). 직렬화하지 않습니다.
    #[serde(skip)]
    pub received_at_micros: i64,
    /// 프로세스명 (`_COMM`)
    #[serde(rename = "cmdName", skip_serializing_if = "String::is_empty")]
    pub command: String,
    /// 심각도 (`PRIORITY`). 없거나 해석할 수 없으면 `None`
    pub priority: Option<Priority>,
    /// 메시지 본문 (`MESSAGE`)
    pub message: String,
    /// 메시지 ID (`MESSAGE_ID`)
    #[serde(rename = "messageId", skip_serializing_if = "String::is_empty")]
    pub message_id: String,
    /// syslog 출처 필드
    #[serde(flatten)]
    pub syslog: RecordSyslog,
    /// 커널/디바이스 필드
    #[serde(flatten)]
    pub kernel: RecordKernel,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let priority = self.priority.map_or("-", Priority::label);
        let command = if self.command.is_empty() {
            "-"
        } else {
            self.command.as_str()
        };
        write!(f, "[{priority}] {command}: {}", self.message)
    }
}

/// syslog 출처 필드
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordSyslog {
    /// syslog facility (`SYSLOG_FACILITY`)
    #[serde(skip_serializing_if = "is_zero")]
    pub facility: i64,
    /// syslog 식별자 (`SYSLOG_IDENTIFIER`)
    #[serde(rename = "ident", skip_serializing_if = "String::is_empty")]
    pub identifier: String,
    /// syslog PID (`SYSLOG_PID`)
    #[serde(skip_serializing_if = "is_zero")]
    pub pid: i64,
}

/// 커널/udev 디바이스 필드
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordKernel {
    /// 커널 디바이스 (`_KERNEL_DEVICE`)
    #[serde(skip_serializing_if = "String::is_empty")]
    pub device: String,
    /// 커널 서브시스템 (`_KERNEL_SUBSYSTEM`)
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subsystem: String,
    /// udev 시스템 이름 (`_UDEV_SYSNAME`)
    #[serde(rename = "sysName", skip_serializing_if = "String::is_empty")]
    pub sys_name: String,
    /// udev 디바이스 노드 (`_UDEV_DEVNODE`)
    #[serde(rename = "devNode", skip_serializing_if = "String::is_empty")]
    pub dev_node: String,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_from_level_covers_all_levels() {
        for (level, expected) in Priority::ALL.iter().enumerate() {
            let level = i64::try_from(level).unwrap();
            assert_eq!(Priority::from_level(level), Some(*expected));
            assert_eq!(i64::from(expected.level()), level);
        }
    }

    #[test]
    fn priority_from_level_rejects_out_of_range() {
        assert_eq!(Priority::from_level(-1), None);
        assert_eq!(Priority::from_level(8), None);
        assert_eq!(Priority::from_level(i64::MAX), None);
    }

    #[test]
    fn priority_serializes_as_label() {
        assert_eq!(
            serde_json::to_string(&Priority::Critical).unwrap(),
            "\"CRITICAL\""
        );
        assert_eq!(
            serde_json::to_string(&Priority::Emergency).unwrap(),
            "\"EMERG\""
        );
        for priority in Priority::ALL {
            let json = serde_json::to_string(&priority).unwrap();
            assert_eq!(json, format!("\"{}\"", priority.label()));
        }
    }

    #[test]
    fn priority_deserializes_from_label() {
        let p: Priority = serde_json::from_str("\"WARNING\"").unwrap();
        assert_eq!(p, Priority::Warning);
        assert!(serde_json::from_str::<Priority>("4").is_err());
    }

    #[test]
    fn record_omits_empty_optional_fields() {
        let record = Record {
            received_at_micros: 1_700_000_000_000_000,
            priority: Some(Priority::Info),
            message: "hello".to_owned(),
            ..Record::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["priority"], "INFO");
        assert_eq!(obj["message"], "hello");
    }

    #[test]
    fn record_flattens_embedded_fields() {
        let record = Record {
            instance_id: "i-0abc".to_owned(),
            command: "sshd".to_owned(),
            priority: Some(Priority::Critical),
            message: "boom".to_owned(),
            message_id: "8d45620c".to_owned(),
            syslog: RecordSyslog {
                facility: 4,
                identifier: "sshd".to_owned(),
                pid: 812,
            },
            kernel: RecordKernel {
                device: "b8:0".to_owned(),
                subsystem: "block".to_owned(),
                sys_name: "sda".to_owned(),
                dev_node: "/dev/sda".to_owned(),
            },
            ..Record::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["instanceId"], "i-0abc");
        assert_eq!(value["cmdName"], "sshd");
        assert_eq!(value["priority"], "CRITICAL");
        assert_eq!(value["messageId"], "8d45620c");
        assert_eq!(value["facility"], 4);
        assert_eq!(value["ident"], "sshd");
        assert_eq!(value["pid"], 812);
        assert_eq!(value["sysName"], "sda");
        assert_eq!(value["devNode"], "/dev/sda");
        assert!(value.get("receivedAtMicros").is_none());
        assert!(value.get("received_at_micros").is_none());
    }

    #[test]
    fn record_unknown_priority_serializes_as_null() {
        let record = Record {
            message: "no priority".to_owned(),
            ..Record::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value["priority"].is_null());
    }

    #[test]
    fn record_display() {
        let record = Record {
            command: "kernel".to_owned(),
            priority: Some(Priority::Warning),
            message: "disk full".to_owned(),
            ..Record::default()
        };
        assert_eq!(record.to_string(), "[WARNING] kernel: disk full");
        assert_eq!(Record::default().to_string(), "[-] -: ");
    }

    #[test]
    fn journal_entry_builder() {
        let entry = JournalEntry::new(42)
            .with_field("MESSAGE", "hi")
            .with_field("PRIORITY", "6");
        assert_eq!(entry.realtime_timestamp, 42);
        assert_eq!(entry.field("MESSAGE"), Some("hi"));
        assert_eq!(entry.field("_COMM"), None);
    }
}
