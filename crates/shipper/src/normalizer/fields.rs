//! journal 필드 → 레코드 필드 매핑 테이블
//!
//! 각 레코드 타입은 [`JournalFields`]를 구현하여 자신이 읽는 journal 키와
//! 채울 필드를 명시적으로 나열합니다. 하위 레코드는 자기 테이블을 갖고,
//! 상위 레코드가 이를 이어 붙입니다.
//!
//! 필드 종류는 정수와 문자열 두 가지뿐입니다.
//! - 정수: 파싱 실패 시 0
//! - 문자열: 그대로 복사
//! - 키가 없으면 zero value

use journalship_core::types::{JournalEntry, Priority, Record, RecordKernel, RecordSyslog};

pub const FIELD_COMM: &str = "_COMM";
pub const FIELD_PRIORITY: &str = "PRIORITY";
pub const FIELD_MESSAGE: &str = "MESSAGE";
pub const FIELD_MESSAGE_ID: &str = "MESSAGE_ID";
pub const FIELD_SYSLOG_FACILITY: &str = "SYSLOG_FACILITY";
pub const FIELD_SYSLOG_IDENTIFIER: &str = "SYSLOG_IDENTIFIER";
pub const FIELD_SYSLOG_PID: &str = "SYSLOG_PID";
pub const FIELD_KERNEL_DEVICE: &str = "_KERNEL_DEVICE";
pub const FIELD_KERNEL_SUBSYSTEM: &str = "_KERNEL_SUBSYSTEM";
pub const FIELD_UDEV_SYSNAME: &str = "_UDEV_SYSNAME";
pub const FIELD_UDEV_DEVNODE: &str = "_UDEV_DEVNODE";

/// 채울 필드에 대한 가변 참조
#[derive(Debug)]
pub enum FieldSlot<'a> {
    /// 정수 필드
    Int(&'a mut i64),
    /// 문자열 필드
    Str(&'a mut String),
}

/// journal 키 → 필드 매핑을 제공하는 레코드 타입
pub trait JournalFields {
    /// (journal 키, 채울 필드) 목록을 반환합니다.
    fn field_slots(&mut self) -> Vec<(&'static str, FieldSlot<'_>)>;
}

/// 매핑 테이블에 따라 `target`의 필드를 `entry`에서 채웁니다.
///
/// 값이 없거나 해석할 수 없는 필드는 zero value로 설정됩니다.
pub fn populate<T: JournalFields + ?Sized>(target: &mut T, entry: &JournalEntry) {
    for (key, slot) in target.field_slots() {
        let value = entry.field(key);
        match slot {
            FieldSlot::Int(dst) => *dst = value.map_or(0, decode_int),
            FieldSlot::Str(dst) => *dst = value.map(str::to_owned).unwrap_or_default(),
        }
    }
}

/// 정수 필드 값을 해석합니다. 실패하면 0입니다.
pub fn decode_int(value: &str) -> i64 {
    value.parse().unwrap_or(0)
}

/// `PRIORITY` 필드를 해석합니다.
///
/// 키가 없거나, 정수가 아니거나, 0~7 범위 밖이면 `None`입니다.
pub fn decode_priority(entry: &JournalEntry) -> Option<Priority> {
    entry
        .field(FIELD_PRIORITY)
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(Priority::from_level)
}

impl JournalFields for RecordSyslog {
    fn field_slots(&mut self) -> Vec<(&'static str, FieldSlot<'_>)> {
        vec![
            (FIELD_SYSLOG_FACILITY, FieldSlot::Int(&mut self.facility)),
            (FIELD_SYSLOG_IDENTIFIER, FieldSlot::Str(&mut self.identifier)),
            (FIELD_SYSLOG_PID, FieldSlot::Int(&mut self.pid)),
        ]
    }
}

impl JournalFields for RecordKernel {
    fn field_slots(&mut self) -> Vec<(&'static str, FieldSlot<'_>)> {
        vec![
            (FIELD_KERNEL_DEVICE, FieldSlot::Str(&mut self.device)),
            (FIELD_KERNEL_SUBSYSTEM, FieldSlot::Str(&mut self.subsystem)),
            (FIELD_UDEV_SYSNAME, FieldSlot::Str(&mut self.sys_name)),
            (FIELD_UDEV_DEVNODE, FieldSlot::Str(&mut self.dev_node)),
        ]
    }
}

impl JournalFields for Record {
    fn field_slots(&mut self) -> Vec<(&'static str, FieldSlot<'_>)> {
        let mut slots = vec![
            (FIELD_COMM, FieldSlot::Str(&mut self.command)),
            (FIELD_MESSAGE, FieldSlot::Str(&mut self.message)),
            (FIELD_MESSAGE_ID, FieldSlot::Str(&mut self.message_id)),
        ];
        slots.extend(self.syslog.field_slots());
        slots.extend(self.kernel.field_slots());
        slots
    }
}
