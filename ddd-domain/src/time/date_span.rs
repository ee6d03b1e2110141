use crate::error::{DomainError, DomainResult};
use chrono::{DateTime, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 日期跨度单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateSpanUnit {
    Day,
    Month,
    Year,
}

impl DateSpanUnit {
    fn suffix(self) -> char {
        match self {
            DateSpanUnit::Day => 'D',
            DateSpanUnit::Month => 'M',
            DateSpanUnit::Year => 'Y',
        }
    }
}

/// 以日/月/年为单位的日期跨度
///
/// 文本形式为带符号整数加单位后缀，例如 `3D`、`-1M`、`+2Y`；序列化时同样使用该文本形式。
///
/// ```
/// use ddd_domain::time::{DateSpan, DateSpanExt};
/// use chrono::NaiveDate;
///
/// let span: DateSpan = "-1M".parse().unwrap();
/// let date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
/// assert_eq!(date.add_span(span).unwrap(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
/// assert_eq!(span.to_string(), "-1M");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateSpan {
    unit: DateSpanUnit,
    value: i32,
}

impl DateSpan {
    pub const ZERO: DateSpan = DateSpan::from_days(0);

    pub const fn new(unit: DateSpanUnit, value: i32) -> Self {
        Self { unit, value }
    }

    pub const fn from_days(value: i32) -> Self {
        Self::new(DateSpanUnit::Day, value)
    }

    pub const fn from_months(value: i32) -> Self {
        Self::new(DateSpanUnit::Month, value)
    }

    pub const fn from_years(value: i32) -> Self {
        Self::new(DateSpanUnit::Year, value)
    }

    pub fn unit(&self) -> DateSpanUnit {
        self.unit
    }

    pub fn value(&self) -> i32 {
        self.value
    }
}

impl fmt::Display for DateSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for DateSpan {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(suffix) = s.chars().last() else {
            return Err(DomainError::parse("empty date span"));
        };
        let unit = match suffix {
            'D' => DateSpanUnit::Day,
            'M' => DateSpanUnit::Month,
            'Y' => DateSpanUnit::Year,
            other => {
                return Err(DomainError::parse(format!(
                    "invalid date span unit '{other}' in '{s}'"
                )));
            }
        };
        let value: i32 = s[..s.len() - suffix.len_utf8()].parse()?;
        Ok(Self::new(unit, value))
    }
}

impl TryFrom<String> for DateSpan {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateSpan> for String {
    fn from(span: DateSpan) -> Self {
        span.to_string()
    }
}

/// 为日期类型提供按 `DateSpan` 偏移与归零时间的能力
pub trait DateSpanExt: Sized {
    /// 偏移给定跨度；超出可表示范围时返回错误
    fn add_span(self, span: DateSpan) -> DomainResult<Self>;
}

impl DateSpanExt for NaiveDate {
    fn add_span(self, span: DateSpan) -> DomainResult<Self> {
        let magnitude = span.value.unsigned_abs();
        let forward = span.value >= 0;
        let shifted = match span.unit {
            DateSpanUnit::Day => {
                let days = Days::new(u64::from(magnitude));
                if forward {
                    self.checked_add_days(days)
                } else {
                    self.checked_sub_days(days)
                }
            }
            DateSpanUnit::Month | DateSpanUnit::Year => {
                let months = match span.unit {
                    DateSpanUnit::Year => magnitude.checked_mul(12),
                    _ => Some(magnitude),
                };
                months.map(Months::new).and_then(|m| {
                    if forward {
                        self.checked_add_months(m)
                    } else {
                        self.checked_sub_months(m)
                    }
                })
            }
        };
        shifted.ok_or_else(|| DomainError::invalid_value(format!("{self} + {span} out of range")))
    }
}

impl DateSpanExt for DateTime<Utc> {
    fn add_span(self, span: DateSpan) -> DomainResult<Self> {
        let date = self.date_naive().add_span(span)?;
        Ok(date.and_time(self.time()).and_utc())
    }
}

/// 截断到当天零点
pub fn date_with_zero_time(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}
