//! 日期工具：`DateSpan` 日期跨度及其在日期类型上的偏移运算
mod date_span;

pub use date_span::{DateSpan, DateSpanExt, DateSpanUnit, date_with_zero_time};
