use crate::domain::{GuestMessage, GuestMessagesCounter};
use chrono::NaiveDate;
use ddd_domain::entity::Entity;
use ddd_domain::specification::QuerySpecification;

/// 指定作者的全部留言，按创建时间排序
pub fn guest_messages_by_author(author: impl Into<String>) -> QuerySpecification<GuestMessage> {
    let author = author.into();
    QuerySpecification::new("GuestMessagesByAuthor")
        .filter_by(move |m: &GuestMessage| m.author() == author)
        .order_by(|m: &GuestMessage| m.audit().creation_date())
}

/// 某一天创建的全部留言
pub fn guest_messages_on_date(date: NaiveDate) -> QuerySpecification<GuestMessage> {
    QuerySpecification::new("GuestMessagesOnDate")
        .filter_by(move |m: &GuestMessage| m.audit().creation_date().date_naive() == date)
}

/// 计数最大的计数记录
pub fn latest_counter() -> QuerySpecification<GuestMessagesCounter> {
    QuerySpecification::new("LatestCounter")
        .order_by_descending(|c: &GuestMessagesCounter| c.count)
        .take(1)
}
