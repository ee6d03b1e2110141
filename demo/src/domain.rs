use ddd_domain::entity::{AggregateRoot, Audit};
use ddd_macros::{domain_event, entity};
use uuid::Uuid;

/// 留言
#[entity(id = Uuid, table = "guest_messages")]
pub struct GuestMessage {
    pub message: String,
}

impl AggregateRoot for GuestMessage {}

impl GuestMessage {
    /// 创建留言并登记 `GuestMessageCreated` 事件
    pub fn create(message: impl Into<String>, author: impl Into<String>) -> Self {
        let message = message.into();
        let author = author.into();
        let mut guest_message = Self {
            message: message.clone(),
            audit: Audit::by(author.clone()),
            ..Default::default()
        };
        guest_message
            .events
            .push(GuestMessageCreated { message, author });
        guest_message
    }

    pub fn author(&self) -> &str {
        self.audit.created_by()
    }
}

/// 留言计数
#[entity(id = Uuid, table = "guest_messages_counter", events = false)]
pub struct GuestMessagesCounter {
    pub count: i64,
    pub last_entry_by: String,
}

impl AggregateRoot for GuestMessagesCounter {}

impl GuestMessagesCounter {
    pub fn new(count: i64, author: impl Into<String>) -> Self {
        let author = author.into();
        Self {
            count,
            last_entry_by: author.clone(),
            audit: Audit::by(author),
            ..Default::default()
        }
    }

    /// 记录一条新留言
    pub fn record(&mut self, author: &str) {
        self.count += 1;
        self.last_entry_by = author.to_string();
        self.audit.set_last_modified_by(author);
    }
}

#[domain_event(name = "guest_message.created")]
pub struct GuestMessageCreated {
    pub message: String,
    pub author: String,
}
