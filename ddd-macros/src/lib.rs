//! 领域模型过程宏
//!
//! - `#[entity]`：为持久化实体注入标识、审计与事件字段并实现 `Entity`
//! - `#[domain_event]`：为领域事件实现 `DomainEvent`
//! - `#[domain_type]`：为无字段枚举实现 `DomainType`
//!
mod derive_utils;
mod domain_event;
mod domain_type;
mod entity;
mod field_utils;

use proc_macro::TokenStream;

/// 实体宏
///
/// ```ignore
/// #[entity(id = i64, table = "guest_messages")]
/// pub struct GuestMessage {
///     message: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item)
}

/// 领域事件宏
///
/// ```ignore
/// #[domain_event(name = "guestbook.message_created")]
/// pub struct GuestMessageCreated {
///     pub message: GuestMessage,
/// }
/// ```
#[proc_macro_attribute]
pub fn domain_event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}

/// 领域类型宏
///
/// ```ignore
/// #[domain_type]
/// pub enum MessageVisibility {
///     #[value(name = "public")]
///     Public,
///     #[value(name = "private")]
///     Private,
/// }
/// ```
#[proc_macro_attribute]
pub fn domain_type(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_type::expand(attr, item)
}
