use std::any::{Any, TypeId};
use std::fmt;

/// 向 `Any` 的转换，供事件代理按具体类型向下转型
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 领域事件载荷需要满足的通用能力边界
///
/// 事件是不可变值，描述已经发生的事实；处理器按事件的具体类型精确匹配。
pub trait DomainEvent: AsAny + fmt::Debug {
    /// 事件类型名（用于日志与审计）
    fn event_type(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl dyn DomainEvent {
    /// 判断事件的具体类型
    pub fn is<E: DomainEvent>(&self) -> bool {
        self.as_any().is::<E>()
    }

    /// 按具体类型向下转型
    pub fn downcast_ref<E: DomainEvent>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    /// 事件具体类型的 `TypeId`（而非 `dyn DomainEvent` 本身）
    pub fn concrete_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }
}
