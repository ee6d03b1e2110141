use super::DomainEventHandler;
use crate::unit_of_work::UnitOfWork;
use dashmap::DashMap;
use ddd_domain::domain_event::DomainEvent;
use ddd_domain::error::{DomainError, DomainResult};
use futures_util::future::BoxFuture;
use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

type HandlerFn = Arc<
    dyn for<'a> Fn(&'a mut UnitOfWork, Arc<dyn DomainEvent>) -> BoxFuture<'a, DomainResult<()>>
        + Send
        + Sync,
>;

// 由约束推导闭包的高阶生命周期签名
fn handler_fn<F>(f: F) -> HandlerFn
where
    F: for<'a> Fn(&'a mut UnitOfWork, Arc<dyn DomainEvent>) -> BoxFuture<'a, DomainResult<()>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

#[derive(Clone)]
struct RegisteredHandler {
    name: &'static str,
    call: HandlerFn,
}

/// 领域事件代理
///
/// - 启动时通过 `register` 显式登记处理器，以事件具体类型的 `TypeId` 为键
/// - 发布时按事件顺序依次分发，同一事件的处理器按登记顺序逐个等待
/// - 只做精确类型匹配；处理器错误原样返回并中止剩余分发
#[derive(Default)]
pub struct DomainEventBroker {
    handlers: DashMap<TypeId, Vec<RegisteredHandler>>,
}

impl DomainEventBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记事件 `E` 的处理器
    pub fn register<E, H>(&self, handler: Arc<H>)
    where
        E: DomainEvent,
        H: DomainEventHandler<E> + 'static,
    {
        let name = handler.name();
        let call = handler_fn(move |uow, event| {
            let handler = handler.clone();
            Box::pin(async move {
                // 键与闭包同属泛型 E，正常情况下不会失败
                match event.downcast_ref::<E>() {
                    Some(e) => handler.handle(uow, e).await,
                    None => Err(DomainError::TypeMismatch {
                        expected: type_name::<E>().to_string(),
                        found: event.event_type().to_string(),
                    }),
                }
            })
        });

        self.handlers
            .entry(TypeId::of::<E>())
            .or_default()
            .push(RegisteredHandler { name, call });
        debug!(event = type_name::<E>(), handler = name, "domain event handler registered");
    }

    /// 事件 `E` 的处理器名称（按登记顺序）
    pub fn handlers_for<E: DomainEvent>(&self) -> Vec<&'static str> {
        self.handlers
            .get(&TypeId::of::<E>())
            .map(|hs| hs.iter().map(|h| h.name).collect())
            .unwrap_or_default()
    }

    fn resolve(&self, event: &dyn DomainEvent) -> Vec<RegisteredHandler> {
        self.handlers
            .get(&event.concrete_type_id())
            .map(|hs| hs.value().clone())
            .unwrap_or_default()
    }

    /// 依次发布事件
    ///
    /// 每个处理器执行前检查工作单元的取消令牌，已取消时返回 `Cancelled`。
    pub async fn publish_events(
        &self,
        uow: &mut UnitOfWork,
        events: &[Arc<dyn DomainEvent>],
    ) -> DomainResult<()> {
        for event in events {
            let handlers = self.resolve(event.as_ref());
            if handlers.is_empty() {
                debug!(event = event.event_type(), "no handler registered");
                continue;
            }

            for handler in handlers {
                if uow.cancellation_token().is_cancelled() {
                    return Err(DomainError::Cancelled);
                }
                debug!(
                    event = event.event_type(),
                    handler = handler.name,
                    "dispatching domain event"
                );
                if let Err(err) = (handler.call)(&mut *uow, event.clone()).await {
                    warn!(
                        event = event.event_type(),
                        handler = handler.name,
                        error = %err,
                        "domain event handler failed"
                    );
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for DomainEventBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainEventBroker")
            .field("event_types", &self.handlers.len())
            .finish()
    }
}
