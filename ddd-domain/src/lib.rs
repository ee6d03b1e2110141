//! DDD 领域层基础库（ddd-domain）
//!
//! 提供以 DDD 为中心的通用抽象与构件：
//! - 实体（`entity`）：标识、审计字段与待发布领域事件；
//! - 领域事件（`domain_event`）：事件载荷协议与实体上的事件集合；
//! - 领域类型（`domain_type`）：具名的封闭取值集合；
//! - 规约（`specification`）：可组合的过滤条件与带缓存元数据的查询规约；
//! - 仓储（`repository`）：面向聚合根的统一读写协议；
//! - 时钟（`clock`）与日期跨度（`time`）等通用工具。
//!
//! 本 crate 不绑定任何存储、缓存或事件分发实现，具体实现由 `ddd-infrastructure` 提供。
//!
//! 典型用法：
//! 1. 使用 `#[entity]` 定义实体，并为聚合根实现 `AggregateRoot`；
//! 2. 使用 `#[domain_event]` 定义事件，在状态变更时推入实体的事件集合；
//! 3. 通过 `QuerySpecification` 描述查询，交给 `Repository` 执行。
//!
pub mod clock;
pub mod domain_event;
pub mod domain_type;
pub mod entity;
pub mod error;
pub mod repository;
pub mod specification;
pub mod time;

// 允许在本 crate 内部通过 ::ddd_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::ddd_domain 路径。
extern crate self as ddd_domain;
