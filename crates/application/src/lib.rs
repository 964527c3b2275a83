//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例逻辑：在线注册表的变更规则、
//! 消息路由器的扇出决策，以及对时钟等外部适配器的抽象。

pub mod clock;
pub mod error;
pub mod presence;
pub mod router;

pub use clock::{Clock, SystemClock};
pub use error::ApplicationError;
pub use presence::PresenceRegistry;
pub use router::MessageRouter;
