pub mod builtin;
pub mod dispatcher;
pub mod lifecycle;
pub mod registry;
pub mod reply;

pub use dispatcher::HandlerDispatcher;
pub use lifecycle::{LifecycleDispatcher, LifecycleHandler, SubscriptionMode};
pub use registry::{HandlerRegistry, Invocation, RequestHandler};
pub use reply::{ChannelReply, NullReply, Reply};
