pub mod context;
pub mod filter;
pub mod service;

pub use filter::{ReplyKind, TopicFilter};
pub use service::{ChatReply, ChatService};
