pub mod conversation;
pub mod message;

pub use conversation::ConversationRecord;
pub use message::MessageRecord;
