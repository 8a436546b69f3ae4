//! 服务模块

pub mod chat;
pub mod screening;
pub mod session;
pub mod transcript;

pub use chat::{ChatReply, ChatService, ReplyOutcome, create_chat_service};
pub use screening::{ScreeningInput, ScreeningResult, evaluate as evaluate_screening};
pub use session::{SessionService, TopicUpdate, TurnContext, create_session_service};
pub use transcript::{Transcript, TranscriptFormat};
