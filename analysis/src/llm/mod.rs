pub mod mock;
pub mod openai;

pub use mock::MockChatModel;
pub use openai::OpenAiChatModel;
