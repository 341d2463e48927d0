mod agent;
pub mod callbacks;
mod error;
pub mod llm;
pub mod tools;

#[cfg(test)]
mod test_server;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub use agent::{Agent, AgentBuilder, FinalAnswer, StopCondition, final_answer};
