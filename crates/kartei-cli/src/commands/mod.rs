//! Command implementations.

pub mod combine;
pub mod merge;
pub mod retry;

pub use self::combine::execute_combine;
pub use self::merge::execute_merge;
pub use self::retry::execute_retry;

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Ran to the end
    Done,
    /// Stopped by Ctrl+C
    Interrupted,
}

impl Completion {
    /// Process exit status for this completion.
    pub fn exit_code(self) -> i32 {
        match self {
            Completion::Done => 0,
            Completion::Interrupted => 130,
        }
    }
}
