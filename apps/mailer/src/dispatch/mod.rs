// Batch dispatch: posting lifecycle, pacing, and outcome bookkeeping.
// All collaborator calls go through the traits in llm_client, posting, and mail.

pub mod outcome;
pub mod pacing;
pub mod runner;

pub use runner::{DispatchLoop, Pacing};
