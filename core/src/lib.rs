pub mod collection;
pub mod config;
pub mod error;
pub mod index;
pub mod kgram;
pub mod merge;
pub mod processor;
pub mod query;
pub mod spelling;
pub mod tokenizer;

pub use collection::{Collection, Document, SharedCollection};
pub use config::SearchConfig;
pub use error::QueryError;
pub use index::{DocId, Position, Posting, PositionalIndex, TermEntry};
pub use kgram::KGramIndex;
pub use merge::Merger;
pub use processor::{AppliedCorrection, BestCandidate, CorrectionSelector, QueryOutcome, QueryProcessor};
pub use query::{tokenize_query, ControlOp, Node, Query};
pub use spelling::{Correction, SpellingController, Suggestion};
