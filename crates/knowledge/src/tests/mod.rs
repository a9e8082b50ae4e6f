mod end_to_end;
mod memory_concurrency;
mod rag_ranking;
pub(crate) mod support;
