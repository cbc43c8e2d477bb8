//! Service layer for the sync pipeline.
//!
//! This module contains the collaborators of a sync:
//! - Page retrieval (`PageSource`, `HttpSource`)
//! - Markup extraction (`PageParser`, `HtmlPageParser`)
//! - Image processing (`ImageProcessor`, `SkipImages`)
//! - Link discovery (`LinkCrawler`)
//! - Record fetching (`RecordFetcher`)

mod fetcher;
mod html_parser;
mod images;
mod links;
mod parser;
mod source;

pub use fetcher::{
    AnswerChain, AnswerResolver, AnswerSignals, HighestVote, MajorityFlag, RecordFetcher,
    SuggestedAnswer,
};
pub use html_parser::HtmlPageParser;
pub use images::{ImageProcessor, SkipImages};
pub use links::LinkCrawler;
pub use parser::{Field, ListingPage, PageParser, RecordPage, TitledLink, VoteCount};
pub use source::{FetchedPage, HttpSource, PageSource};
