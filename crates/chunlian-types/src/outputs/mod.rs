mod analysis;
mod lines;
mod review;

pub use analysis::{AnalysisDetail, ScrollTheme, TopicAnalysis, WordPair};
pub use lines::{BannersOutput, ElectionChoice, HorizontalScrollOutput, LowerLineOutput, UpperLineOutput};
pub use review::{ReviewIssue, ReviewVerdict};
