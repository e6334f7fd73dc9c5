pub mod claim;
pub mod credibility;
pub mod scoring;
pub mod section;
pub mod synthesis;
