pub mod analysis;
pub mod query;
pub mod upload_url;

pub use analysis::MoodAnalyzer;
pub use query::{MoodHistory, MoodQueryService};
pub use upload_url::{IssuedUpload, UploadUrlIssuer};
