mod dataset;
mod driver;
mod report;
mod settings;
mod store;

pub use dataset::{parse_gold, Dataset, DatasetError, Selection};
pub use driver::{EvalDriver, FailureCause, QuestionOutcome};
pub use report::{
    classify_flip, flip_of, is_stalemate, stalemate_gap, EvalSummary, FailureCounts, FlipCategory,
    FlipCounts, ScoreBreakdown, ScoreMeans,
};
pub use settings::EvalSettings;
pub use store::{default_output_dir, read_run, RunEnd, RunLine, RunRecord, RunStart, RunWriter};
