//! Metric extractors — independent, pure aggregators that each consume one
//! shared event window and produce one named statistics block for the
//! dashboard snapshot.

pub mod comparison;
pub mod dialog;
pub mod funnel;
pub mod rate;
pub mod recommendations;
pub mod signups;
pub mod snapshot;
pub mod steps;
pub mod survey_types;

pub use comparison::{AbComparisonExtractor, AbComparisonStats, AnonymousUsersExtractor, CohortStats};
pub use dialog::{DialogCloseExtractor, DialogCloseStats};
pub use funnel::{FunnelExtractor, SurveyFunnelStats};
pub use rate::Rate;
pub use recommendations::{RecommendationStats, RecommendationsExtractor};
pub use signups::{SignupStats, SignupsExtractor};
pub use snapshot::{
    all_extractors, BlockError, Metric, MetricBlock, MetricExtractor, RefreshKey, Snapshot,
};
pub use steps::{DropoffExtractor, StepDropoff, SurveyStepStat, SurveyStepsExtractor};
pub use survey_types::{SurveyTypeStats, SurveyTypesExtractor};
