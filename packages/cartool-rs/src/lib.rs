pub mod aggregation;
pub mod codec;
pub mod config;
pub mod error;
pub mod formats;
pub mod projection;
pub mod regions;
pub mod source_estimate;
pub mod source_space;
pub mod types;

pub use aggregation::{per_region, reduce_by_region, reduce_time_course, ReductionMethod};
pub use config::WriterConfig;
pub use error::{CartoolError, Result};
pub use formats::{
    read_file, CartoolFile, CartoolFormat, ContinuousSignal, InverseSolution,
    InverseSolutionKind, Leadfield, Montage, Regularization,
};
pub use projection::RegularizationSelector;
pub use regions::RegionsOfInterest;
pub use source_estimate::SourceEstimate;
pub use source_space::SourceSpace;
pub use types::*;
