//! Command implementations.

pub mod collect;
pub mod geocode;
pub mod judge;
pub mod locate;
pub mod metrics;
pub mod predict;
pub mod preview;
pub mod similarity;

pub use self::collect::execute_collect;
pub use self::geocode::execute_geocode;
pub use self::judge::execute_judge;
pub use self::locate::execute_locate;
pub use self::metrics::{
    execute_classify, execute_count, execute_describe, execute_distance, execute_means,
};
pub use self::predict::execute_predict;
pub use self::preview::execute_preview;
pub use self::similarity::execute_similarity;
