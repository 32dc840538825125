pub mod delivery;
pub mod notice;
pub mod orchestrator;
pub mod stage;

pub use delivery::{remove_artifacts, CleanupReport, Delivery};
pub use notice::{Notice, NoticeLevel, NoticeLog};
pub use orchestrator::{Orchestrator, SessionState};
pub use stage::{SessionGraph, SessionStage, StageRequest};
