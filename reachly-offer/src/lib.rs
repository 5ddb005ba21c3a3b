pub mod lifecycle;
pub mod models;
pub mod reach;
pub mod recheck;
pub mod repository;

pub use lifecycle::{OfferDraft, OfferError, OfferService, SubmitOutcome};
pub use models::{Offer, OfferStatus, OfferTrack, TrackSample};
pub use reach::{total_reach, tracked_days, ReachEntry};
pub use recheck::{run_recheck_worker, ChannelScheduler, RecheckJob};
pub use repository::OfferRepository;
