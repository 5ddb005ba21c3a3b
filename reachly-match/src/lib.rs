pub mod discovery;
pub mod matcher;
pub mod predicates;

pub use discovery::{discover_influencers, DiscoveryCriteria, Popularity, ReputationFilter};
pub use matcher::{
    eligible_campaigns, eligible_influencers, evaluate, is_valid, Ineligibility, MatchDecision,
    MatchMode, PriorOffers,
};
pub use predicates::{categories_overlap, within_any_geofence};
