pub mod campaign;
pub mod influencer;
pub mod location;
pub mod pricing;
pub mod repository;

pub use campaign::{Campaign, CampaignPost, CampaignStatus};
pub use influencer::{Category, Influencer, Reputation};
pub use location::Geofence;
pub use pricing::ScorePricing;
pub use repository::CatalogRepository;
