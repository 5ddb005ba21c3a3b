use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub verification: VerificationSettings,
    #[serde(default)]
    pub reach: ReachSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VerificationSettings {
    /// Minimum Jaro-Winkler similarity between the posted caption and the
    /// expected caption (with suffix) for the text gate to pass.
    #[serde(default = "default_caption_threshold")]
    pub caption_threshold: f64,

    /// Maximum perceptual hash distance (exclusive) between the expected
    /// and posted images.
    #[serde(default = "default_max_image_distance")]
    pub max_image_distance: u32,

    /// Promotional tag influencers must append to the campaign caption.
    #[serde(default = "default_caption_suffix")]
    pub caption_suffix: String,

    /// Delay before a verified offer is re-checked for sustained compliance.
    #[serde(default = "default_recheck_delay_hours")]
    pub recheck_delay_hours: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReachSettings {
    /// Weight applied to followers of cancelled offers in the total-reach
    /// aggregate. Passed explicitly into the computation, never read
    /// ambiently.
    #[serde(default = "default_cancelled_follower_rate")]
    pub cancelled_follower_rate: f64,
}

fn default_caption_threshold() -> f64 {
    0.95
}

fn default_max_image_distance() -> u32 {
    10
}

fn default_caption_suffix() -> String {
    "#ad".to_string()
}

fn default_recheck_delay_hours() -> u64 {
    24
}

fn default_cancelled_follower_rate() -> f64 {
    0.5
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            caption_threshold: default_caption_threshold(),
            max_image_distance: default_max_image_distance(),
            caption_suffix: default_caption_suffix(),
            recheck_delay_hours: default_recheck_delay_hours(),
        }
    }
}

impl Default for ReachSettings {
    fn default() -> Self {
        Self {
            cancelled_follower_rate: default_cancelled_follower_rate(),
        }
    }
}

impl Settings {
    /// Load settings from an optional `config/default` file with
    /// `REACHLY__`-prefixed environment overrides.
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings: Self = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("REACHLY").separator("__"))
            .build()?
            .try_deserialize()?;
        tracing::debug!(?settings, "settings loaded");
        Ok(settings)
    }
}
