use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub sentinel: SentinelConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

// ============================================================
// Scoring Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    #[serde(default = "default_salary_weight")]
    pub salary_deviation_weight: f64,
    #[serde(default = "default_shared_account_weight")]
    pub shared_account_weight: f64,
    #[serde(default = "default_verification_weight")]
    pub verification_weight: f64,
    /// Points per sigma of salary deviation, capped at 100.
    #[serde(default = "default_z_scale")]
    pub z_score_scale: f64,
    /// Points per peer sharing the same bank account, capped at 100.
    #[serde(default = "default_peer_scale")]
    pub shared_peer_scale: f64,
    #[serde(default = "default_moderate_threshold")]
    pub moderate_threshold: f64,
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f64,
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
    /// Floor for the per-group population stddev to keep z-scores finite
    /// when a job group has identical salaries.
    #[serde(default = "default_stddev_epsilon")]
    pub stddev_epsilon: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            salary_deviation_weight: 0.5,
            shared_account_weight: 0.3,
            verification_weight: 0.2,
            z_score_scale: 25.0,
            shared_peer_scale: 20.0,
            moderate_threshold: 60.0,
            high_threshold: 75.0,
            critical_threshold: 90.0,
            stddev_epsilon: 1e-6,
        }
    }
}

fn default_salary_weight() -> f64 {
    0.5
}

fn default_shared_account_weight() -> f64 {
    0.3
}

fn default_verification_weight() -> f64 {
    0.2
}

fn default_z_scale() -> f64 {
    25.0
}

fn default_peer_scale() -> f64 {
    20.0
}

fn default_moderate_threshold() -> f64 {
    60.0
}

fn default_high_threshold() -> f64 {
    75.0
}

fn default_critical_threshold() -> f64 {
    90.0
}

fn default_stddev_epsilon() -> f64 {
    1e-6
}

// ============================================================
// Sentinel Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct SentinelConfig {
    /// Moire energy above this value indicates a screen replay.
    #[serde(default = "default_spoof_threshold")]
    pub spoof_energy_threshold: f64,
    /// Liveness confidence below this value is inconclusive.
    #[serde(default = "default_confidence_threshold")]
    pub liveness_confidence_threshold: f64,
    /// Confidence bonus for a completed active challenge.
    #[serde(default = "default_challenge_bonus")]
    pub active_challenge_bonus: f64,
    #[serde(default = "default_station_name")]
    pub default_station: String,
    #[serde(default = "default_stations")]
    pub stations: Vec<StationConfig>,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            spoof_energy_threshold: 300.0,
            liveness_confidence_threshold: 0.5,
            active_challenge_bonus: 0.25,
            default_station: default_station_name(),
            stations: default_stations(),
        }
    }
}

fn default_spoof_threshold() -> f64 {
    300.0
}

fn default_confidence_threshold() -> f64 {
    0.5
}

fn default_challenge_bonus() -> f64 {
    0.25
}

fn default_station_name() -> String {
    "KICC, Nairobi".to_string()
}

fn default_stations() -> Vec<StationConfig> {
    vec![StationConfig {
        name: default_station_name(),
        lat: -1.2884,
        lon: 36.8233,
        radius_km: 0.5,
    }]
}

#[derive(Debug, Deserialize, Clone)]
pub struct StationConfig {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_station_radius")]
    pub radius_km: f64,
}

fn default_station_radius() -> f64 {
    0.5
}

// ============================================================
// Ingest Config
// ============================================================

#[derive(Debug, Deserialize, Clone, Default)]
pub struct IngestConfig {
    /// Optional payroll CSV loaded when an audit is requested without rows.
    pub dataset_path: Option<String>,
}

// ============================================================
// API Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_api_host")]
    pub host: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_port() -> u16 {
    3000
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        let s = &self.scoring;
        for (name, w) in [
            ("salary_deviation_weight", s.salary_deviation_weight),
            ("shared_account_weight", s.shared_account_weight),
            ("verification_weight", s.verification_weight),
        ] {
            if !(0.0..=1.0).contains(&w) {
                return Err(eyre::eyre!("Scoring weight '{}' must be in [0, 1]", name));
            }
        }
        let weight_sum =
            s.salary_deviation_weight + s.shared_account_weight + s.verification_weight;
        if (weight_sum - 1.0).abs() > 1e-9 {
            return Err(eyre::eyre!(
                "Scoring weights must sum to 1.0 (got {})",
                weight_sum
            ));
        }
        if !(s.moderate_threshold < s.high_threshold && s.high_threshold < s.critical_threshold) {
            return Err(eyre::eyre!(
                "Tier thresholds must be strictly increasing (moderate < high < critical)"
            ));
        }
        if s.critical_threshold > 100.0 || s.moderate_threshold <= 0.0 {
            return Err(eyre::eyre!("Tier thresholds must lie in (0, 100]"));
        }
        if s.z_score_scale <= 0.0 || s.shared_peer_scale <= 0.0 {
            return Err(eyre::eyre!("Signal scales must be positive"));
        }
        if s.stddev_epsilon <= 0.0 {
            return Err(eyre::eyre!("stddev_epsilon must be positive"));
        }

        let v = &self.sentinel;
        if v.spoof_energy_threshold <= 0.0 {
            return Err(eyre::eyre!("spoof_energy_threshold must be positive"));
        }
        if !(0.0..=1.0).contains(&v.liveness_confidence_threshold) {
            return Err(eyre::eyre!(
                "liveness_confidence_threshold must be in [0, 1]"
            ));
        }
        if v.stations.is_empty() {
            return Err(eyre::eyre!("At least one duty station must be configured"));
        }
        for station in &v.stations {
            if station.radius_km <= 0.0 {
                return Err(eyre::eyre!(
                    "Station '{}' must have a positive radius",
                    station.name
                ));
            }
            if !(-90.0..=90.0).contains(&station.lat) || !(-180.0..=180.0).contains(&station.lon) {
                return Err(eyre::eyre!(
                    "Station '{}' has out-of-range coordinates",
                    station.name
                ));
            }
        }
        if !v.stations.iter().any(|st| st.name == v.default_station) {
            return Err(eyre::eyre!(
                "default_station '{}' is not in the stations list",
                v.default_station
            ));
        }

        Ok(())
    }

    pub fn station(&self, name: &str) -> Option<&StationConfig> {
        self.sentinel.stations.iter().find(|st| st.name == name)
    }
}
