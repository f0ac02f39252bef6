//! TOML-based dashboard configuration: battery capacities, charger specs, and
//! forecast constants.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Top-level dashboard configuration parsed from TOML.
///
/// All fields default to the installed hardware at the monitored site. Load
/// from TOML with [`DashboardConfig::from_toml_file`] or use
/// [`DashboardConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Home battery parameters.
    pub powerwall: PowerwallConfig,
    /// Vehicle A ("Model 3") pack and charger parameters.
    pub model3: VehicleConfig,
    /// Vehicle B ("Model X") pack and charger parameters.
    pub modelx: VehicleConfig,
    /// Thermostat power-draw constants.
    pub thermostat: ThermostatConfig,
    /// Forecast engine tuning.
    pub forecast: ForecastConfig,
}

/// Home battery parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PowerwallConfig {
    /// Usable capacity (kWh).
    pub capacity_kwh: f32,
}

impl Default for PowerwallConfig {
    fn default() -> Self {
        Self { capacity_kwh: 13.5 }
    }
}

/// Vehicle pack and charger parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VehicleConfig {
    /// Pack capacity (kWh).
    pub capacity_kwh: f32,
    /// Charger circuit voltage (V).
    pub voltage_v: f32,
    /// Lowest selectable charging current (A).
    pub min_amps: u32,
    /// Highest selectable charging current (A).
    pub max_amps: u32,
}

impl Default for VehicleConfig {
    /// Model 3 Standard Range Plus on the 249 V wall connector.
    fn default() -> Self {
        Self {
            capacity_kwh: 52.4,
            voltage_v: 249.0,
            min_amps: 5,
            max_amps: 32,
        }
    }
}

impl VehicleConfig {
    /// Model X defaults (larger pack, higher-amperage onboard charger).
    pub fn model_x() -> Self {
        Self {
            capacity_kwh: 100.0,
            voltage_v: 249.0,
            min_amps: 7,
            max_amps: 48,
        }
    }
}

/// Thermostat power-draw constants.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThermostatConfig {
    /// Draw while actively heating or cooling (kW).
    pub running_kw: f32,
    /// Draw while online but idle, fan only (kW). Site measurements range
    /// between 0.9 and 1.2; the lower reading is the default.
    pub fan_kw: f32,
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            running_kw: 5.6,
            fan_kw: 0.9,
        }
    }
}

/// Forecast engine tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Simulation step length in minutes (must divide 60).
    pub step_minutes: u32,
    /// Powerwall charge-rate ceiling (kW).
    pub max_powerwall_charge_kw: f32,
    /// Minimum residual house load after a charger drops off (kW).
    pub house_idle_floor_kw: f32,
    /// Matching window for the same-time-yesterday solar lookup (minutes).
    pub solar_lookup_tolerance_min: u32,
    /// Weekday hour after which telemetry-driven Model 3 charging is treated
    /// as stopped (off-peak rate schedule).
    pub cutoff_hour: u32,
    /// Minute component of the weekday charging cutoff.
    pub cutoff_minute: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            step_minutes: 15,
            max_powerwall_charge_kw: 5.0,
            house_idle_floor_kw: 0.234,
            solar_lookup_tolerance_min: 5,
            cutoff_hour: 14,
            cutoff_minute: 15,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"forecast.step_minutes"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl DashboardConfig {
    /// Returns the site defaults with the Model X pack filled in for vehicle B.
    pub fn site_default() -> Self {
        Self {
            modelx: VehicleConfig::model_x(),
            ..Self::default()
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.powerwall.capacity_kwh <= 0.0 {
            errors.push(ConfigError {
                field: "powerwall.capacity_kwh".into(),
                message: "must be > 0".into(),
            });
        }

        for (name, v) in [("model3", &self.model3), ("modelx", &self.modelx)] {
            if v.capacity_kwh <= 0.0 {
                errors.push(ConfigError {
                    field: format!("{name}.capacity_kwh"),
                    message: "must be > 0".into(),
                });
            }
            if v.voltage_v <= 0.0 {
                errors.push(ConfigError {
                    field: format!("{name}.voltage_v"),
                    message: "must be > 0".into(),
                });
            }
            if v.min_amps > v.max_amps {
                errors.push(ConfigError {
                    field: format!("{name}.min_amps"),
                    message: format!("must be <= {name}.max_amps"),
                });
            }
        }

        let t = &self.thermostat;
        if t.running_kw < 0.0 || t.fan_kw < 0.0 {
            errors.push(ConfigError {
                field: "thermostat".into(),
                message: "power draws must be >= 0".into(),
            });
        }
        if t.fan_kw > t.running_kw {
            errors.push(ConfigError {
                field: "thermostat.fan_kw".into(),
                message: "must be <= thermostat.running_kw".into(),
            });
        }

        let f = &self.forecast;
        if f.step_minutes == 0 || 60 % f.step_minutes != 0 {
            errors.push(ConfigError {
                field: "forecast.step_minutes".into(),
                message: "must be > 0 and divide 60".into(),
            });
        }
        if f.max_powerwall_charge_kw <= 0.0 {
            errors.push(ConfigError {
                field: "forecast.max_powerwall_charge_kw".into(),
                message: "must be > 0".into(),
            });
        }
        if f.house_idle_floor_kw < 0.0 {
            errors.push(ConfigError {
                field: "forecast.house_idle_floor_kw".into(),
                message: "must be >= 0".into(),
            });
        }
        if f.cutoff_hour > 23 || f.cutoff_minute > 59 {
            errors.push(ConfigError {
                field: "forecast.cutoff_hour".into(),
                message: "must name a valid time of day".into(),
            });
        }

        errors
    }
}
