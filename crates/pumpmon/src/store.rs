//! Read-only snapshot of pump, maintenance and alert records
//!
//! The store is built once at startup from fixed sample data and shared behind an `Arc`;
//! every query returns owned copies so callers never hold a borrow across an await.
mod fixtures;
pub mod records;

use chrono::{Duration, Local, NaiveDateTime};
use rand::Rng;
use serde::Deserialize;
use std::collections::BTreeMap;

pub use records::{
    Activity, Alert, AlertPriority, AlertStatus, AlertSummary, DashboardStats, HealthPoint,
    HealthTrends, MaintenanceLog, Pump, PumpStatus, SensorSample, StatusBreakdown,
};

/// Days-to-failure at or below which a pump counts as a predicted failure
pub const PREDICTED_FAILURE_WINDOW_DAYS: u32 = 30;
const TREND_HOURS: i64 = 24;

/// Optional filters for [`DataStore::search_pumps`]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PumpFilter {
    pub location: Option<String>,
    pub pump_type: Option<String>,
    pub status: Option<String>,
}

/// Optional filters for [`DataStore::list_alerts`]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AlertFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub pump_id: Option<String>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches(filter: &Option<String>, value: &str) -> bool {
    filter
        .as_deref()
        .filter(|f| !f.is_empty())
        .map_or(true, |f| f.eq_ignore_ascii_case(value))
}

pub struct DataStore {
    pumps: Vec<Pump>,
    maintenance: Vec<MaintenanceLog>,
    alerts: Vec<Alert>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::sample()
    }
}

impl DataStore {
    pub fn new(pumps: Vec<Pump>, maintenance: Vec<MaintenanceLog>, alerts: Vec<Alert>) -> Self {
        Self {
            pumps,
            maintenance,
            alerts,
        }
    }

    /// The bundled nine-pump sample plant
    pub fn sample() -> Self {
        Self::new(
            fixtures::pumps(),
            fixtures::maintenance_logs(),
            fixtures::alerts(),
        )
    }

    pub fn pumps(&self) -> &[Pump] {
        &self.pumps
    }

    pub fn find_pump(&self, id: &str) -> Option<Pump> {
        self.pumps.iter().find(|pump| pump.id == id).cloned()
    }

    /// Location and type match by case-insensitive substring, status by case-insensitive equality
    pub fn search_pumps(&self, filter: &PumpFilter) -> Vec<Pump> {
        self.pumps
            .iter()
            .filter(|pump| {
                filter
                    .location
                    .as_deref()
                    .map_or(true, |location| contains_ignore_case(&pump.location, location))
            })
            .filter(|pump| {
                filter
                    .pump_type
                    .as_deref()
                    .map_or(true, |pump_type| contains_ignore_case(&pump.pump_type, pump_type))
            })
            .filter(|pump| matches(&filter.status, pump.status.as_str()))
            .cloned()
            .collect()
    }

    pub fn maintenance_logs(&self, pump_id: &str) -> Vec<MaintenanceLog> {
        self.maintenance
            .iter()
            .filter(|log| log.pump_id == pump_id)
            .cloned()
            .collect()
    }

    pub fn list_alerts(&self, filter: &AlertFilter) -> Vec<Alert> {
        self.alerts
            .iter()
            .filter(|alert| matches(&filter.status, alert.status.as_str()))
            .filter(|alert| matches(&filter.priority, alert.priority.as_str()))
            .filter(|alert| {
                filter
                    .pump_id
                    .as_deref()
                    .filter(|pump_id| !pump_id.is_empty())
                    .map_or(true, |pump_id| alert.pump_id == pump_id)
            })
            .cloned()
            .collect()
    }

    pub fn find_alert(&self, id: u32) -> Option<Alert> {
        self.alerts.iter().find(|alert| alert.id == id).cloned()
    }

    pub fn dashboard_stats(&self) -> DashboardStats {
        let count_status = |status: PumpStatus| self.pumps.iter().filter(|p| p.status == status).count();

        let health_scores: Vec<f64> = self
            .pumps
            .iter()
            .map(|p| p.health_score)
            .filter(|score| *score > 0.0)
            .collect();
        let system_health = if health_scores.is_empty() {
            0.0
        } else {
            let mean = health_scores.iter().sum::<f64>() / health_scores.len() as f64;
            (mean * 10.0).round() / 10.0
        };

        DashboardStats {
            total_pumps: self.pumps.len(),
            critical_alerts: self
                .alerts
                .iter()
                .filter(|a| a.priority == AlertPriority::Critical)
                .count(),
            predicted_failures: self
                .pumps
                .iter()
                .filter(|p| p.predicted_failure_days <= PREDICTED_FAILURE_WINDOW_DAYS)
                .count(),
            system_health,
            pump_status_breakdown: StatusBreakdown {
                normal: count_status(PumpStatus::Normal),
                warning: count_status(PumpStatus::Warning),
                critical: count_status(PumpStatus::Critical),
            },
        }
    }

    /// 24 hourly samples jittered around the pump's current readings, ending now
    pub fn sensor_trend(&self, pump_id: &str) -> Vec<SensorSample> {
        self.sensor_trend_from(pump_id, Local::now().naive_local())
    }

    fn sensor_trend_from(&self, pump_id: &str, now: NaiveDateTime) -> Vec<SensorSample> {
        let Some(pump) = self.pumps.iter().find(|p| p.id == pump_id) else {
            return Vec::new();
        };

        let mut rng = rand::thread_rng();
        let start = now - Duration::hours(TREND_HOURS);
        (0..TREND_HOURS)
            .map(|hour| SensorSample {
                pump_id: pump.id.clone(),
                vibration: (pump.vibration + rng.gen_range(-0.5..=0.5)).max(0.0),
                temperature: (pump.temperature + rng.gen_range(-3.0..=3.0)).max(50.0),
                pressure: (pump.pressure + rng.gen_range(-2.0..=2.0)).max(0.0),
                flow_rate: (pump.flow_rate + rng.gen_range(-50.0..=50.0)).max(0.0),
                power: (pump.power + rng.gen_range(-5.0..=5.0)).max(0.0),
                recorded_at: start + Duration::hours(hour),
            })
            .collect()
    }

    pub fn alert_summary(&self) -> AlertSummary {
        let priority_breakdown = AlertPriority::ALL
            .iter()
            .map(|priority| {
                let count = self.alerts.iter().filter(|a| a.priority == *priority).count();
                (priority.as_str().to_lowercase(), count)
            })
            .collect::<BTreeMap<_, _>>();
        let status_breakdown = AlertStatus::ALL
            .iter()
            .map(|status| {
                let count = self.alerts.iter().filter(|a| a.status == *status).count();
                (status.as_str().to_lowercase(), count)
            })
            .collect::<BTreeMap<_, _>>();

        AlertSummary {
            total_alerts: self.alerts.len(),
            active_alerts: self
                .alerts
                .iter()
                .filter(|a| a.status == AlertStatus::Active)
                .count(),
            critical_alerts: self
                .alerts
                .iter()
                .filter(|a| a.priority == AlertPriority::Critical)
                .count(),
            priority_breakdown,
            status_breakdown,
        }
    }

    pub fn health_trends(&self) -> HealthTrends {
        let points = [
            ("00:00", 94),
            ("04:00", 93),
            ("08:00", 96),
            ("12:00", 94),
            ("16:00", 95),
            ("20:00", 96),
            ("24:00", 95),
        ];
        HealthTrends {
            health_data: points
                .into_iter()
                .map(|(time, value)| HealthPoint {
                    time: time.to_string(),
                    value,
                })
                .collect(),
            current_health: 95,
            trend: "stable".to_string(),
        }
    }

    /// The first three alerts followed by the latest maintenance and prediction events
    pub fn recent_activity(&self) -> Vec<Activity> {
        let mut activities: Vec<Activity> = self
            .alerts
            .iter()
            .take(3)
            .map(|alert| {
                let pump_name = self
                    .pumps
                    .iter()
                    .find(|p| p.id == alert.pump_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| alert.pump_id.clone());
                Activity {
                    kind: "alert".to_string(),
                    timestamp: "2024-06-17T10:30:00Z".to_string(),
                    message: format!("Alert: {} on {}", alert.message, pump_name),
                    priority: alert.priority.as_str().to_string(),
                    pump_id: Some(alert.pump_id.clone()),
                }
            })
            .collect();

        activities.push(Activity {
            kind: "maintenance".to_string(),
            timestamp: "2024-06-17T08:15:00Z".to_string(),
            message: "Routine inspection completed on Feed Pump A1".to_string(),
            priority: "Info".to_string(),
            pump_id: Some("P001".to_string()),
        });
        activities.push(Activity {
            kind: "prediction".to_string(),
            timestamp: "2024-06-17T07:45:00Z".to_string(),
            message: "AI model updated predictions for 12 pumps".to_string(),
            priority: "Info".to_string(),
            pump_id: None,
        });

        activities.truncate(5);
        activities
    }
}
