use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PumpStatus {
    Normal,
    Warning,
    Critical,
}

impl PumpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PumpStatus::Normal => "Normal",
            PumpStatus::Warning => "Warning",
            PumpStatus::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl AlertPriority {
    pub const ALL: [AlertPriority; 4] = [
        AlertPriority::Critical,
        AlertPriority::High,
        AlertPriority::Medium,
        AlertPriority::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertPriority::Critical => "Critical",
            AlertPriority::High => "High",
            AlertPriority::Medium => "Medium",
            AlertPriority::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub const ALL: [AlertStatus; 3] = [
        AlertStatus::Active,
        AlertStatus::Acknowledged,
        AlertStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "Active",
            AlertStatus::Acknowledged => "Acknowledged",
            AlertStatus::Resolved => "Resolved",
        }
    }
}

/// A pump with its latest sensor readings, operational figures and AI insights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pump {
    pub id: String,
    pub name: String,
    pub location: String,
    pub pump_type: String,
    pub status: PumpStatus,

    pub pressure: f64,
    pub temperature: f64,
    pub vibration: f64,
    pub flow_rate: f64,
    pub power: f64,

    pub total_runtime: f64,
    pub average_uptime: f64,
    pub efficiency: f64,

    pub health_score: f64,
    pub predicted_failure_days: u32,
    pub confidence: f64,
    pub predicted_issue: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceLog {
    pub pump_id: String,
    pub task: String,
    pub status: String,
    pub date: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDateTime>,
    pub technician: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: u32,
    pub pump_id: String,
    pub alert_type: String,
    pub priority: AlertPriority,
    pub status: AlertStatus,
    pub message: String,
    pub remaining_useful_life: u32,
    pub confidence: f64,
}

/// One hourly sensor sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub pump_id: String,
    pub vibration: f64,
    pub temperature: f64,
    pub pressure: f64,
    pub flow_rate: f64,
    pub power: f64,
    pub recorded_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub normal: usize,
    pub warning: usize,
    pub critical: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_pumps: usize,
    pub critical_alerts: usize,
    pub predicted_failures: usize,
    pub system_health: f64,
    pub pump_status_breakdown: StatusBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthPoint {
    pub time: String,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthTrends {
    pub health_data: Vec<HealthPoint>,
    pub current_health: u32,
    pub trend: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: String,
    pub message: String,
    pub priority: String,
    pub pump_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total_alerts: usize,
    pub active_alerts: usize,
    pub critical_alerts: usize,
    pub priority_breakdown: std::collections::BTreeMap<String, usize>,
    pub status_breakdown: std::collections::BTreeMap<String, usize>,
}
