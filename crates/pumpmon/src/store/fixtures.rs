//! The fixed sample records served by the store

use chrono::{NaiveDate, NaiveDateTime};

use super::records::{Alert, AlertPriority, AlertStatus, MaintenanceLog, Pump, PumpStatus};

/// `[pressure, temperature, vibration, flow_rate, power]`
type Sensors = [f64; 5];
/// `[total_runtime, average_uptime, efficiency]`
type Operational = [f64; 3];

#[allow(clippy::too_many_arguments)]
fn pump(
    id: &str,
    name: &str,
    location: &str,
    pump_type: &str,
    status: PumpStatus,
    sensors: Sensors,
    operational: Operational,
    insights: (f64, u32, f64, &str),
) -> Pump {
    let [pressure, temperature, vibration, flow_rate, power] = sensors;
    let [total_runtime, average_uptime, efficiency] = operational;
    let (health_score, predicted_failure_days, confidence, predicted_issue) = insights;
    Pump {
        id: id.to_string(),
        name: name.to_string(),
        location: location.to_string(),
        pump_type: pump_type.to_string(),
        status,
        pressure,
        temperature,
        vibration,
        flow_rate,
        power,
        total_runtime,
        average_uptime,
        efficiency,
        health_score,
        predicted_failure_days,
        confidence,
        predicted_issue: predicted_issue.to_string(),
    }
}

pub fn pumps() -> Vec<Pump> {
    use PumpStatus::*;
    vec![
        pump(
            "P001",
            "Feed Pump A1",
            "Unit A",
            "Centrifugal",
            Normal,
            [45.2, 78.0, 2.3, 1250.0, 75.5],
            [8760.0, 98.5, 87.2],
            (73.0, 18, 85.0, "Bearing wear detected. Flow rate declining gradually."),
        ),
        pump(
            "P002",
            "Booster Pump B3",
            "Unit B",
            "Centrifugal",
            Warning,
            [52.1, 92.0, 3.1, 980.0, 82.3],
            [7200.0, 96.8, 84.1],
            (
                68.0,
                12,
                87.0,
                "Temperature rising above normal range. Cooling system may need attention.",
            ),
        ),
        pump(
            "P003",
            "Transfer Pump C2",
            "Unit C",
            "Reciprocating",
            Critical,
            [38.7, 105.0, 4.8, 750.0, 95.2],
            [9100.0, 92.1, 79.8],
            (45.0, 5, 92.0, "Critical overheating detected. Immediate maintenance required."),
        ),
        pump(
            "P004",
            "Circulation Pump A2",
            "Unit A",
            "Rotary",
            Normal,
            [41.3, 82.0, 1.9, 1150.0, 68.7],
            [6500.0, 99.2, 91.5],
            (89.0, 45, 72.0, "Operating within normal parameters."),
        ),
        pump(
            "P005",
            "Main Feed Pump",
            "Unit B",
            "Centrifugal",
            Warning,
            [48.9, 88.0, 2.8, 1100.0, 79.1],
            [8200.0, 97.3, 85.7],
            (71.0, 22, 79.0, "Flow rate fluctuations detected. Check impeller condition."),
        ),
        pump(
            "P006",
            "Service Pump D1",
            "Unit C",
            "Rotary",
            Normal,
            [44.6, 76.0, 1.7, 1300.0, 72.4],
            [5800.0, 98.9, 93.2],
            (94.0, 67, 68.0, "Excellent condition. No immediate concerns detected."),
        ),
        pump(
            "P007",
            "Coolant Pump A3",
            "Unit A",
            "Centrifugal",
            Normal,
            [46.1, 79.0, 1.3, 1180.0, 73.2],
            [7200.0, 97.8, 89.1],
            (
                82.0,
                35,
                76.0,
                "Normal operation. Minor vibration increase noted for monitoring.",
            ),
        ),
        pump(
            "P008",
            "Reserve Pump B1",
            "Unit B",
            "Reciprocating",
            Critical,
            [50.5, 98.0, 3.8, 890.0, 88.7],
            [9500.0, 93.5, 81.3],
            (52.0, 8, 89.0, "High vibration and temperature. Bearing failure imminent."),
        ),
        pump(
            "P009",
            "Auxiliary Pump C4",
            "Unit C",
            "Rotary",
            Warning,
            [40.2, 85.0, 2.1, 1050.0, 76.8],
            [6800.0, 95.7, 86.4],
            (74.0, 28, 81.0, "Efficiency declining slowly. Schedule preventive maintenance."),
        ),
    ]
}

fn day(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn log(pump_id: &str, task: &str, status: &str, date: (u32, u32), technician: &str) -> MaintenanceLog {
    let date = day(2024, date.0, date.1);
    MaintenanceLog {
        pump_id: pump_id.to_string(),
        task: task.to_string(),
        status: status.to_string(),
        date,
        completed_date: (status == "Completed").then_some(date),
        technician: technician.to_string(),
    }
}

pub fn maintenance_logs() -> Vec<MaintenanceLog> {
    vec![
        log("P001", "Routine Inspection", "Completed", (6, 10), "John Smith"),
        log("P001", "Bearing Replacement", "Completed", (5, 15), "Mike Johnson"),
        log("P001", "Oil Change", "Completed", (4, 20), "Sarah Davis"),
        log("P001", "Scheduled Inspection", "Pending", (6, 25), "TBD"),
        log("P002", "Cooling System Check", "Completed", (6, 8), "Lisa Wilson"),
        log("P002", "Temperature Sensor Calibration", "Pending", (6, 20), "TBD"),
        log("P003", "Emergency Inspection", "Pending", (6, 15), "Emergency Team"),
        log("P003", "Overhaul Required", "Scheduled", (6, 18), "Senior Technician"),
        log("P004", "Routine Maintenance", "Completed", (5, 28), "Bob Chen"),
        log("P005", "Impeller Inspection", "Pending", (6, 22), "TBD"),
        log("P006", "Performance Check", "Completed", (6, 5), "Alex Kumar"),
        log("P007", "Vibration Analysis", "Scheduled", (6, 19), "Vibration Specialist"),
        log("P008", "Critical Bearing Replacement", "Urgent", (6, 16), "Emergency Team"),
        log("P009", "Preventive Maintenance", "Scheduled", (6, 24), "Maintenance Team"),
    ]
}

pub fn alerts() -> Vec<Alert> {
    use AlertPriority::*;
    use AlertStatus::*;
    let rows = [
        ("P003", "temperature", Critical, Active, "Temperature spike detected - 105°F", 5, 92.0),
        (
            "P008",
            "vibration",
            Critical,
            Active,
            "High vibration and temperature - bearing failure imminent",
            8,
            89.0,
        ),
        ("P002", "temperature", High, Acknowledged, "Temperature rising above normal range", 12, 87.0),
        ("P005", "flow", Medium, Active, "Flow rate fluctuations detected", 22, 79.0),
        ("P009", "efficiency", Medium, Active, "Efficiency declining slowly", 28, 81.0),
        ("P001", "pressure", Low, Resolved, "Pressure fluctuation detected", 45, 65.0),
    ];

    rows.into_iter()
        .enumerate()
        .map(
            |(index, (pump_id, alert_type, priority, status, message, rul, confidence))| Alert {
                id: index as u32 + 1,
                pump_id: pump_id.to_string(),
                alert_type: alert_type.to_string(),
                priority,
                status,
                message: message.to_string(),
                remaining_useful_life: rul,
                confidence,
            },
        )
        .collect()
}
