//! Plain-text business report
//!
//! The report is rendered from the outputs of the other stages: the demand
//! forecast summary, the anomaly status and the risk assessment. Every input field
//! is optional when decoded from JSON so a partial upstream failure still renders.

use risk_scoring::{AnomalyResult, RiskLevel, RiskResult, Severity};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const RULE_WIDTH: usize = 80;
const DEFAULT_HORIZON_DAYS: usize = 30;

/// Demand forecast fields the report reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSummary {
    pub forecast: Vec<f64>,
    pub growth_percentage: f64,
    pub confidence: f64,
}

/// Anomaly fields the report reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyStatus {
    pub anomaly: bool,
    pub score: f64,
    pub severity: Option<Severity>,
}

/// Everything the report is rendered from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportInput {
    pub demand_forecast: ForecastSummary,
    pub anomaly_status: AnomalyStatus,
    /// Labels other than LOW, MEDIUM or HIGH (any case) decode as UNKNOWN
    #[serde(deserialize_with = "lenient_risk_level")]
    pub risk_level: RiskLevel,
    pub risk_probability: f64,
    pub top_factors: Vec<String>,
}

impl Default for ReportInput {
    fn default() -> Self {
        Self {
            demand_forecast: ForecastSummary::default(),
            anomaly_status: AnomalyStatus::default(),
            risk_level: RiskLevel::Unknown,
            risk_probability: 0.0,
            top_factors: Vec::new(),
        }
    }
}

fn lenient_risk_level<'de, D>(deserializer: D) -> std::result::Result<RiskLevel, D::Error>
where
    D: Deserializer<'de>,
{
    let level = match Value::deserialize(deserializer)? {
        Value::String(label) => match label.to_ascii_uppercase().as_str() {
            "LOW" => RiskLevel::Low,
            "MEDIUM" => RiskLevel::Medium,
            "HIGH" => RiskLevel::High,
            _ => RiskLevel::Unknown,
        },
        _ => RiskLevel::Unknown,
    };
    Ok(level)
}

impl ReportInput {
    /// Assemble the report input from stage results
    pub fn from_results(forecast: ForecastSummary, anomaly: &AnomalyResult, risk: &RiskResult) -> Self {
        Self {
            demand_forecast: forecast,
            anomaly_status: AnomalyStatus {
                anomaly: anomaly.is_anomaly,
                score: anomaly.score,
                severity: anomaly.severity,
            },
            risk_level: risk.risk_level,
            risk_probability: risk.risk_probability,
            top_factors: risk.top_factors.clone(),
        }
    }

    fn horizon_days(&self) -> usize {
        match self.demand_forecast.forecast.len() {
            0 => DEFAULT_HORIZON_DAYS,
            n => n,
        }
    }
}

/// Operational health on a 0-100 scale
pub fn health_score(growth_percentage: f64, risk_probability: f64, is_anomaly: bool) -> f64 {
    let mut score = 100.0 - risk_probability * 30.0;
    if is_anomaly {
        score -= 15.0;
    }
    if growth_percentage.abs() > 20.0 {
        score -= 10.0;
    }
    score.clamp(0.0, 100.0)
}

/// Grade of a health score
pub fn health_grade(score: f64) -> &'static str {
    if score >= 80.0 {
        "EXCELLENT"
    } else if score >= 60.0 {
        "GOOD"
    } else if score >= 40.0 {
        "FAIR"
    } else {
        "POOR"
    }
}

/// 0.3 x forecast confidence + 0.3 x anomaly clearance + 0.4 x risk clearance
pub fn combined_score(confidence: f64, is_anomaly: bool, risk_probability: f64) -> f64 {
    let anomaly_clearance = if is_anomaly { 0.0 } else { 100.0 };
    confidence * 0.3 + anomaly_clearance * 0.3 + (1.0 - risk_probability) * 100.0 * 0.4
}

/// `delay_days` becomes `Delay Days`
fn title_case(factor: &str) -> String {
    factor
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

fn section(out: &mut String, title: &str) {
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');
}

fn line(out: &mut String, text: impl AsRef<str>) {
    out.push_str(text.as_ref());
    out.push('\n');
}

fn render_forecast(out: &mut String, input: &ReportInput) {
    let growth = input.demand_forecast.growth_percentage;
    let days = input.horizon_days();
    section(out, "DEMAND FORECAST ANALYSIS");

    if growth > 0.0 {
        line(out, format!("Demand is projected to INCREASE by {:.1}% over the next {} days.", growth.abs(), days));
        if growth > 15.0 {
            line(out, "ALERT: Significant demand surge expected. Immediate action required.");
        } else if growth > 10.0 {
            line(out, "Moderate growth anticipated. Prepare for increased orders.");
        } else {
            line(out, "Steady growth pattern detected. Normal operations recommended.");
        }
    } else if growth < 0.0 {
        line(out, format!("Demand is projected to DECREASE by {:.1}% over the next {} days.", growth.abs(), days));
        if growth.abs() > 15.0 {
            line(out, "ALERT: Significant demand drop expected. Review inventory levels.");
        } else {
            line(out, "Slight decline anticipated. Monitor market conditions.");
        }
    } else {
        line(out, format!("Demand is projected to remain STABLE over the next {} days.", days));
    }

    line(out, format!("Forecast Confidence: {:.0}%", input.demand_forecast.confidence));
    line(out, "");
}

fn render_anomaly(out: &mut String, input: &ReportInput) {
    let status = &input.anomaly_status;
    section(out, "ANOMALY DETECTION STATUS");

    if status.anomaly {
        let severity = status.severity.unwrap_or(Severity::Medium);
        line(out, format!("ANOMALY DETECTED - Severity: {}", severity));
        line(out, "Unusual patterns identified in recent shipment data.");
        line(out, format!("Anomaly Score: {:.3} (lower values indicate higher anomaly)", status.score));
        line(out, "");
        line(out, "Recommended Actions:");
        line(out, "  - Investigate recent transactions for irregularities");
        line(out, "  - Verify temperature and handling compliance");
        line(out, "  - Review supplier and distributor performance");
    } else {
        line(out, "NO ANOMALIES DETECTED");
        line(out, "All recent shipments are within normal operational parameters.");
        line(out, "Supply chain operations are functioning as expected.");
    }
    line(out, "");
}

fn render_factors(out: &mut String, heading: &str, factors: &[String]) {
    line(out, heading);
    for (i, factor) in factors.iter().take(3).enumerate() {
        line(out, format!("  {}. {}", i + 1, title_case(factor)));
    }
    line(out, "");
}

fn render_risk(out: &mut String, input: &ReportInput) {
    let factors = &input.top_factors;
    let has = |name: &str| factors.iter().any(|f| f.as_str() == name);
    section(out, "RISK ASSESSMENT");

    line(out, format!("Current Risk Level: {}", input.risk_level));
    line(out, format!("Risk Probability: {}", percent(input.risk_probability)));
    line(out, "");

    match input.risk_level {
        RiskLevel::High => {
            line(out, "HIGH RISK ALERT - Immediate intervention required!");
            line(out, "");
            render_factors(out, "Critical Risk Factors:", factors);
            line(out, "Urgent Actions Required:");
            if has("delay_days") {
                line(out, "  - Address delivery delays - review logistics and routes");
            }
            if has("temperature") {
                line(out, "  - Investigate temperature control issues - check cold chain");
            }
            if has("stock_level") {
                line(out, "  - Replenish inventory immediately - prevent stockouts");
            }
            if has("demand") {
                line(out, "  - Adjust supply planning - align with demand fluctuations");
            }
        }
        RiskLevel::Medium => {
            line(out, "MODERATE RISK - Proactive monitoring recommended");
            line(out, "");
            render_factors(out, "Key Risk Factors:", factors);
            line(out, "Recommended Actions:");
            line(out, "  - Increase monitoring frequency for flagged parameters");
            line(out, "  - Prepare contingency plans for potential disruptions");
            line(out, "  - Review and optimize current operational procedures");
        }
        RiskLevel::Low | RiskLevel::Unknown => {
            line(out, "LOW RISK - Operations within acceptable parameters");
            line(out, "");
            line(out, "Maintain current operational standards and continue routine monitoring.");
        }
    }
    line(out, "");
}

fn render_recommendations(out: &mut String, input: &ReportInput) {
    let growth = input.demand_forecast.growth_percentage;
    section(out, "STRATEGIC RECOMMENDATIONS");

    if growth > 15.0 {
        let buffer = ((growth * 1.2) as i64).min(25);
        line(out, format!("- INCREASE buffer stock by {}% to meet projected demand surge", buffer));
    } else if growth > 5.0 {
        line(out, format!("- ADJUST inventory levels by {}% to align with demand growth", growth as i64));
    } else if growth < -10.0 {
        let cut = (growth as i64).abs().min(20);
        line(out, format!("- REDUCE inventory by {}% to prevent overstocking", cut));
    } else {
        line(out, "- MAINTAIN current inventory levels - demand stable");
    }

    match input.risk_level {
        RiskLevel::High => {
            line(out, "- IMPLEMENT emergency response protocols immediately");
            line(out, "- ESCALATE to senior management for strategic intervention");
        }
        RiskLevel::Medium => {
            line(out, "- REINFORCE monitoring protocols and inspection frequency");
            line(out, "- PREPARE backup suppliers and alternative routes");
        }
        RiskLevel::Low | RiskLevel::Unknown => {
            line(out, "- CONTINUE standard operations with routine monitoring");
        }
    }

    if input.anomaly_status.anomaly {
        line(out, "- CONDUCT thorough audit of flagged transactions");
        line(out, "- VERIFY record integrity and data authenticity");
    }

    line(out, "- MAINTAIN temperature compliance across all shipments (15°C - 30°C)");
    line(out, "- ENSURE traceability records for all transactions");
    line(out, "");
}

fn render_kpis(out: &mut String, input: &ReportInput) {
    let growth = input.demand_forecast.growth_percentage;
    let anomaly = input.anomaly_status.anomaly;
    let health = health_score(growth, input.risk_probability, anomaly);
    section(out, "KEY PERFORMANCE INDICATORS");

    line(out, format!("Forecast Accuracy:        {:.0}%", input.demand_forecast.confidence));
    line(out, format!("Risk Assessment:          {} ({})", input.risk_level, percent(input.risk_probability)));
    line(out, format!("Anomaly Status:           {}", if anomaly { "DETECTED" } else { "CLEAR" }));
    line(out, format!("Operational Health:       {} ({:.0}/100)", health_grade(health), health));
    line(out, "");
}

fn render_next_steps(out: &mut String, input: &ReportInput) {
    let growth = input.demand_forecast.growth_percentage;
    section(out, "IMMEDIATE NEXT STEPS (Priority Order)");

    let mut steps: Vec<String> = Vec::new();
    if input.risk_level == RiskLevel::High {
        let leading: Vec<&str> = input.top_factors.iter().take(2).map(String::as_str).collect();
        steps.push(format!("Address high-risk factors: {}", leading.join(", ")));
    }
    if input.anomaly_status.anomaly {
        steps.push("Investigate detected anomalies in supply chain data".to_string());
    }
    if growth.abs() > 10.0 {
        steps.push(format!(
            "Adjust inventory and procurement based on {:.1}% demand change",
            growth.abs()
        ));
    }
    steps.push("Review and optimize logistics for cost efficiency".to_string());
    steps.push("Conduct routine traceability and compliance checks".to_string());

    for (priority, step) in steps.iter().enumerate() {
        line(out, format!("{}. {}", priority + 1, step));
    }
    line(out, "");
}

/// Render the full multi-section report
pub fn render_report(input: &ReportInput) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    line(&mut out, &rule);
    line(&mut out, "SUPPLY CHAIN INTELLIGENCE REPORT");
    line(&mut out, &rule);
    line(&mut out, "");

    render_forecast(&mut out, input);
    render_anomaly(&mut out, input);
    render_risk(&mut out, input);
    render_recommendations(&mut out, input);
    render_kpis(&mut out, input);
    render_next_steps(&mut out, input);

    line(&mut out, &rule);
    line(&mut out, "Report generated by the Supply Insight engine");
    out.push_str(&rule);
    out
}
