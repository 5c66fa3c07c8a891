//! Text output

use colored::Colorize;
use diabetalens_core::{
    ActivityAssessment, ActivityCategory, ActivityForecast, AgeGroupInfo, BaselineCategory,
    BatchEntry, BatchReport, Horizon, RiskLevel, RiskMethod, RiskResult, StepSummary,
};

pub fn risk_result(result: &RiskResult) {
    println!();
    println!(
        "{} age {}, BMI {:.1}",
        "Diabetes risk".bold().cyan(),
        result.age,
        result.bmi
    );
    println!("  {} {}", "Method:".dimmed(), method_label(result.method));
    println!("  {} {}", "Reason:".dimmed(), result.reason);
    println!("  {} {:.1}%", "Baseline:".dimmed(), result.baseline_risk);

    if let Some(activity) = &result.activity {
        println!(
            "  {} {} (median {:.0} steps/day)",
            "Activity:".dimmed(),
            category_label(activity.category),
            activity.median_steps
        );
    }
    if let Some(level) = &result.risk_level {
        println!(
            "  {} {} (p = {:.4}, {} confidence)",
            "Risk level:".dimmed(),
            level_label(level.level),
            level.probability,
            level.confidence
        );
    }

    println!();
    println!("{}", "Horizons".bold());
    for horizon in Horizon::ALL {
        let added = result.risk_for(horizon) - result.baseline_risk;
        let sedentary = result
            .forecast
            .as_ref()
            .map(|f| format!(", {} sedentary days", f.sedentary_days(horizon)))
            .unwrap_or_default();
        println!(
            "  {:<9} {:>6.2}%  (+{:.2}{})",
            horizon.to_string(),
            result.risk_for(horizon),
            added,
            sedentary
        );
    }

    if !result.recommendations.is_empty() {
        println!();
        println!("{}", "Recommendations".bold());
        for line in &result.recommendations {
            println!("  - {}", line);
        }
    }
    println!();
}

pub fn age_group_info(info: &AgeGroupInfo) {
    let category = match info.risk_category {
        BaselineCategory::Low => "low".green(),
        BaselineCategory::Moderate => "moderate".yellow(),
        BaselineCategory::High => "high".red(),
    };
    println!(
        "{} age {} ({} bucket)",
        "Baseline:".bold().cyan(),
        info.age,
        info.age_group
    );
    println!(
        "  {} {:.1}% ({})",
        "Risk:".dimmed(),
        info.risk_percentage,
        category
    );
    println!(
        "  {} male {:.1}%, female {:.1}%, average {:.1}%",
        "Bucket prevalence:".dimmed(),
        info.age_group_data.male,
        info.age_group_data.female,
        info.age_group_data.average
    );
}

pub fn activity(assessment: &ActivityAssessment) {
    println!(
        "{} {}",
        "Activity:".bold().cyan(),
        category_label(assessment.category)
    );
    println!("  {} {:.1}", "Median steps:".dimmed(), assessment.median_steps);
    println!("  {} {:.1}", "Mean steps:".dimmed(), assessment.mean_steps);
    println!(
        "  {} {} of {} ({} outliers removed)",
        "Valid days:".dimmed(),
        assessment.valid_days,
        assessment.total_days,
        assessment.outliers_removed
    );
    println!(
        "  {} {} - {}",
        "Range:".dimmed(),
        assessment.min_steps,
        assessment.max_steps
    );
}

pub fn forecast(forecast: &ActivityForecast, summary: &StepSummary, sedentary_threshold: u32) {
    println!("{}", "28-day history".bold().cyan());
    println!(
        "  {} {:.2} (median {:.1}, std {:.2})",
        "Average:".dimmed(),
        forecast.avg_daily_steps,
        summary.median_steps,
        summary.std_steps
    );
    println!(
        "  {} {} below 5000, {} at or above 10000",
        "Days:".dimmed(),
        summary.days_below_5000,
        summary.days_above_10000
    );
    println!();
    println!(
        "{} (sedentary < {} steps)",
        "Projection".bold(),
        sedentary_threshold
    );
    for projection in &forecast.projections {
        println!(
            "  {:<9} {:>3} days, {:>3} sedentary",
            projection.horizon.to_string(),
            projection.horizon_days,
            projection.sedentary_day_count
        );
    }
}

pub fn batch(report: &BatchReport) {
    println!(
        "{} {} ({})",
        "Batch".bold().cyan(),
        report.batch_id,
        report.processed_at.to_rfc3339()
    );
    for entry in &report.entries {
        match entry {
            BatchEntry::Assessed { patient_id, result } => println!(
                "  {} {:<12} {:>6.2}% {:>6.2}% {:>6.2}%  {}",
                "ok".green(),
                patient_id,
                result.risk_1_month,
                result.risk_3_month,
                result.risk_6_month,
                method_label(result.method)
            ),
            BatchEntry::Failed {
                patient_id, error, ..
            } => println!("  {} {:<12} {}", "err".red(), patient_id, error),
        }
    }
    println!(
        "  {} total, {} successful, {} failed",
        report.summary.total, report.summary.successful, report.summary.failed
    );
}

fn method_label(method: RiskMethod) -> colored::ColoredString {
    match method {
        RiskMethod::BaselineOnly => "baseline only".normal(),
        RiskMethod::ActivityAdjusted => "activity adjusted".yellow(),
    }
}

fn category_label(category: ActivityCategory) -> colored::ColoredString {
    match category {
        ActivityCategory::Low => category.as_str().red(),
        ActivityCategory::Moderate => category.as_str().yellow(),
        ActivityCategory::High => category.as_str().green(),
    }
}

fn level_label(level: RiskLevel) -> colored::ColoredString {
    match level {
        RiskLevel::LowRisk => level.as_str().green(),
        RiskLevel::MediumRisk => level.as_str().yellow(),
        RiskLevel::HighRisk => level.as_str().red().bold(),
    }
}
