//! Lifestyle suggestions attached to a risk result.
//!
//! Selected deterministically from the pipeline path and activity category.
//! They are general guidance, not a diagnosis.

use crate::types::{ActivityCategory, RiskLevel};

/// Which branch of the pipeline produced the result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pathway {
    /// Below the age gate
    Young,
    /// At or above the age gate, classifier said low-risk
    LowRisk,
    /// At or above the age gate, classifier said medium- or high-risk
    AtRisk(RiskLevel),
}

pub fn recommendations_for(pathway: Pathway, activity: Option<ActivityCategory>) -> Vec<String> {
    let heading;
    let mut out: Vec<&str> = Vec::new();

    match pathway {
        // Activity is never assessed below the age gate
        Pathway::Young => {
            out.push("Maintain healthy lifestyle habits to prevent future diabetes risk");
            out.push("Continue regular physical activity to build long-term health patterns");
        }
        Pathway::LowRisk => {
            out.push("Low diabetes risk - continue current lifestyle");
            out.push("Maintain regular health check-ups");
            match activity {
                Some(ActivityCategory::Low) => {
                    out.push("Consider increasing daily activity for general health benefits");
                    out.push("Aim for at least 7,000-8,000 steps per day");
                }
                Some(ActivityCategory::Moderate) => {
                    out.push("Good activity level - maintain current routine")
                }
                Some(ActivityCategory::High) => out.push("Excellent activity level - keep it up!"),
                None => {}
            }
        }
        Pathway::AtRisk(level) => {
            heading = format!("{} diabetes risk detected", title_case(level));
            out.push(&heading);
            out.push("Consult with healthcare provider about diabetes prevention strategies");
            out.push("Consider regular blood glucose monitoring");
            match activity {
                Some(ActivityCategory::Low) => {
                    out.push("PRIORITY: Increase physical activity - aim for 8,000+ steps daily");
                    out.push("Focus on reducing sedentary days (< 5,000 steps) as they increase risk");
                    out.push("Start with walking 30 minutes daily, gradually increase intensity");
                }
                Some(ActivityCategory::Moderate) => {
                    out.push("Good activity level, but consider increasing to 10,000+ steps daily");
                    out.push("Add strength training 2-3 times per week");
                }
                Some(ActivityCategory::High) => {
                    out.push("Excellent activity level - maintain current routine");
                    out.push("Consider adding variety with different types of exercise");
                }
                None => {}
            }
        }
    }

    out.into_iter().map(String::from).collect()
}

/// "medium-risk" -> "Medium Risk"
fn title_case(level: RiskLevel) -> String {
    level
        .as_str()
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_risk_heading() {
        let recs = recommendations_for(
            Pathway::AtRisk(RiskLevel::HighRisk),
            Some(ActivityCategory::Low),
        );
        assert_eq!(recs[0], "High Risk diabetes risk detected");
        assert_eq!(recs.len(), 6);
        assert!(recs.iter().any(|r| r.contains("sedentary days")));
    }

    #[test]
    fn test_young_gets_generic_lines_only() {
        let recs = recommendations_for(Pathway::Young, None);
        assert_eq!(recs.len(), 2);
        assert_eq!(recommendations_for(Pathway::Young, Some(ActivityCategory::Low)), recs);
    }

    #[test]
    fn test_low_risk_by_activity() {
        let moderate = recommendations_for(Pathway::LowRisk, Some(ActivityCategory::Moderate));
        assert_eq!(moderate.len(), 3);
        let low = recommendations_for(Pathway::LowRisk, Some(ActivityCategory::Low));
        assert_eq!(low.len(), 4);
    }
}
