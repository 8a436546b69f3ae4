//! 早期脑健康自查
//!
//! 基于症状清单和年龄的可解释评分，输出风险区间、需要继续观察的症状
//! 和可复制的简要报告。仅用于教育目的，不构成诊断。

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{AppError, Result};

pub const MIN_AGE: u32 = 18;
pub const MAX_AGE: u32 = 120;

const HIGH_THRESHOLD: f64 = 0.7;
const MODERATE_THRESHOLD: f64 = 0.35;

/// 自查清单中的症状
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    MemoryRecent,
    DifficultyTasks,
    Disorientation,
    Language,
    MoodChange,
    MotorSymptoms,
    VisualSpatial,
    SleepProblems,
    SmellLoss,
}

impl Symptom {
    pub const ALL: [Symptom; 9] = [
        Symptom::MemoryRecent,
        Symptom::DifficultyTasks,
        Symptom::Disorientation,
        Symptom::Language,
        Symptom::MoodChange,
        Symptom::MotorSymptoms,
        Symptom::VisualSpatial,
        Symptom::SleepProblems,
        Symptom::SmellLoss,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Symptom::MemoryRecent => {
                "Noticeable recent memory lapses (forgetting recent conversations or events)"
            }
            Symptom::DifficultyTasks => "Difficulty planning or completing familiar tasks",
            Symptom::Disorientation => "Disorientation in time or place",
            Symptom::Language => "Trouble finding words or following conversations",
            Symptom::MoodChange => "Marked mood or personality changes",
            Symptom::MotorSymptoms => "Tremors, stiffness, or slowed movement",
            Symptom::VisualSpatial => {
                "Difficulty with spatial tasks (driving, judging distances)"
            }
            Symptom::SleepProblems => "Marked changes in sleep patterns (insomnia, vivid dreams)",
            Symptom::SmellLoss => "Noticeable loss of sense of smell (anosmia)",
        }
    }

    pub fn weight(&self) -> u32 {
        match self {
            Symptom::MemoryRecent | Symptom::Disorientation => 3,
            Symptom::DifficultyTasks | Symptom::Language | Symptom::MotorSymptoms => 2,
            Symptom::MoodChange
            | Symptom::VisualSpatial
            | Symptom::SleepProblems
            | Symptom::SmellLoss => 1,
        }
    }
}

/// 出生时登记的性别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
    #[default]
    Other,
}

impl Sex {
    pub fn label(&self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
            Sex::Other => "Other / Prefer not to say",
        }
    }
}

/// 风险区间
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    pub fn from_probability(probability: f64) -> Self {
        if probability >= HIGH_THRESHOLD {
            RiskBand::High
        } else if probability >= MODERATE_THRESHOLD {
            RiskBand::Moderate
        } else {
            RiskBand::Low
        }
    }
}

/// 自查输入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningInput {
    pub age: u32,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub symptoms: Vec<Symptom>,
}

/// 自查结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub score: u32,
    pub probability: f64,
    pub risk_band: RiskBand,
    /// 百分比（四舍五入）
    pub percent: u32,
    pub inferred_symptoms: Vec<String>,
    pub next_steps: Vec<String>,
    pub report: String,
}

pub const NEXT_STEPS: &[&str] = &[
    "Schedule a clinical evaluation: bring this report to a primary care physician or neurologist.",
    "Bring a companion to appointments to help recall history and symptoms.",
    "Ask about standard cognitive tests (e.g., MMSE, MoCA) and whether a referral for imaging or specialist assessment is appropriate.",
    "Document changes: keep a short diary of symptoms, dates, and impact on daily life.",
    "Immediate red flags: seek urgent care if there is sudden confusion, focal weakness, sudden vision loss, or loss of speech.",
];

const NO_TRAJECTORY: &str = "No strong additional symptom trajectory inferred from current inputs. Continue routine monitoring.";

/// 年龄加分
fn age_factor(age: u32) -> u32 {
    if age >= 65 {
        2
    } else if age >= 50 {
        1
    } else {
        0
    }
}

/// 分数映射为概率
pub fn heuristic_probability(score: u32) -> f64 {
    1.0 / (1.0 + (-(score as f64 - 5.0) / 2.0).exp())
}

fn infer_next_symptoms(checked: &BTreeSet<Symptom>) -> Vec<String> {
    let mut inferred = Vec::new();
    if checked.contains(&Symptom::MemoryRecent) || checked.contains(&Symptom::DifficultyTasks) {
        inferred.push(
            "Increased difficulty with short-term memory (e.g., forgetting appointments)".into(),
        );
        inferred.push("Reduced ability to manage finances or medications".into());
    }
    if checked.contains(&Symptom::MotorSymptoms) {
        inferred.push("Progression in motor symptoms: slowed movement, increased stiffness".into());
        inferred.push("Greater difficulty with balance".into());
    }
    if checked.contains(&Symptom::SmellLoss) {
        inferred.push(
            "Potential earlier olfactory changes; monitor for related cognitive issues".into(),
        );
    }
    if inferred.is_empty() {
        inferred.push(NO_TRAJECTORY.to_string());
    }
    inferred
}

/// 执行自查
pub fn evaluate(input: &ScreeningInput) -> Result<ScreeningResult> {
    if !(MIN_AGE..=MAX_AGE).contains(&input.age) {
        return Err(AppError::Validation(format!(
            "Age must be between {} and {}",
            MIN_AGE, MAX_AGE
        )));
    }

    let checked: BTreeSet<Symptom> = input.symptoms.iter().copied().collect();
    let score = checked.iter().map(Symptom::weight).sum::<u32>() + age_factor(input.age);
    let probability = heuristic_probability(score);
    let risk_band = RiskBand::from_probability(probability);
    let percent = (probability * 100.0).round() as u32;
    let inferred_symptoms = infer_next_symptoms(&checked);

    let mut report = format!(
        "InMind Early Check Report\nAge: {}\nSex: {}\nRisk: {:?} ({}%)\nChecked symptoms:\n",
        input.age,
        input.sex.label(),
        risk_band,
        percent
    );
    for symptom in Symptom::ALL.iter().filter(|s| checked.contains(*s)) {
        report.push_str(&format!("- {}\n", symptom.label()));
    }
    report.push_str("\nInferred next symptoms:\n");
    for item in &inferred_symptoms {
        report.push_str(&format!("- {}\n", item));
    }
    report.push_str("\nNext steps: Seek clinical evaluation. This is not a diagnosis.");

    Ok(ScreeningResult {
        score,
        probability,
        risk_band,
        percent,
        inferred_symptoms,
        next_steps: NEXT_STEPS.iter().map(|s| s.to_string()).collect(),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn input(age: u32, symptoms: Vec<Symptom>) -> ScreeningInput {
        ScreeningInput {
            age,
            sex: Sex::Female,
            symptoms,
        }
    }

    #[test]
    fn test_midpoint_probability() {
        assert!((heuristic_probability(5) - 0.5).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case(30, vec![], 0, RiskBand::Low)]
    #[case(65, vec![], 2, RiskBand::Low)]
    #[case(55, vec![Symptom::MemoryRecent], 4, RiskBand::Moderate)]
    #[case(70, vec![Symptom::MemoryRecent, Symptom::Disorientation, Symptom::Language], 10, RiskBand::High)]
    fn test_score_and_band(
        #[case] age: u32,
        #[case] symptoms: Vec<Symptom>,
        #[case] score: u32,
        #[case] band: RiskBand,
    ) {
        let result = evaluate(&input(age, symptoms)).unwrap();
        assert_eq!(result.score, score);
        assert_eq!(result.risk_band, band);
    }

    #[test]
    fn test_duplicate_symptoms_counted_once() {
        let result = evaluate(&input(
            30,
            vec![Symptom::MemoryRecent, Symptom::MemoryRecent],
        ))
        .unwrap();
        assert_eq!(result.score, 3);
    }

    #[test]
    fn test_age_out_of_range() {
        assert!(matches!(
            evaluate(&input(17, vec![])),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            evaluate(&input(121, vec![])),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_inferred_symptoms() {
        let result = evaluate(&input(40, vec![])).unwrap();
        assert_eq!(result.inferred_symptoms, vec![NO_TRAJECTORY]);

        let result = evaluate(&input(40, vec![Symptom::MotorSymptoms, Symptom::SmellLoss])).unwrap();
        assert_eq!(result.inferred_symptoms.len(), 3);
        assert!(result.inferred_symptoms[0].starts_with("Progression in motor symptoms"));
    }

    #[test]
    fn test_report_contents() {
        let result = evaluate(&input(66, vec![Symptom::SmellLoss, Symptom::MemoryRecent])).unwrap();
        assert!(result.report.starts_with("InMind Early Check Report\nAge: 66\nSex: Female\n"));
        let memory = result.report.find(Symptom::MemoryRecent.label()).unwrap();
        let smell = result.report.find(Symptom::SmellLoss.label()).unwrap();
        assert!(memory < smell);
        assert!(result.report.ends_with("This is not a diagnosis."));
        assert_eq!(result.next_steps.len(), 5);
    }
}
