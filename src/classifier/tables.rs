//! 关键词表
//!
//! 内置的类别、建议与紧急触发词，以及从 TOML 文件加载自定义表。

use figment::{
    Figment,
    providers::{Format, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ClassifierBuilder;
use crate::error::{AppError, Result};
use crate::models::{AdviceParts, AdviceTemplate, KeywordCategory};

/// 内置紧急触发词
pub const EMERGENCY_TRIGGERS: &[&str] = &[
    "call 911",
    "911",
    "emergency",
    "unresponsive",
    "not breathing",
    "sudden vision",
    "face droop",
    "arm weak",
    "loss of speech",
    "collapse",
    "seizure",
];

/// (类别, 触发短语, [领域, 关注, 下一步, 在此期间])
type BuiltinEntry = (&'static str, &'static [&'static str], [&'static str; 4]);

const BUILTIN: &[BuiltinEntry] = &[
    (
        "memory",
        &["memory", "forget", "dementia", "alzheimer", "confusion", "repeating"],
        [
            "Possible area: Alzheimer’s-type cognitive decline.",
            "Watch: progressive short-term memory loss, repeating questions, disorientation.",
            "schedule cognitive screen (MMSE/MoCA), bring family member, keep diary.",
            "Meanwhile: support sleep, exercise, cognitive tasks, safety measures.",
        ],
    ),
    (
        "movement",
        &["tremor", "shake", "parkinson", "stiff", "rigid", "bradykinesia", "slow movement"],
        [
            "Possible area: Movement disorder (e.g., Parkinson’s).",
            "Watch: tremor, slowed movements, small handwriting, balance problems.",
            "movement-neurology evaluation; record short videos of symptoms.",
            "Meanwhile: fall safety, gentle exercise; do not stop meds.",
        ],
    ),
    (
        "stroke",
        &["stroke", "face droop", "arm weak", "slurred", "speech difficulty", "sudden weakness"],
        [
            "Possible area: Stroke (urgent if sudden).",
            "Watch: FAST — Face droop, Arm weakness, Speech difficulty; sudden onset is emergency.",
            "call emergency services immediately for sudden symptoms.",
            "Meanwhile: note time of onset; do not drive.",
        ],
    ),
    (
        "speech",
        &["speech", "aphasia", "language", "word-finding", "slurred"],
        [
            "Possible area: Language disorder (aphasia/PPA).",
            "Watch: difficulty finding words, understanding, forming sentences.",
            "speech-language evaluation and neurology assessment.",
            "Meanwhile: use communication aids and consistency.",
        ],
    ),
    (
        "sleep",
        &["sleep", "insomnia", "apnea", "narcolepsy", "restless legs", "daytime sleepiness"],
        [
            "Possible area: Sleep disorder (insomnia, sleep apnea, RLS).",
            "Watch: loud snoring, gasping, daytime sleepiness.",
            "keep sleep diary; consult primary care / sleep clinic.",
            "Meanwhile: regular schedule, cut caffeine/alcohol before bed.",
        ],
    ),
    (
        "mood",
        &["depress", "anxiety", "panic", "stress", "hopeless", "sad"],
        [
            "Possible area: Mood disorder (depression/anxiety).",
            "Watch: prolonged low mood, panic, changes in sleep/appetite.",
            "mental health screening; consider therapy or medication discussion.",
            "Meanwhile: reach out to supports; if suicidal, seek emergency help.",
        ],
    ),
    (
        "seizure",
        &["seizure", "convulsion", "fit", "blackout", "epilepsy"],
        [
            "Possible area: Seizure disorder.",
            "Watch: convulsions, loss of awareness, tongue biting, post-event confusion.",
            "urgent neurology and EEG for first-time events; ED if prolonged.",
            "Meanwhile: safety and avoid driving until assessed.",
        ],
    ),
    (
        "headache",
        &["headache", "migraine", "aura", "thunderclap"],
        [
            "Possible area: Headache / migraine.",
            "Watch: sudden severe headache (thunderclap), focal deficits.",
            "ED for sudden severe; otherwise track triggers and consult clinician.",
            "Meanwhile: hydration, rest, avoid triggers.",
        ],
    ),
    (
        "vision",
        &["vision", "double vision", "blur", "blind"],
        [
            "Possible area: Visual disturbance.",
            "Watch: sudden loss/double vision.",
            "urgent ophthalmology/ED if sudden.",
            "Meanwhile: avoid driving if impaired.",
        ],
    ),
    (
        "numbness",
        &["numb", "tingle", "pins and needles", "neuropathy"],
        [
            "Possible area: Peripheral neuropathy.",
            "Watch: progressive numbness, burning, weakness.",
            "primary-care testing (glucose, B12) and neurology referral.",
            "Meanwhile: protective foot care and fall prevention.",
        ],
    ),
];

/// 内置关键词表
pub fn builtin() -> ClassifierBuilder {
    BUILTIN
        .iter()
        .fold(ClassifierBuilder::default(), |builder, (name, phrases, parts)| {
            let [area, watch, next_steps, meanwhile] = parts;
            builder
                .category(KeywordCategory::new(name, phrases.iter()))
                .advice(AdviceTemplate::from_parts(
                    name,
                    &AdviceParts {
                        area: area.to_string(),
                        watch: watch.to_string(),
                        next_steps: next_steps.to_string(),
                        meanwhile: meanwhile.to_string(),
                    },
                ))
        })
        .emergency_phrases(EMERGENCY_TRIGGERS.iter())
}

/// 自定义关键词表文件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFile {
    /// 紧急提示（可选）
    #[serde(default)]
    pub emergency_message: Option<String>,
    /// 紧急触发词
    #[serde(default)]
    pub emergency_triggers: Vec<String>,
    /// 类别（按文件中的顺序注册）
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
}

/// 文件中的单个类别
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    pub triggers: Vec<String>,
    pub advice: AdviceParts,
}

impl TableFile {
    /// 转换为构建器（尚未校验）
    pub fn into_builder(self) -> ClassifierBuilder {
        let mut builder = ClassifierBuilder::default();
        for entry in self.categories {
            builder = builder
                .category(KeywordCategory::new(&entry.name, &entry.triggers))
                .advice(AdviceTemplate::from_parts(&entry.name, &entry.advice));
        }
        builder = builder.emergency_phrases(&self.emergency_triggers);
        if let Some(message) = self.emergency_message {
            builder = builder.emergency_message(&message);
        }
        builder
    }
}

/// 从 TOML 文件加载关键词表
pub fn load_from_file(path: &Path) -> Result<ClassifierBuilder> {
    if !path.exists() {
        return Err(AppError::Config(format!(
            "classifier tables not found: {}",
            path.display()
        )));
    }

    let file: TableFile = Figment::from(Toml::file(path)).extract()?;
    Ok(file.into_builder())
}

/// 从 TOML 字符串加载关键词表
pub fn load_from_str(toml: &str) -> Result<ClassifierBuilder> {
    let file: TableFile = Figment::from(Toml::string(toml)).extract()?;
    Ok(file.into_builder())
}
