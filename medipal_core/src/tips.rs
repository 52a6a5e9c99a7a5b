//! Daily tips and weekly snack plans from an external text generator.
//!
//! The generator is optional. Any failure (no generator, non-zero exit,
//! malformed output) falls back to a fixed local list and is only logged.

use crate::{Error, FoodPlanItem, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};

const TIP_PROMPT: &str = "Give one short tip (max 15 words) about a specific food that \
protects the stomach before taking medicine. Be direct.";

const PLAN_PROMPT: &str = "Create a simple weekly snack plan (Sunday to Saturday) that \
protects the stomach when taking medicine.\n\
RULES:\n\
1. Never suggest dry foods on their own.\n\
2. Common, cheap foods.\n\
Return ONLY a valid JSON array.\n\
Format: [{\"day\": \"Sunday\", \"food\": \"Food\"}]";

/// Tips used when no generator is available
pub const LOCAL_TIPS: &[&str] = &[
    "Drink water, your skin will thank you.",
    "Peel more, unwrap less.",
    "Bananas help prevent cramps and lift your mood.",
    "An apple is the practical snack for busy people.",
    "Skip coffee after 4pm to sleep like a rock.",
    "Chew slowly, the food isn't going anywhere.",
    "Yogurt is great for your gut.",
];

/// Plan used when the generator fails
pub fn fallback_food_plan() -> Vec<FoodPlanItem> {
    [
        ("Sunday", "Yogurt with honey"),
        ("Monday", "Banana with oats"),
        ("Tuesday", "Ricotta sandwich"),
        ("Wednesday", "Papaya with granola"),
        ("Thursday", "Toast with cream cheese"),
        ("Friday", "Apple juice with whole-grain crackers"),
        ("Saturday", "Pear with yogurt"),
    ]
    .into_iter()
    .map(|(day, food)| FoodPlanItem {
        day: day.into(),
        food: food.into(),
    })
    .collect()
}

/// External text-generation backend
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Generator that pipes the prompt into an external command and reads stdout
#[derive(Clone, Debug)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a config argv such as `["llm", "-m", "some-model"]`
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

impl TextGenerator for CommandGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(prompt.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(Error::Generator(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Where a tip came from
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TipSource {
    Local,
    Generated,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tip {
    pub text: String,
    pub source: TipSource,
}

/// Fetch a daily tip, falling back to a local tip chosen by `seed`
pub fn daily_tip(generator: Option<&dyn TextGenerator>, seed: u64) -> Tip {
    if let Some(generator) = generator {
        match generator.generate(TIP_PROMPT) {
            Ok(text) if !text.trim().is_empty() => {
                return Tip {
                    text: text.trim().to_string(),
                    source: TipSource::Generated,
                };
            }
            Ok(_) => tracing::warn!("Generator returned an empty tip, using local tip"),
            Err(e) => tracing::warn!("Failed to generate tip: {}. Using local tip.", e),
        }
    }

    Tip {
        text: LOCAL_TIPS[(seed % LOCAL_TIPS.len() as u64) as usize].to_string(),
        source: TipSource::Local,
    }
}

/// Generate a seven-day snack plan, or the fallback plan on any failure
pub fn weekly_food_plan(generator: Option<&dyn TextGenerator>) -> Vec<FoodPlanItem> {
    let Some(generator) = generator else {
        tracing::info!("No generator configured, using fallback snack plan");
        return fallback_food_plan();
    };

    match generator
        .generate(PLAN_PROMPT)
        .and_then(|text| parse_food_plan(&text))
    {
        Ok(plan) => plan,
        Err(e) => {
            tracing::warn!("Failed to generate snack plan: {}. Using fallback.", e);
            fallback_food_plan()
        }
    }
}

/// Parse generator output into a plan, tolerating markdown code fences
pub fn parse_food_plan(text: &str) -> Result<Vec<FoodPlanItem>> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let items: Vec<FoodPlanItem> = serde_json::from_str(cleaned.trim())?;

    if items.len() != 7 {
        return Err(Error::Generator(format!(
            "expected 7 plan entries, got {}",
            items.len()
        )));
    }
    if let Some(bad) = items
        .iter()
        .find(|i| i.day.trim().is_empty() || i.food.trim().is_empty())
    {
        return Err(Error::Generator(format!("incomplete plan entry: {:?}", bad)));
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedGenerator(Result<String>);

    impl TextGenerator for FixedGenerator {
        fn generate(&self, _prompt: &str) -> Result<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(Error::Generator(e.to_string())),
            }
        }
    }

    fn plan_json() -> String {
        let items: Vec<_> = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]
            .iter()
            .map(|d| serde_json::json!({"day": d, "food": "Oats"}))
            .collect();
        serde_json::to_string(&items).unwrap()
    }

    #[test]
    fn test_tip_falls_back_without_generator() {
        let tip = daily_tip(None, 3);
        assert_eq!(tip.source, TipSource::Local);
        assert_eq!(tip.text, LOCAL_TIPS[3]);
    }

    #[test]
    fn test_tip_from_generator() {
        let gen = FixedGenerator(Ok("  Eat a banana first.\n".into()));
        let tip = daily_tip(Some(&gen), 0);
        assert_eq!(tip.source, TipSource::Generated);
        assert_eq!(tip.text, "Eat a banana first.");
    }

    #[test]
    fn test_tip_falls_back_on_error_or_empty() {
        let failing = FixedGenerator(Err(Error::Generator("offline".into())));
        assert_eq!(daily_tip(Some(&failing), 0).source, TipSource::Local);

        let empty = FixedGenerator(Ok("   ".into()));
        assert_eq!(daily_tip(Some(&empty), 0).source, TipSource::Local);
    }

    #[test]
    fn test_parse_fenced_plan() {
        let text = format!("```json\n{}\n```", plan_json());
        let plan = parse_food_plan(&text).unwrap();
        assert_eq!(plan.len(), 7);
        assert_eq!(plan[0].day, "Sun");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(parse_food_plan(r#"[{"day": "Sunday", "food": "Oats"}]"#).is_err());
        assert!(parse_food_plan("not json").is_err());
    }

    #[test]
    fn test_plan_falls_back_on_malformed_output() {
        let gen = FixedGenerator(Ok("Sure! Here's your plan...".into()));
        assert_eq!(weekly_food_plan(Some(&gen)), fallback_food_plan());
        assert_eq!(weekly_food_plan(None).len(), 7);
    }

    #[test]
    fn test_plan_from_generator() {
        let gen = FixedGenerator(Ok(plan_json()));
        let plan = weekly_food_plan(Some(&gen));
        assert_eq!(plan[6].day, "Sat");
        assert_eq!(plan[6].food, "Oats");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_generator_pipes_prompt() {
        let gen = CommandGenerator::new("cat", vec![]);
        assert_eq!(gen.generate("hello").unwrap(), "hello");

        let failing = CommandGenerator::new("false", vec![]);
        assert!(failing.generate("hello").is_err());
    }
}
