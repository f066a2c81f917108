//! Static service catalog: the five resold inference services, their USDC
//! prices, and the system prompts assembled from per-service options.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const AGENT_NAME: &str = "MindForHire";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKey {
    Summarize,
    Translate,
    CodeReview,
    Explain,
    GeneratePrompt,
}

pub const ALL_SERVICES: [ServiceKey; 5] = [
    ServiceKey::Summarize,
    ServiceKey::Translate,
    ServiceKey::CodeReview,
    ServiceKey::Explain,
    ServiceKey::GeneratePrompt,
];

impl ServiceKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKey::Summarize => "summarize",
            ServiceKey::Translate => "translate",
            ServiceKey::CodeReview => "code-review",
            ServiceKey::Explain => "explain",
            ServiceKey::GeneratePrompt => "generate-prompt",
        }
    }

    pub fn endpoint(&self) -> String {
        format!("/api/{}", self.as_str())
    }

    /// Price as charged, in USDC.
    pub fn price_usdc(&self) -> f64 {
        match self {
            ServiceKey::Summarize => 0.005,
            ServiceKey::Translate => 0.003,
            ServiceKey::CodeReview => 0.02,
            ServiceKey::Explain => 0.005,
            ServiceKey::GeneratePrompt => 0.01,
        }
    }

    /// Price as advertised in pricing/manifest responses and 402 headers.
    pub fn price_str(&self) -> &'static str {
        match self {
            ServiceKey::Summarize => "0.005",
            ServiceKey::Translate => "0.003",
            ServiceKey::CodeReview => "0.02",
            ServiceKey::Explain => "0.005",
            ServiceKey::GeneratePrompt => "0.01",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ServiceKey::Summarize => "Summarize any text or article into key points",
            ServiceKey::Translate => "Translate text between any languages",
            ServiceKey::CodeReview => "Review code for bugs, security, and improvements",
            ServiceKey::Explain => "Explain complex topics in simple terms",
            ServiceKey::GeneratePrompt => "Generate optimized AI image prompts",
        }
    }

    /// Output token cap for the upstream completion request.
    pub fn max_tokens(&self) -> u32 {
        match self {
            ServiceKey::CodeReview => 2048,
            _ => 1024,
        }
    }

    /// Service-specific alias for the input field accepted on the paid
    /// endpoint alongside the generic `input`.
    pub fn input_alias(&self) -> &'static str {
        match self {
            ServiceKey::Summarize | ServiceKey::Translate => "text",
            ServiceKey::CodeReview => "code",
            ServiceKey::Explain => "topic",
            ServiceKey::GeneratePrompt => "idea",
        }
    }

    /// Build the system prompt for this service from caller-supplied options.
    pub fn system_prompt(&self, options: &HashMap<String, String>) -> String {
        match self {
            ServiceKey::Summarize => {
                let mut prompt = String::from(
                    "You are a professional summarizer. Create a clear, concise summary of the provided text. ",
                );
                match options.get("max_length") {
                    Some(max) => prompt.push_str(&format!("Keep the summary under {} words.", max)),
                    None => prompt.push_str("Keep it concise but comprehensive."),
                }
                prompt
            }
            ServiceKey::Translate => {
                let from = options
                    .get("from")
                    .map(|f| format!("from {} ", f))
                    .unwrap_or_default();
                let to = options.get("to").map(String::as_str).unwrap_or("English");
                format!(
                    "You are a professional translator. Translate the given text {}to {}. Provide only the translation, no explanations.",
                    from, to
                )
            }
            ServiceKey::CodeReview => {
                let mut prompt =
                    String::from("You are a senior software engineer performing code review. ");
                match options.get("language") {
                    Some(lang) => prompt.push_str(&format!("The code is written in {}. ", lang)),
                    None => prompt.push_str("Detect the language. "),
                }
                match options.get("focus") {
                    Some(focus) => prompt.push_str(&format!("Focus on: {}. ", focus)),
                    None => prompt.push_str(
                        "Review for bugs, security issues, performance, and readability. ",
                    ),
                }
                prompt.push_str(
                    "Provide structured feedback with specific line references and improvement suggestions.",
                );
                prompt
            }
            ServiceKey::Explain => {
                let mut prompt = String::from(
                    "You are an expert teacher. Explain the given topic clearly and thoroughly. ",
                );
                match options.get("level") {
                    Some(level) => prompt.push_str(&format!("Target audience: {} level. ", level)),
                    None => prompt.push_str("Explain for a general audience. "),
                }
                prompt.push_str("Use analogies and examples where helpful.");
                prompt
            }
            ServiceKey::GeneratePrompt => {
                let mut prompt = String::from(
                    "You are an expert AI image prompt engineer. Create a highly detailed, optimized prompt for AI image generation (Midjourney/DALL-E/Stable Diffusion style). ",
                );
                if let Some(style) = options.get("style") {
                    prompt.push_str(&format!("Style: {}. ", style));
                }
                if let Some(ratio) = options.get("aspect_ratio") {
                    prompt.push_str(&format!("Aspect ratio: {}. ", ratio));
                }
                prompt.push_str(
                    "Include details about: subject, composition, lighting, mood, colors, camera angle, and artistic style. Output ONLY the prompt text, nothing else.",
                );
                prompt
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_serde_kebab_case() {
        let key: ServiceKey = serde_json::from_str("\"code-review\"").unwrap();
        assert_eq!(key, ServiceKey::CodeReview);
        assert_eq!(
            serde_json::to_string(&ServiceKey::GeneratePrompt).unwrap(),
            "\"generate-prompt\""
        );
    }

    #[test]
    fn test_prices_match_catalog() {
        assert_eq!(ServiceKey::Summarize.price_usdc(), 0.005);
        assert_eq!(ServiceKey::Translate.price_usdc(), 0.003);
        assert_eq!(ServiceKey::CodeReview.price_usdc(), 0.02);
        for service in ALL_SERVICES {
            let parsed: f64 = service.price_str().parse().unwrap();
            assert_eq!(parsed, service.price_usdc());
        }
    }

    #[test]
    fn test_code_review_gets_larger_budget() {
        assert_eq!(ServiceKey::CodeReview.max_tokens(), 2048);
        assert_eq!(ServiceKey::Summarize.max_tokens(), 1024);
    }

    #[test]
    fn test_summarize_prompt_with_max_length() {
        let mut options = HashMap::new();
        options.insert("max_length".to_string(), "50".to_string());
        let prompt = ServiceKey::Summarize.system_prompt(&options);
        assert!(prompt.contains("under 50 words"));

        let default = ServiceKey::Summarize.system_prompt(&HashMap::new());
        assert!(default.contains("concise but comprehensive"));
    }

    #[test]
    fn test_translate_prompt_defaults_to_english() {
        let prompt = ServiceKey::Translate.system_prompt(&HashMap::new());
        assert!(prompt.contains("to English"));

        let mut options = HashMap::new();
        options.insert("from".to_string(), "German".to_string());
        options.insert("to".to_string(), "Indonesian".to_string());
        let prompt = ServiceKey::Translate.system_prompt(&options);
        assert!(prompt.contains("from German to Indonesian"));
    }

    #[test]
    fn test_generate_prompt_includes_style_options() {
        let mut options = HashMap::new();
        options.insert("style".to_string(), "anime".to_string());
        options.insert("aspect_ratio".to_string(), "16:9".to_string());
        let prompt = ServiceKey::GeneratePrompt.system_prompt(&options);
        assert!(prompt.contains("Style: anime."));
        assert!(prompt.contains("Aspect ratio: 16:9."));
    }
}
