//! Prompt templates for board questions

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

const PLACEHOLDER_PATTERN: &str = r"\{\{(\w+)\}\}";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern is a valid regex"));

/// Text with `{{name}}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Substitute known placeholders; unknown ones are left in place
    #[must_use]
    pub fn render(&self, values: &HashMap<&str, &str>) -> String {
        PLACEHOLDER
            .replace_all(&self.template, |caps: &Captures| {
                values
                    .get(&caps[1])
                    .map_or_else(|| caps[0].to_string(), |value| (*value).to_string())
            })
            .into_owned()
    }

    /// Placeholder names in first-seen order
    #[must_use]
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&self.template) {
            if let Some(name) = caps.get(1).map(|m| m.as_str()) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// Fixed prompts used by the answer generator
pub struct BoardPrompts;

impl BoardPrompts {
    /// System instruction: answer in Japanese, cite `No.XXX`, admit ignorance
    #[must_use]
    pub const fn system() -> &'static str {
        "あなたは賢い掲示板のアシスタントです。\n\
         提供された掲示板の会話コンテキストを元に、ユーザーの質問に日本語で回答してください。\n\
         文脈に答えがない場合は、無理に答えを生成せず「分かりません」と回答してください。\n\
         \n\
         回答する際は、参考にしたレス番号（No.XXX）を明示してください。\n\
         会話の時系列的な流れを理解した上で回答してください。"
    }

    /// User message carrying the rendered context and the question
    #[must_use]
    pub fn question() -> PromptTemplate {
        PromptTemplate::new("【コンテキスト】\n{{context}}\n\n【質問】\n{{question}}\n\n【回答】")
    }
}
