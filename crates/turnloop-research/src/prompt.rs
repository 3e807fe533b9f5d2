//! Assistant presets and their developer instructions.

use clap::ValueEnum;

/// A ready-made assistant: instruction, tools and turn budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Japanese-to-English translation, no tools. Keeps history across lines.
    Translator,
    /// Step-by-step arithmetic with the `add`/`sub`/`mul`/`div` tools.
    Calculator,
    /// Web search plus arithmetic, answering with cited sources.
    Researcher,
}

impl Preset {
    /// Developer instruction seeded into every session for this preset.
    pub fn instruction(self) -> &'static str {
        match self {
            Preset::Translator => TRANSLATOR_PROMPT,
            Preset::Calculator => CALCULATOR_PROMPT,
            Preset::Researcher => RESEARCHER_PROMPT,
        }
    }

    pub fn default_max_turns(self) -> u32 {
        match self {
            Preset::Translator => 1,
            Preset::Calculator => 10,
            Preset::Researcher => 8,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Preset::Translator => "gpt-4o-mini",
            Preset::Calculator | Preset::Researcher => turnloop::DEFAULT_MODEL,
        }
    }

    /// Translation keeps the provider's default sampling.
    pub fn default_temperature(self) -> Option<f32> {
        match self {
            Preset::Translator => None,
            Preset::Calculator | Preset::Researcher => Some(0.0),
        }
    }

    pub fn uses_arithmetic(self) -> bool {
        matches!(self, Preset::Calculator | Preset::Researcher)
    }

    pub fn uses_search(self) -> bool {
        matches!(self, Preset::Researcher)
    }

    /// Label shown before each interactive input line.
    pub fn input_label(self) -> &'static str {
        match self {
            Preset::Translator => "translate",
            Preset::Calculator => "expression",
            Preset::Researcher => "question",
        }
    }
}

const TRANSLATOR_PROMPT: &str = "\
You are a high-quality Japanese-to-English translation engine. Translate the \
user's input into English and reply with the translation only.";

const CALCULATOR_PROMPT: &str = "\
You compute the value of the arithmetic expression the user enters.
Respect operator precedence and work step by step using the provided tools.
Each tool returns its value in the `result` field.
When every step is done, output only the final numeric result.";

const RESEARCHER_PROMPT: &str = "\
You are a research assistant that answers numeric questions by combining web \
search with the arithmetic tools.
- Always use tavily_search when facts must be looked up.
- Do every sum, difference, product or quotient with the provided tools.
- Structure the answer with short headings and bullet points.
- Cite the source URLs you relied on and show the calculation you performed.";
