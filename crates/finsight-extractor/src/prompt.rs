//! Prompt templates for question contextualization and structured answers

use crate::config::ConversionMode;
use finsight_domain::TaskKind;

/// Build the prompt that turns a task label into a self-contained question
pub fn contextualizer_prompt(task_label: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(CONTEXTUALIZER_INSTRUCTIONS);
    prompt.push_str("\n\n---\n");
    prompt.push_str(&format!("Task: {}\n", task_label));
    prompt.push_str("Question:");
    prompt
}

/// Builds the answer prompt for one task
pub struct PromptBuilder<'a> {
    task_label: &'a str,
    question: &'a str,
    context: &'a str,
    kind: TaskKind,
    mode: ConversionMode,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(task_label: &'a str, kind: TaskKind, question: &'a str, context: &'a str) -> Self {
        Self {
            task_label,
            question,
            context,
            kind,
            mode: ConversionMode::default(),
        }
    }

    /// Set the unit conversion policy the instructions describe
    pub fn with_mode(mut self, mode: ConversionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the complete answer prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(ANSWER_PREAMBLE);
        prompt.push_str("\n\n");

        prompt.push_str(&format!("ORIGINAL TASK: {}\n", self.task_label));
        prompt.push_str(&format!("DETAILED QUESTION: {}\n\n", self.question));

        prompt.push_str("CONTEXT:\n---\n");
        prompt.push_str(self.context);
        prompt.push_str("\n---\n\n");

        prompt.push_str("INSTRUCTIONS:\n");
        prompt.push_str("1. Answer the DETAILED QUESTION using only the CONTEXT above.\n");
        prompt.push_str(
            "2. Cross-check the answer against the ORIGINAL TASK so every constraint \
             (currency, year, metric) is met.\n",
        );
        match self.mode {
            ConversionMode::Strict => prompt.push_str(
                "3. If the figure is present only in a different unit than the ORIGINAL TASK \
                 requires, return status NOT_FOUND. Do not convert currencies.\n",
            ),
            ConversionMode::Convert => prompt.push_str(
                "3. If the figure is present in a different unit than the ORIGINAL TASK \
                 requires, report it exactly as written, with its own unit. Do not convert \
                 currencies yourself.\n",
            ),
        }
        prompt.push_str(
            "4. If the answer is not in the CONTEXT, return status NOT_FOUND with null values.\n",
        );
        prompt.push_str("5. Set source_page to the page of the most relevant snippet.\n\n");

        prompt.push_str(output_format(self.kind));
        prompt.push_str("\n\nReturn ONLY valid JSON, no markdown code blocks, no explanations.");

        prompt
    }
}

fn output_format(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Revenue | TaskKind::NetIncome | TaskKind::Eps => MONETARY_FORMAT,
        TaskKind::SegmentContribution => SEGMENT_FORMAT,
        TaskKind::Utilization => UTILIZATION_FORMAT,
        TaskKind::KeyRisks => RISK_FORMAT,
    }
}

const CONTEXTUALIZER_INSTRUCTIONS: &str = r#"Rephrase the task below as a detailed, self-contained question to be answered from a company's annual report.
Make the question as specific as possible so that a similarity search finds the right passages.

Rules:
- If the task names a unit or currency (e.g. "USD Billion"), the question must explicitly ask for the figure in exactly that unit.
- For qualitative tasks such as risks, name the usual section titles too, e.g. "Management Discussion & Analysis", "Risk Management" and "Principal Risks and Uncertainties".
- Reply with the question only.

Examples:
User Task: "Consolidated Revenue (USD Billion)"
Good Question: What is the total consolidated revenue from operations, specifically in USD Billion, for the most recent financial year reported?

User Task: "Top 2-3 most critical risks from the Management Discussion & Analysis"
Good Question: What are the top 2-3 most critical risks identified in the 'Management Discussion & Analysis', 'Risk Management' or 'Principal Risks and Uncertainties' sections of the report?"#;

const ANSWER_PREAMBLE: &str = "You are an expert financial analyst. Answer the question by \
synthesizing the provided context. Be precise and respect every constraint of the task.";

const MONETARY_FORMAT: &str = r#"Output format:
{"status": "FOUND" | "NOT_FOUND", "value": number | null, "unit": "e.g. INR Crores" | null, "source_page": integer | null, "reasoning": string | null}"#;

const SEGMENT_FORMAT: &str = r#"Output format:
{"status": "FOUND" | "NOT_FOUND", "top_segments": [{"segment_name": string, "percentage_contribution": number}], "source_page": integer | null}
List at most the top 3 segments by contribution."#;

const UTILIZATION_FORMAT: &str = r#"Output format:
{"status": "FOUND" | "NOT_FOUND", "rate_percentage": number | null, "source_page": integer | null, "reasoning": string | null}"#;

const RISK_FORMAT: &str = r#"Output format:
{"status": "FOUND" | "NOT_FOUND", "key_risks": [{"risk_summary": string}], "source_page": integer | null}
List the 2-3 most critical risks, one concise summary each."#;
