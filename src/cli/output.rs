//! Colored output helpers for the CLI
//!
//! Status lines go to stdout, errors to stderr. With colors disabled every
//! line carries a bracketed tag instead.

use owo_colors::OwoColorize;

use crate::pipeline::PipelineResult;
use crate::steps::{Executor, StepRegistry};
use crate::utils::toml_config::ResearchConfig;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}\n",
                "ARES Research Pipeline".bright_cyan().bold(),
                version.dimmed()
            );
        } else {
            println!("\n   ARES Research Pipeline {}\n", version);
        }
    }

    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Human-readable summary of a finished run.
    pub fn pipeline_summary(&self, result: &PipelineResult) {
        self.header(&format!("Research: {}", result.research_topic));

        let meta = &result.pipeline_metadata;
        let phases: Vec<&str> = meta.completed_phases.iter().map(|p| p.label()).collect();
        self.kv("phases completed", &format!("{} ({})", meta.phases_completed, phases.join(", ")));
        self.kv("execution time", &format!("{:.2}s", result.execution_time));

        if let Some(collection) = &result.results.collection_data {
            self.kv("documents", &collection.document_count().to_string());
        }
        if let Some(processing) = &result.results.processing_data {
            self.kv(
                "validated facts",
                &format!(
                    "{} of {}",
                    processing.validated_facts.len(),
                    processing.normalized_facts.len()
                ),
            );
        }
        let collaboration = &result.results.collaboration_data;
        if !collaboration.is_empty() {
            self.kv("conversations", &collaboration.conversations.len().to_string());
            self.kv("hypotheses", &collaboration.hypotheses.len().to_string());
        }
        if let Some(kb) = &result.results.synthesis_data {
            self.kv("knowledge elements", &kb.elements.len().to_string());
            self.kv("overall confidence", &format!("{:.2}", kb.overall_confidence));
            if let Some(summary) = &kb.executive_summary {
                self.header("Executive summary");
                println!("    {}", summary);
            }
            if !kb.recommendations.is_empty() {
                self.header("Recommendations");
                for rec in &kb.recommendations {
                    self.list_item(&format!("[{:?}] {}", rec.priority, rec.text));
                }
            }
        }

        for warning in &meta.warnings {
            self.warning(warning);
        }
        match &result.error {
            Some(error) => self.error(error),
            None => self.success("Pipeline completed"),
        }
    }

    /// One entry per step with its delegate and JSON schemas.
    pub fn step_summary(&self, steps: &StepRegistry) {
        self.header("Steps");
        for step in steps.steps() {
            let executor = match step.executor() {
                Executor::Agent(mode) => format!("agent:{}", mode.as_str()),
                Executor::Function(function) => format!("function:{}", function.as_str()),
            };
            self.kv(step.name(), &executor);
            self.list_item(&format!("in  {}", step.input_schema().to_json_schema()));
            self.list_item(&format!("out {}", step.output_schema().to_json_schema()));
        }
    }

    pub fn config_summary(&self, config: &ResearchConfig) {
        self.header("Pipeline");
        self.kv("step timeout", &format!("{}s", config.pipeline.step_timeout_secs));
        self.kv("expert questions", &config.pipeline.expert_questions.to_string());
        self.kv("default scope", config.pipeline.default_scope.as_str());
        self.kv("default synthesis mode", config.pipeline.default_synthesis_mode.as_str());

        self.header("Language model");
        self.kv("provider", &format!("{:?}", config.llm.provider));
        self.kv("model", &config.llm.model);
        self.kv("base url", &config.llm.base_url);

        self.header("Collectors");
        self.kv("wikipedia", &config.collectors.wikipedia_api_url);
        self.kv("web search", &config.collectors.web_search.to_string());

        self.header("Synthesis");
        let w = &config.synthesis.weights;
        self.kv(
            "weights",
            &format!(
                "elements {} / diversity {} / validation {} / completeness {}",
                w.element_confidence, w.source_diversity, w.validation, w.completeness
            ),
        );
        self.kv("fallback confidence", &config.synthesis.fallback_confidence.to_string());

        if let Some(persistence) = &config.persistence {
            self.header("Persistence");
            self.kv("directory", &persistence.dir.display().to_string());
        }
    }
}
