//! Prompt Fusion - step-scheduled prompt interpolation for diffusion models.
//!
//! Compiles the Prompt Fusion prompt language into a per-step schedule of
//! literal prompts the host's conditioning encoder can consume, and selects
//! the host grammar able to read them.

pub mod bridge;
pub mod config;
pub mod legacy;
pub mod tensor;

mod error;

pub use prompt_fusion_core::{curve, expression, schedule};

pub use error::FusionError;

use indexmap::IndexSet;
use log::{debug, info, trace};

use prompt_fusion_core::{expression::Expression, schedule::Schedule};

use bridge::{
    ConditioningOptions, LegacyConditioning, ScheduleParser, ScheduledConditioning,
    convert_legacy_schedules,
};
use config::AppConfig;
use legacy::HostGrammar;
use tensor::{InterpolationTensor, StepContext};

/// Everything compiled from one prompt.
#[derive(Debug, Clone)]
pub struct Compilation {
    expression: Expression,
    schedule: Schedule,
    prompts: IndexSet<String>,
    grammar: HostGrammar,
}

impl Compilation {
    /// The elaborated expression tree.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// One literal prompt per step.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Every literal prompt the host must encode, blend partners included.
    pub fn prompts(&self) -> &IndexSet<String> {
        &self.prompts
    }

    /// The host grammar able to read the scheduled prompts.
    pub fn grammar(&self) -> HostGrammar {
        self.grammar
    }
}

/// Compiler for Prompt Fusion prompts.
///
/// # Examples
///
/// ```rust
/// use prompt_fusion::{PromptCompiler, config::AppConfig};
///
/// let compiler = PromptCompiler::new(AppConfig::default());
///
/// let compilation = compiler
///     .compile("a [red|blue:1] car")
///     .expect("Failed to compile");
///
/// assert_eq!(compilation.schedule().text_at(0), Some("a red car"));
/// assert_eq!(compilation.schedule().text_at(1), Some("a blue car"));
/// ```
#[derive(Debug, Default)]
pub struct PromptCompiler {
    config: AppConfig,
}

impl PromptCompiler {
    /// Create a new compiler with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The evaluation context described by the configuration.
    pub fn step_context(&self) -> StepContext {
        self.config.step_context()
    }

    /// Parse a prompt into an expression tree.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Parse`] carrying the text the diagnostic spans
    /// refer to.
    pub fn parse(&self, source: &str) -> Result<Expression, FusionError> {
        info!("Parsing prompt");

        let resolved = prompt_fusion_parser::resolve_variables(source)
            .map_err(|err| FusionError::new_parse_error(err, source))?;
        debug!(resolved = resolved.as_str(); "Variables resolved");

        let expression = prompt_fusion_parser::parse_expression(&resolved)
            .map_err(|err| FusionError::new_parse_error(err, resolved.as_str()))?;

        debug!("Prompt parsed successfully");
        trace!(expression:%; "Parsed expression");

        Ok(expression)
    }

    /// Schedule an expression over the configured step budget.
    pub fn evaluate(&self, expression: &Expression) -> Schedule {
        self.tensor().evaluate(expression)
    }

    /// Every literal prompt the host must encode for `expression`.
    pub fn prompt_database(&self, expression: &Expression) -> IndexSet<String> {
        self.tensor().prompt_database(expression)
    }

    /// Parse, evaluate and classify a prompt.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Parse`] when the prompt does not parse.
    pub fn compile(&self, source: &str) -> Result<Compilation, FusionError> {
        let expression = self.parse(source)?;

        let tensor = self.tensor();
        let schedule = tensor.evaluate(&expression);
        let prompts = tensor.prompt_database(&expression);
        let grammar = HostGrammar::select(&prompts);
        info!(
            entries = schedule.len(),
            prompts = prompts.len(),
            grammar:%;
            "Prompt compiled",
        );

        Ok(Compilation {
            expression,
            schedule,
            prompts,
            grammar,
        })
    }

    /// Hand `prompts` to the host parser able to read them.
    ///
    /// Legacy output is converted, so both paths yield the same record
    /// shape.
    pub fn host_schedules<O, L>(
        &self,
        prompts: &[String],
        options: &ConditioningOptions,
        optimized: &O,
        legacy: &L,
    ) -> Vec<Vec<ScheduledConditioning<String>>>
    where
        O: ScheduleParser<Record = ScheduledConditioning<String>>,
        L: ScheduleParser<Record = LegacyConditioning<String>>,
    {
        let steps = self.config.schedule().steps();
        match HostGrammar::select(prompts) {
            HostGrammar::Legacy => {
                convert_legacy_schedules(legacy.prompt_schedules(prompts, steps, options))
            }
            HostGrammar::Optimized => optimized.prompt_schedules(prompts, steps, options),
        }
    }

    fn tensor(&self) -> InterpolationTensor {
        InterpolationTensor::new(self.step_context())
    }
}
