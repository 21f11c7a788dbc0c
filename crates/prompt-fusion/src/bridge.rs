//! Bridging between the two host schedule shapes and the host's arguments.
//!
//! The legacy host parser produces conditioning records shaped
//! `(end_at_step, cond)`, the optimized one `(cond, end_at_step)`. Callers
//! only ever see [`ScheduledConditioning`]: legacy output is converted with
//! [`convert_legacy_schedules`].
//!
//! The host also passes `hires_steps` and `use_old_scheduling` either
//! positionally or by keyword, with loosely typed values.
//! [`unpack_conditioning_options`] reads them the same way regardless of
//! how they were supplied.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::tensor::StepContext;

const HIRES_STEPS_KEY: &str = "hires_steps";
const USE_OLD_SCHEDULING_KEY: &str = "use_old_scheduling";

/// A conditioning record as produced by the legacy host parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyConditioning<C> {
    pub end_at_step: usize,
    pub cond: C,
}

/// A conditioning record as consumed by the host sampler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledConditioning<C> {
    pub cond: C,
    pub end_at_step: usize,
}

impl<C> From<LegacyConditioning<C>> for ScheduledConditioning<C> {
    fn from(legacy: LegacyConditioning<C>) -> Self {
        Self {
            cond: legacy.cond,
            end_at_step: legacy.end_at_step,
        }
    }
}

/// Convert per-prompt legacy schedules into the current record shape.
///
/// Order is preserved at both levels.
pub fn convert_legacy_schedules<C>(
    legacy: Vec<Vec<LegacyConditioning<C>>>,
) -> Vec<Vec<ScheduledConditioning<C>>> {
    legacy
        .into_iter()
        .map(|schedule| schedule.into_iter().map(ScheduledConditioning::from).collect())
        .collect()
}

/// The scheduling options the host passes alongside the prompts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditioningOptions {
    /// Step count of the hires pass, passed through untouched.
    pub hires_steps: Option<Value>,
    pub use_old_scheduling: bool,
}

impl ConditioningOptions {
    /// Apply the options to an evaluation context.
    ///
    /// A present `hires_steps` marks the evaluation as the hires pass.
    pub fn apply(&self, context: StepContext) -> StepContext {
        context
            .with_hires(self.hires_steps.is_some())
            .with_old_scheduling(self.use_old_scheduling)
    }
}

/// Read `hires_steps` and `use_old_scheduling` from the host's arguments.
///
/// Positional values take precedence over keywords: `args[0]` is
/// `hires_steps` and `args[1]` is `use_old_scheduling`. A missing or null
/// `use_old_scheduling` is `false`.
///
/// # Examples
///
/// ```
/// use prompt_fusion::bridge::unpack_conditioning_options;
/// use serde_json::{Map, json};
///
/// let mut kwargs = Map::new();
/// kwargs.insert("use_old_scheduling".to_string(), json!("off"));
///
/// let options = unpack_conditioning_options(&[], &kwargs);
/// assert_eq!(options.hires_steps, None);
/// assert!(!options.use_old_scheduling);
/// ```
pub fn unpack_conditioning_options(args: &[Value], kwargs: &Map<String, Value>) -> ConditioningOptions {
    let hires_steps = args.first().or_else(|| kwargs.get(HIRES_STEPS_KEY));
    let use_old_scheduling = args.get(1).or_else(|| kwargs.get(USE_OLD_SCHEDULING_KEY));

    ConditioningOptions {
        hires_steps: hires_steps.filter(|value| !value.is_null()).cloned(),
        use_old_scheduling: use_old_scheduling.is_some_and(is_truthy),
    }
}

/// Unpack the options and write the normalized values back.
///
/// A value is written into its positional slot when one exists. Otherwise
/// it replaces the keyword, but only if the caller supplied that keyword.
/// Other arguments are left alone.
pub fn normalize_conditioning_arguments(
    args: &[Value],
    kwargs: &Map<String, Value>,
) -> (ConditioningOptions, Vec<Value>, Map<String, Value>) {
    let options = unpack_conditioning_options(args, kwargs);
    let mut args = args.to_vec();
    let mut kwargs = kwargs.clone();

    let hires_steps = options.hires_steps.clone().unwrap_or(Value::Null);
    write_back(&mut args, &mut kwargs, 0, HIRES_STEPS_KEY, hires_steps);
    write_back(
        &mut args,
        &mut kwargs,
        1,
        USE_OLD_SCHEDULING_KEY,
        Value::Bool(options.use_old_scheduling),
    );

    (options, args, kwargs)
}

fn write_back(
    args: &mut [Value],
    kwargs: &mut Map<String, Value>,
    index: usize,
    key: &str,
    value: Value,
) {
    if let Some(slot) = args.get_mut(index) {
        *slot = value;
    } else if let Some(slot) = kwargs.get_mut(key) {
        *slot = value;
    }
}

/// Loose truthiness of a host value.
///
/// Strings are false when, trimmed and lowercased, they are one of `""`,
/// `"0"`, `"false"`, `"no"` or `"off"`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !matches!(
            text.trim().to_lowercase().as_str(),
            "" | "0" | "false" | "no" | "off"
        ),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// A host schedule parser.
///
/// The host owns two implementations, one per [`HostGrammar`]. Each returns
/// one schedule per prompt, in its own record shape.
///
/// [`HostGrammar`]: crate::legacy::HostGrammar
pub trait ScheduleParser {
    type Record;

    fn prompt_schedules(
        &self,
        prompts: &[String],
        steps: usize,
        options: &ConditioningOptions,
    ) -> Vec<Vec<Self::Record>>;
}
