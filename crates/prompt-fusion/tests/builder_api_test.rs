//! Integration tests for the PromptCompiler API
//!
//! These tests verify that the public API works and is usable.

use std::cell::RefCell;

use prompt_fusion::{
    FusionError, PromptCompiler,
    bridge::{ConditioningOptions, LegacyConditioning, ScheduleParser, ScheduledConditioning},
    config::AppConfig,
    legacy::HostGrammar,
};
use prompt_fusion_parser::error::ErrorKind;

fn compiler(steps: usize) -> PromptCompiler {
    let mut config = AppConfig::default();
    config.schedule_mut().set_steps(steps);
    PromptCompiler::new(config)
}

#[test]
fn test_compiler_api_exists() {
    let compiler = PromptCompiler::default();
    assert_eq!(compiler.config().schedule().steps(), 20);
}

#[test]
fn test_compile_simple_prompt() {
    let result = PromptCompiler::default().compile("a cat on a mat");
    assert!(
        result.is_ok(),
        "Should compile valid prompt: {:?}",
        result.err()
    );

    let compilation = result.unwrap();
    assert_eq!(compilation.schedule().len(), 1);
    assert_eq!(compilation.grammar(), HostGrammar::Optimized);
}

#[test]
fn test_compile_time_varying_prompt() {
    let compilation = compiler(10)
        .compile("$animal = cat\na [$animal|dog:5] in [snow:rain:0.5]")
        .expect("Failed to compile");

    assert!(compilation.expression().is_time_varying());
    assert!(compilation.schedule().covers(0..10));
    assert_eq!(
        compilation.schedule().text_at(0),
        Some("a cat in [snow:rain:0.5]")
    );
    assert_eq!(
        compilation.schedule().text_at(7),
        Some("a dog in [snow:rain:0.5]")
    );
    assert_eq!(compilation.grammar(), HostGrammar::Optimized);
}

#[test]
fn test_compile_selects_host_grammar() {
    // Curves collapse into plain keyframe texts.
    let compilation = compiler(10)
        .compile("[a:b:c:,,]")
        .expect("Failed to compile");

    assert_eq!(compilation.prompts().len(), 3);
    assert_eq!(compilation.grammar(), HostGrammar::Optimized);

    let compilation = compiler(10)
        .compile("[[a:b:0.3]:c:5]")
        .expect("Failed to compile");

    assert_eq!(compilation.grammar(), HostGrammar::Legacy);
}

#[test]
fn test_variable_errors_refer_to_source() {
    let source = "a photo of $subject";

    let err = PromptCompiler::default().compile(source).unwrap_err();

    match err {
        FusionError::Parse { err, src } => {
            assert_eq!(err.kind(), ErrorKind::UndefinedVariable);
            assert_eq!(src, source);
        }
        other => panic!("Expected a parse error, got {other}"),
    }
}

#[test]
fn test_structural_errors_refer_to_resolved_text() {
    let err = PromptCompiler::default()
        .compile("$a = x\n[$a:y")
        .unwrap_err();

    match err {
        FusionError::Parse { err, src } => {
            assert_eq!(err.kind(), ErrorKind::MalformedExpression);
            assert_eq!(src, "[ x :y");
        }
        other => panic!("Expected a parse error, got {other}"),
    }
}

/// Records which host parser was called.
#[derive(Default)]
struct FakeParser {
    calls: RefCell<Vec<Vec<String>>>,
}

impl FakeParser {
    fn schedule(&self, prompts: &[String], steps: usize) -> Vec<Vec<(usize, String)>> {
        self.calls.borrow_mut().push(prompts.to_vec());
        prompts
            .iter()
            .map(|prompt| vec![(steps, prompt.clone())])
            .collect()
    }
}

struct Optimized(FakeParser);

impl ScheduleParser for Optimized {
    type Record = ScheduledConditioning<String>;

    fn prompt_schedules(
        &self,
        prompts: &[String],
        steps: usize,
        _options: &ConditioningOptions,
    ) -> Vec<Vec<Self::Record>> {
        self.0
            .schedule(prompts, steps)
            .into_iter()
            .map(|schedule| {
                schedule
                    .into_iter()
                    .map(|(end_at_step, cond)| ScheduledConditioning { cond, end_at_step })
                    .collect()
            })
            .collect()
    }
}

struct Legacy(FakeParser);

impl ScheduleParser for Legacy {
    type Record = LegacyConditioning<String>;

    fn prompt_schedules(
        &self,
        prompts: &[String],
        steps: usize,
        _options: &ConditioningOptions,
    ) -> Vec<Vec<Self::Record>> {
        self.0
            .schedule(prompts, steps)
            .into_iter()
            .map(|schedule| {
                schedule
                    .into_iter()
                    .map(|(end_at_step, cond)| LegacyConditioning { end_at_step, cond })
                    .collect()
            })
            .collect()
    }
}

#[test]
fn test_host_schedules_dispatch() {
    let compiler = compiler(12);
    let optimized = Optimized(FakeParser::default());
    let legacy = Legacy(FakeParser::default());
    let options = ConditioningOptions::default();

    let plain = vec!["a cat".to_string()];
    let schedules = compiler.host_schedules(&plain, &options, &optimized, &legacy);
    assert_eq!(
        schedules,
        vec![vec![ScheduledConditioning {
            cond: "a cat".to_string(),
            end_at_step: 12,
        }]]
    );
    assert_eq!(optimized.0.calls.borrow().len(), 1);
    assert!(legacy.0.calls.borrow().is_empty());

    let nested = vec!["[[a:b:1]:c:2]".to_string()];
    let schedules = compiler.host_schedules(&nested, &options, &optimized, &legacy);
    assert_eq!(schedules[0][0].cond, "[[a:b:1]:c:2]");
    assert_eq!(schedules[0][0].end_at_step, 12);
    assert_eq!(legacy.0.calls.borrow().len(), 1);
}
