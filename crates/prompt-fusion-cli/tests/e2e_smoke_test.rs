use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::tempdir;

use prompt_fusion_cli::{Args, OutputFormat, run};

/// Collects all .prompt files from a directory
fn collect_prompt_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("prompt")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

/// Demo prompts live at the workspace root, not in the crate
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn args_for(input: &Path, output: PathBuf, format: OutputFormat) -> Args {
    let mut args = Args::new(input.to_string_lossy());
    args.output = Some(output.to_string_lossy().to_string());
    args.format = format;
    args.log_level = "off".to_string();
    args
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let valid_demos = collect_prompt_files(demos_path());

    assert!(!valid_demos.is_empty(), "No valid demos found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &valid_demos {
        for format in [OutputFormat::Text, OutputFormat::Toml] {
            let output_filename = format!(
                "{}.{format:?}",
                demo_path.file_stem().unwrap().to_string_lossy()
            );
            let output_path = temp_dir.path().join(output_filename);
            let args = args_for(demo_path, output_path.clone(), format);

            match run(&args) {
                Ok(()) => {
                    let written = fs::read_to_string(&output_path).expect("Output written");
                    assert!(!written.is_empty(), "{} produced no output", demo_path.display());
                }
                Err(e) => failed_demos.push((demo_path.clone(), e)),
            }
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, err) in &failed_demos {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid demo run(s) failed unexpectedly", failed_demos.len());
    }

    println!("✅ All {} valid demos passed", valid_demos.len());
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let error_demos = collect_prompt_files(demos_path().join("errors"));

    assert!(
        !error_demos.is_empty(),
        "No error demos found in demos/errors/"
    );

    let mut unexpectedly_succeeded = Vec::new();

    for demo_path in &error_demos {
        let output_filename = format!(
            "error_{}.txt",
            demo_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(output_filename);
        let args = args_for(demo_path, output_path, OutputFormat::Text);

        if run(&args).is_ok() {
            unexpectedly_succeeded.push(demo_path.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }

    println!("✅ All {} error demos failed as expected", error_demos.len());
}

#[test]
fn e2e_text_report_contents() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input_path = temp_dir.path().join("input.prompt");
    let output_path = temp_dir.path().join("schedule.txt");
    fs::write(&input_path, "$a = red\n[$a|blue:5] car").expect("Failed to write input");

    let mut args = args_for(&input_path, output_path.clone(), OutputFormat::Text);
    args.steps = Some(10);
    run(&args).expect("Failed to run");

    let written = fs::read_to_string(&output_path).expect("Output written");
    assert_eq!(written, "0..5: red car\n5..10: blue car\ngrammar: optimized\n");
}

#[test]
fn e2e_missing_input_fails() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input_path = temp_dir.path().join("absent.prompt");

    let args = args_for(&input_path, temp_dir.path().join("out.txt"), OutputFormat::Text);

    assert!(run(&args).is_err());
}
