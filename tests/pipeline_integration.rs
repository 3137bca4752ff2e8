//! Integration tests for single-kernel preprocessing
//!
//! Drives [`Preprocessor`] end to end over a scripted toolchain and checks
//! the verdict, the normalized text and the bytecode features.

use clgen_preprocess::compiler::EUGLY_CODE;
use clgen_preprocess::config::ClgenConfig;
use clgen_preprocess::features::{instcounts_to_ratios, parse_instcounts, TOTAL_KEY};
use clgen_preprocess::pipeline::{sanitize_prototype, Preprocessor, Verdict};
use clgen_preprocess::store::Status;
use clgen_preprocess::testkit::{stdin_text, MockToolchain};
use clgen_preprocess::toolchain::{Tool, ToolOutput};
use clgen_preprocess::ErrorClass;
use indoc::indoc;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeMap;

const SAXPY: &str = indoc! {"
    #define ALPHA 2.0f
    kernel __attribute__((reqd_work_group_size(64, 1, 1)))
    void saxpy(global float* x,
               global float* y) {
      int i = get_global_id(0);
      y[i] = ALPHA * x[i] + y[i];
    }
"};

/// Preprocessor output with the macro expanded and the directive dropped.
fn expand_alpha(inv: &clgen_preprocess::toolchain::Invocation) -> ToolOutput {
    let src = stdin_text(inv)
        .lines()
        .filter(|line| !line.starts_with("#define"))
        .map(|line| line.replace("ALPHA", "2.0f"))
        .collect::<Vec<_>>()
        .join("\n");
    ToolOutput::ok(format!("# 1 \"<built-in>\" 1\n# 1 \"<stdin>\" 2\n{src}\n"))
}

// ============================================================================
// Verdicts
// ============================================================================

#[test]
fn test_kernel_is_normalized_through_every_stage() {
    let toolchain = MockToolchain::new().with_preprocess(expand_alpha);
    let config = ClgenConfig::default();

    let verdict = Preprocessor::new(&toolchain, &config)
        .classify(SAXPY)
        .expect("Healthy toolchain should classify");

    assert_eq!(
        verdict,
        Verdict::Accepted(
            indoc! {"
                kernel void saxpy(global float* x, global float* y) {
                  int i = get_global_id(0);
                  y[i] = 2.0f * x[i] + y[i];
                }"}
            .to_string()
        )
    );
    for tool in [Tool::Clang, Tool::Opt, Tool::Rewriter, Tool::ClangFormat] {
        assert!(!toolchain.calls_to(tool).is_empty(), "{tool:?} was never run");
    }
}

#[test]
fn test_rewriter_sentinel_keeps_preprocessed_text() {
    let toolchain = MockToolchain::new()
        .with_preprocess(expand_alpha)
        .with_rewrite(|_| ToolOutput::exit(EUGLY_CODE, ""));
    let config = ClgenConfig::default();

    let verdict = Preprocessor::new(&toolchain, &config)
        .classify(SAXPY)
        .unwrap();

    assert_eq!(verdict.status(), Status::Ugly);
    assert!(verdict.contents().contains("2.0f * x[i]"));
    assert!(toolchain.calls_to(Tool::ClangFormat).is_empty());
}

#[test]
fn test_rewriter_warnings_keep_its_output() {
    let toolchain = MockToolchain::new().with_rewrite(|inv| {
        let staged = std::fs::read(&inv.args[0]).unwrap_or_default();
        ToolOutput {
            stdout: staged,
            stderr: b"warning: unknown pragma".to_vec(),
            exit_code: Some(1),
        }
    });
    let config = ClgenConfig::default();

    let verdict = Preprocessor::new(&toolchain, &config)
        .classify(SAXPY)
        .unwrap();

    assert_eq!(verdict.status(), Status::Accepted);
    assert!(verdict.contents().starts_with("kernel void saxpy("));
}

#[test]
fn test_analysis_failure_is_bad() {
    let toolchain =
        MockToolchain::new().with_analysis(|_| ToolOutput::exit(1, "opt: invalid bitcode"));
    let config = ClgenConfig::default();

    let verdict = Preprocessor::new(&toolchain, &config)
        .classify(SAXPY)
        .unwrap();

    assert_eq!(verdict.status(), Status::Bad);
    assert!(toolchain.calls_to(Tool::Rewriter).is_empty());
}

#[test]
fn test_broken_formatter_is_not_a_verdict() {
    let toolchain =
        MockToolchain::new().with_format(|_| ToolOutput::exit(1, "Invalid style argument"));
    let config = ClgenConfig::default();

    let err = Preprocessor::new(&toolchain, &config)
        .classify(SAXPY)
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::Tool);
}

#[test]
fn test_minimum_instruction_threshold() {
    let toolchain = MockToolchain::new();
    let mut config = ClgenConfig::default();

    config.policy.min_instructions = 10;
    let verdict = Preprocessor::new(&toolchain, &config)
        .classify(SAXPY)
        .unwrap();
    assert_eq!(verdict.status(), Status::Accepted);

    config.policy.min_instructions = 11;
    let verdict = Preprocessor::new(&toolchain, &config)
        .classify(SAXPY)
        .unwrap();
    assert_eq!(verdict.status(), Status::Ugly);
}

// ============================================================================
// Features
// ============================================================================

#[test]
fn test_features_report_counts_and_ratios() {
    let toolchain = MockToolchain::new();
    let config = ClgenConfig::default();

    let table = Preprocessor::new(&toolchain, &config)
        .features(SAXPY)
        .unwrap();

    assert_eq!(table.instruction_count(), 10);
    assert_eq!(table.count("Add_insts"), Some(4));
    assert_eq!(table.ratio("ratio_Load_insts"), Some(0.5));
    assert_eq!(table.ratio("ratio_Ret_insts"), Some(0.1));
}

fn instcount_report(counts: &[u64]) -> String {
    let mut report = String::new();
    for (i, count) in counts.iter().enumerate() {
        report.push_str(&format!("{count} instcount - Number of Op{i} insts\n"));
    }
    let total: u64 = counts.iter().sum();
    report.push_str(&format!("{total} instcount - Number of {TOTAL_KEY}\n"));
    report
}

proptest! {
    #[test]
    fn ratios_of_a_complete_report_sum_to_one(counts in prop::collection::vec(1u64..1000, 1..12)) {
        let parsed = parse_instcounts(&instcount_report(&counts));
        let table = instcounts_to_ratios(&parsed);

        let sum: f64 = table
            .iter()
            .filter(|(key, _)| key.starts_with("ratio_"))
            .map(|(_, value)| value.as_f64())
            .sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);
        prop_assert_eq!(table.instruction_count(), counts.iter().sum::<u64>());
    }

    #[test]
    fn sanitized_prototype_is_stable(
        name in "[a-z][a-z0-9_]{0,8}",
        gap in "[ \t\n]{1,4}",
        body in "[a-z =;\n]{0,20}",
    ) {
        let src = format!("kernel{gap}void{gap}{name}(){gap}{{{body}}}");
        let once = sanitize_prototype(&src);
        prop_assert_eq!(sanitize_prototype(&once), once.clone());
        let expected_prefix = format!("kernel void {name}() {{");
        prop_assert!(once.starts_with(&expected_prefix));
    }
}

#[test]
fn test_parse_instcounts_ignores_noise() {
    let parsed = parse_instcounts(indoc! {"
        ===-------------------------------------------------------------------------===
                                  ... Statistics Collected ...
        ===-------------------------------------------------------------------------===
         3 instcount - Number of Br insts
         3 instcount - Number of instructions (of all types)
    "});

    let expected: BTreeMap<String, u64> = [
        ("Br insts".to_string(), 3),
        (TOTAL_KEY.to_string(), 3),
    ]
    .into_iter()
    .collect();
    assert_eq!(parsed, expected);
}
