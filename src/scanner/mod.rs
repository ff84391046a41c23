//! Rule dispatch.
//!
//! The [`Scanner`] walks every block of every file, looks up the rules that
//! apply to each block, runs the checks on a worker pool and turns the raw
//! results into a deterministic [`ScanReport`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tfguard::{Block, Registry, Scanner, Severity, SourceFile, SourceRange};
//!
//! let domain = Block::new(
//!     "resource",
//!     ["aws_elasticsearch_domain", "example"],
//!     SourceRange::new("main.tf", 1, 6),
//! )
//! .with_child(Block::new(
//!     "log_publishing_options",
//!     Vec::<String>::new(),
//!     SourceRange::new("main.tf", 3, 5),
//! ));
//!
//! let scanner = Scanner::new(Arc::new(Registry::with_builtins().unwrap()));
//! let report = scanner.scan(vec![SourceFile::new("main.tf", vec![domain])]);
//!
//! assert_eq!(report.count(Severity::Error), 1);
//! assert_eq!(report.exit_code(), 2);
//! ```

mod pool;

use crate::config::ScanConfig;
use crate::context::{BlockAddress, Context};
use crate::finding::{Finding, FindingKind};
use crate::model::{Block, SourceFile};
use crate::rule::{Registry, RuleSpec, Severity};
use pool::{Job, Outcome};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Reported findings, sorted by file, start line and rule code.
    pub findings: Vec<Finding>,
    /// Well-formed blocks visited, nested blocks included.
    pub blocks_scanned: usize,
    /// Check function invocations dispatched.
    pub invocations: usize,
    /// Findings dropped by suppression directives.
    pub suppressed: usize,
    /// Invocations that panicked or timed out.
    pub execution_errors: usize,
    pub duration: Duration,
}

impl ScanReport {
    /// Count findings of a given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    /// No errors and no warnings.
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && self.count(Severity::Warning) == 0
    }

    /// Process exit code: 0 clean, 1 warnings only, 2 errors.
    pub fn exit_code(&self) -> i32 {
        if self.has_errors() {
            2
        } else if self.count(Severity::Warning) > 0 {
            1
        } else {
            0
        }
    }
}

/// Dispatches registered rules against parsed files.
#[derive(Debug, Clone)]
pub struct Scanner {
    registry: Arc<Registry>,
    config: ScanConfig,
}

impl Scanner {
    /// Create a scanner with the default config.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan a complete set of files.
    ///
    /// Never fails: a check that panics or runs past the configured time
    /// bound is reported as an execution-error finding and the scan goes on.
    pub fn scan(&self, files: Vec<SourceFile>) -> ScanReport {
        let start = Instant::now();
        let context = Arc::new(Context::new(files));

        let mut report = ScanReport::default();
        let jobs = self.plan(&context, &mut report);
        report.invocations = jobs.len();

        let outcomes = pool::run(
            &jobs,
            &context,
            self.config.worker_count(),
            self.config.rule_timeout(),
        );

        // Paired with the index of the file the invocation came from
        let mut findings: Vec<(usize, Finding)> = Vec::new();
        for (job, outcome) in jobs.iter().zip(outcomes) {
            let file = job.block.file;
            let Some(block) = context.block_at(&job.block) else {
                continue;
            };
            match outcome {
                Outcome::Completed(raw) => {
                    findings.extend(
                        raw.into_iter()
                            .map(|f| (file, self.normalize(f, &job.rule, block))),
                    );
                }
                Outcome::Panicked(message) => {
                    tracing::warn!(
                        rule = %job.rule.code,
                        block = %block.full_name(),
                        "Rule panicked: {}",
                        message
                    );
                    report.execution_errors += 1;
                    let finding = Finding::execution_error(
                        job.rule.code.clone(),
                        format!(
                            "Rule {} panicked while checking {}: {}",
                            job.rule.code,
                            block.full_name(),
                            message
                        ),
                        block.range().clone(),
                    );
                    findings.push((file, finding));
                }
                Outcome::TimedOut(limit) => {
                    report.execution_errors += 1;
                    let finding = Finding::execution_error(
                        job.rule.code.clone(),
                        format!(
                            "Rule {} did not finish checking {} within {}ms",
                            job.rule.code,
                            block.full_name(),
                            limit.as_millis()
                        ),
                        block.range().clone(),
                    );
                    findings.push((file, finding));
                }
            }
        }

        // Directives belong to the file the block was parsed from, whatever
        // path its ranges carry
        let before = findings.len();
        findings.retain(|(file, f)| {
            !context.files().get(*file).is_some_and(|source| {
                context.is_suppressed(source.path(), &f.rule_code, f.range.start_line)
            })
        });
        report.suppressed = before - findings.len();

        let mut findings: Vec<Finding> = findings
            .into_iter()
            .map(|(_, f)| f)
            .filter(|f| f.is_execution_error() || self.config.reports(f.severity))
            .collect();

        findings.sort_by(Finding::report_order);
        findings.dedup();

        report.findings = findings;
        report.duration = start.elapsed();

        tracing::info!(
            blocks = report.blocks_scanned,
            invocations = report.invocations,
            findings = report.findings.len(),
            suppressed = report.suppressed,
            execution_errors = report.execution_errors,
            "Scan finished in {:?}",
            report.duration
        );

        report
    }

    /// Enumerate (block, rule) pairs in dispatch order.
    fn plan(&self, context: &Context, report: &mut ScanReport) -> Vec<Job> {
        let mut jobs = Vec::new();
        for (file_idx, file) in context.files().iter().enumerate() {
            for (block_idx, block) in file.blocks().iter().enumerate() {
                let mut address = BlockAddress {
                    file: file_idx,
                    path: vec![block_idx],
                };
                self.plan_block(block, block.provider(), &mut address, &mut jobs, report);
            }
        }
        jobs
    }

    fn plan_block(
        &self,
        block: &Block,
        provider: Option<&str>,
        address: &mut BlockAddress,
        jobs: &mut Vec<Job>,
        report: &mut ScanReport,
    ) {
        if let Some(error) = block.parse_error() {
            tracing::warn!(
                block = %block.full_name(),
                range = %block.range(),
                "Skipping malformed block: {}",
                error
            );
            return;
        }
        report.blocks_scanned += 1;

        for rule in self
            .registry
            .lookup(provider, block.block_type(), block.labels())
        {
            if self.config.is_excluded(&rule.code) {
                continue;
            }
            jobs.push(Job {
                id: jobs.len(),
                block: address.clone(),
                rule: Arc::clone(rule),
            });
        }

        // Nested blocks belong to the provider of their top-level ancestor
        for (idx, child) in block.children().iter().enumerate() {
            address.path.push(idx);
            self.plan_block(child, provider, address, jobs, report);
            address.path.pop();
        }
    }

    /// Stamp rule metadata onto a raw finding and keep its range inside the
    /// originating block.
    fn normalize(&self, mut finding: Finding, rule: &RuleSpec, block: &Block) -> Finding {
        finding.rule_code = rule.code.clone();
        finding.severity = self.config.severity_for(&rule.code, rule.severity);
        finding.kind = FindingKind::Violation;

        if !block.range().contains(&finding.range) {
            tracing::warn!(
                rule = %rule.code,
                block = %block.full_name(),
                "Finding range {} lies outside {}, re-anchoring to the block",
                finding.range,
                block.range()
            );
            finding.range = block.range().clone();
        }
        finding
    }
}
