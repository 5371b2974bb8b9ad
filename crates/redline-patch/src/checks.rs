//! Heuristic payload checks.
//!
//! These are signals, not rules: a legitimate payload can trip any of them.
//! Each check is named by its issue code so callers can suppress it per call.

use crate::diagnostics::IssueCode;
use crate::schema::Operation;

/// Blocks shorter than this are exempt from the reduction check.
pub const REDUCTION_MIN_CHARS: usize = 20;

/// What a check sees of one record.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub op: Operation,
    pub payload: &'a str,
    /// Current text of the target block; `None` for inserts.
    pub original: Option<&'a str>,
    pub max_reduction: f64,
}

pub trait AdvisoryCheck: Send + Sync {
    fn code(&self) -> IssueCode;

    fn applies_to(&self, op: Operation) -> bool;

    /// A human-readable finding, or `None` when the payload looks fine.
    fn check(&self, ctx: &CheckContext<'_>) -> Option<String>;

    fn name(&self) -> &'static str {
        self.code().as_str()
    }
}

/// An ordered set of checks. Findings are reported in registration order.
pub struct CheckSet {
    checks: Vec<Box<dyn AdvisoryCheck>>,
}

impl CheckSet {
    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    pub fn builtin() -> Self {
        Self::empty()
            .with(UnterminatedQuote)
            .with(TrailingEllipsis)
            .with(LargeReduction)
    }

    pub fn with(mut self, check: impl AdvisoryCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.checks.iter().map(|c| c.name())
    }

    pub fn run(&self, ctx: &CheckContext<'_>, suppress: &[String]) -> Vec<(IssueCode, String)> {
        self.checks
            .iter()
            .filter(|c| c.applies_to(ctx.op))
            .filter(|c| !suppress.iter().any(|s| s.trim() == c.name()))
            .filter_map(|c| c.check(ctx).map(|msg| (c.code(), msg)))
            .collect()
    }
}

impl Default for CheckSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for CheckSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Quotes left open at the end of the payload, when the original was balanced.
#[derive(Debug, Clone, Copy)]
pub struct UnterminatedQuote;

fn has_open_quote(text: &str) -> bool {
    let straight = text.chars().filter(|c| *c == '"').count();
    let opening = text.chars().filter(|c| *c == '\u{201C}').count();
    let closing = text.chars().filter(|c| *c == '\u{201D}').count();
    straight % 2 == 1 || opening > closing
}

impl AdvisoryCheck for UnterminatedQuote {
    fn code(&self) -> IssueCode {
        IssueCode::UnterminatedQuote
    }

    fn applies_to(&self, op: Operation) -> bool {
        matches!(op, Operation::Replace | Operation::Insert)
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Option<String> {
        if !has_open_quote(ctx.payload) || ctx.original.is_some_and(has_open_quote) {
            return None;
        }
        Some("payload ends inside an unterminated quotation; it may be truncated".to_string())
    }
}

/// Payload trails off with an ellipsis the original did not have.
#[derive(Debug, Clone, Copy)]
pub struct TrailingEllipsis;

fn ends_with_ellipsis(text: &str) -> bool {
    let t = text.trim_end();
    t.ends_with("...") || t.ends_with('\u{2026}')
}

impl AdvisoryCheck for TrailingEllipsis {
    fn code(&self) -> IssueCode {
        IssueCode::TrailingEllipsis
    }

    fn applies_to(&self, op: Operation) -> bool {
        matches!(op, Operation::Replace | Operation::Insert)
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Option<String> {
        if !ends_with_ellipsis(ctx.payload) || ctx.original.is_some_and(ends_with_ellipsis) {
            return None;
        }
        Some("payload ends with an ellipsis; it may be truncated".to_string())
    }
}

/// Replacement text much shorter than the block it replaces.
#[derive(Debug, Clone, Copy)]
pub struct LargeReduction;

impl AdvisoryCheck for LargeReduction {
    fn code(&self) -> IssueCode {
        IssueCode::LargeReduction
    }

    fn applies_to(&self, op: Operation) -> bool {
        op == Operation::Replace
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Option<String> {
        let original = ctx.original?.chars().count();
        if original < REDUCTION_MIN_CHARS {
            return None;
        }
        let new = ctx.payload.chars().count();
        let floor = (1.0 - ctx.max_reduction.clamp(0.0, 1.0)) * original as f64;
        if (new as f64) >= floor {
            return None;
        }
        let reduction = 100.0 * (original - new.min(original)) as f64 / original as f64;
        Some(format!(
            "payload is {new} chars, {reduction:.0}% shorter than the original {original}"
        ))
    }
}
