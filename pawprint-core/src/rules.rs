//! Ordered first-match rule tables.
//!
//! Both the emotion classifier and the reaction lookup are "walk a fixed
//! list, take the first entry whose predicate holds" tables. Order is part
//! of the semantics, so tables are plain slices evaluated front to back.

/// A single entry in an ordered rule table.
pub trait Rule<I: ?Sized> {
    /// What the rule yields when it matches.
    type Output;

    /// Whether this rule applies to `input`.
    fn matches(&self, input: &I) -> bool;

    /// The rule's result.
    fn output(&self) -> Self::Output;
}

/// Evaluate `rules` in order and return the output of the first match.
pub fn first_match<I, R>(rules: &[R], input: &I) -> Option<R::Output>
where
    I: ?Sized,
    R: Rule<I>,
{
    rules.iter().find(|r| r.matches(input)).map(Rule::output)
}
