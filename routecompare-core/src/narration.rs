//! Analyst prompt describing one pair's comparison.
//!
//! The rendered text is handed to an external language model; this crate
//! never talks to one.

use std::fmt;

use crate::{CoverageStat, ProviderKind, RouteDetails};

/// Instructions listed per route.
pub const PROMPT_INSTRUCTION_LIMIT: usize = 5;

/// Prompt asking a model to compare the routes behind one [`CoverageStat`].
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use routecompare_core::{CoverageStat, NarrationPrompt, ProviderKind, RouteDetails};
///
/// let details = RouteDetails::new(5_250.0, 630.0, ["Head north", "Turn left"])?;
/// let stat = CoverageStat {
///     reference: ProviderKind::Google,
///     coverage: BTreeMap::from([(ProviderKind::Here, 87.5)]),
///     details: BTreeMap::from([
///         (ProviderKind::Google, Some(details)),
///         (ProviderKind::Here, None),
///     ]),
/// };
/// let prompt = NarrationPrompt::new(&stat, "Which route is better for a cyclist?").render();
/// assert!(prompt.contains("Distance: 5.25 km"));
/// assert!(prompt.contains("--- HERE Route ---\nNo data available."));
/// # Ok::<(), routecompare_core::RouteDetailsError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationPrompt<'a> {
    stat: &'a CoverageStat,
    user_prompt: &'a str,
}

impl<'a> NarrationPrompt<'a> {
    /// Prepare a prompt for `stat` and the user's question.
    pub fn new(stat: &'a CoverageStat, user_prompt: &'a str) -> Self {
        Self { stat, user_prompt }
    }

    /// Render the prompt text.
    pub fn render(&self) -> String {
        self.to_string()
    }

    fn providers(&self) -> Vec<ProviderKind> {
        let reference = self.stat.reference;
        std::iter::once(reference)
            .chain(
                self.stat
                    .details
                    .keys()
                    .copied()
                    .filter(move |kind| *kind != reference),
            )
            .collect()
    }
}

impl fmt::Display for NarrationPrompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let providers = self.providers();
        writeln!(
            f,
            "You are an expert transportation and logistics analyst. Your task is to compare \
             {} route options based on the data provided and the user's request. Be concise \
             and insightful.",
            providers.len()
        )?;
        writeln!(f)?;
        writeln!(f, "Here is the data for the routes:")?;
        for kind in &providers {
            writeln!(f, "--- {} Route ---", kind.display_name())?;
            writeln!(f, "{}", format_details(self.stat.details_for(*kind)))?;
            writeln!(f)?;
        }
        writeln!(
            f,
            "--- Coverage of the {} route corridor ---",
            self.stat.reference.display_name()
        )?;
        for (kind, coverage) in &self.stat.coverage {
            writeln!(f, "{}: {coverage:.2}%", kind.display_name())?;
        }
        writeln!(f, "---")?;
        writeln!(f, "User's request: \"{}\"", self.user_prompt)?;
        writeln!(f)?;
        write!(f, "Your analysis:")
    }
}

fn format_details(details: Option<&RouteDetails>) -> String {
    let Some(details) = details else {
        return "No data available.".to_owned();
    };
    let mut text = format!(
        "Distance: {:.2} km\nDuration: {:.1} minutes\nFirst {PROMPT_INSTRUCTION_LIMIT} Instructions:",
        details.distance() / 1000.0,
        details.duration() / 60.0,
    );
    for instruction in details.instructions().iter().take(PROMPT_INSTRUCTION_LIMIT) {
        text.push_str("\n- ");
        text.push_str(instruction);
    }
    text
}
