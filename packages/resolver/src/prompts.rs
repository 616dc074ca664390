//! Prompt formatting and response parsing for guided navigation.
//!
//! The inference service sees the page's links and a goal, and answers
//! with the index of the link to click. Replies are free text; parsing is
//! forgiving (first integer wins) because small local models rarely obey
//! output formats exactly.

use crate::traits::page::PageLink;

/// The navigation goal put in front of the model.
pub const REGISTRATION_DETAILS_GOAL: &str =
    "find the page stating the company's registration details \
     (tax ID / ИНН, ОГРН, legal name, requisites)";

/// Most links shown to the model in one prompt.
const MAX_PROMPT_LINKS: usize = 40;

/// Format the link-choice prompt for one navigation step.
pub fn format_link_choice_prompt(links: &[PageLink], goal: &str) -> String {
    let mut prompt = String::with_capacity(1024);
    prompt.push_str("You are navigating a company website. Goal: ");
    prompt.push_str(goal);
    prompt.push_str(".\n\nVisible links:\n");

    for (i, link) in links.iter().take(MAX_PROMPT_LINKS).enumerate() {
        let text = if link.text.trim().is_empty() {
            "(no text)"
        } else {
            link.text.trim()
        };
        prompt.push_str(&format!("{}: {} ({})\n", i, text, link.href));
    }

    prompt.push_str(
        "\nAnswer with the number of the single most promising link. \
         Answer with just the number.",
    );
    prompt
}

/// Parse a link choice out of a free-text reply.
///
/// Returns the first integer found, provided it indexes into the link
/// list that was shown. `None` means the reply was unusable.
pub fn parse_link_choice(reply: &str, link_count: usize) -> Option<usize> {
    let shown = link_count.min(MAX_PROMPT_LINKS);
    let mut current = String::new();

    for c in reply.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            break;
        }
    }

    let index: usize = current.parse().ok()?;
    (index < shown).then_some(index)
}
