use slideforge_common::Aspect;

pub const PLANNER_INSTRUCTIONS: &str = "\
You plan a single presentation slide. Given a user request, produce exactly \
one outline with a concise title (at most 80 characters) and 3 to 6 bullet \
points. Suggest up to 8 search queries and up to 24 key constraints drawn \
from the request. Return structured JSON only.";

pub const WEB_RESEARCH_INSTRUCTIONS: &str = "\
You research a slide topic using web search. Given a set of queries, find \
supporting facts and return findings with title/url/quote citations for \
every claim you surface. Return structured JSON only.";

pub const FILE_RESEARCH_INSTRUCTIONS: &str = "\
You research a slide topic using the attached file collection. Given a \
prompt and a set of keywords, extract relevant snippets and cite the file \
they came from. Return structured JSON only.";

pub const HTML_GENERATOR_INSTRUCTIONS: &str = "\
You generate the HTML for exactly one presentation slide. The document must \
contain exactly one element matching <section class=\"...slide...\">, sized \
to the given canvas with content inside the safe margin. Do not include \
<script> tags. Return only the HTML document, optionally fenced in a \
```html code block.";

pub const VALIDATOR_INSTRUCTIONS: &str = "\
You validate a single-slide HTML document against layout and content \
constraints. Report whether it passes, list concrete issues, and when it \
fails, suggest a prompt appendix that would fix them. Return structured \
JSON only.";

/// Appends the canvas/safe-margin constraints for `aspect` to the raw
/// prompt. See spec §4.6.2 and scenario 2 in §8.
pub fn compose_effective_prompt(raw_prompt: &str, aspect: Aspect) -> String {
    let (width, height) = aspect.canvas();
    let margin = aspect.safe_margin();
    format!(
        "{raw_prompt}\n\n---\nAspect: {aspect_label}\nCanvas: {width}x{height}\nSafe margin: {margin}px\nKeep all content within the safe margin.",
        raw_prompt = raw_prompt,
        aspect_label = aspect.as_str(),
    )
}

/// Synthesizes a fix-loop appendix from validator issues when the
/// validator did not provide one itself. See spec §4.6.5.
pub fn synthesize_fix_appendix(issues: &[String]) -> String {
    let mut appendix = "Fix these issues:\n".to_string();
    for issue in issues {
        appendix.push_str("- ");
        appendix.push_str(issue);
        appendix.push('\n');
    }
    appendix
}
