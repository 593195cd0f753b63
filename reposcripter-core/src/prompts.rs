//! Prompt construction, kept apart from the calls that send them.
//!
//! Every builder here is a pure function so prompt wording can be tested without a client.

use crate::contract::FileSummary;

/// Prompt asking for a one-paragraph summary of a single file.
pub fn summary_prompt(path: &str, content: &str) -> String {
    format!(
        "You are a File-Level Summarizer Agent. Write one concise paragraph describing the \
purpose of the following file, its main functions or classes, and its key responsibilities \
within the project. Describe the high-level logic only, not line-by-line details.

File Path: `{path}`

File Content:
```
{content}
```

Summary:"
    )
}

/// Render the file listing as one `- path` line per file.
pub fn file_listing<'a, I>(paths: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    paths
        .into_iter()
        .map(|p| format!("- {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render summaries as `**path**: summary` lines, preserving order.
pub fn render_summaries(summaries: &[FileSummary]) -> String {
    summaries
        .iter()
        .map(|s| format!("**{}**: {}", s.path, s.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt asking for a 2-3 sentence purpose and architecture overview.
pub fn synthesis_prompt(listing: &str, manifest: &str, summaries: &[FileSummary]) -> String {
    let summaries = render_summaries(summaries);
    format!(
        "You are an Architectural Synthesizer Agent. Using the file structure, dependencies and \
file summaries below, infer the overall purpose and architecture of the project. Respond with a \
concise, high-level overview of 2-3 sentences.

File Structure:
```
{listing}
```

Dependencies:
```
{manifest}
```

File Summaries:
{summaries}

Project Overview:"
    )
}

/// Prompt asking for exactly one README section in Markdown.
pub fn section_prompt(title: &str, overview: &str, context: &str) -> String {
    format!(
        "You are a professional technical writer who specialises in README.md files. Your \
current task is to write the \"{title}\" section.

Project Architectural Overview: \"{overview}\"

Use the following context to write a clear and concise \"{title}\" section in Markdown. \
Write only the body of this section, without repeating its heading.

Context:
{context}

## {title}
"
    )
}
