//! Vertical card display for query responses.
//!
//! Renders a recommendation as a grouped, human-readable card: verdict,
//! supporting evidence, cautions, follow-up, sources.

use caduceus_core::{QueryResponse, SourceRef, SupportingEvidence};

const MAX_TITLE_WIDTH: usize = 70;

/// Print a query response as a vertical card grouped by section.
pub fn print_response_card(response: &QueryResponse) {
    let r = &response.recommendation;

    println!("=== {} ===", response.query);
    println!();

    println!("Recommendation");
    println!("{}", wrap_indent(&r.primary_recommendation, "  "));
    println!();

    println!("Assessment");
    println!("  {:<18} {}", "evidence level", r.evidence_level);
    println!("  {:<18} {:.2}", "confidence", r.confidence_score);
    println!("  {:<18} {}", "summary", r.evidence_summary);
    println!();

    if !r.supporting_evidence.is_empty() {
        println!("Supporting Evidence ({}):", r.supporting_evidence.len());
        for item in &r.supporting_evidence {
            print_evidence_item(item);
        }
        println!();
    }

    if !r.contraindications.is_empty() {
        println!("Cautions");
        for c in &r.contraindications {
            println!("  - {c}");
        }
        println!();
    }

    if !r.follow_up_actions.is_empty() {
        println!("Follow-up");
        for a in &r.follow_up_actions {
            println!("  - {a}");
        }
        println!();
    }

    if !response.sources.is_empty() {
        println!("Sources ({}):", response.sources.len());
        for source in &response.sources {
            print_source(source);
        }
        println!();
    }

    println!("{}", wrap_indent(&r.disclaimer, ""));
    println!();
    println!("processed in {:.2}s", response.processing_time);
}

fn print_evidence_item(item: &SupportingEvidence) {
    println!("    {:<20} {}", item.study_type, truncate(&item.title, MAX_TITLE_WIDTH));
    print!("      {}", item.journal);
    if !item.pub_date.is_empty() {
        print!("  {}", item.pub_date);
    }
    println!("  (relevance {:.2})", item.relevance);
    if !item.key_finding.is_empty() {
        println!("      {}", item.key_finding);
    }
}

fn print_source(source: &SourceRef) {
    println!("    {}", truncate(&source.title, MAX_TITLE_WIDTH));
    let authors = if source.authors.len() > 3 {
        format!("{} et al.", source.authors[..3].join(", "))
    } else {
        source.authors.join(", ")
    };
    if !authors.is_empty() {
        println!("      {authors}");
    }
    match &source.url {
        Some(url) => println!("      {}  {}", source.journal, url),
        None => println!("      {}", source.journal),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}

/// Naive word wrap at 96 columns with a fixed indent.
fn wrap_indent(text: &str, indent: &str) -> String {
    const WIDTH: usize = 96;
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > WIDTH {
            lines.push(format!("{indent}{current}"));
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(format!("{indent}{current}"));
    }
    lines.join("\n")
}
