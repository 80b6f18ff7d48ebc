//! Flattens a provider response into a plain-text digest that a language model
//! can read directly.

use scraper::Html;
use serde::Deserialize;
use serde_json::Value;

/// Character budget for any single free-text field in the digest.
pub const FIELD_BUDGET: usize = 300;

pub const NO_RESULTS: &str = "No results found.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderResponse {
    pub infobox: Option<ResultSet>,
    pub web: Option<ResultSet>,
    pub news: Option<ResultSet>,
    pub videos: Option<ResultSet>,
    pub discussions: Option<ResultSet>,
    pub locations: Option<ResultSet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResultSet {
    pub results: Vec<Entry>,
}

/// Union of the fields the digest reads from any category. Category-specific
/// blocks stay as raw JSON because their shapes vary between provider versions.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Entry {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub long_desc: Option<String>,
    pub age: Option<String>,
    pub data: Option<Value>,
    pub postal_address: Option<Value>,
    pub meta_url: Option<Value>,
}

#[derive(Clone, Copy)]
enum Category {
    Summary,
    Web,
    News,
    Videos,
    Discussions,
    Locations,
}

impl Category {
    fn heading(self) -> &'static str {
        match self {
            Category::Summary => "Summary",
            Category::Web => "Web Results",
            Category::News => "News",
            Category::Videos => "Videos",
            Category::Discussions => "Discussions",
            Category::Locations => "Locations",
        }
    }
}

pub fn render_value(raw: Value) -> Result<String, serde_json::Error> {
    let response: ProviderResponse = serde_json::from_value(raw)?;
    Ok(render(&response))
}

pub fn render(response: &ProviderResponse) -> String {
    let categories = [
        (Category::Summary, &response.infobox),
        (Category::Web, &response.web),
        (Category::News, &response.news),
        (Category::Videos, &response.videos),
        (Category::Discussions, &response.discussions),
        (Category::Locations, &response.locations),
    ];

    let sections: Vec<String> = categories
        .into_iter()
        .filter_map(|(category, set)| {
            let entries = &set.as_ref()?.results;
            if entries.is_empty() {
                return None;
            }
            Some(render_section(category, entries))
        })
        .collect();

    if sections.is_empty() {
        NO_RESULTS.to_string()
    } else {
        sections.join("\n\n")
    }
}

fn render_section(category: Category, entries: &[Entry]) -> String {
    let mut out = format!("## {}", category.heading());
    for (idx, entry) in entries.iter().enumerate() {
        out.push_str(&format!("\n{}. {}", idx + 1, field(entry.title.as_deref()).unwrap_or_else(|| "N/A".into())));

        let mut lines: Vec<(&str, String)> = Vec::new();
        if let Some(url) = entry.url.as_deref().filter(|u| !u.is_empty()) {
            lines.push(("URL", url.to_string()));
        }

        let description = match category {
            Category::Summary => field(entry.long_desc.as_deref()).or_else(|| field(entry.description.as_deref())),
            _ => field(entry.description.as_deref()),
        };
        if let Some(description) = description {
            lines.push(("Description", description));
        }

        match category {
            Category::News => {
                if let Some(source) = nested_str(entry.meta_url.as_ref(), "hostname") {
                    lines.push(("Source", source));
                }
            }
            Category::Discussions => {
                if let Some(forum) = nested_str(entry.data.as_ref(), "forum_name") {
                    lines.push(("Forum", forum));
                }
                if let Some(comment) = nested_str(entry.data.as_ref(), "top_comment") {
                    lines.push(("Top comment", comment));
                }
            }
            Category::Locations => {
                if let Some(address) = nested_str(entry.postal_address.as_ref(), "displayAddress") {
                    lines.push(("Address", address));
                }
            }
            _ => {}
        }

        if let Some(age) = field(entry.age.as_deref()) {
            lines.push(("Age", age));
        }

        for (label, value) in lines {
            out.push_str(&format!("\n   {label}: {value}"));
        }
    }
    out
}

fn nested_str(block: Option<&Value>, key: &str) -> Option<String> {
    field(block?.get(key)?.as_str())
}

/// Cleans one free-text field: strips markup, collapses whitespace and
/// applies [`FIELD_BUDGET`].
fn field(raw: Option<&str>) -> Option<String> {
    let text = strip_html(raw?);
    if text.is_empty() {
        return None;
    }
    Some(truncate(&text, FIELD_BUDGET))
}

pub fn strip_html(raw: &str) -> String {
    let text = if raw.contains('<') || raw.contains('&') {
        Html::parse_fragment(raw).root_element().text().collect::<String>()
    } else {
        raw.to_string()
    };
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn truncate(text: &str, budget: usize) -> String {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => format!("{}...", text[..idx].trim_end()),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_response() {
        assert_eq!(render_value(json!({})).unwrap(), NO_RESULTS);
        assert_eq!(render_value(json!({"web": {"results": []}, "type": "search"})).unwrap(), NO_RESULTS);
    }

    #[test]
    fn test_web_section() {
        let digest = render_value(json!({
            "web": {"results": [{
                "title": "The Rust Book",
                "url": "https://doc.rust-lang.org/book/",
                "description": "Learn <strong>Rust</strong> &amp; more",
                "age": "2 days ago"
            }]}
        }))
        .unwrap();
        assert_eq!(
            digest,
            "## Web Results\n1. The Rust Book\n   URL: https://doc.rust-lang.org/book/\n   Description: Learn Rust & more\n   Age: 2 days ago"
        );
    }

    #[test]
    fn test_category_order_and_extras() {
        let digest = render_value(json!({
            "locations": {"results": [{"title": "Cafe", "postal_address": {"displayAddress": "1 Main St"}}]},
            "discussions": {"results": [{
                "title": "Async question",
                "url": "https://forum.example/t/1",
                "data": {"forum_name": "r/rust", "top_comment": "Use tokio"}
            }]},
            "news": {"results": [{"title": "Release", "meta_url": {"hostname": "blog.rust-lang.org"}}]},
            "infobox": {"results": [{"title": "Rust", "long_desc": "A systems language"}]}
        }))
        .unwrap();

        let summary = digest.find("## Summary").unwrap();
        let news = digest.find("## News").unwrap();
        let discussions = digest.find("## Discussions").unwrap();
        let locations = digest.find("## Locations").unwrap();
        assert!(summary < news && news < discussions && discussions < locations);
        assert!(digest.contains("Description: A systems language"));
        assert!(digest.contains("Source: blog.rust-lang.org"));
        assert!(digest.contains("Forum: r/rust"));
        assert!(digest.contains("Top comment: Use tokio"));
        assert!(digest.contains("Address: 1 Main St"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 3), "ééé...");
        let long = "word ".repeat(200);
        let cut = truncate(long.trim(), FIELD_BUDGET);
        assert!(cut.ends_with("..."));
        assert!(cut.chars().count() <= FIELD_BUDGET + 3);
    }

    #[test]
    fn test_missing_title_is_marked() {
        let digest = render_value(json!({"videos": {"results": [{"url": "https://v.example/1"}]}})).unwrap();
        assert!(digest.starts_with("## Videos\n1. N/A\n   URL: https://v.example/1"));
    }
}
