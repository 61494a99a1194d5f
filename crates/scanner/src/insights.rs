//! Deterministic page statistics reported next to the assessment.

use std::collections::HashSet;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SemanticStructure {
    pub headings_count: usize,
    pub lists_count: usize,
    pub semantic_sections: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextInsights {
    pub text_quality: u32,
    pub label_quality: u32,
    pub semantic_structure: SemanticStructure,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageInsights {
    pub images_analyzed: usize,
    pub images_with_alt: usize,
    pub images_with_descriptions: usize,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageInsights {
    pub text: TextInsights,
    pub images: ImageInsights,
}

fn count(document: &Html, css: &str) -> usize {
    Selector::parse(css)
        .map(|sel| document.select(&sel).count())
        .unwrap_or(0)
}

/// Body text without script/style contents, like `innerText`.
pub(crate) fn body_text(document: &Html) -> String {
    let Ok(body_sel) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = document.select(&body_sel).next() else {
        return String::new();
    };
    let mut out = String::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_string()))
            .map(|name| matches!(name.as_str(), "script" | "style" | "noscript" | "template"))
            .unwrap_or(false);
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    out
}

fn text_insights(document: &Html) -> TextInsights {
    let text = body_text(document);
    let words = text.split_whitespace().count() as f64;
    let sentences = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count() as f64;
    let text_quality = ((words / 100.0) * 50.0 + (sentences / 10.0) * 50.0)
        .round()
        .min(100.0) as u32;

    let label_targets: HashSet<String> = Selector::parse("label[for]")
        .map(|sel| {
            document
                .select(&sel)
                .filter_map(|l| l.value().attr("for"))
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let fields = count(document, "input, textarea, select").max(1) as f64;
    let label_quality = ((label_targets.len() as f64 / fields) * 100.0)
        .round()
        .min(100.0) as u32;

    let semantic_structure = SemanticStructure {
        headings_count: count(document, "h1, h2, h3, h4, h5, h6"),
        lists_count: count(document, "ul, ol"),
        semantic_sections: count(document, "section, article, nav, main"),
    };

    let mut recommendations = Vec::new();
    if text_quality < 50 {
        recommendations.push("Consider adding more descriptive content to the page".to_string());
    }
    if label_quality < 80 {
        recommendations
            .push("Many input fields lack proper labels - critical for accessibility".to_string());
    }
    if semantic_structure.semantic_sections == 0 {
        recommendations.push(
            "Use semantic HTML sections (section, article, nav) for better structure".to_string(),
        );
    }

    TextInsights {
        text_quality,
        label_quality,
        semantic_structure,
        recommendations,
    }
}

fn image_insights(document: &Html) -> ImageInsights {
    let mut insights = ImageInsights::default();
    let Ok(sel) = Selector::parse("img") else {
        return insights;
    };
    for img in document.select(&sel) {
        insights.images_analyzed += 1;
        if let Some(alt) = img.value().attr("alt").filter(|a| !a.trim().is_empty()) {
            insights.images_with_alt += 1;
            if alt.chars().count() > 5 {
                insights.images_with_descriptions += 1;
            }
        }
    }

    if insights.images_analyzed > 0 {
        let total = insights.images_analyzed as f64;
        let alt_coverage = insights.images_with_alt as f64 / total * 100.0;
        let description_coverage = insights.images_with_descriptions as f64 / total * 100.0;
        if alt_coverage < 100.0 {
            insights.recommendations.push(format!(
                "{}% of images are missing alt text",
                (100.0 - alt_coverage).round()
            ));
        }
        if description_coverage < 50.0 {
            insights
                .recommendations
                .push("Many alt texts are too short - use descriptive text".to_string());
        }
    }
    insights
}

pub fn page_insights(html: &str) -> PageInsights {
    let document = Html::parse_document(html);
    PageInsights {
        text: text_insights(&document),
        images: image_insights(&document),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_quality_formula() {
        // 20 words in 2 sentences: 20/100*50 + 2/10*50 = 10 + 10
        let sentence = "one two three four five six seven eight nine ten.";
        let html = format!("<body><p>{} {}</p></body>", sentence, sentence);
        let insights = page_insights(&html);
        assert_eq!(insights.text.text_quality, 20);
        assert!(insights
            .text
            .recommendations
            .iter()
            .any(|r| r.contains("more descriptive content")));
    }

    #[test]
    fn test_script_text_ignored() {
        let html = "<body><script>var a = 1; var b = 2;</script></body>";
        assert_eq!(page_insights(html).text.text_quality, 0);
    }

    #[test]
    fn test_label_quality() {
        let html = r#"<body><label for="a">A</label><input id="a"><input id="b"><textarea></textarea><select></select></body>"#;
        let insights = page_insights(html);
        assert_eq!(insights.text.label_quality, 25);
    }

    #[test]
    fn test_semantic_sections_counted() {
        let html = "<body><nav></nav><main><article><ul><li>x</li></ul></article></main></body>";
        let insights = page_insights(html);
        assert_eq!(insights.text.semantic_structure.semantic_sections, 3);
        assert_eq!(insights.text.semantic_structure.lists_count, 1);
        assert!(!insights
            .text
            .recommendations
            .iter()
            .any(|r| r.contains("semantic HTML sections")));
    }

    #[test]
    fn test_image_coverage() {
        let html = r#"<body><img alt="A detailed photo"><img alt="cat"><img><img alt=" "></body>"#;
        let images = page_insights(html).images;
        assert_eq!(images.images_analyzed, 4);
        assert_eq!(images.images_with_alt, 2);
        assert_eq!(images.images_with_descriptions, 1);
        assert_eq!(images.recommendations[0], "50% of images are missing alt text");
        assert_eq!(images.recommendations.len(), 2);
    }
}
